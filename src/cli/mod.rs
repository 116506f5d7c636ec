//! CB-013: CLI subcommands: validate, resolve, versions.

use crate::core::config::CookbookConfig;
use crate::core::resolver::{BatchReport, Outcome, ResolveRequest, Resolver};
use crate::core::scale::{RequestedYield, ScaleRequest};
use crate::core::store::{DirStore, RecipeLookup};
use crate::core::version::{self, SemverPrecedence};
use anyhow::{bail, Context, Result};
use clap::Subcommand;
use indexmap::IndexMap;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve and validate recipes (all known versions by default)
    Validate {
        /// Recipe slug (omit to validate every recipe)
        #[arg(conflicts_with = "all")]
        slug: Option<String>,

        /// Validate every known recipe and version
        #[arg(long)]
        all: bool,

        /// Only this version of SLUG
        #[arg(long, requires = "slug")]
        version: Option<String>,
    },

    /// Resolve a recipe and print the flattened result as JSON
    Resolve {
        /// Recipe slug
        slug: String,

        /// Exact version (default: highest known)
        #[arg(long, conflicts_with = "constraint")]
        version: Option<String>,

        /// Version constraint, e.g. "^1.2" or ">=1.0, <2.0"
        #[arg(long)]
        constraint: Option<String>,

        /// Target yield amount
        #[arg(long = "yield")]
        yield_amount: Option<f64>,

        /// Target yield unit (default: the recipe's own unit)
        #[arg(long, requires = "yield_amount")]
        unit: Option<String>,

        /// Override a recipe variable (repeatable)
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
        vars: Vec<(String, serde_json::Value)>,
    },

    /// List known versions of a recipe and mark the selected one
    Versions {
        /// Recipe slug
        slug: String,

        /// Version constraint to select against
        #[arg(long)]
        constraint: Option<String>,
    },
}

/// Parse `NAME=VALUE`. VALUE is taken as JSON when it parses, else as text.
fn parse_var(raw: &str) -> std::result::Result<(String, serde_json::Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty variable name in '{}'", raw));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

/// Dispatch a CLI command against the configured recipe tree.
pub fn dispatch(cmd: Commands, config: &CookbookConfig) -> Result<()> {
    let store = DirStore::new(&config.recipes_dir);
    match cmd {
        Commands::Validate { slug, all, version } => {
            cmd_validate(&store, slug.as_deref(), all, version.as_deref())
        }
        Commands::Resolve {
            slug,
            version,
            constraint,
            yield_amount,
            unit,
            vars,
        } => {
            let scale = ScaleRequest {
                yield_: yield_amount.map(|amount| RequestedYield { amount, unit }),
                vars: collect_vars(vars)?,
            };
            let mut request = ResolveRequest::new(slug).with_scale(scale);
            request.version = version;
            request.constraint = constraint;
            cmd_resolve(&store, &request, config.policy.warnings_fatal)
        }
        Commands::Versions { slug, constraint } => {
            cmd_versions(&store, &slug, constraint.as_deref())
        }
    }
}

fn cmd_validate<L: RecipeLookup + ?Sized>(
    store: &L,
    slug: Option<&str>,
    all: bool,
    version: Option<&str>,
) -> Result<()> {
    let resolver = Resolver::new(store);
    let report = match (slug, version) {
        (Some(id), Some(v)) if !all => BatchReport {
            entries: vec![resolver.validate_entry(id, v)],
        },
        (Some(id), None) if !all => resolver.validate_recipe(id)?,
        _ => resolver.validate_all()?,
    };

    print_report(&report);
    let failed = report.failures().count();
    if failed > 0 {
        bail!(
            "{} of {} recipe version(s) failed validation",
            failed,
            report.entries.len()
        );
    }
    Ok(())
}

/// Display a batch report to stdout.
fn print_report(report: &BatchReport) {
    for entry in &report.entries {
        match &entry.outcome {
            Outcome::Valid { fingerprint } => {
                println!("[VALID]   {} ({})", entry.key, fingerprint);
            }
            Outcome::Invalid(violations) => {
                println!("[INVALID] {}", entry.key);
                for v in violations {
                    println!("    {}", v);
                }
            }
            Outcome::Failed(e) => println!("[ERROR]   {}: {}", entry.key, e),
        }
    }
    println!();
    println!(
        "{} valid, {} failed",
        report.valid_count(),
        report.failures().count()
    );
}

fn cmd_resolve<L: RecipeLookup + ?Sized>(
    store: &L,
    request: &ResolveRequest,
    warnings_fatal: bool,
) -> Result<()> {
    let resolution = Resolver::new(store)
        .resolve(request)
        .with_context(|| format!("cannot resolve '{}'", request.id))?;

    for v in &resolution.violations {
        eprintln!("warning: {}", v);
    }
    if warnings_fatal && !resolution.is_valid() {
        bail!(
            "{}@{} has {} validation finding(s)",
            resolution.recipe.id,
            resolution.recipe.version,
            resolution.violations.len()
        );
    }

    let json = serde_json::to_string_pretty(&resolution.recipe)?;
    println!("{}", json);
    eprintln!("fingerprint: {}", resolution.fingerprint);
    Ok(())
}

fn cmd_versions<L: RecipeLookup + ?Sized>(
    store: &L,
    slug: &str,
    constraint: Option<&str>,
) -> Result<()> {
    let known = store.list_versions(slug)?;
    let selected = version::select_from(slug, &known, constraint, &SemverPrecedence)?;
    for v in version::sort_versions(&known, &SemverPrecedence) {
        let marker = if v == selected { "*" } else { " " };
        println!("{} {}", marker, v);
    }
    Ok(())
}

/// Collect `--var` pairs, rejecting a name given twice.
pub fn collect_vars(
    pairs: Vec<(String, serde_json::Value)>,
) -> Result<IndexMap<String, serde_json::Value>> {
    let mut vars = IndexMap::new();
    for (name, value) in pairs {
        if vars.contains_key(&name) {
            bail!("variable '{}' given more than once", name);
        }
        vars.insert(name, value);
    }
    Ok(vars)
}
