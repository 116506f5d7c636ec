//! Cookbook: versioned recipe resolution.
//!
//! Flattens a recipe that derives from a base and composes other recipes,
//! each independently versioned, into one reproducible resolved form.

pub mod cli;
pub mod core;
