//! Integration test modules

mod cli;
mod document;
mod reconcile_properties;
mod verification;
