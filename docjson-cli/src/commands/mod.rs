//! CLI command implementations.

pub mod build;
pub mod check;

pub use build::{build_sites, BuildOptions};
pub use check::check_sites;
