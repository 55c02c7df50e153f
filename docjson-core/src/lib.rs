//! # docjson-core
//!
//! Core library for the docjson content pipeline.
//!
//! This crate turns a tree of markdown sources into one JSON artifact per
//! file: front matter attributes, commit attribution, a heading outline,
//! and the rendered HTML body.

pub mod attribution;
pub mod builder;
pub mod config;
pub mod frontmatter;
pub mod markdown;
pub mod models;
pub mod slug;
pub mod store;
pub mod structure;

pub use attribution::{AttributionEnricher, CommitHistory, CommitRecord, GitHubHistory, HistoryResponse};
pub use builder::{BuildError, ContentBuilder, FileFailure, SitePlan, SiteReport};
pub use config::{Config, FailurePolicy, SiteConfig};
pub use markdown::{CodeBlockStyle, MarkdownRenderer};
pub use models::{Attributes, ContentArtifact, HeadingEntry, ParsedDocument};
pub use slug::slugify;
pub use structure::SiteStructureIndex;
