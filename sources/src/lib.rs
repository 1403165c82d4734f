//! # Document Sources
//!
//! This crate provides the document-source side of ragmark: fetching the
//! Markdown files of a repository so the engine can index them.
//!
//! Two sources are included:
//!
//! - [`GithubSource`]: walks a GitHub repository through the REST contents
//!   API, bounded in depth and file count
//! - [`StaticSource`]: serves fixed in-memory documents, for tests and
//!   offline runs
//!
//! Both implement [`DocumentSource`], which is what the engine consumes.

pub mod document;
pub mod error;
pub mod github;
pub mod source;

pub use document::{Document, hash_content};
pub use error::{Result, SourceError};
pub use github::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_FILES, GithubSource};
pub use source::{DocumentSource, StaticSource};
