//! Cantus - Docker Registry v2 gateway library
//!
//! Cantus reads manifests and tags from Docker Registry v2 endpoints,
//! normalizes schema 1 and schema 2 manifests into one metadata document, and
//! copies images between registries blob by blob.
//!
//! # Quick Start
//!
//! ```no_run
//! use libcantus::Cantus;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cantus = Cantus::builder().build()?;
//!
//!     let manifest = cantus
//!         .manifest("docker-registry.default.svc:5000/aurora/app:1.0.0", Some("token"))
//!         .await?;
//!     println!("{} built {}", manifest.docker_digest, manifest.build_ended);
//!
//!     let report = cantus
//!         .tag(
//!             "docker-registry.default.svc:5000/aurora/app:1.0.0",
//!             Some("token"),
//!             "docker-registry.default.svc:5000/aurora/app:latest",
//!             Some("token"),
//!         )
//!         .await?;
//!     println!("copied {} blobs", report.copied.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Main Types
//!
//! - [`Cantus`] - Main entry point
//! - [`CantusBuilder`] - Builder for configuration
//! - [`NormalizedManifest`] - Image metadata extracted from a manifest
//! - [`TagEntry`] - Tag name with its [`TagKind`]
//! - [`BatchResult`] - Per-reference outcomes of a batch lookup
//! - [`CantusError`] - Typed failure with a stable [`ErrorKind`]
//!
//! The lower-level modules stay public for callers that need to drive the
//! protocol client or the retry layer directly.

#![warn(clippy::all)]

/// Returns the libcantus crate version.
///
/// # Examples
///
/// ```
/// let version = libcantus::version();
/// assert!(!version.is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

mod cantus;
pub use cantus::{Cantus, CantusBuilder};

pub use batch::{BatchFailure, BatchItem, BatchResult};
pub use config::Config;
pub use copy::CopyReport;
pub use digest::Digest;
pub use error::{CantusError, ErrorKind, Result};
pub use manifest::{BuildTimeline, JavaImage, NormalizedManifest};
pub use reference::RepoCommand;
pub use tag::{TagEntry, TagKind, TagList};

#[doc(hidden)]
pub mod auth;
#[doc(hidden)]
pub mod batch;
#[doc(hidden)]
pub mod client;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod copy;
#[doc(hidden)]
pub mod digest;
#[doc(hidden)]
pub mod error;
#[doc(hidden)]
pub mod manifest;
#[doc(hidden)]
pub mod metadata;
#[doc(hidden)]
pub mod pool;
#[doc(hidden)]
pub mod reference;
#[doc(hidden)]
pub mod registry;
#[doc(hidden)]
pub mod retry;
pub mod tag;

#[cfg(test)]
mod test_support;
