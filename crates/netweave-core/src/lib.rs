#![forbid(unsafe_code)]

//! Weathermap generation engine (headless).
//!
//! Design goals:
//! - deterministic output: identical topology facts and config yield an
//!   identical document, regardless of row arrival order
//! - non-destructive merge: operator-curated template attributes always win
//! - no I/O besides the codec; the database and process wiring live in
//!   `netweave-db` and `netweave-cli`

pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod geom;
pub mod geometry;
pub mod merge;
pub mod pipeline;
pub mod placement;
pub mod reconcile;
pub mod topology;

pub use config::MapConfig;
pub use document::{Attr, AttrBlock, Document, Section};
pub use error::{Error, Result};
pub use pipeline::build_map;
