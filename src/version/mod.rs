//! Version handling for package resolution
//!
//! # Modules
//!
//! - [`semver`]: Parsing of package version strings into `semver::Version`
//! - [`range`]: Version ranges with interval and floating notation
//! - [`matcher`]: Best-fit version selection for a range

pub mod matcher;
pub mod range;
pub mod semver;

pub use matcher::find_best_match;
pub use range::{FloatBehavior, VersionRange};
