//! Compatibility verification of restored graphs

pub mod assets;
pub mod checker;
pub mod resolver;
pub mod types;

pub use checker::{CompatibilityCheckResult, CompatibilityChecker, CompatibilityIssue};
pub use resolver::CompatibilityDataResolver;
