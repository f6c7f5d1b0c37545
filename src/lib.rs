pub mod archive;
pub mod compat;
pub mod config;
pub mod error;
pub mod framework;
pub mod graph;
pub mod library;
pub mod lockfile;
pub mod logging;
pub mod provider;
pub mod repository;
pub mod source;
pub mod version;
