#![allow(dead_code)]

pub mod package;
pub mod source;

pub use package::{PackageBuilder, TestRepository, lock_file};
pub use source::{mock_package, mock_service_index};
