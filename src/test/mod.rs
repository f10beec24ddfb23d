//! Shared test data for unit tests.
//!
//! Factories build the modules, files and directories that several test modules need, so
//! every test module describes its scenario instead of its setup.

pub mod factories;

pub use factories::*;
