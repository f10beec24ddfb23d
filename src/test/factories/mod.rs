//! Factory methods for test data.

pub mod files;
pub mod images;
pub mod modules;

pub use files::*;
pub use images::*;
pub use modules::*;
