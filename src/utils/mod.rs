// Utility functions
pub mod error;
pub mod paths;

pub use error::*;
