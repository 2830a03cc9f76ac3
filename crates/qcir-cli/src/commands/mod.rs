//! CLI command implementations.

pub mod common;
pub mod convert;
pub mod ghz;
pub mod inspect;
pub mod results;
pub mod transform;
