//! HTTP handlers for resource operations.

pub mod resource;
pub use resource::*;
