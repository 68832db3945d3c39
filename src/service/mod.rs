//! Resource orchestration: validation, hooks, and the four operations.

pub mod hooks;
mod resource;
mod validation;
pub use hooks::{NoHooks, ResourceHooks};
pub use resource::{ListRequest, Resource};
pub use validation::{Payload, PayloadValidator};
