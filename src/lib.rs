//! pg-resource: PostgreSQL tables as paginated, filterable, searchable REST resources.

pub mod config;
pub mod error;
pub mod pagination;
pub mod policy;
pub mod response;
pub mod sql;
pub mod state;
pub mod store;
pub mod service;
pub mod handlers;
pub mod routes;

pub use config::{load_from_file, resolve, ResourceConfig, ResourceDefinition, Settings};
pub use error::{AppError, ConfigError};
pub use pagination::{LinkBuilder, Window};
pub use policy::FieldPolicy;
pub use response::{Created, ListEnvelope, PageMeta};
pub use routes::{common_routes, common_routes_with_ready, resource_routes};
pub use service::{ListRequest, NoHooks, Payload, Resource, ResourceHooks};
pub use sql::Conditions;
pub use state::{AppState, ResourceRegistry};
pub use store::{Cursor, PgStorage, Row, Storage, StorageError};
