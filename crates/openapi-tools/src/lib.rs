//! `OpenAPI` -> MCP tool proxying.
//!
//! [`catalog::Catalog`] turns one document into tool descriptors, [`router`] shapes a call's
//! flat arguments into an HTTP request (with [`upload`] for multipart files),
//! [`executor::RequestExecutor`] sends it, and [`dispatcher::ToolDispatcher`] ties them together
//! behind list/call.

pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod loader;
pub mod resolver;
pub mod router;
pub mod schema;
pub mod semantics;
pub mod upload;

pub use catalog::{Catalog, CatalogOptions, ToolDescriptor};
pub use config::ProxyConfig;
pub use dispatcher::ToolDispatcher;
pub use error::{HttpError, OpenApiToolsError, Result};
pub use executor::RequestExecutor;
