//! URI and JSON Pointer resolution plus the canonical schema map used by `schemata`.
mod error;
mod graph;
pub mod pointer;
mod subresources;
pub mod uri;

pub use error::Error;
pub use fluent_uri::Uri;
pub use graph::{NodeId, Resolved, SchemaGraph};
pub use subresources::{subresources_of, Subresource, SubresourceKey};
pub use uri::{AnchorScope, Fragment, ResolvedReference};
