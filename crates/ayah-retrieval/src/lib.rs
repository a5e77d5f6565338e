//! Query-time pipeline: resource cache, retriever, context linker and the
//! search service that ties them together.

pub mod cache;
pub mod context;
pub mod lang;
pub mod retriever;
pub mod service;

pub use cache::{IndexLoader, LanceIndexLoader, ResourceCache};
pub use context::{ContextLinker, ContextParams};
pub use lang::{FixedDetector, WhatlangDetector};
pub use retriever::{ContentOptions, Retriever};
pub use service::SearchService;
