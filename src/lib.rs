pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod iri;
pub mod logging;
pub mod metrics;
pub mod repository;
pub mod server;
pub mod storage;
pub mod templates;

pub use config::Config;
pub use error::{Result, UrlShareError};
pub use repository::{KeyEncoding, KeyFormat, Mapping, MappingRepository};
pub use storage::Store;
