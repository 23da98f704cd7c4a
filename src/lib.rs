//! Advanced results for the bootcamp directory: turns a listing request's query-string
//! into a filtered, projected, sorted and paginated read against a document
//! repository, and wraps the page in the directory's result envelope.
//!
//! ```no_run
//! use std::sync::Arc;
//! use campquery::{MemoryStore, RawQuery, Resource, ResultsConfig, ResultsOptions, advanced_results};
//!
//! # async fn demo() -> Result<(), campquery::QueryError> {
//! let store = Arc::new(MemoryStore::new());
//! let repo = store.repository(Resource::Bootcamps.collection());
//! let opts = ResultsOptions::for_resource(Resource::Bootcamps, &ResultsConfig::default());
//! let raw = RawQuery::from_pairs([("averageCost[lte]", "10000"), ("select", "name")]);
//! let page = advanced_results(&raw, &repo, &opts).await?;
//! println!("{}", page.to_json());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod query;
pub mod repository;
pub mod resources;
pub mod results;
pub mod utils;

pub use config::ResultsConfig;
pub use errors::QueryError;
pub use query::{AdvancedResults, RawQuery, ResultsOptions};
pub use repository::{MemoryRepository, MemoryStore, Repository};
pub use resources::Resource;
pub use results::advanced_results;
