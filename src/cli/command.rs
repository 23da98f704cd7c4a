use std::path::PathBuf;

use crate::resources::Resource;

pub enum Command {
    /// Run one listing request against a JSON fixture of collections.
    Query {
        data: PathBuf,
        resource: Resource,
        /// `key=value` query-string pairs, already decoded.
        params: Vec<String>,
    },
    /// Show how a listing request translates, without reading any data.
    Explain {
        resource: Resource,
        params: Vec<String>,
    },
    /// List the resources with their listing defaults.
    Resources,
}
