use std::sync::Arc;

use crate::config::ResultsConfig;
use crate::errors::QueryError;
use crate::query::{Order, Projection, ResultsOptions, translate};
use crate::repository::MemoryStore;
use crate::resources::Resource;
use crate::results::advanced_results;

use super::command::Command;
use super::util::raw_query;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputMode {
    Pretty,
    Compact,
}

fn render(value: &serde_json::Value, mode: OutputMode) -> Result<String, QueryError> {
    Ok(match mode {
        OutputMode::Pretty => serde_json::to_string_pretty(value)?,
        OutputMode::Compact => serde_json::to_string(value)?,
    })
}

/// Runs a command and returns what should be printed.
///
/// # Errors
/// Fixture, translation and repository errors are returned unmodified.
pub async fn run(cmd: Command, cfg: &ResultsConfig, mode: OutputMode) -> Result<String, QueryError> {
    match cmd {
        Command::Query { data, resource, params } => {
            let text = std::fs::read_to_string(&data)?;
            let store = Arc::new(MemoryStore::from_json(serde_json::from_str(&text)?)?);
            log::info!(
                "loaded {} collections from {}",
                store.collection_names().len(),
                data.display()
            );
            let repo = store.repository(resource.collection());
            let opts = ResultsOptions::for_resource(resource, cfg);
            let results = advanced_results(&raw_query(&params)?, &repo, &opts).await?;
            render(&results.to_json(), mode)
        }
        Command::Explain { resource, params } => {
            let opts = ResultsOptions::for_resource(resource, cfg);
            let t = translate(&raw_query(&params)?, &opts)?;
            let projection = match &t.find.projection {
                None => serde_json::Value::Null,
                Some(Projection::Include { fields, keep_id }) => {
                    serde_json::json!({"include": fields, "keep_id": keep_id})
                }
                Some(Projection::Exclude(f)) => serde_json::json!({"exclude": f}),
            };
            let sort: Vec<String> = t
                .find
                .sort
                .iter()
                .map(|s| match s.order {
                    Order::Asc => s.field.clone(),
                    Order::Desc => format!("-{}", s.field),
                })
                .collect();
            let populate: Vec<&str> = t.find.populate.iter().map(|p| p.path.as_str()).collect();
            let out = serde_json::json!({
                "collection": resource.collection(),
                "filter": bson::Bson::Document(t.filter.to_document()).into_relaxed_extjson(),
                "projection": projection,
                "sort": sort,
                "skip": t.find.skip,
                "limit": t.find.limit,
                "populate": populate,
                "page": t.page,
            });
            render(&out, mode)
        }
        Command::Resources => {
            let list: Vec<serde_json::Value> = Resource::ALL
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "name": r.collection(),
                        "default_limit": cfg.limit_for(*r),
                        "fields": r.known_fields(),
                        "populate": r.default_populate().iter().map(|p| p.path.clone()).collect::<Vec<_>>(),
                    })
                })
                .collect();
            render(&serde_json::Value::Array(list), mode)
        }
    }
}
