use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument, oid::ObjectId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::QueryError;
use crate::query::eval::{apply_projection, compare_docs, eval_filter, get_path};
use crate::query::{CmpOp, Filter, FindQuery, ID_FIELD, PopulateSpec, Projection, Relation};
use crate::utils::num::usize_to_u64;

use super::Repository;

/// Named collections of documents held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<BsonDocument>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `{ "<collection>": [ {..}, .. ], .. }`. Documents may use extended JSON
    /// (`{"$oid": ..}`, `{"$date": ..}`); missing `_id`/`createdAt` are filled in.
    ///
    /// # Errors
    /// Returns `InvalidData` when the value is not an object of arrays of objects.
    pub fn from_json(value: serde_json::Value) -> Result<Self, QueryError> {
        let serde_json::Value::Object(map) = value else {
            return Err(QueryError::InvalidData("expected an object of collections".into()));
        };
        let store = Self::new();
        for (name, docs) in map {
            let serde_json::Value::Array(items) = docs else {
                return Err(QueryError::InvalidData(format!("collection `{name}` is not an array")));
            };
            for item in items {
                let bson = Bson::try_from(item)
                    .map_err(|e| QueryError::InvalidData(format!("{name}: {e}")))?;
                let Bson::Document(doc) = bson else {
                    return Err(QueryError::InvalidData(format!(
                        "{name}: every entry must be an object"
                    )));
                };
                store.insert(&name, doc);
            }
        }
        Ok(store)
    }

    /// Stores `doc`, assigning an `_id` and `createdAt` when absent. Returns the `_id`.
    pub fn insert(&self, collection: &str, mut doc: BsonDocument) -> Bson {
        if !doc.contains_key(ID_FIELD) {
            doc.insert(ID_FIELD, ObjectId::new());
        }
        if !doc.contains_key("createdAt") {
            doc.insert("createdAt", bson::DateTime::now());
        }
        let id = doc.get(ID_FIELD).cloned().unwrap_or(Bson::Null);
        self.collections.write().entry(collection.to_string()).or_default().push(doc);
        id
    }

    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.collections.read().get(collection).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Repository view over one collection of a shared store.
    #[must_use]
    pub fn repository(self: &Arc<Self>, collection: &str) -> MemoryRepository {
        MemoryRepository { store: Arc::clone(self), collection: collection.to_string() }
    }

    /// Filter, sort, skip/limit, project, then populate.
    #[must_use]
    pub fn find(&self, collection: &str, query: &FindQuery) -> Vec<BsonDocument> {
        let mut page: Vec<BsonDocument> = {
            let guard = self.collections.read();
            let Some(all) = guard.get(collection) else {
                return Vec::new();
            };
            let mut hits: Vec<&BsonDocument> =
                all.iter().filter(|d| eval_filter(d, &query.filter)).collect();
            if !query.sort.is_empty() {
                hits.sort_by(|a, b| compare_docs(a, b, &query.sort));
            }
            let limit = query.limit.unwrap_or(usize::MAX);
            hits.into_iter()
                .skip(query.skip)
                .take(limit)
                .map(|d| match &query.projection {
                    Some(p) => apply_projection(d, p),
                    None => d.clone(),
                })
                .collect()
        };
        for spec in &query.populate {
            self.populate(&mut page, spec);
        }
        page
    }

    #[must_use]
    pub fn count(&self, collection: &str, filter: &Filter) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, |all| all.iter().filter(|d| eval_filter(d, filter)).count())
    }

    fn populate(&self, docs: &mut [BsonDocument], spec: &PopulateSpec) {
        let projection = spec.select.clone().map(Projection::include);
        let lookup = |collection: &str, filter: &Filter| -> Vec<BsonDocument> {
            let guard = self.collections.read();
            guard.get(collection).map_or_else(Vec::new, |all| {
                all.iter()
                    .filter(|d| eval_filter(d, filter))
                    .map(|d| projection.as_ref().map_or_else(|| d.clone(), |p| apply_projection(d, p)))
                    .collect()
            })
        };
        for doc in docs.iter_mut() {
            match &spec.relation {
                Relation::Ref { collection } => {
                    let Some(reference) = get_path(doc, &spec.path).cloned() else {
                        continue;
                    };
                    let resolve = |id: Bson| {
                        let f = Filter::cmp(ID_FIELD, CmpOp::Eq, id);
                        lookup(collection, &f).into_iter().next().map_or(Bson::Null, Bson::Document)
                    };
                    let populated = match reference {
                        Bson::Array(ids) => Bson::Array(ids.into_iter().map(resolve).collect()),
                        id => resolve(id),
                    };
                    doc.insert(spec.path.clone(), populated);
                }
                Relation::Virtual { collection, foreign_field } => {
                    let Some(id) = doc.get(ID_FIELD).cloned() else {
                        continue;
                    };
                    let f = Filter::cmp(foreign_field.clone(), CmpOp::Eq, id);
                    let related = lookup(collection, &f).into_iter().map(Bson::Document).collect();
                    doc.insert(spec.path.clone(), Bson::Array(related));
                }
            }
        }
    }
}

/// [`Repository`] over one collection of a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryRepository {
    store: Arc<MemoryStore>,
    collection: String,
}

#[async_trait]
impl Repository for MemoryRepository {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn fetch(&self, query: &FindQuery) -> Result<Vec<BsonDocument>, QueryError> {
        let docs = self.store.find(&self.collection, query);
        log::debug!("memory fetch collection={} returned={}", self.collection, docs.len());
        Ok(docs)
    }

    async fn count(&self, filter: &Filter) -> Result<u64, QueryError> {
        Ok(usize_to_u64(self.store.count(&self.collection, filter)))
    }
}
