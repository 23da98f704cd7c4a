use bson::{Bson, Document as BsonDocument};
use serde::{Deserialize, Serialize};

// Safety limits to prevent resource abuse
pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub(crate) const MAX_IN_SET: usize = 1000;
pub(crate) const MAX_SORT_FIELDS: usize = 8;
pub(crate) const MAX_PROJECTION_FIELDS: usize = 64;

/// Field every stored document carries; used as the final sort tie-breaker.
pub const ID_FIELD: &str = "_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: Order,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Desc }
    }
}

/// Comparison operators a filter key may carry.
///
/// `Eq` is implicit (a bare `field=value` pair); the others are spelled as
/// bracketed whole-word tokens, e.g. `averageCost[lte]=10000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl CmpOp {
    /// Recognizes an operator token. Only an exact, whole-word match counts.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "in" => Some(Self::In),
            _ => None,
        }
    }

    /// Canonical operator form understood by document stores (`$gte`, `$in`, ...).
    #[must_use]
    pub const fn canonical(self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::In => "$in",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    True,
    And(Vec<Filter>),
    /// For `CmpOp::In` the value is a `Bson::Array` of candidates.
    ///
    /// `raw` is the query-string text `value` was coerced from. When present, the
    /// evaluator re-reads it in the type of the stored field (string, object id, date).
    Cmp { path: String, op: CmpOp, value: Bson, raw: Option<String> },
}

impl Filter {
    /// A comparison against an already typed value.
    pub fn cmp(path: impl Into<String>, op: CmpOp, value: impl Into<Bson>) -> Self {
        Self::Cmp { path: path.into(), op, value: value.into(), raw: None }
    }

    /// Renders the filter in the canonical operator encoding:
    /// `{ "averageCost": { "$lte": 10000 } }`.
    ///
    /// Terms that cannot share a path entry without hiding one another (two equalities,
    /// or the same operator twice) go to a top-level `$and` array.
    #[must_use]
    pub fn to_document(&self) -> BsonDocument {
        let mut out = BsonDocument::new();
        self.write_into(&mut out);
        out
    }

    fn write_into(&self, out: &mut BsonDocument) {
        match self {
            Self::True => {}
            Self::And(fs) => {
                for f in fs {
                    f.write_into(out);
                }
            }
            Self::Cmp { path, op, value, .. } => {
                let key = op.canonical();
                let conflict = match out.get_mut(path.as_str()) {
                    None => {
                        out.insert(path.clone(), term_value(*op, value));
                        false
                    }
                    Some(Bson::Document(ops)) => {
                        if ops.contains_key(key) {
                            true
                        } else {
                            ops.insert(key, value.clone());
                            false
                        }
                    }
                    Some(_) if *op == CmpOp::Eq => true,
                    Some(literal) => {
                        let mut ops = BsonDocument::new();
                        ops.insert(CmpOp::Eq.canonical(), std::mem::replace(literal, Bson::Null));
                        ops.insert(key, value.clone());
                        *literal = Bson::Document(ops);
                        false
                    }
                };
                if conflict {
                    let mut term = BsonDocument::new();
                    term.insert(path.clone(), term_value(*op, value));
                    match out.get_mut("$and") {
                        Some(Bson::Array(terms)) => terms.push(Bson::Document(term)),
                        _ => {
                            out.insert("$and", vec![Bson::Document(term)]);
                        }
                    }
                }
            }
        }
    }

    /// Flattens nested `And` groups and drops `True` terms.
    #[must_use]
    pub fn and(filters: Vec<Self>) -> Self {
        let mut flat = Vec::with_capacity(filters.len());
        for f in filters {
            match f {
                Self::True => {}
                Self::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Self::True,
            1 => flat.remove(0),
            _ => Self::And(flat),
        }
    }
}

// Equality renders as the bare value, except a document value, which would read as
// an operator document.
fn term_value(op: CmpOp, value: &Bson) -> Bson {
    if op == CmpOp::Eq && !matches!(value, Bson::Document(_)) {
        return value.clone();
    }
    let mut ops = BsonDocument::new();
    ops.insert(op.canonical(), value.clone());
    Bson::Document(ops)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    /// Only these fields; `_id` as well unless `keep_id` is false (`select=-_id,name`).
    Include { fields: Vec<String>, keep_id: bool },
    Exclude(Vec<String>),
}

impl Projection {
    /// Inclusion that keeps `_id`.
    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Include { fields: fields.into_iter().map(Into::into).collect(), keep_id: true }
    }

    /// Field names the projection mentions, `_id` excluded.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        match self {
            Self::Include { fields, .. } | Self::Exclude(fields) => fields,
        }
    }
}

/// How a populated path resolves to documents in another collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    /// The field at `path` holds the `_id` of one document in `collection`.
    Ref { collection: String },
    /// Documents in `collection` whose `foreign_field` equals this document's `_id`.
    Virtual { collection: String, foreign_field: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulateSpec {
    pub path: String,
    pub relation: Relation,
    pub select: Option<Vec<String>>,
}

impl PopulateSpec {
    pub fn reference(path: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            relation: Relation::Ref { collection: collection.into() },
            select: None,
        }
    }

    pub fn virtual_field(
        path: impl Into<String>,
        collection: impl Into<String>,
        foreign_field: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            relation: Relation::Virtual {
                collection: collection.into(),
                foreign_field: foreign_field.into(),
            },
            select: None,
        }
    }

    #[must_use]
    pub fn with_select<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { select: Some(fields.into_iter().map(Into::into).collect()), ..self }
    }
}

/// Immutable description of one read against a repository.
///
/// Every builder method consumes the descriptor and returns a new one; nothing is
/// executed until the value is handed to [`crate::repository::Repository::fetch`].
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    pub filter: Filter,
    pub projection: Option<Projection>,
    pub sort: Vec<SortSpec>,
    pub skip: usize,
    pub limit: Option<usize>,
    pub populate: Vec<PopulateSpec>,
}

impl FindQuery {
    #[must_use]
    pub fn new(filter: Filter) -> Self {
        Self { filter, projection: None, sort: Vec::new(), skip: 0, limit: None, populate: Vec::new() }
    }

    #[must_use]
    pub fn select(self, projection: Option<Projection>) -> Self {
        Self { projection, ..self }
    }

    #[must_use]
    pub fn sort(self, sort: Vec<SortSpec>) -> Self {
        Self { sort, ..self }
    }

    #[must_use]
    pub fn skip(self, skip: usize) -> Self {
        Self { skip, ..self }
    }

    #[must_use]
    pub fn limit(self, limit: usize) -> Self {
        Self { limit: Some(limit), ..self }
    }

    #[must_use]
    pub fn populate(self, populate: Vec<PopulateSpec>) -> Self {
        Self { populate, ..self }
    }
}
