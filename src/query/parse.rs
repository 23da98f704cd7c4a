use bson::Bson;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::errors::QueryError;

use super::types::{CmpOp, Filter, ID_FIELD, MAX_IN_SET, Projection, SortSpec};

/// Keys that shape the output and never act as filters.
pub const SHAPING_KEYS: [&str; 4] = ["select", "sort", "page", "limit"];

// `field`, `field[op]`, `field[sub][op]`, ...
static FILTER_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<field>[^\[\]]+)(?P<rest>(?:\[[^\[\]]+\])*)$").expect("static regex")
});
static BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(?P<seg>[^\[\]]+)\]").expect("static regex"));

/// The decoded query-string of one request.
///
/// Keys are kept in sorted order so that translating the same request twice yields
/// the same filter, term for term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawQuery(BTreeMap<String, String>);

impl RawQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Later pairs with the same key replace earlier ones.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs.into_iter().collect()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Pairs that are not shaping keys, in key order.
    pub fn filter_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(k, _)| !is_shaping_key(k))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawQuery {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[must_use]
pub fn is_shaping_key(key: &str) -> bool {
    SHAPING_KEYS.contains(&key)
}

/// Splits a filter key into a document path and an operator.
///
/// A trailing bracket segment that is exactly one of `gt|gte|lt|lte|in` becomes the
/// operator; any other bracket segment is a nested field, so `location[city]` reads
/// `location.city` and `title[forgotten]` reads `title.forgotten`. Keys that do not
/// follow the bracket grammar are taken verbatim as the path.
#[must_use]
pub fn parse_filter_key(key: &str) -> (String, CmpOp) {
    let Some(caps) = FILTER_KEY.captures(key) else {
        return (key.to_string(), CmpOp::Eq);
    };
    let mut segments: Vec<&str> = vec![caps.name("field").map_or(key, |m| m.as_str())];
    let rest = caps.name("rest").map_or("", |m| m.as_str());
    segments.extend(BRACKET.captures_iter(rest).filter_map(|c| c.name("seg")).map(|m| m.as_str()));

    let op = match segments.last().and_then(|s| CmpOp::from_token(s)) {
        Some(op) if segments.len() > 1 => {
            segments.pop();
            op
        }
        _ => CmpOp::Eq,
    };
    (segments.join("."), op)
}

/// Types a raw query-string value: integer, float, boolean, `null`, RFC 3339
/// timestamp, otherwise string.
#[must_use]
pub fn coerce_value(raw: &str) -> Bson {
    match raw {
        "true" => return Bson::Boolean(true),
        "false" => return Bson::Boolean(false),
        "null" => return Bson::Null,
        _ => {}
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Bson::Int64(i);
    }
    if let Ok(f) = raw.parse::<f64>()
        && f.is_finite()
    {
        return Bson::Double(f);
    }
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Bson::DateTime(bson::DateTime::from_millis(ts.timestamp_millis()));
    }
    Bson::String(raw.to_string())
}

/// Builds the filter for one `key=value` pair.
#[must_use]
pub fn parse_filter_pair(key: &str, value: &str) -> Filter {
    let (path, op) = parse_filter_key(key);
    let typed = if op == CmpOp::In {
        Bson::Array(in_values(value).map(coerce_value).collect())
    } else {
        coerce_value(value)
    };
    Filter::Cmp { path, op, value: typed, raw: Some(value.to_string()) }
}

/// Candidates of an `in` value: comma-separated, trimmed, empty pieces dropped.
pub(crate) fn in_values(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).take(MAX_IN_SET)
}

/// Builds the conjunction of every non-shaping pair in `raw`.
#[must_use]
pub fn parse_filter(raw: &RawQuery) -> Filter {
    Filter::and(raw.filter_pairs().map(|(k, v)| parse_filter_pair(k, v)).collect())
}

fn split_fields(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Parses `select`. `name,description` includes; `-description,-photo` excludes.
/// `-_id` may accompany inclusions to drop the id from the included fields.
///
/// # Errors
/// Returns `MalformedShapingParameter` when inclusion and exclusion are mixed.
pub fn parse_select(value: &str) -> Result<Option<Projection>, QueryError> {
    let mut include = Vec::new();
    let mut exclude = Vec::new();
    for f in split_fields(value) {
        match f.strip_prefix('-') {
            Some(rest) if !rest.is_empty() => exclude.push(rest.to_string()),
            Some(_) => {}
            None => include.push(f.to_string()),
        }
    }
    if !include.is_empty() && exclude.iter().any(|f| f == ID_FIELD) {
        exclude.retain(|f| f != ID_FIELD);
        if exclude.is_empty() {
            include.retain(|f| f != ID_FIELD);
            return Ok(Some(Projection::Include { fields: include, keep_id: false }));
        }
    }
    match (include.is_empty(), exclude.is_empty()) {
        (true, true) => Ok(None),
        (false, true) => Ok(Some(Projection::Include { fields: include, keep_id: true })),
        (true, false) => Ok(Some(Projection::Exclude(exclude))),
        (false, false) => {
            Err(QueryError::shaping("select", "cannot mix included and excluded fields"))
        }
    }
}

/// Parses `sort`: comma-separated fields, `-` prefix for descending.
#[must_use]
pub fn parse_sort(value: &str) -> Vec<SortSpec> {
    split_fields(value)
        .filter_map(|f| match f.strip_prefix('-') {
            Some("") => None,
            Some(rest) => Some(SortSpec::desc(rest)),
            None => Some(SortSpec::asc(f)),
        })
        .collect()
}
