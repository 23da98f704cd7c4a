use crate::config::ResultsConfig;
use crate::errors::QueryError;
use crate::resources::Resource;
use crate::utils::num::u64_to_usize_saturating;

use super::page::PageState;
use super::parse::{RawQuery, parse_filter, parse_filter_key, parse_select, parse_sort};
use super::types::{
    Filter, FindQuery, ID_FIELD, MAX_SORT_FIELDS, PopulateSpec, Projection, SortSpec,
};

/// Per-call-site shaping defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsOptions {
    pub populate: Vec<PopulateSpec>,
    pub default_sort: Vec<SortSpec>,
    pub default_limit: u64,
    pub max_limit: u64,
    /// When set, `select` and `sort` may only name these fields.
    pub known_fields: Option<Vec<String>>,
    pub hidden_fields: Vec<String>,
}

impl Default for ResultsOptions {
    fn default() -> Self {
        Self {
            populate: Vec::new(),
            default_sort: vec![SortSpec::desc("createdAt")],
            default_limit: 25,
            max_limit: 1000,
            known_fields: None,
            hidden_fields: Vec::new(),
        }
    }
}

impl ResultsOptions {
    #[must_use]
    pub fn for_resource(resource: Resource, cfg: &ResultsConfig) -> Self {
        let default_sort = parse_sort(&cfg.default_sort);
        let defaults = Self::default();
        Self {
            populate: resource.default_populate(),
            default_sort: if default_sort.is_empty() { defaults.default_sort } else { default_sort },
            default_limit: cfg.limit_for(resource),
            max_limit: cfg.max_limit,
            known_fields: cfg
                .strict_fields
                .then(|| resource.known_fields().iter().map(ToString::to_string).collect()),
            hidden_fields: resource.hidden_fields().iter().map(ToString::to_string).collect(),
        }
    }

    #[must_use]
    pub fn with_populate(self, populate: Vec<PopulateSpec>) -> Self {
        Self { populate, ..self }
    }

    #[must_use]
    pub fn with_default_sort(self, default_sort: Vec<SortSpec>) -> Self {
        Self { default_sort, ..self }
    }

    #[must_use]
    pub fn with_default_limit(self, default_limit: u64) -> Self {
        Self { default_limit, ..self }
    }

    #[must_use]
    pub fn with_known_fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { known_fields: Some(fields.into_iter().map(Into::into).collect()), ..self }
    }
}

/// A request translated into repository terms, ready to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedQuery {
    /// Filter for the total count; identical to `find.filter`.
    pub filter: Filter,
    pub find: FindQuery,
    pub page: PageState,
}

/// Translates a raw query into a filter, a find descriptor and a page state.
///
/// # Errors
/// Returns `MalformedShapingParameter` when `select` mixes inclusion and exclusion, when
/// a filter key or `sort` names a hidden field, or when `known_fields` is set and
/// `select`/`sort` names an undeclared field.
pub fn translate(raw: &RawQuery, opts: &ResultsOptions) -> Result<TranslatedQuery, QueryError> {
    let filter = parse_filter(raw);

    let projection = match raw.get("select") {
        Some(v) => parse_select(v)?,
        None => None,
    };
    let mut sort = raw.get("sort").map(parse_sort).unwrap_or_default();
    if sort.is_empty() {
        sort.clone_from(&opts.default_sort);
    }

    for (key, _) in raw.filter_pairs() {
        let (path, _) = parse_filter_key(key);
        check_visible(key, &path, &opts.hidden_fields)?;
    }
    for s in &sort {
        check_visible("sort", &s.field, &opts.hidden_fields)?;
    }

    if let Some(known) = &opts.known_fields {
        if let Some(p) = &projection {
            check_known("select", p.fields().iter().map(String::as_str), known)?;
        }
        check_known("sort", sort.iter().map(|s| s.field.as_str()), known)?;
    }

    let projection = hide_fields(projection, &opts.hidden_fields);
    let sort = with_tie_break(sort);
    let page = PageState::from_raw(raw.get("page"), raw.get("limit"), opts.default_limit, opts.max_limit);

    let find = FindQuery::new(filter.clone())
        .select(projection)
        .sort(sort)
        .skip(u64_to_usize_saturating(page.offset))
        .limit(u64_to_usize_saturating(page.limit))
        .populate(opts.populate.clone());

    Ok(TranslatedQuery { filter, find, page })
}

fn top_segment(path: &str) -> &str {
    path.split('.').next().unwrap_or(path)
}

/// Hidden fields may not appear in filters or sorts.
fn check_visible(param: &str, path: &str, hidden: &[String]) -> Result<(), QueryError> {
    let top = top_segment(path);
    if hidden.iter().any(|h| h == top) {
        return Err(QueryError::shaping(param, format!("field `{top}` cannot be filtered or sorted on")));
    }
    Ok(())
}

fn check_known<'a>(
    param: &str,
    fields: impl Iterator<Item = &'a str>,
    known: &[String],
) -> Result<(), QueryError> {
    for f in fields {
        let top = top_segment(f);
        if !known.iter().any(|k| k == top) {
            return Err(QueryError::shaping(param, format!("unknown field `{f}`")));
        }
    }
    Ok(())
}

fn hide_fields(projection: Option<Projection>, hidden: &[String]) -> Option<Projection> {
    if hidden.is_empty() {
        return projection;
    }
    match projection {
        None => Some(Projection::Exclude(hidden.to_vec())),
        Some(Projection::Include { mut fields, keep_id }) => {
            fields.retain(|f| !hidden.iter().any(|h| h == top_segment(f)));
            Some(Projection::Include { fields, keep_id })
        }
        Some(Projection::Exclude(mut fields)) => {
            for h in hidden {
                if !fields.contains(h) {
                    fields.push(h.clone());
                }
            }
            Some(Projection::Exclude(fields))
        }
    }
}

/// Appends `_id` ascending so equal sort keys always come back in the same order.
fn with_tie_break(mut sort: Vec<SortSpec>) -> Vec<SortSpec> {
    if sort.iter().any(|s| s.field == ID_FIELD) {
        sort.truncate(MAX_SORT_FIELDS);
        return sort;
    }
    if sort.len() >= MAX_SORT_FIELDS {
        log::warn!("sort spec too long: {} fields, keeping {}", sort.len(), MAX_SORT_FIELDS - 1);
        sort.truncate(MAX_SORT_FIELDS - 1);
    }
    sort.push(SortSpec::asc(ID_FIELD));
    sort
}
