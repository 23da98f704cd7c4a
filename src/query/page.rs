use bson::{Bson, Document as BsonDocument};
use serde::{Deserialize, Serialize};

use crate::utils::num::parse_int_prefix;

/// Page and limit of one request, with the derived offset.
///
/// Invariants: `page >= 1`, `limit >= 1`, `offset == (page - 1) * limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
}

impl PageState {
    /// Builds the state from raw `page`/`limit` strings.
    ///
    /// Values are read as leading base-10 integers. Absent, non-numeric, zero or negative
    /// values fall back to page 1 and `default_limit`; a limit above `max_limit` is capped.
    #[must_use]
    pub fn from_raw(
        page: Option<&str>,
        limit: Option<&str>,
        default_limit: u64,
        max_limit: u64,
    ) -> Self {
        let page = positive(page).unwrap_or(1);
        let default_limit = default_limit.max(1);
        let limit = positive(limit).unwrap_or(default_limit).min(max_limit.max(1));
        Self::new(page, limit)
    }

    /// `page` and `limit` are clamped to at least 1.
    #[must_use]
    pub fn new(page: u64, limit: u64) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        Self { page, limit, offset: (page - 1).saturating_mul(limit) }
    }

    /// Cursors to the neighbouring pages given the total number of matches.
    #[must_use]
    pub fn cursors(&self, total: u64) -> Pagination {
        let next = (self.offset.saturating_add(self.limit) < total)
            .then(|| PageCursor { page: self.page + 1, limit: self.limit });
        let prev =
            (self.offset > 0).then(|| PageCursor { page: self.page - 1, limit: self.limit });
        Pagination { next, prev }
    }
}

fn positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(parse_int_prefix).and_then(|n| u64::try_from(n).ok()).filter(|n| *n > 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<PageCursor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageCursor>,
}

/// The result envelope handed back to route handlers.
///
/// `count` is the number of items on this page, not the number of matches overall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedResults<T> {
    pub success: bool,
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<T>,
}

impl<T> AdvancedResults<T> {
    #[must_use]
    pub fn new(data: Vec<T>, pagination: Pagination) -> Self {
        Self { success: true, count: data.len(), pagination, data }
    }
}

impl AdvancedResults<BsonDocument> {
    /// Renders the envelope as JSON, documents in relaxed extended JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let data: Vec<serde_json::Value> =
            self.data.iter().map(|d| Bson::Document(d.clone()).into_relaxed_extjson()).collect();
        let mut out = serde_json::json!({
            "success": self.success,
            "count": self.count,
            "pagination": {},
            "data": data,
        });
        if let Ok(p) = serde_json::to_value(&self.pagination) {
            out["pagination"] = p;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_fallbacks() {
        let p = PageState::from_raw(None, None, 25, 1000);
        assert_eq!(p, PageState { page: 1, limit: 25, offset: 0 });
        let p = PageState::from_raw(Some("abc"), Some("x"), 100, 1000);
        assert_eq!(p, PageState { page: 1, limit: 100, offset: 0 });
        let p = PageState::from_raw(Some("0"), Some("-5"), 25, 1000);
        assert_eq!(p, PageState { page: 1, limit: 25, offset: 0 });
        let p = PageState::from_raw(Some("3xyz"), Some("10.7"), 25, 1000);
        assert_eq!(p, PageState { page: 3, limit: 10, offset: 20 });
    }

    #[test]
    fn limit_is_capped() {
        let p = PageState::from_raw(Some("2"), Some("5000"), 25, 1000);
        assert_eq!(p.limit, 1000);
        assert_eq!(p.offset, 1000);
    }

    #[test]
    fn cursors_middle_first_last() {
        let mid = PageState::new(2, 10).cursors(25);
        assert_eq!(mid.prev, Some(PageCursor { page: 1, limit: 10 }));
        assert_eq!(mid.next, Some(PageCursor { page: 3, limit: 10 }));

        let first = PageState::new(1, 10).cursors(25);
        assert_eq!(first.prev, None);
        assert!(first.next.is_some());

        let last = PageState::new(3, 10).cursors(25);
        assert_eq!(last.next, None);
        assert!(last.prev.is_some());

        let exact = PageState::new(2, 10).cursors(20);
        assert_eq!(exact.next, None);
    }

    #[test]
    fn envelope_serialization_omits_absent_cursors() {
        let env: AdvancedResults<u32> = AdvancedResults::new(vec![1, 2], Pagination::default());
        let s = serde_json::to_string(&env).unwrap();
        assert_eq!(s, r#"{"success":true,"count":2,"pagination":{},"data":[1,2]}"#);
    }

    #[test]
    fn bson_envelope_to_json() {
        let env = AdvancedResults::new(
            vec![bson::doc! {"name": "Devworks", "averageCost": 10_000i64}],
            PageState::new(1, 1).cursors(2),
        );
        let v = env.to_json();
        assert_eq!(v["count"], 1);
        assert_eq!(v["pagination"]["next"]["page"], 2);
        assert_eq!(v["data"][0]["name"], "Devworks");
        assert_eq!(v["data"][0]["averageCost"], 10_000);
    }
}
