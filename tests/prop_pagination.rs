use campquery::query::{CmpOp, PageState, RawQuery, ResultsOptions, parse_filter_key, translate};
use proptest::prelude::*;

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 256,
        .. proptest::test_runner::Config::default()
    })]
    #[test]
    fn prop_page_state_invariants(page in any::<i64>(), limit in any::<i64>(), default_limit in 1u64..500) {
        let p = page.to_string();
        let l = limit.to_string();
        let st = PageState::from_raw(Some(&p), Some(&l), default_limit, 1000);
        prop_assert!(st.page >= 1);
        prop_assert!(st.limit >= 1 && st.limit <= 1000);
        prop_assert_eq!(st.offset, (st.page - 1).saturating_mul(st.limit));
        if limit <= 0 {
            prop_assert_eq!(st.limit, default_limit);
        }
    }

    #[test]
    fn prop_cursors_follow_offset_and_total(page in 1u64..200, limit in 1u64..100, total in 0u64..10_000) {
        let st = PageState::new(page, limit);
        let cur = st.cursors(total);
        prop_assert_eq!(cur.prev.is_some(), page > 1);
        prop_assert_eq!(cur.next.is_some(), st.offset + limit < total);
        if let Some(n) = cur.next {
            prop_assert_eq!((n.page, n.limit), (page + 1, limit));
        }
        if let Some(p) = cur.prev {
            prop_assert_eq!((p.page, p.limit), (page - 1, limit));
        }
    }

    #[test]
    fn prop_operator_tokens_only_as_whole_segments(field in "[a-z]{1,12}", seg in "[a-z]{1,8}") {
        let (path, op) = parse_filter_key(&format!("{field}[{seg}]"));
        match seg.as_str() {
            "gt" | "gte" | "lt" | "lte" | "in" => {
                prop_assert_eq!(&path, &field);
                prop_assert_ne!(op, CmpOp::Eq);
            }
            _ => {
                prop_assert_eq!(path, format!("{field}.{seg}"));
                prop_assert_eq!(op, CmpOp::Eq);
            }
        }
        // a bare key is always an equality on itself, whatever it contains
        let (path, op) = parse_filter_key(&field);
        prop_assert_eq!(path, field);
        prop_assert_eq!(op, CmpOp::Eq);
    }

    #[test]
    fn prop_translate_is_deterministic(pairs in proptest::collection::vec(("[a-z]{1,6}(\\[(gt|lte|in|x)\\])?", "[a-z0-9,]{0,8}"), 0..8)) {
        let raw = RawQuery::from_pairs(pairs);
        let opts = ResultsOptions::default();
        let a = translate(&raw, &opts).unwrap();
        let b = translate(&raw, &opts).unwrap();
        prop_assert_eq!(a.filter.to_document().to_string(), b.filter.to_document().to_string());
        prop_assert_eq!(a, b);
    }
}
