use bson::{Bson, doc};
use campquery::query::{
    CmpOp, Filter, PageState, Projection, RawQuery, ResultsOptions, SortSpec, parse_filter_key, translate,
};
use campquery::{QueryError, Resource, ResultsConfig};

#[test]
fn operators_become_canonical_comparisons() {
    let raw = RawQuery::from_pairs([("averageCost[lte]", "10000"), ("rating[gt]", "7")]);
    let t = translate(&raw, &ResultsOptions::default()).unwrap();
    assert_eq!(
        t.filter.to_document(),
        doc! { "averageCost": { "$lte": 10000_i64 }, "rating": { "$gt": 7_i64 } }
    );
    assert_eq!(t.find.filter, t.filter);
}

#[test]
fn in_operator_splits_the_value() {
    let raw = RawQuery::from_pairs([("careers[in]", "Web Development,UI/UX")]);
    let t = translate(&raw, &ResultsOptions::default()).unwrap();
    match &t.filter {
        Filter::Cmp { path, op: CmpOp::In, value, .. } => {
            assert_eq!(path, "careers");
            assert_eq!(value, &Bson::Array(vec!["Web Development".into(), "UI/UX".into()]));
        }
        other => panic!("expected an `in` comparison, got {other:?}"),
    }
}

#[test]
fn operator_words_are_matched_whole() {
    // `forgotten` contains `gt`, `ingredients` contains `in`; neither is an operator
    assert_eq!(parse_filter_key("title[forgotten]"), ("title.forgotten".into(), CmpOp::Eq));
    assert_eq!(parse_filter_key("ingredients"), ("ingredients".into(), CmpOp::Eq));
    assert_eq!(parse_filter_key("location[city]"), ("location.city".into(), CmpOp::Eq));
    assert_eq!(parse_filter_key("location[zip][gte]"), ("location.zip".into(), CmpOp::Gte));

    let raw = RawQuery::from_pairs([("title", "lt is forgotten")]);
    let t = translate(&raw, &ResultsOptions::default()).unwrap();
    assert_eq!(t.filter.to_document(), doc! { "title": "lt is forgotten" });
}

#[test]
fn shaping_keys_never_filter() {
    let raw = RawQuery::from_pairs([("select", "name"), ("sort", "name"), ("page", "3"), ("limit", "5")]);
    let t = translate(&raw, &ResultsOptions::default()).unwrap();
    assert_eq!(t.filter, Filter::True);
    assert_eq!(t.find.projection, Some(Projection::include(["name"])));
    assert_eq!(t.find.sort, vec![SortSpec::asc("name"), SortSpec::asc("_id")]);
    assert_eq!(t.page, PageState { page: 3, limit: 5, offset: 10 });
}

#[test]
fn id_can_be_dropped_from_an_inclusion() {
    let raw = RawQuery::from_pairs([("select", "-_id,name")]);
    let t = translate(&raw, &ResultsOptions::default()).unwrap();
    assert_eq!(t.find.projection, Some(Projection::Include { fields: vec!["name".into()], keep_id: false }));
}

#[test]
fn equality_and_operator_on_one_path_both_render() {
    let raw = RawQuery::from_pairs([("a.b[gt]", "1"), ("a[b]", "2")]);
    let t = translate(&raw, &ResultsOptions::default()).unwrap();
    assert_eq!(t.filter.to_document(), doc! { "a.b": { "$gt": 1_i64, "$eq": 2_i64 } });
}

#[test]
fn exclusion_select() {
    let raw = RawQuery::from_pairs([("select", "-description,-photo")]);
    let t = translate(&raw, &ResultsOptions::default()).unwrap();
    assert_eq!(
        t.find.projection,
        Some(Projection::Exclude(vec!["description".into(), "photo".into()]))
    );
}

#[test]
fn mixed_select_is_rejected() {
    let raw = RawQuery::from_pairs([("select", "name,-description")]);
    let err = translate(&raw, &ResultsOptions::default()).unwrap_err();
    assert!(matches!(err, QueryError::MalformedShapingParameter { ref param, .. } if param == "select"));
}

#[test]
fn strict_fields_reject_unknown_names() {
    let cfg = ResultsConfig { strict_fields: true, ..ResultsConfig::default() };
    let opts = ResultsOptions::for_resource(Resource::Bootcamps, &cfg);

    let ok = RawQuery::from_pairs([("select", "name,location.city"), ("sort", "-averageCost")]);
    assert!(translate(&ok, &opts).is_ok());

    let bad_sort = RawQuery::from_pairs([("sort", "nope")]);
    let err = translate(&bad_sort, &opts).unwrap_err();
    assert!(matches!(err, QueryError::MalformedShapingParameter { ref param, .. } if param == "sort"));

    let bad_select = RawQuery::from_pairs([("select", "secret")]);
    assert!(translate(&bad_select, &opts).is_err());
}

#[test]
fn page_and_limit_are_lenient() {
    let opts = ResultsOptions::default();
    let cases = [
        (Some("2abc"), Some("10"), (2, 10)),
        (Some("abc"), Some("x"), (1, 25)),
        (Some("0"), Some("-5"), (1, 25)),
        (Some("-3"), Some("0"), (1, 25)),
        (None, Some("5000"), (1, 1000)),
        (Some(" 4"), Some("3.9"), (4, 3)),
    ];
    for (page, limit, (p, l)) in cases {
        let mut raw = RawQuery::new();
        if let Some(v) = page {
            raw.insert("page", v);
        }
        if let Some(v) = limit {
            raw.insert("limit", v);
        }
        let t = translate(&raw, &opts).unwrap();
        assert_eq!((t.page.page, t.page.limit), (p, l), "page={page:?} limit={limit:?}");
        assert_eq!(t.page.offset, (p - 1) * l);
        assert_eq!(t.find.skip, usize::try_from(t.page.offset).unwrap());
        assert_eq!(t.find.limit, Some(usize::try_from(l).unwrap()));
    }
}

#[test]
fn resource_defaults_flow_into_options() {
    let cfg = ResultsConfig::default();
    let bootcamps = ResultsOptions::for_resource(Resource::Bootcamps, &cfg);
    assert_eq!(bootcamps.default_limit, 25);
    assert_eq!(bootcamps.populate.len(), 1);
    assert_eq!(bootcamps.populate[0].path, "courses");

    let users = ResultsOptions::for_resource(Resource::Users, &cfg);
    assert!(users.populate.is_empty());
    assert!(users.hidden_fields.iter().any(|f| f == "password"));
    let t = translate(&RawQuery::new(), &users).unwrap();
    match t.find.projection {
        Some(Projection::Exclude(fields)) => assert!(fields.contains(&"password".to_string())),
        other => panic!("expected exclusion projection, got {other:?}"),
    }
}

#[test]
fn configured_default_sort_applies_when_sort_absent() {
    let cfg = ResultsConfig { default_sort: "name,-rating".into(), ..ResultsConfig::default() };
    let opts = ResultsOptions::for_resource(Resource::Reviews, &cfg);
    let t = translate(&RawQuery::new(), &opts).unwrap();
    assert_eq!(
        t.find.sort,
        vec![SortSpec::asc("name"), SortSpec::desc("rating"), SortSpec::asc("_id")]
    );
}

#[test]
fn translation_is_deterministic() {
    let raw = RawQuery::from_pairs([
        ("rating[gte]", "5"),
        ("averageCost[lt]", "9000"),
        ("housing", "true"),
        ("sort", "-rating"),
    ]);
    let opts = ResultsOptions::default();
    let a = translate(&raw, &opts).unwrap();
    let b = translate(&raw.clone(), &opts).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.filter.to_document().to_string(), b.filter.to_document().to_string());
}

#[test]
fn call_site_overrides() {
    let opts = ResultsOptions::default()
        .with_default_sort(vec![SortSpec::asc("name")])
        .with_default_limit(5)
        .with_known_fields(["_id", "name"]);
    let t = translate(&RawQuery::from_pairs([("page", "3")]), &opts).unwrap();
    assert_eq!(t.find.sort, vec![SortSpec::asc("name"), SortSpec::asc("_id")]);
    assert_eq!(t.page, PageState { page: 3, limit: 5, offset: 10 });
    assert!(translate(&RawQuery::from_pairs([("sort", "rating")]), &opts).is_err());
}
