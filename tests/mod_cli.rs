use campquery::ResultsConfig;
use campquery::cli::{Command, OutputMode, run};
use campquery::{QueryError, Resource};
use std::io::Write;

fn fixture() -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    let data = serde_json::json!({
        "bootcamps": [
            {"_id": {"$oid": "5d713995b721c3bb38c1f5d0"}, "name": "Devworks Bootcamp", "averageCost": 10000,
             "createdAt": {"$date": "2024-01-01T00:00:00Z"}},
            {"_id": {"$oid": "5d713a66ec8f2b88b8f830b8"}, "name": "ModernTech Bootcamp", "averageCost": 8000,
             "createdAt": {"$date": "2024-02-01T00:00:00Z"}},
            {"_id": {"$oid": "5d725a037b292f5f8ceff787"}, "name": "Codemasters", "averageCost": 12000,
             "createdAt": {"$date": "2024-03-01T00:00:00Z"}}
        ],
        "courses": [
            {"title": "Front End Web Development", "tuition": 8000, "bootcamp": {"$oid": "5d713995b721c3bb38c1f5d0"}}
        ]
    });
    write!(f, "{data}").unwrap();
    f
}

#[tokio::test]
async fn query_prints_the_envelope() {
    let f = fixture();
    let cmd = Command::Query {
        data: f.path().to_path_buf(),
        resource: Resource::Bootcamps,
        params: vec!["averageCost[lte]=10000".into(), "select=name".into(), "limit=1".into()],
    };
    let out = run(cmd, &ResultsConfig::default(), OutputMode::Compact).await.unwrap();
    let v: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(v["success"], true);
    assert_eq!(v["count"], 1);
    assert_eq!(v["pagination"], serde_json::json!({"next": {"page": 2, "limit": 1}}));
    // newest of the two matches
    assert_eq!(v["data"][0]["name"], "ModernTech Bootcamp");
    assert_eq!(v["data"][0]["courses"], serde_json::json!([]));
}

#[tokio::test]
async fn explain_shows_the_translation() {
    let cmd = Command::Explain {
        resource: Resource::Courses,
        params: vec!["tuition[gte]=5000".into(), "sort=-tuition".into(), "page=2".into()],
    };
    let out = run(cmd, &ResultsConfig::default(), OutputMode::Pretty).await.unwrap();
    let v: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(v["collection"], "courses");
    assert_eq!(v["filter"], serde_json::json!({"tuition": {"$gte": 5000}}));
    assert_eq!(v["sort"], serde_json::json!(["-tuition", "_id"]));
    assert_eq!(v["skip"], 100);
    assert_eq!(v["limit"], 100);
    assert_eq!(v["populate"], serde_json::json!(["bootcamp"]));
}

#[tokio::test]
async fn resources_lists_configured_limits() {
    let mut cfg = ResultsConfig::default();
    cfg.limits.insert("reviews".into(), 10);
    let out = run(Command::Resources, &cfg, OutputMode::Compact).await.unwrap();
    let v: serde_json::Value = serde_json::from_str(&out).unwrap();
    let list = v.as_array().unwrap();
    assert_eq!(list.len(), 4);
    let reviews = list.iter().find(|r| r["name"] == "reviews").unwrap();
    assert_eq!(reviews["default_limit"], 10);
    let bootcamps = list.iter().find(|r| r["name"] == "bootcamps").unwrap();
    assert_eq!(bootcamps["default_limit"], 25);
}

#[tokio::test]
async fn bad_inputs_surface_as_errors() {
    let cmd = Command::Query {
        data: std::path::PathBuf::from("/definitely/not/here.json"),
        resource: Resource::Bootcamps,
        params: vec![],
    };
    assert!(matches!(run(cmd, &ResultsConfig::default(), OutputMode::Compact).await, Err(QueryError::Io(_))));

    let cmd = Command::Explain { resource: Resource::Bootcamps, params: vec!["select=name,-photo".into()] };
    assert!(matches!(
        run(cmd, &ResultsConfig::default(), OutputMode::Compact).await,
        Err(QueryError::MalformedShapingParameter { .. })
    ));
}
