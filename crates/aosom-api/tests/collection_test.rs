#![allow(clippy::unwrap_used)]
// Integration tests for collections, items and transformers using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aosom_api::{Error, IndexMethod, MultiTransformer, Record, ResourceKind, Session, SessionConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn login_with_version(server: &MockServer, version: &str) -> Session {
    Mock::given(method("POST"))
        .and(path("/api/user/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "tok-1" })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/versions/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": version })))
        .mount(server)
        .await;

    let uri = Url::parse(&server.uri()).unwrap();
    let mut config = SessionConfig::new(uri.host_str().unwrap());
    config.port = uri.port().unwrap();

    let mut session = Session::new(config);
    session.login().await.unwrap();
    session
}

async fn login(server: &MockServer) -> Session {
    login_with_version(server, "2.1.0").await
}

async fn mount_list(server: &MockServer, uri: &str, items: Value) {
    Mock::given(method("GET"))
        .and(path(uri))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": items })))
        .mount(server)
        .await;
}

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

const POOLS: &str = "/api/resources/ip-pools";

// ── Digest / lookup tests ───────────────────────────────────────────

#[tokio::test]
async fn test_unknown_name_yields_absent_item() {
    let server = MockServer::start().await;
    let mut session = login(&server).await;
    mount_list(&server, POOLS, json!([{ "display_name": "pool-a", "id": "id-1" }])).await;

    let pools = session.collection(ResourceKind::IpPools).unwrap();
    let item = pools.get("nope").await.unwrap();

    assert!(!item.exists());
    assert!(item.url().is_none());
    assert!(item.id().is_none());
    assert!(item.value().is_empty());
}

#[tokio::test]
async fn test_names_and_find() {
    let server = MockServer::start().await;
    let mut session = login(&server).await;
    mount_list(&server, POOLS, json!([{ "display_name": "pool-a", "id": "id-1" }])).await;

    let pools = session.resource("IpPools").unwrap();
    assert_eq!(pools.names().await.unwrap(), ["pool-a"]);

    let found = pools.find("id-1", "id").await.unwrap().unwrap();
    assert_eq!(found["display_name"], "pool-a");

    assert!(pools.find("missing", "display_name").await.unwrap().is_none());
    assert!(
        pools
            .find_by("pool-a", IndexMethod::Name)
            .await
            .unwrap()
            .is_some()
    );

    let err = pools.find("pool-a", "label").await.unwrap_err();
    assert!(err.is_access(), "expected access error, got: {err:?}");
}

#[tokio::test]
async fn test_contains_and_clear_cache() {
    let server = MockServer::start().await;
    let mut session = login(&server).await;

    Mock::given(method("GET"))
        .and(path(POOLS))
        .and(header("AUTHTOKEN", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "display_name": "pool-a", "id": "id-1" }]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let pools = session.collection(ResourceKind::IpPools).unwrap();
    assert!(pools.contains("pool-a").await.unwrap());
    assert!(!pools.contains("id-1").await.unwrap());
    assert!(pools.is_cached());

    pools.clear_cache();
    assert!(!pools.is_cached());

    assert!(pools.contains("pool-a").await.unwrap());
}

#[tokio::test]
async fn test_empty_list_is_cached() {
    let server = MockServer::start().await;
    let mut session = login(&server).await;

    Mock::given(method("GET"))
        .and(path(POOLS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let pools = session.collection(ResourceKind::IpPools).unwrap();
    assert!(pools.names().await.unwrap().is_empty());
    assert!(!pools.contains("anything").await.unwrap());
}

#[tokio::test]
async fn test_failed_digest_leaves_no_state() {
    let server = MockServer::start().await;
    let mut session = login(&server).await;

    Mock::given(method("GET"))
        .and(path(POOLS))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "errors": "bad" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_list(&server, POOLS, json!([{ "display_name": "pool-a", "id": "id-1" }])).await;

    let pools = session.collection(ResourceKind::IpPools).unwrap();

    let err = pools.cache().await.unwrap_err();
    assert!(err.is_request(), "expected request error, got: {err:?}");
    assert_eq!(err.status().map(|s| s.as_u16()), Some(400));
    assert_eq!(err.response().unwrap().json().unwrap()["errors"], "bad");
    assert!(!pools.is_cached());

    let index = pools.cache().await.unwrap();
    assert_eq!(index.names(), ["pool-a"]);
    assert!(index.by_id("id-1").is_some());
}

#[tokio::test]
async fn test_items_iterate_in_list_order() {
    let server = MockServer::start().await;
    let mut session = login(&server).await;
    mount_list(
        &server,
        POOLS,
        json!([
            { "display_name": "pool-b", "id": "id-2" },
            { "display_name": "pool-a", "id": "id-1" },
        ]),
    )
    .await;

    let pools = session.collection(ResourceKind::IpPools).unwrap();
    let items = pools.items().await.unwrap();
    assert_eq!(items.len(), 2);

    let names: Vec<String> = items.clone().map(|i| i.name().to_owned()).collect();
    assert_eq!(names, ["pool-b", "pool-a"]);

    // restartable
    let ids: Vec<String> = items.filter_map(|i| i.id()).collect();
    assert_eq!(ids, ["id-2", "id-1"]);
}

#[tokio::test]
async fn test_await_listed() {
    let server = MockServer::start().await;
    let mut session = login(&server).await;
    mount_list(&server, POOLS, json!([{ "display_name": "pool-a", "id": "id-1" }])).await;

    let pools = session.collection(ResourceKind::IpPools).unwrap();
    assert!(pools.await_listed("pool-a", Duration::from_secs(2)).await);
    assert!(!pools.await_listed("pool-z", Duration::from_millis(300)).await);
}

// ── List shape by server version ────────────────────────────────────

#[tokio::test]
async fn test_legacy_server_returns_bare_list() {
    let server = MockServer::start().await;
    let mut session = login_with_version(&server, "1.0").await;

    Mock::given(method("GET"))
        .and(path(POOLS))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "display_name": "pool-a", "id": "id-1" }])),
        )
        .mount(&server)
        .await;

    let pools = session.collection(ResourceKind::IpPools).unwrap();
    assert_eq!(pools.names().await.unwrap(), ["pool-a"]);
}

#[tokio::test]
async fn test_list_shape_must_match_version() {
    let server = MockServer::start().await;
    let mut session = login_with_version(&server, "1.0").await;
    mount_list(&server, POOLS, json!([{ "display_name": "pool-a", "id": "id-1" }])).await;

    let pools = session.collection(ResourceKind::IpPools).unwrap();
    let result = pools.names().await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

// ── Item lifecycle ──────────────────────────────────────────────────

#[tokio::test]
async fn test_create_then_read_round_trip() {
    let server = MockServer::start().await;
    let mut session = login(&server).await;
    mount_list(&server, POOLS, json!([])).await;

    let value = json!({
        "display_name": "pool-new",
        "subnets": [{ "network": "172.21.0.0/16" }],
    });

    Mock::given(method("POST"))
        .and(path(POOLS))
        .and(body_json(&value))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "id-9" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut echoed = value.clone();
    echoed["id"] = json!("id-9");
    Mock::given(method("GET"))
        .and(path(format!("{POOLS}/id-9")))
        .respond_with(ResponseTemplate::new(200).set_body_json(&echoed))
        .mount(&server)
        .await;

    let pools = session.collection(ResourceKind::IpPools).unwrap();
    let mut item = pools.get("pool-new").await.unwrap();
    assert!(!item.exists());

    item.create(record(value.clone())).await.unwrap();
    assert!(item.exists());
    assert_eq!(item.id().as_deref(), Some("id-9"));
    assert!(item.url().unwrap().ends_with("/api/resources/ip-pools/id-9"));
    assert_eq!(item.value(), &record(echoed.clone()));

    let fresh = item.read().await.unwrap();
    assert_eq!(fresh, &record(echoed));

    // a second create on the same item is a precondition failure
    let err = item.create(record(value)).await.unwrap_err();
    assert!(
        matches!(err, Error::AlreadyExists { ref name } if name == "pool-new"),
        "expected AlreadyExists, got: {err:?}"
    );
}

#[tokio::test]
async fn test_failed_create_restores_record() {
    let server = MockServer::start().await;
    let mut session = login(&server).await;
    mount_list(&server, POOLS, json!([])).await;

    Mock::given(method("POST"))
        .and(path(POOLS))
        .respond_with(ResponseTemplate::new(409).set_body_string("conflict"))
        .mount(&server)
        .await;

    let pools = session.collection(ResourceKind::IpPools).unwrap();
    let mut item = pools.get("pool-new").await.unwrap();

    let err = item
        .create(record(json!({ "display_name": "pool-new" })))
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(409));
    assert!(!item.exists());
    assert!(item.value().is_empty());
}

#[tokio::test]
async fn test_create_without_returned_id_keeps_record() {
    let server = MockServer::start().await;
    let mut session = login(&server).await;
    mount_list(&server, POOLS, json!([])).await;

    Mock::given(method("POST"))
        .and(path(POOLS))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let pools = session.collection(ResourceKind::IpPools).unwrap();
    let mut item = pools.get("pool-new").await.unwrap();

    let value = record(json!({ "display_name": "pool-new" }));
    let err = item.create(value.clone()).await.unwrap_err();
    assert!(
        matches!(err, Error::CreatedWithoutId { ref name, .. } if name == "pool-new"),
        "expected CreatedWithoutId, got: {err:?}"
    );
    assert!(err.is_state());

    // the server holds the record now: the sent value stays, no ID yet
    assert_eq!(item.value(), &value);
    assert!(item.id().is_none());
}

#[tokio::test]
async fn test_non_json_body_is_a_typed_error() {
    let server = MockServer::start().await;
    let mut session = login(&server).await;

    // a multi-byte character straddles the preview cut
    let body = format!("a{}", "é".repeat(150));
    Mock::given(method("GET"))
        .and(path(POOLS))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let pools = session.collection(ResourceKind::IpPools).unwrap();
    let result = pools.cache().await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
    assert!(!pools.is_cached());
}

#[tokio::test]
async fn test_replace_and_delete() {
    let server = MockServer::start().await;
    let mut session = login(&server).await;
    mount_list(
        &server,
        POOLS,
        json!([{ "display_name": "pool-a", "id": "id-1", "tags": [] }]),
    )
    .await;

    Mock::given(method("PUT"))
        .and(path(format!("{POOLS}/id-1")))
        .and(body_json(json!({ "display_name": "pool-a", "tags": ["prod"] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{POOLS}/id-1")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let pools = session.collection(ResourceKind::IpPools).unwrap();
    let mut item = pools.get("pool-a").await.unwrap();
    assert!(item.exists());

    item.replace(record(json!({ "display_name": "pool-a", "tags": ["prod"] })))
        .await
        .unwrap();
    assert_eq!(item.value()["tags"], json!(["prod"]));
    assert_eq!(item.id().as_deref(), Some("id-1"));

    item.delete().await.unwrap();
    assert!(!item.exists());
    assert!(item.url().is_none());

    let err = item.delete().await.unwrap_err();
    assert!(err.is_state(), "expected NotExists, got: {err:?}");
}

// ── Transformers ────────────────────────────────────────────────────

#[tokio::test]
async fn test_multi_transformer_round_trip() {
    let server = MockServer::start().await;
    let mut session = login(&server).await;
    mount_list(&server, POOLS, json!([{ "display_name": "pool-a", "id": "ip-1" }])).await;
    mount_list(
        &server,
        "/api/resources/asn-pools",
        json!([
            { "display_name": "asn-a", "id": "asn-1" },
            { "display_name": "asn-b", "id": "asn-2" },
        ]),
    )
    .await;

    let xf = MultiTransformer::new([
        ("ip_pool", ResourceKind::IpPools),
        ("asn_pools", ResourceKind::AsnPools),
    ]);

    let named = record(json!({ "ip_pool": "pool-a", "asn_pools": ["asn-a", "asn-b"] }));
    let wire = xf.xf_out(&mut session, &named).await.unwrap();
    assert_eq!(
        wire,
        record(json!({ "ip_pool": "ip-1", "asn_pools": ["asn-1", "asn-2"] }))
    );

    let back = xf.xf_in(&mut session, &wire).await.unwrap();
    assert_eq!(back, named);

    let err = xf
        .xf_out(&mut session, &record(json!({ "ip_pool": "pool-zzz" })))
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::Access { ref key, ref method } if key == "pool-zzz" && method == "display_name"),
        "expected Access error, got: {err:?}"
    );

    let err = xf
        .xf_out(&mut session, &record(json!({ "vlan": 10 })))
        .await
        .unwrap_err();
    assert!(err.is_access());
}

#[tokio::test]
async fn test_collection_transformer() {
    let server = MockServer::start().await;
    let mut session = login(&server).await;
    mount_list(&server, POOLS, json!([{ "display_name": "pool-a", "id": "ip-1" }])).await;

    let pools = session.collection(ResourceKind::IpPools).unwrap();
    let xf = pools.transformer();
    let index = pools.cache().await.unwrap();

    let wire = xf.xf_out(index, &record(json!({ "pool": "pool-a" }))).unwrap();
    assert_eq!(wire["pool"], "ip-1");
}
