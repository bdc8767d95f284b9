use super::*;
use serde::Deserialize;
use serde_json::json;
use std::io::Write;

#[derive(Debug, Deserialize, PartialEq)]
struct Named {
    name: String,
}

#[tokio::test]
async fn test_query_sends_empty_filters_and_select() {
    let stub = StubTransport::new();
    stub.respond("thing.query", json!([{ "name": "a" }, { "name": "b" }]));

    let records: Vec<Named> = query(&stub, "thing.query", &["name"]).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[1].name, "b");

    let calls = stub.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "thing.query");
    assert_eq!(calls[0].1, vec![json!([]), json!({ "select": ["name"] })]);
}

#[tokio::test]
async fn test_query_rejects_record_missing_field() {
    let stub = StubTransport::new();
    stub.respond("thing.query", json!([{ "name": "a" }, { "other": 1 }]));

    let err = query::<Named>(&stub, "thing.query", &["name"])
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Malformed(_)));
}

#[tokio::test]
async fn test_stub_unknown_method_is_remote_error() {
    let stub = StubTransport::new();

    let err = stub.invoke("nope", vec![]).await.unwrap_err();
    assert_eq!(
        err,
        TransportError::Remote {
            code: None,
            message: "method not found: nope".to_string()
        }
    );
}

#[tokio::test]
async fn test_stub_failure_injection_and_clear() {
    let stub = StubTransport::new();
    stub.respond("ping", json!("pong"));

    stub.fail_with(TransportError::Connection("closed".to_string()));
    assert!(stub.invoke("ping", vec![]).await.is_err());

    stub.clear_failure();
    assert_eq!(stub.invoke("ping", vec![]).await.unwrap(), json!("pong"));
    assert_eq!(stub.call_count("ping"), 2);
}

#[tokio::test]
async fn test_replay_answers_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "system.info": {{ "hostname": "nas01" }}, "pool.query": [] }}"#
    )
    .unwrap();

    let replay = ReplayTransport::new(file.path());

    let info = replay.invoke("system.info", vec![]).await.unwrap();
    assert_eq!(info["hostname"], "nas01");

    let pools = replay.invoke("pool.query", query_args(&["guid"])).await.unwrap();
    assert_eq!(pools, json!([]));

    let err = replay.invoke("vm.query", vec![]).await.unwrap_err();
    assert!(matches!(err, TransportError::Remote { .. }));
}

#[tokio::test]
async fn test_replay_missing_file_is_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let replay = ReplayTransport::new(dir.path().join("absent.json"));

    let err = replay.invoke("system.info", vec![]).await.unwrap_err();
    assert!(matches!(err, TransportError::Connection(_)));
}

#[tokio::test]
async fn test_replay_rejects_non_object_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[1, 2, 3]").unwrap();

    let replay = ReplayTransport::new(file.path());
    let err = replay.invoke("system.info", vec![]).await.unwrap_err();
    assert!(matches!(err, TransportError::Malformed(_)));
}

#[test]
fn test_error_display() {
    let err = TransportError::Remote {
        code: Some(22),
        message: "Invalid argument".to_string(),
    };
    assert_eq!(err.to_string(), "remote error 22: Invalid argument");
    assert_eq!(TransportError::Timeout.to_string(), "remote call timed out");
}
