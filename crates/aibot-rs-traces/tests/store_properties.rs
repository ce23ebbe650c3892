use aibot_rs_protocol::{Metadata, Role, TraceFilter, TurnRecord, UNKNOWN};
use aibot_rs_traces::{JsonTraceStore, JsonlTraceStore, StoreOptions, TraceStore};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::thread;
use tempfile::TempDir;

fn record(
    role: Role,
    content: &str,
    trace_id: &str,
    session: Option<&str>,
    ts: f64,
) -> TurnRecord {
    let mut metadata = Metadata::new();
    if let Some(session) = session {
        metadata.insert("session_id".to_string(), json!(session));
    }
    TurnRecord::new(role, content, trace_id, metadata, ts)
}

fn backends(dir: &Path) -> Vec<Box<dyn TraceStore>> {
    vec![
        Box::new(JsonTraceStore::open(dir.join("local_traces.json")).expect("json store")),
        Box::new(JsonlTraceStore::open(dir.join("local_traces.jsonl")).expect("jsonl store")),
    ]
}

fn mixed_log() -> Vec<TurnRecord> {
    vec![
        record(Role::User, "What is 2+2?", "t1", Some("s1"), 100.0),
        record(Role::Assistant, "4", "t1", Some("s1"), 101.0),
        record(Role::User, "hello", "t2", Some("s2"), 102.0),
        record(Role::Assistant, "OpenAI call error: timeout", "t2", Some("s2"), 103.0),
        record(Role::User, "orphan", "t3", None, 104.0),
        record(Role::User, "calculate 3*3", "t4", Some("s1"), 105.0),
    ]
}

#[test]
fn append_then_export_round_trips() {
    let temp = TempDir::new().expect("tmp");
    for store in backends(temp.path()) {
        let turn = vec![
            record(Role::User, "What is 2+2?", "abc123", Some("s1"), 100.0),
            record(Role::Assistant, "4", "abc123", Some("s1"), 101.0),
        ];
        store.append(&turn).expect("append");

        let bytes = store.export().expect("export").expect("file exists");
        let copy = temp
            .path()
            .join("copy")
            .join(store.path().file_name().expect("file name"));
        fs::create_dir_all(copy.parent().expect("parent")).expect("dir");
        fs::write(&copy, &bytes).expect("write copy");

        let reloaded: Vec<TurnRecord> = if copy.extension().is_some_and(|ext| ext == "jsonl") {
            JsonlTraceStore::open(&copy).expect("open").load().expect("load")
        } else {
            JsonTraceStore::open(&copy).expect("open").load().expect("load")
        };
        assert_eq!(reloaded, turn);
    }
}

#[test]
fn log_length_is_sum_of_appends() {
    let temp = TempDir::new().expect("tmp");
    for store in backends(temp.path()) {
        let log = mixed_log();
        store.append(&log[..2]).expect("append");
        store.append(&[]).expect("append");
        store.append(&log[2..5]).expect("append");
        store.append(&log[5..]).expect("append");
        assert_eq!(store.len(), log.len());
        assert_eq!(store.load().expect("load"), log);
    }
}

#[test]
fn empty_filter_returns_everything_in_order() {
    let temp = TempDir::new().expect("tmp");
    for store in backends(temp.path()) {
        store.append(&mixed_log()).expect("append");
        assert_eq!(store.query(&TraceFilter::all()).expect("query"), mixed_log());
    }
}

#[test]
fn session_filter_keeps_order() {
    let temp = TempDir::new().expect("tmp");
    for store in backends(temp.path()) {
        store.append(&mixed_log()).expect("append");
        let hits = store
            .query(&TraceFilter::all().with_session("s1"))
            .expect("query");
        let contents: Vec<_> = hits.iter().filter_map(|r| r.content_text()).collect();
        assert_eq!(contents, vec!["What is 2+2?", "4", "calculate 3*3"]);
    }
}

#[test]
fn unknown_session_collects_records_without_id() {
    let temp = TempDir::new().expect("tmp");
    for store in backends(temp.path()) {
        store.append(&mixed_log()).expect("append");
        let hits = store
            .query(&TraceFilter::all().with_session(UNKNOWN))
            .expect("query");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].trace_id, "t3");
        assert_eq!(
            store.sessions().expect("sessions"),
            vec!["s1".to_string(), "s2".to_string(), UNKNOWN.to_string()]
        );
    }
}

#[test]
fn search_is_case_insensitive_and_combines_with_role() {
    let temp = TempDir::new().expect("tmp");
    for store in backends(temp.path()) {
        store.append(&mixed_log()).expect("append");
        let hits = store
            .query(&TraceFilter::all().with_search("ERROR"))
            .expect("query");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content_text(), Some("OpenAI call error: timeout"));

        let none = store
            .query(
                &TraceFilter::all()
                    .with_search("error")
                    .with_role(Role::User),
            )
            .expect("query");
        assert!(none.is_empty());
    }
}

#[test]
fn second_handle_sees_appends_from_first() {
    let temp = TempDir::new().expect("tmp");
    let path = temp.path().join("local_traces.json");
    let writer = JsonTraceStore::open(&path).expect("writer");
    let reader = JsonTraceStore::open(&path).expect("reader");
    writer.append(&mixed_log()[..2]).expect("append");
    assert_eq!(reader.query(&TraceFilter::all()).expect("query").len(), 2);
    assert_eq!(reader.len(), 2);
}

#[test]
fn locked_writers_never_lose_updates() {
    let temp = TempDir::new().expect("tmp");
    let path = temp.path().join("local_traces.json");
    let writers = 4;
    let turns_per_writer = 10;

    let handles: Vec<_> = (0..writers)
        .map(|writer| {
            let store =
                JsonTraceStore::open_with(&path, StoreOptions { lock: true }).expect("open");
            thread::spawn(move || {
                for turn in 0..turns_per_writer {
                    let trace_id = format!("w{writer}t{turn}");
                    let pair = [
                        record(Role::User, "q", &trace_id, Some("s"), 1.0),
                        record(Role::Assistant, "a", &trace_id, Some("s"), 2.0),
                    ];
                    store.append(&pair).expect("append");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("join");
    }

    let store = JsonTraceStore::open(&path).expect("open");
    let records = store.load().expect("load");
    assert_eq!(records.len(), writers * turns_per_writer * 2);
    for pair in records.chunks(2) {
        assert_eq!(pair[0].trace_id, pair[1].trace_id);
        assert_eq!(pair[0].role, Role::User);
        assert_eq!(pair[1].role, Role::Assistant);
    }
}
