use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[allow(deprecated)]
fn ragdb(store: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ragdb").expect("binary");
    cmd.env("RAGDB_EMBEDDING_MODE", "stub")
        .env("RAGDB_EMBEDDING_DIM", "64")
        .env_remove("RAGDB_STORE_PATH")
        .env_remove("RAGDB_ON_CORRUPT")
        .env_remove("RAGDB_REBUILD")
        .arg("--store")
        .arg(store);
    cmd
}

fn run_json(store: &Path, args: &[&str]) -> Value {
    let output = ragdb(store)
        .args(args)
        .arg("--json")
        .output()
        .expect("command run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

fn add(store: &Path, text: &str, meta: &[&str]) -> String {
    let mut args = vec!["add", text];
    for pair in meta {
        args.push("--meta");
        args.push(*pair);
    }
    let body = run_json(store, &args);
    assert_eq!(body["status"], "added");
    body["id"].as_str().expect("id").to_string()
}

#[test]
fn add_get_search_roundtrip() {
    let temp = tempdir().unwrap();
    let store = temp.path().join("db.json");

    let rust = add(
        &store,
        "rust ownership and borrowing rules",
        &["source=book.md", "page=12"],
    );
    let _soup = add(&store, "tom yum soup recipe with lemongrass", &[]);

    let doc = run_json(&store, &["get", rust.as_str()]);
    assert_eq!(doc["id"], rust.as_str());
    assert_eq!(doc["text"], "rust ownership and borrowing rules");
    assert_eq!(doc["metadata"]["source"], "book.md");
    assert_eq!(doc["metadata"]["page"], 12);

    let found = run_json(&store, &["search", "borrowing rules in rust", "-k", "1"]);
    let hits = found["hits"].as_array().expect("hits array");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["id"], rust.as_str());
    let relevance = hits[0]["relevance"].as_f64().unwrap();
    assert!(relevance > 0.0 && relevance <= 1.0);
}

#[test]
fn list_reports_total_and_pages() {
    let temp = tempdir().unwrap();
    let store = temp.path().join("db.json");
    let first = add(&store, "first", &[]);
    add(&store, "second", &[]);
    add(&store, "third", &[]);

    let page = run_json(&store, &["list", "--skip", "1", "--limit", "1"]);
    assert_eq!(page["total"], 3);
    let docs = page["documents"].as_array().unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["text"], "second");

    let all = run_json(&store, &["list"]);
    assert_eq!(all["documents"][0]["id"], first.as_str());
}

#[test]
fn update_and_delete() {
    let temp = tempdir().unwrap();
    let store = temp.path().join("db.json");
    let id = add(&store, "draft text", &["status=draft", "source=a.txt"]);

    let updated = run_json(&store, &["update", id.as_str(), "final text", "--meta", "status=final"]);
    assert_eq!(updated["status"], "updated");

    let doc = run_json(&store, &["get", id.as_str()]);
    assert_eq!(doc["text"], "final text");
    assert_eq!(doc["metadata"]["status"], "final");
    assert_eq!(doc["metadata"]["source"], "a.txt");

    let deleted = run_json(&store, &["delete", id.as_str()]);
    assert_eq!(deleted["status"], "deleted");

    let stats = run_json(&store, &["stats"]);
    assert_eq!(stats["documents"], 0);
    assert_eq!(stats["index_rows"], 0);
    assert_eq!(stats["dimension"], 64);
}

#[test]
fn missing_id_exits_non_zero() {
    let temp = tempdir().unwrap();
    let store = temp.path().join("db.json");

    for args in [
        vec!["get", "nope"],
        vec!["delete", "nope"],
        vec!["update", "nope", "text"],
    ] {
        ragdb(&store)
            .args(&args)
            .assert()
            .failure()
            .stderr(predicate::str::contains("not found"));
    }
}

#[test]
fn empty_text_is_rejected() {
    let temp = tempdir().unwrap();
    let store = temp.path().join("db.json");

    ragdb(&store)
        .args(["add", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty"));
}

#[test]
fn ingest_files_with_chunk_metadata() {
    let temp = tempdir().unwrap();
    let store = temp.path().join("db.json");
    let notes = temp.path().join("notes.txt");
    fs::write(&notes, "one two three four five six seven").unwrap();
    let binary = temp.path().join("image.png");
    fs::write(&binary, [0_u8, 1, 2]).unwrap();

    let stats = run_json(
        &store,
        &[
            "ingest",
            notes.to_str().unwrap(),
            binary.to_str().unwrap(),
            "--chunk-size",
            "3",
        ],
    );
    assert_eq!(stats["sources"], 1);
    assert_eq!(stats["chunks"], 3);
    assert_eq!(stats["documents_added"], 3);
    assert_eq!(stats["errors"].as_array().unwrap().len(), 1);

    let last_id = stats["ids"][2].as_str().unwrap();
    let doc = run_json(&store, &["get", last_id]);
    assert_eq!(doc["text"], "seven");
    assert_eq!(doc["metadata"]["source"], "notes.txt");
    assert_eq!(doc["metadata"]["chunk_id"], 3);
    assert_eq!(doc["metadata"]["total_chunks"], 3);
    assert_eq!(doc["metadata"]["type"], "txt");
}

#[test]
fn corrupt_snapshot_fails_unless_policy_allows_empty() {
    let temp = tempdir().unwrap();
    let store = temp.path().join("db.json");
    fs::write(&store, "not json").unwrap();

    ragdb(&store)
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Corrupt snapshot"));

    ragdb(&store)
        .env("RAGDB_ON_CORRUPT", "empty")
        .args(["stats", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"documents\": 0"));
}
