//! End-to-end checks that each binary reads line-delimited JSON, runs its
//! pipeline, and writes a JSON array of result rows with exit code 0 - and
//! that a bad input file surfaces as a non-zero exit with a stderr message
//! instead of a panic.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn input_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

#[test]
fn word_count_writes_a_json_array_and_exits_zero() {
    let input = input_file(&[r#"{"text": "Hello, world!"}"#, r#"{"text": "hello hello"}"#]);
    let output = NamedTempFile::new().unwrap();

    Command::cargo_bin("word-count")
        .unwrap()
        .arg(input.path())
        .arg(output.path())
        .assert()
        .success();

    let written = std::fs::read_to_string(output.path()).unwrap();
    let rows: Vec<serde_json::Value> = serde_json::from_str(&written).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["text"], "world");
    assert_eq!(rows[0]["count"], 1);
    assert_eq!(rows[1]["text"], "hello");
    assert_eq!(rows[1]["count"], 3);
}

#[test]
fn missing_input_file_is_a_clean_nonzero_exit() {
    let output = NamedTempFile::new().unwrap();

    Command::cargo_bin("word-count")
        .unwrap()
        .arg("/no/such/input.jsonl")
        .arg(output.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn inverted_index_produces_tf_idf_rows() {
    let input = input_file(&[
        r#"{"doc_id": 1, "text": "a b a"}"#,
        r#"{"doc_id": 2, "text": "a c"}"#,
        r#"{"doc_id": 3, "text": "b c c"}"#,
    ]);
    let output = NamedTempFile::new().unwrap();

    Command::cargo_bin("inverted-index")
        .unwrap()
        .arg(input.path())
        .arg(output.path())
        .assert()
        .success();

    let written = std::fs::read_to_string(output.path()).unwrap();
    let rows: Vec<serde_json::Value> = serde_json::from_str(&written).unwrap();
    let hit = rows
        .iter()
        .find(|r| r["doc_id"] == 1 && r["text"] == "a")
        .expect("doc 1 / word a in output");
    let score = hit["tf_idf"].as_f64().unwrap();
    assert!((score - 0.270).abs() < 0.01, "score was {score}");
}

#[test]
fn traffic_speed_joins_two_input_files() {
    let times = input_file(&[r#"{"edge_id": 1, "enter_time": "20171020T112238.723000", "leave_time": "20171020T122238.723000"}"#]);
    let lengths = input_file(&[r#"{"edge_id": 1, "start": [37.5, 55.75], "end": [37.6, 55.75]}"#]);
    let output = NamedTempFile::new().unwrap();

    Command::cargo_bin("traffic-speed")
        .unwrap()
        .arg(times.path())
        .arg(lengths.path())
        .arg(output.path())
        .assert()
        .success();

    let written = std::fs::read_to_string(output.path()).unwrap();
    let rows: Vec<serde_json::Value> = serde_json::from_str(&written).unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0]["speed"].is_number());
}
