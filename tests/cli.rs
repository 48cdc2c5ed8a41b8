mod common;

use common::{TestContext, block_texts};
use predicates::prelude::*;

#[test]
fn process_in_test_mode_fills_question() {
    let ctx = TestContext::new();
    let doc = ctx.write_docx("report.docx", &["实验一", "1. 什么是栈？", "结束"]);

    ctx.cli()
        .args(["process", "report.docx", "--test-mode", "--locator", "pattern", "--no-exec"])
        .write_stdin("后进先出。\n===END===\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Filled: 1"))
        .stdout(predicate::str::contains("Rate: 100.0%"))
        .stderr(predicate::str::contains("1. 什么是栈？"));

    assert_eq!(block_texts(&doc), vec!["实验一", "1. 什么是栈？", "后进先出。", "结束"]);
}

#[test]
fn process_writes_to_output_path() {
    let ctx = TestContext::new();
    let doc = ctx.write_docx("report.docx", &["请问结果是多少？"]);

    ctx.cli()
        .args([
            "process",
            "report.docx",
            "-o",
            "filled.docx",
            "--test-mode",
            "--locator",
            "pattern",
            "--no-exec",
        ])
        .write_stdin("答案是42。\n===END===\n")
        .assert()
        .success();

    assert_eq!(block_texts(&doc), vec!["请问结果是多少？"]);
    assert_eq!(
        block_texts(&ctx.work_dir().join("filled.docx")),
        vec!["请问结果是多少？", "答案是42。"]
    );
}

#[test]
fn unfilled_points_exit_with_failure() {
    let ctx = TestContext::new();
    ctx.write_docx("report.docx", &["1. 什么是栈？", "2. 什么是队列？"]);

    ctx.cli()
        .args(["process", "report.docx", "--test-mode", "--locator", "pattern", "--no-exec"])
        .write_stdin("后进先出。\n===END===\n")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Remaining: 1"))
        .stdout(predicate::str::contains("2. 什么是队列？"));
}

#[test]
fn json_output_reports_status() {
    let ctx = TestContext::new();
    ctx.write_docx("report.docx", &["什么是栈？"]);

    let output = ctx
        .cli()
        .args(["process", "report.docx", "--test-mode", "--locator", "pattern", "--no-exec", "--json"])
        .write_stdin("后进先出。\n")
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["status"]["total"], 1);
    assert_eq!(value["status"]["points"][0]["anchor_index"], 0);
    assert_eq!(value["status"]["points"][0]["content"][0]["kind"], "text");
}

#[test]
fn documents_dir_is_searched() {
    let ctx = TestContext::new();
    ctx.write_config("[document]\ndocuments_dir = \"docs\"\n");
    let doc = ctx.write_docx("docs/lab.docx", &["为什么？"]);

    ctx.cli()
        .args(["process", "lab.docx", "--test-mode", "--locator", "pattern", "--no-exec"])
        .write_stdin("因为如此。\n===END===\n")
        .assert()
        .success();

    assert_eq!(block_texts(&doc), vec!["为什么？", "因为如此。"]);
}

#[test]
fn missing_api_key_is_reported() {
    let ctx = TestContext::new();
    ctx.write_docx("report.docx", &["什么是栈？"]);

    ctx.cli()
        .args(["process", "report.docx", "--locator", "pattern", "--no-exec"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key not configured"));
}

#[test]
fn missing_document_is_reported() {
    let ctx = TestContext::new();

    ctx.cli()
        .args(["process", "absent.docx", "--test-mode", "--no-exec"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Document not found"));
}

#[test]
fn corrupt_document_is_reported() {
    let ctx = TestContext::new();
    std::fs::write(ctx.work_dir().join("broken.docx"), b"not a zip").unwrap();

    ctx.cli()
        .args(["process", "broken.docx", "--test-mode", "--no-exec"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed document"));
}

#[test]
fn unknown_locator_is_rejected() {
    let ctx = TestContext::new();
    ctx.write_docx("report.docx", &["什么是栈？"]);

    ctx.cli()
        .args(["process", "report.docx", "--locator", "magic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("magic"));
}

#[test]
fn invalid_config_is_reported() {
    let ctx = TestContext::new();
    ctx.write_config("[api]\ntimeout_secs = 0\n");

    ctx.cli()
        .args(["info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("api.timeout_secs"));
}

#[test]
fn info_masks_api_key() {
    let ctx = TestContext::new();
    ctx.write_config("[api]\napi_key = \"sk-or-v1-abcdef123456\"\nmodel = \"test/model\"\n");

    ctx.cli()
        .args(["info"])
        .assert()
        .success()
        .stdout(predicate::str::contains("test/model"))
        .stdout(predicate::str::contains("sk-o...3456"))
        .stdout(predicate::str::contains("abcdef").not());
}

#[test]
fn info_json_reads_environment() {
    let ctx = TestContext::new();

    let output = ctx
        .cli()
        .args(["info", "--json"])
        .env("OPENAI_MODEL", "env/model")
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["model"], "env/model");
    assert_eq!(value["api_key"], serde_json::Value::Null);
    assert_eq!(value["locator"], "assisted");
}

#[test]
fn explicit_config_path_must_exist() {
    let ctx = TestContext::new();

    ctx.cli()
        .args(["--config", "nowhere.toml", "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}
