//! Integration tests for the inspection helpers behind `zohocrm-inspect`.

use std::io::Write;

use serde_json::Value;
use zohocrm_response::ParseOptions;
use zohocrm_response_cli::inspect::{inspect, read_document, EXIT_API_ERROR, EXIT_BAD_DOCUMENT};

// ─────────────────────── helpers ───────────────────────

/// Write `contents` to a temp file and return its handle.
fn captured(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn run(raw: &str, module: &str, method: &str) -> (Value, i32) {
    let outcome = inspect(raw, module, method, ParseOptions::default(), false, false).unwrap();
    (serde_json::from_str(&outcome.output).unwrap(), outcome.exit_code)
}

// ═══════════════════════════════════════════════════════

#[test]
fn test_read_document_from_file() {
    let xml = "<response><nodata><code>4422</code></nodata></response>";
    let file = captured(xml);
    let raw = read_document(file.path().to_str()).unwrap();
    assert_eq!(raw, xml);
}

#[test]
fn test_read_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.xml");
    let err = read_document(missing.to_str()).unwrap_err();
    assert!(err.to_string().contains("missing.xml"));
}

#[test]
fn test_inspect_record_listing() {
    let xml = r#"<response uri="/crm/private/xml/Leads/getRecordById"><result><Leads><row no="1"><FL val="LEADID">123456789012345678</FL><FL val="Company">Acme</FL></row></Leads></result></response>"#;
    let (value, exit_code) = run(xml, "Leads", "getRecordById");
    assert_eq!(exit_code, 0);
    assert_eq!(value["record_id"], "123456789012345678");
    assert_eq!(value["uri"], "/crm/private/xml/Leads/getRecordById");
    assert_eq!(value["records"]["kind"], "rows");
    assert_eq!(value["records"]["data"]["1"]["Company"], "Acme");
    assert!(value.get("xml").is_none());
}

#[test]
fn test_inspect_with_xml() {
    let xml = "<success><Contact param=\"id\">1</Contact></success>";
    let outcome = inspect(xml, "Leads", "convertLead", ParseOptions::default(), true, true).unwrap();
    let value: Value = serde_json::from_str(&outcome.output).unwrap();
    assert_eq!(value["xml"], xml);
    assert_eq!(value["records"]["data"]["Contact"], "1");
}

#[test]
fn test_inspect_bulk_outcomes() {
    let xml = r#"<response><result><row no="2"><error><code>4835</code><details>Missing Last Name</details></error></row><row no="1"><success><code>2000</code><details><FL val="Id">9</FL></details></success></row></result></response>"#;
    let (value, _) = run(xml, "Leads", "insertRecords");
    let outcomes = value["records"]["data"].as_object().unwrap();
    let positions: Vec<&String> = outcomes.keys().collect();
    assert_eq!(positions, vec!["1", "2"]);
    assert_eq!(outcomes["1"]["status"], "success");
    assert_eq!(outcomes["2"]["message"], "Missing Last Name");
}

#[test]
fn test_inspect_api_error_exit_code() {
    let xml = r#"<response uri="/u"><error><code>4834</code><message>Invalid Ticket Id</message></error></response>"#;
    let (value, exit_code) = run(xml, "Leads", "getRecords");
    assert_eq!(exit_code, EXIT_API_ERROR);
    assert_eq!(value["error"], "api");
    assert_eq!(value["code"], "4834");
    assert_eq!(value["uri"], "/u");
}

#[test]
fn test_inspect_bad_documents_exit_code() {
    let (value, exit_code) = run("garbage", "Leads", "getRecords");
    assert_eq!(exit_code, EXIT_BAD_DOCUMENT);
    assert_eq!(value["error"], "malformed_document");

    let (value, exit_code) = run("<response/>", "Leads", "getRecords");
    assert_eq!(exit_code, EXIT_BAD_DOCUMENT);
    assert_eq!(value["error"], "unrecognized_shape");
    assert_eq!(value["root"], "response");
}
