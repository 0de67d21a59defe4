//! Queue processor E2E tests for solr-sync.
//!
//! Drives index/reindex/unindex through a manager whose connection is backed
//! by a scripted transport, and checks the exact requests on the wire.

use pretty_assertions::assert_eq;
use serde_json::json;

use e2e_tests::{json_document, product_document, test_document, TestHarness};
use solr_types::Document;

#[test]
fn test_index_python_test_doc() {
    let harness = TestHarness::new();
    let log = harness.script_with_schema(1);

    harness.processor.index(&test_document(), None).unwrap();

    let requests = log.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].to_string(),
        "GET /solr/admin/get-file.jsp?file=schema.xml"
    );
    assert_eq!(
        requests[1].to_string(),
        "POST /solr/update\n<add><doc><field name=\"id\">500</field><field name=\"name\">python test doc</field></doc></add>"
    );
}

#[test]
fn test_index_full_product_in_schema_order() {
    let harness = TestHarness::new();
    let log = harness.script_with_schema(1);

    harness.processor.index(&product_document("500"), None).unwrap();

    let body = log.requests()[1].body.clone().unwrap();
    assert_eq!(
        body,
        concat!(
            "<add><doc>",
            "<field name=\"id\">500</field>",
            "<field name=\"name\">foo</field>",
            "<field name=\"cat\">electronics</field>",
            "<field name=\"cat\">memory</field>",
            "<field name=\"price\">42.0</field>",
            "<field name=\"popularity\">3</field>",
            "<field name=\"inStock\">true</field>",
            "<field name=\"timestamp\">1972-05-11T03:45:00.000Z</field>",
            "<field name=\"allowedRolesAndUsers\">user$test_user_1_</field>",
            "<field name=\"allowedRolesAndUsers\">Manager</field>",
            "</doc></add>"
        )
    );
}

#[test]
fn test_partial_update_omits_unselected_fields() {
    let harness = TestHarness::new();
    let log = harness.script_with_schema(1);
    let doc = Document::new()
        .with("id", "500")
        .with("name", "foo")
        .with("price", 42.0);

    harness
        .processor
        .index(&doc, Some(&["id", "name"][..]))
        .unwrap();

    let body = log.requests()[1].body.clone().unwrap();
    assert_eq!(
        body,
        "<add><doc><field name=\"id\">500</field><field name=\"name\">foo</field></doc></add>"
    );
    assert!(!body.contains("price"));
    assert!(!body.contains("42"));
}

#[test]
fn test_partial_update_always_carries_unique_key() {
    let harness = TestHarness::new();
    let log = harness.script_with_schema(1);

    harness
        .processor
        .index(&product_document("500"), Some(&["price"][..]))
        .unwrap();

    assert_eq!(
        log.requests()[1].body.as_deref(),
        Some("<add><doc><field name=\"id\">500</field><field name=\"price\">42.0</field></doc></add>")
    );
}

#[test]
fn test_date_is_sent_in_utc() {
    let harness = TestHarness::new();
    let log = harness.script_with_schema(1);

    harness
        .processor
        .index(&product_document("zeidler"), Some(&["timestamp"][..]))
        .unwrap();

    let body = log.requests()[1].body.clone().unwrap();
    assert!(body.contains("<field name=\"timestamp\">1972-05-11T03:45:00.000Z</field>"));
}

#[test]
fn test_reindex_matches_index_byte_for_byte() {
    let harness = TestHarness::new();
    let log = harness.script_with_schema(4);
    let doc = product_document("500");

    harness.processor.index(&doc, None).unwrap();
    harness.processor.reindex(&doc, None).unwrap();
    harness.processor.index(&doc, Some(&["name", "cat"][..])).unwrap();
    harness.processor.reindex(&doc, Some(&["name", "cat"][..])).unwrap();

    let requests = log.requests();
    assert_eq!(requests.len(), 5);
    assert_eq!(requests[1], requests[2]);
    assert_eq!(requests[3], requests[4]);
    assert_ne!(requests[1], requests[3]);
}

#[test]
fn test_unindex_sends_only_the_identifier() {
    let harness = TestHarness::new();
    let log = harness.script_with_schema(1);

    harness.processor.unindex(&product_document("500")).unwrap();

    assert_eq!(
        log.requests()[1].to_string(),
        "POST /solr/update\n<delete><id>500</id></delete>"
    );
}

#[test]
fn test_undeclared_attributes_are_dropped_without_allowlist() {
    let harness = TestHarness::new();
    let log = harness.script_with_schema(1);
    let doc = json_document(json!({
        "id": "7",
        "name": "from json",
        "unknown": "ignored",
        "popularity": null
    }));

    harness.processor.index(&doc, None).unwrap();

    assert_eq!(
        log.requests()[1].body.as_deref(),
        Some("<add><doc><field name=\"id\">7</field><field name=\"name\">from json</field></doc></add>")
    );
}

#[test]
fn test_prepare_data_with_cached_schema() {
    let harness = TestHarness::new();
    harness.load_schema();
    let doc = product_document("500");

    let first = harness.processor.prepare_data(&doc, None).unwrap();
    let second = harness.processor.prepare_data(&doc, None).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first.get("allowedRolesAndUsers").unwrap(),
        &["user$test_user_1_", "Manager"]
    );
    assert_eq!(first.get("price").unwrap(), &["42.0"]);
    // No network traffic beyond the schema fetch.
    let conn = harness.manager.connection().unwrap();
    assert_eq!(conn.request_count(), 1);
}

#[test]
fn test_values_are_xml_escaped() {
    let harness = TestHarness::new();
    let log = harness.script_with_schema(1);
    let doc = Document::new()
        .with("id", "a&b")
        .with("name", "<b>Fish & Chips</b>\u{1}");

    harness.processor.index(&doc, None).unwrap();

    assert_eq!(
        log.requests()[1].body.as_deref(),
        Some("<add><doc><field name=\"id\">a&amp;b</field><field name=\"name\">&lt;b&gt;Fish &amp; Chips&lt;/b&gt;</field></doc></add>")
    );
}
