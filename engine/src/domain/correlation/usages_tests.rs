//! Tests for usage matching

use std::collections::BTreeMap;

use super::*;

fn make_tx(entry_index: usize, url: &str) -> Transaction {
    Transaction {
        entry_index,
        step_number: 1,
        step_label: "1 - step".to_string(),
        request_id: format!("req-{}", entry_index),
        method: "GET".to_string(),
        url: url.to_string(),
        headers: BTreeMap::new(),
        post_data: String::new(),
        response_status: Some(200),
        response_headers: BTreeMap::new(),
        response_body: None,
    }
}

fn with_header(mut tx: Transaction, name: &str, value: &str) -> Transaction {
    tx.headers.insert(name.to_string(), value.to_string());
    tx
}

fn with_body(mut tx: Transaction, body: &str) -> Transaction {
    tx.method = "POST".to_string();
    tx.post_data = body.to_string();
    tx
}

fn find(txs: &[Transaction], value: &str, start_index: usize) -> Vec<Usage> {
    let config = AnalysisConfig::default();
    let filter = DomainFilter::new(&config);
    UsageMatcher::new(txs, &filter, &config).find_usages(value, start_index)
}

// ============================================================================
// VALUE MATCHING
// ============================================================================

#[test]
fn test_short_needle_requires_word_boundary() {
    assert!(!value_matches("11", "110022"));
    assert!(!value_matches("11", "11111111-2222-3333-4444-555555555555"));
    assert!(value_matches("11", "page=11&size=20"));
    assert!(value_matches("11", "11"));
    assert!(value_matches("110022", "110022"));
}

#[test]
fn test_long_needle_uses_containment() {
    assert!(value_matches("abc123def", "xxabc123defyy"));
    assert!(!value_matches("abc123def", "abc123"));
}

#[test]
fn test_matching_is_percent_decoding_aware() {
    assert!(value_matches("a/b+c123", "code=a%2Fb%2Bc123"));
    assert!(value_matches("a%2Fb%2Bc123", "a/b+c123"));
    assert!(value_matches("ü-12345678", "x=%C3%BC-12345678"));
}

#[test]
fn test_empty_inputs_never_match() {
    assert!(!value_matches("", "anything"));
    assert!(!value_matches("abc", ""));
}

// ============================================================================
// URL
// ============================================================================

#[test]
fn test_path_segment_usage() {
    let txs = vec![make_tx(4, "https://shop.test/orders/987654/items")];
    let usages = find(&txs, "987654", 1);

    assert_eq!(usages.len(), 1);
    let u = &usages[0];
    assert_eq!(u.location_type, LocationType::RequestUrlPath);
    assert_eq!(u.location_key.as_deref(), Some("orders"));
    assert_eq!(u.location_pattern, "/orders/{VALUE}/items");
    assert_eq!(u.example, "/orders/987654/items");
    assert_eq!(u.entry_index, 4);
    assert_eq!(u.request_id, "req-4");
}

#[test]
fn test_first_path_segment_has_no_key() {
    let txs = vec![make_tx(1, "https://shop.test/987654")];
    let usages = find(&txs, "987654", 0);
    assert_eq!(usages[0].location_key, None);
    assert_eq!(usages[0].location_pattern, "/{VALUE}");
}

#[test]
fn test_query_param_usage() {
    let txs = vec![make_tx(2, "https://shop.test/checkout?cartId=CART-99887766&page=1")];
    let usages = find(&txs, "CART-99887766", 1);

    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].location_type, LocationType::RequestQueryParam);
    assert_eq!(usages[0].location_key.as_deref(), Some("cartId"));
    assert_eq!(usages[0].location_pattern, "cartId={VALUE}");
    assert_eq!(usages[0].example, "cartId=CART-99887766");
}

#[test]
fn test_short_value_inside_longer_token_is_not_a_usage() {
    let txs = vec![make_tx(3, "https://shop.test/items/110022?ref=110022")];
    assert!(find(&txs, "11", 1).is_empty());
    assert_eq!(find(&txs, "110022", 1).len(), 2);
}

// ============================================================================
// HEADERS
// ============================================================================

#[test]
fn test_request_header_usage() {
    let tx = with_header(make_tx(2, "https://shop.test/api"), "X-Correlation-Id", "abc123");
    let usages = find(&[tx], "abc123", 1);

    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].location_type, LocationType::RequestHeader);
    assert_eq!(usages[0].location_key.as_deref(), Some("X-Correlation-Id"));
    assert_eq!(usages[0].location_pattern, "X-Correlation-Id: {VALUE}");
}

#[test]
fn test_transport_headers_are_ignored() {
    let tx = make_tx(2, "https://shop.test/api");
    let tx = with_header(tx, "Cookie", "sid=abc123xyz");
    let tx = with_header(tx, "Referer", "https://shop.test/orders/abc123xyz");
    let tx = with_header(tx, "User-Agent", "abc123xyz-agent");
    assert!(find(&[tx], "abc123xyz", 0).is_empty());
}

// ============================================================================
// BODY
// ============================================================================

#[test]
fn test_json_body_requires_exact_leaf_match() {
    let tx = with_body(
        make_tx(5, "https://shop.test/api/pay"),
        r#"{"order": {"ref": "987654"}, "note": "ref 9876543", "qty": 987654}"#,
    );
    let usages = find(&[tx], "987654", 1);

    let found: Vec<_> = usages
        .iter()
        .map(|u| {
            (
                u.location_json_path.as_deref(),
                u.location_pattern.as_str(),
            )
        })
        .collect();
    assert_eq!(
        found,
        vec![
            (Some("order.ref"), r#""ref": "{VALUE}""#),
            (Some("qty"), r#""qty": {VALUE}"#),
        ]
    );
    assert!(
        usages
            .iter()
            .all(|u| u.location_type == LocationType::RequestBodyJson)
    );
    assert_eq!(usages[0].example, "order.ref = 987654");
}

#[test]
fn test_form_body_reports_field() {
    let tx = with_header(
        make_tx(3, "https://shop.test/cart"),
        "Content-Type",
        "application/x-www-form-urlencoded",
    );
    let tx = with_body(tx, "cart=CART-99887766&qty=1");
    let usages = find(&[tx], "CART-99887766", 0);

    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].location_type, LocationType::RequestBodyText);
    assert_eq!(usages[0].location_key.as_deref(), Some("cart"));
    assert_eq!(usages[0].location_pattern, "cart={VALUE}");
}

#[test]
fn test_form_body_is_sniffed_without_content_type() {
    let tx = with_body(make_tx(3, "https://shop.test/cart"), "token=tok%2F12345678");
    let usages = find(&[tx], "tok/12345678", 0);
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].location_key.as_deref(), Some("token"));
}

#[test]
fn test_plain_text_body_usage() {
    let tx = with_body(
        make_tx(3, "https://shop.test/notes"),
        "please ship order CART-99887766 today",
    );
    let usages = find(&[tx], "CART-99887766", 0);

    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].location_type, LocationType::RequestBodyText);
    assert_eq!(usages[0].location_key, None);
    assert_eq!(usages[0].location_pattern, "{VALUE}");
    assert!(usages[0].example.ends_with("CART-99887766 today"));
}

// ============================================================================
// SCOPE
// ============================================================================

#[test]
fn test_only_searches_forward_of_start_index() {
    let txs = vec![
        make_tx(0, "https://shop.test/orders/987654"),
        make_tx(1, "https://shop.test/orders/987654"),
        make_tx(2, "https://shop.test/orders/987654"),
    ];
    let usages = find(&txs, "987654", 1);
    let indexes: Vec<_> = usages.iter().map(|u| u.entry_index).collect();
    assert_eq!(indexes, vec![1, 2]);
}

#[test]
fn test_excluded_domains_are_skipped() {
    let txs = vec![make_tx(
        2,
        "https://www.google-analytics.com/collect?cid=987654321",
    )];
    assert!(find(&txs, "987654321", 0).is_empty());
}

#[test]
fn test_blank_value_has_no_usages() {
    let txs = vec![make_tx(2, "https://shop.test/a/b")];
    assert!(find(&txs, "  ", 0).is_empty());
}

#[test]
fn test_example_is_truncated() {
    let config = AnalysisConfig {
        example_max_length: 12,
        ..AnalysisConfig::default()
    };
    let filter = DomainFilter::new(&config);
    let txs = vec![make_tx(
        1,
        "https://shop.test/very/long/path/segments/987654/tail",
    )];
    let usages = UsageMatcher::new(&txs, &filter, &config).find_usages("987654", 0);
    assert_eq!(usages[0].example, "/very/long/p...");
}
