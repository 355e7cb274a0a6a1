//! Integration tests for the read side: listing with search/sort/pagination,
//! the customer rollup, and the payment history replay.

mod common;

use axum::http::{Method, StatusCode};
use common::{parse_decimal, response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

const COMPANY: i64 = 1;

#[tokio::test]
async fn pagination_returns_the_requested_slice_and_full_total() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer(COMPANY, "Acme Industries").await;

    for i in 0..25 {
        let value = format!("{}", 1000 + i);
        app.seed_deal(COMPANY, customer_id, &value, &value, "0")
            .await;
    }

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/{COMPANY}/deals?page=2&per_page=10"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;

    let page = body["data"]["data"].as_array().unwrap();
    assert_eq!(page.len(), 10);
    assert_eq!(body["data"]["pagination"]["total"], 25);
    assert_eq!(body["data"]["pagination"]["total_pages"], 3);

    // Default order is ascending by deal number; page 2 starts at sequence 011.
    let first = page[0]["deal_number"].as_str().unwrap();
    assert!(first.ends_with("011"), "expected sequence 011, got {first}");
    let last = page[9]["deal_number"].as_str().unwrap();
    assert!(last.ends_with("020"), "expected sequence 020, got {last}");
}

#[tokio::test]
async fn search_matches_customer_name_case_insensitively() {
    let app = TestApp::new().await;
    let acme = app.seed_customer(COMPANY, "Acme Industries").await;
    let borel = app.seed_customer(COMPANY, "Borel Labs").await;
    app.seed_deal(COMPANY, acme, "1000", "1000", "0").await;
    app.seed_deal(COMPANY, borel, "2000", "2000", "0").await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/{COMPANY}/deals?search=bOrEl"),
            None,
        )
        .await;
    let body = response_json(response).await;
    let page = body["data"]["data"].as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["customer_name"], "Borel Labs");
    assert_eq!(body["data"]["pagination"]["total"], 1);
}

#[tokio::test]
async fn search_matches_requirement_text() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer(COMPANY, "Acme Industries").await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/{COMPANY}/deals"),
            Some(json!({
                "customer_id": customer_id,
                "requirement": "Hydraulic press overhaul",
                "deal_value": "4000",
                "deal_approval_value": "4000",
                "advance_payment": "0",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    app.seed_deal(COMPANY, customer_id, "1000", "1000", "0").await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/{COMPANY}/deals?search=hydraulic"),
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["pagination"]["total"], 1);
}

#[tokio::test]
async fn sorting_by_deal_value_descending() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer(COMPANY, "Acme Industries").await;
    app.seed_deal(COMPANY, customer_id, "100", "100", "0").await;
    app.seed_deal(COMPANY, customer_id, "300", "300", "0").await;
    app.seed_deal(COMPANY, customer_id, "200", "200", "0").await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/{COMPANY}/deals?sort_by=deal_value&sort_order=desc"),
            None,
        )
        .await;
    let body = response_json(response).await;
    let values: Vec<_> = body["data"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| parse_decimal(&d["deal_value"]))
        .collect();
    assert_eq!(values, vec![dec!(300), dec!(200), dec!(100)]);
}

#[tokio::test]
async fn unknown_sort_field_is_rejected_not_interpolated() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/{COMPANY}/deals?sort_by=deal_number;drop%20table%20deals"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn customer_rollup_aggregates_deal_totals() {
    let app = TestApp::new().await;
    let acme = app.seed_customer(COMPANY, "Acme Industries").await;
    let borel = app.seed_customer(COMPANY, "Borel Labs").await;

    app.seed_deal(COMPANY, acme, "10000", "9000", "2000").await;
    app.seed_deal(COMPANY, acme, "5000", "5000", "0").await;
    // Borel has no deals; still present with zero totals.
    let _ = borel;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/{COMPANY}/customers/rollup"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let rows = body["data"]["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);

    let acme_row = rows.iter().find(|r| r["name"] == "Acme Industries").unwrap();
    assert_eq!(acme_row["deal_count"], 2);
    assert_eq!(parse_decimal(&acme_row["total_deal_value"]), dec!(15000));
    assert_eq!(
        parse_decimal(&acme_row["total_balance_amount"]),
        dec!(12000)
    );

    let borel_row = rows.iter().find(|r| r["name"] == "Borel Labs").unwrap();
    assert_eq!(borel_row["deal_count"], 0);
    assert_eq!(parse_decimal(&borel_row["total_deal_value"]), dec!(0));
}

#[tokio::test]
async fn payment_history_replays_running_balance_newest_first() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer(COMPANY, "Acme Industries").await;
    let (deal_id, _) = app
        .seed_deal(COMPANY, customer_id, "10000", "9000", "2000")
        .await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/{COMPANY}/deals/payments"),
            Some(json!({
                "deal_id": deal_id,
                "amount": "3000",
                "payment_method": "Cash",
                "payment_date": "2030-01-01T10:00:00Z",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/{COMPANY}/deals/payments/history?deal_id={deal_id}"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let history = &body["data"];

    assert_eq!(parse_decimal(&history["deal_approval_value"]), dec!(9000));
    assert_eq!(parse_decimal(&history["balance_amount"]), dec!(4000));

    let entries = history["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);

    // Newest first: the 3000 payment leaves 4000, the advance left 7000.
    assert_eq!(parse_decimal(&entries[0]["amount"]), dec!(3000));
    assert_eq!(parse_decimal(&entries[0]["balance_after"]), dec!(4000));
    assert_eq!(entries[1]["payment_method"], "Advance");
    assert_eq!(parse_decimal(&entries[1]["balance_after"]), dec!(7000));
}

#[tokio::test]
async fn repeated_reads_are_idempotent() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer(COMPANY, "Acme Industries").await;
    app.seed_deal(COMPANY, customer_id, "1000", "1000", "0").await;

    let uri = format!("/api/v1/{COMPANY}/deals");
    let first = response_json(app.request(Method::GET, &uri, None).await).await;
    let second = response_json(app.request(Method::GET, &uri, None).await).await;
    assert_eq!(first, second);
}
