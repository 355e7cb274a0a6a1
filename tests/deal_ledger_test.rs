//! Integration tests for the deal ledger: creation with advance payments,
//! balance maintenance across payment writes, and server-side invariants.

mod common;

use axum::http::{Method, StatusCode};
use common::{parse_decimal, parse_uuid, response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

const COMPANY: i64 = 1;

#[tokio::test]
async fn create_deal_with_advance_opens_ledger() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer(COMPANY, "Acme Industries").await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/{COMPANY}/deals"),
            Some(json!({
                "customer_id": customer_id,
                "requirement": "Spindle rebuild",
                "deal_value": "10000",
                "deal_approval_value": "9000",
                "advance_payment": "2000",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert!(body["success"].as_bool().unwrap());
    let deal = &body["data"];
    assert_eq!(parse_decimal(&deal["balance_amount"]), dec!(7000));
    let deal_number = deal["deal_number"].as_str().unwrap();
    assert!(
        deal_number.starts_with("ACME"),
        "number should start with the name prefix, got {deal_number}"
    );
    assert!(deal_number.ends_with("001"));

    // Exactly one Advance payment for the advance amount.
    let deal_id = parse_uuid(&deal["id"]);
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/{COMPANY}/deals/payments?deal_id={deal_id}"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payments = response_json(response).await;
    let entries = payments["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["payment_method"], "Advance");
    assert_eq!(parse_decimal(&entries[0]["amount"]), dec!(2000));
}

#[tokio::test]
async fn create_deal_without_advance_has_no_payments() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer(COMPANY, "Borel Labs").await;
    let (deal_id, balance) = app
        .seed_deal(COMPANY, customer_id, "5000", "5000", "0")
        .await;
    assert_eq!(balance, dec!(5000));

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/{COMPANY}/deals/payments?deal_id={deal_id}"),
            None,
        )
        .await;
    let payments = response_json(response).await;
    assert!(payments["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn create_deal_for_unknown_customer_is_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/{COMPANY}/deals"),
            Some(json!({
                "customer_id": uuid::Uuid::new_v4(),
                "deal_value": "100",
                "deal_approval_value": "100",
                "advance_payment": "0",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn advance_beyond_approval_is_rejected() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer(COMPANY, "Acme Industries").await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/{COMPANY}/deals"),
            Some(json!({
                "customer_id": customer_id,
                "deal_value": "10000",
                "deal_approval_value": "1000",
                "advance_payment": "2000",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ledger_scenario_record_then_delete_restores_balance() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer(COMPANY, "Acme Industries").await;
    let (deal_id, balance) = app
        .seed_deal(COMPANY, customer_id, "10000", "9000", "2000")
        .await;
    assert_eq!(balance, dec!(7000));

    // Record a payment of 3000: balance drops to 4000.
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/{COMPANY}/deals/payments"),
            Some(json!({
                "deal_id": deal_id,
                "amount": "3000",
                "payment_method": "Bank Transfer",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let payment = response_json(response).await;
    let payment_id = parse_uuid(&payment["data"]["id"]);

    let deal = app.fetch_deal(COMPANY, deal_id).await;
    assert_eq!(parse_decimal(&deal["balance_amount"]), dec!(4000));

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/{COMPANY}/deals/payments?deal_id={deal_id}"),
            None,
        )
        .await;
    let payments = response_json(response).await;
    assert_eq!(payments["data"].as_array().unwrap().len(), 2);

    // Delete the 3000 payment: balance returns to exactly 7000.
    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/{COMPANY}/deals/payments"),
            Some(json!({ "id": payment_id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let deal = app.fetch_deal(COMPANY, deal_id).await;
    assert_eq!(parse_decimal(&deal["balance_amount"]), dec!(7000));
}

#[tokio::test]
async fn overdraw_is_rejected_and_mutates_nothing() {
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
                "amount": "7001",
                "payment_method": "Cash",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Balance untouched, ledger still only holds the advance.
    let deal = app.fetch_deal(COMPANY, deal_id).await;
    assert_eq!(parse_decimal(&deal["balance_amount"]), dec!(7000));

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/{COMPANY}/deals/payments?deal_id={deal_id}"),
            None,
        )
        .await;
    let payments = response_json(response).await;
    assert_eq!(payments["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn zero_or_negative_amounts_are_rejected() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer(COMPANY, "Acme Industries").await;
    let (deal_id, _) = app
        .seed_deal(COMPANY, customer_id, "1000", "1000", "0")
        .await;

    for amount in ["0", "-50"] {
        let response = app
            .request(
                Method::POST,
                &format!("/api/v1/{COMPANY}/deals/payments"),
                Some(json!({
                    "deal_id": deal_id,
                    "amount": amount,
                    "payment_method": "Cash",
                })),
            )
            .await;
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "amount {amount} must be rejected"
        );
    }
}

#[tokio::test]
async fn unknown_payment_method_is_rejected() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer(COMPANY, "Acme Industries").await;
    let (deal_id, _) = app
        .seed_deal(COMPANY, customer_id, "1000", "1000", "0")
        .await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/{COMPANY}/deals/payments"),
            Some(json!({
                "deal_id": deal_id,
                "amount": "100",
                "payment_method": "barter",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn payment_update_moves_balance_by_delta() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer(COMPANY, "Acme Industries").await;
    let (deal_id, _) = app
        .seed_deal(COMPANY, customer_id, "10000", "9000", "0")
        .await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/{COMPANY}/deals/payments"),
            Some(json!({
                "deal_id": deal_id,
                "amount": "4000",
                "payment_method": "Cheque",
            })),
        )
        .await;
    let payment_id = parse_uuid(&response_json(response).await["data"]["id"]);

    // 4000 -> 2500: balance gains 1500.
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/{COMPANY}/deals/payments"),
            Some(json!({
                "id": payment_id,
                "amount": "2500",
                "payment_method": "Cheque",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let deal = app.fetch_deal(COMPANY, deal_id).await;
    assert_eq!(parse_decimal(&deal["balance_amount"]), dec!(6500));

    // 2500 -> 9500 would overdraw (only 6500 remains above the other edits).
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/{COMPANY}/deals/payments"),
            Some(json!({
                "id": payment_id,
                "amount": "9500",
                "payment_method": "Cheque",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let deal = app.fetch_deal(COMPANY, deal_id).await;
    assert_eq!(parse_decimal(&deal["balance_amount"]), dec!(6500));
}

#[tokio::test]
async fn deal_update_recomputes_balance_from_ledger() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer(COMPANY, "Acme Industries").await;
    let (deal_id, _) = app
        .seed_deal(COMPANY, customer_id, "10000", "9000", "2000")
        .await;

    // Raise the approved value: balance = 9500 - 2000 already paid.
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/{COMPANY}/deals"),
            Some(json!({
                "id": deal_id,
                "deal_approval_value": "9500",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(parse_decimal(&body["data"]["balance_amount"]), dec!(7500));

    // Lowering the approval below the paid total is a ledger violation.
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/{COMPANY}/deals"),
            Some(json!({
                "id": deal_id,
                "deal_approval_value": "1500",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_a_deal_removes_its_payments() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer(COMPANY, "Acme Industries").await;
    let (deal_id, _) = app
        .seed_deal(COMPANY, customer_id, "10000", "9000", "2000")
        .await;

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/{COMPANY}/deals"),
            Some(json!({ "id": deal_id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Payments went with the deal; the listing reports the deal as gone.
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/{COMPANY}/deals/payments?deal_id={deal_id}"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(Method::GET, &format!("/api/v1/{COMPANY}/deals"), None)
        .await;
    let body = response_json(response).await;
    assert!(body["data"]["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_missing_deal_is_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/{COMPANY}/deals"),
            Some(json!({ "id": uuid::Uuid::new_v4() })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn payment_referencing_unknown_employee_is_not_found() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer(COMPANY, "Acme Industries").await;
    let (deal_id, _) = app
        .seed_deal(COMPANY, customer_id, "1000", "1000", "0")
        .await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/{COMPANY}/deals/payments"),
            Some(json!({
                "deal_id": deal_id,
                "amount": "100",
                "payment_method": "UPI",
                "created_by_id": uuid::Uuid::new_v4(),
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn payments_list_carries_recorder_identity() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer(COMPANY, "Acme Industries").await;
    let employee_id = app
        .seed_employee(COMPANY, "Priya Nair", "priya@dealdesk.io")
        .await;
    let (deal_id, _) = app
        .seed_deal(COMPANY, customer_id, "5000", "5000", "0")
        .await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/{COMPANY}/deals/payments"),
            Some(json!({
                "deal_id": deal_id,
                "amount": "1200",
                "payment_method": "UPI",
                "created_by_id": employee_id,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/{COMPANY}/deals/payments?deal_id={deal_id}"),
            None,
        )
        .await;
    let payments = response_json(response).await;
    let entry = &payments["data"][0];
    assert_eq!(entry["recorded_by_name"], "Priya Nair");
    assert_eq!(entry["recorded_by_email"], "priya@dealdesk.io");
}
