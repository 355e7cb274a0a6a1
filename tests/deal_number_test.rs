//! Deal number assignment: per-customer daily sequences and distinctness
//! under concurrent creation.

mod common;

use common::TestApp;
use dealdesk_api::services::deals::CreateDealRequest;
use rust_decimal_macros::dec;
use std::collections::HashSet;

const COMPANY: i64 = 1;

fn plain_request(customer_id: uuid::Uuid) -> CreateDealRequest {
    CreateDealRequest {
        customer_id,
        requirement: None,
        deal_value: dec!(1000),
        deal_approval_value: dec!(1000),
        advance_payment: dec!(0),
        balance_amount: None,
    }
}

#[tokio::test]
async fn sequences_advance_per_customer_per_day() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer(COMPANY, "Acme Industries").await;
    let deals = app.state.services.deals.clone();

    let first = deals
        .create_deal(COMPANY, plain_request(customer_id))
        .await
        .unwrap();
    let second = deals
        .create_deal(COMPANY, plain_request(customer_id))
        .await
        .unwrap();
    let third = deals
        .create_deal(COMPANY, plain_request(customer_id))
        .await
        .unwrap();

    assert!(first.deal_number.ends_with("001"));
    assert!(second.deal_number.ends_with("002"));
    assert!(third.deal_number.ends_with("003"));

    let prefix = &first.deal_number[..first.deal_number.len() - 3];
    assert!(second.deal_number.starts_with(prefix));
    assert!(third.deal_number.starts_with(prefix));
}

#[tokio::test]
async fn customers_with_identical_names_sequence_independently() {
    let app = TestApp::new().await;
    let first_acme = app.seed_customer(COMPANY, "Acme Industries").await;
    let second_acme = app.seed_customer(COMPANY, "Acme Industries").await;
    let deals = app.state.services.deals.clone();

    let first = deals
        .create_deal(COMPANY, plain_request(first_acme))
        .await
        .unwrap();
    let second = deals
        .create_deal(COMPANY, plain_request(second_acme))
        .await
        .unwrap();

    // Same prefix and same sequence: uniqueness is scoped per customer.
    assert_eq!(first.deal_number, second.deal_number);
    assert_ne!(first.customer_id, second.customer_id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creations_for_one_customer_yield_distinct_numbers() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer(COMPANY, "Acme Industries").await;
    let deals = app.state.services.deals.clone();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = deals.clone();
        handles.push(tokio::spawn(async move {
            service
                .create_deal(COMPANY, plain_request(customer_id))
                .await
        }));
    }

    let mut numbers = HashSet::new();
    for handle in handles {
        let deal = handle.await.unwrap().expect("concurrent create succeeds");
        assert!(
            numbers.insert(deal.deal_number.clone()),
            "duplicate deal number assigned: {}",
            deal.deal_number
        );
    }

    assert_eq!(numbers.len(), 8);
}

#[tokio::test]
async fn short_customer_names_keep_short_prefixes() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer(COMPANY, "Al").await;
    let deals = app.state.services.deals.clone();

    let deal = deals
        .create_deal(COMPANY, plain_request(customer_id))
        .await
        .unwrap();

    assert!(deal.deal_number.starts_with("AL"));
    // AL + DDMM + NNN
    assert_eq!(deal.deal_number.len(), 2 + 4 + 3);
}
