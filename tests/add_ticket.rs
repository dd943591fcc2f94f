pub mod common;

use repairs_api::api;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn creates_valid_ticket() {
    let server = common::Server::start().await;
    let alice = server.client().auth("alice", "password").await;

    let (status, ticket) = alice
        .add_ticket_json(json!({
            "description": "leaky faucet",
            "emergency": false,
        }))
        .await
        .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        ticket,
        json!({
            "id": 2,
            "description": "leaky faucet",
            "emergency": false,
            "date_completed": null,
            "employee": null,
            "customer": {
                "id": 1,
                "address": "100 Main St",
                "full_name": "Alice Smith",
            },
        }),
    );
}

#[tokio::test]
async fn persists_created_ticket() {
    let server = common::Server::start().await;
    let bob = server.client().auth("bob", "password").await;

    let created = bob.add_ticket("no hot water", true).await.unwrap();
    let stored = bob.get_ticket(created.id).await.unwrap();

    assert_eq!(stored, created);
    assert!(stored.emergency);
    assert_eq!(stored.customer.id, api::customer::Id::from(2));
}

#[tokio::test]
async fn cant_create_without_description() {
    let server = common::Server::start().await;
    let alice = server.client().auth("alice", "password").await;

    let status = alice
        .add_ticket_json(json!({ "emergency": false }))
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cant_create_without_emergency() {
    let server = common::Server::start().await;
    let alice = server.client().auth("alice", "password").await;

    let status = alice
        .add_ticket_json(json!({ "description": "leaky faucet" }))
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cant_create_with_malformed_payload() {
    let server = common::Server::start().await;
    let alice = server.client().auth("alice", "password").await;

    let status = alice
        .add_ticket_json(json!({
            "description": "leaky faucet",
            "emergency": "maybe",
        }))
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cant_create_without_customer_record() {
    let server = common::Server::start().await;
    let carol = server.client().auth("carol", "password").await;

    let status = carol.add_ticket("leaky faucet", false).await.unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let tickets = carol.get_tickets(None).await.unwrap();
    assert_eq!(tickets.len(), 1);
}
