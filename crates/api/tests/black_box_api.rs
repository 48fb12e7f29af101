use std::sync::Arc;

use eventive_api::app::{build_router, AppServices};
use eventive_infra::catalog::{CatalogSeed, InMemoryCatalog};
use eventive_infra::BookingOptions;
use reqwest::StatusCode;
use serde_json::json;

const USER_HEADER: &str = "x-eventive-user";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory services, ephemeral port.
        let seed: CatalogSeed = serde_json::from_value(catalog_seed()).expect("valid catalog seed");
        let services = AppServices::in_memory(InMemoryCatalog::from_seed(seed), BookingOptions::default());
        let app = build_router(Arc::new(services));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn catalog_seed() -> serde_json::Value {
    json!({
        "events": [
            { "id": "EVT-1", "name": "RustConf", "capacity": 3, "is_published": true, "venue": "Hall A" },
            { "id": "EVT-SMALL", "name": "Workshop", "capacity": 1, "is_published": true },
            { "id": "EVT-DRAFT", "name": "Draft", "capacity": 10, "is_published": false }
        ],
        "ticket_types": [
            { "id": "VIP", "event": "EVT-1", "category": "VIP", "price": 250,
              "included_merchandise": [{ "item": "shirt", "quantity": 1 }] },
            { "id": "GA", "event": "EVT-1", "category": "General", "price": 100 },
            { "id": "WS", "event": "EVT-SMALL", "category": "Seat", "price": 40 }
        ],
        "merchandise": [
            { "id": "shirt", "name": "T-Shirt", "unit_price": 30 },
            { "id": "cap", "name": "Cap", "unit_price": 15 }
        ]
    })
}

fn two_attendee_booking() -> serde_json::Value {
    json!({
        "event_id": "EVT-1",
        "email": "booker@example.com",
        "attendees": [
            { "full_name": "Ada", "email": "ada@example.com", "ticket_type": "GA",
              "merchandise": [{ "item": "cap", "quantity": 2 }] },
            { "full_name": "Bob", "email": "bob@example.com", "ticket_type": "VIP" }
        ]
    })
}

async fn book(client: &reqwest::Client, base_url: &str, body: &serde_json::Value) -> serde_json::Value {
    let res = client
        .post(format!("{}/bookings", base_url))
        .json(body)
        .send()
        .await
        .unwrap();
    if res.status() != StatusCode::CREATED {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        panic!("expected 201 Created from booking, got {status} body={body}");
    }
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn caller_identity_comes_from_header() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/whoami", srv.base_url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["authenticated"], false);

    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .header(USER_HEADER, "Ada@Example.com")
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["email"], "ada@example.com");

    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .header(USER_HEADER, "not-an-email")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn booking_issues_one_ticket_per_attendee() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = book(&client, &srv.base_url, &two_attendee_booking()).await;
    let tickets = created["tickets"].as_array().unwrap();
    assert_eq!(tickets.len(), 2);
    assert_eq!(created["status"], "Pending");
    // GA 100 + 2 caps at 15 + VIP 250 with its shirt included at no charge.
    assert_eq!(created["total_amount"], 380);
    for ticket in tickets {
        let qr = ticket["qr_code"].as_str().unwrap();
        assert!(qr.starts_with("/artifacts/Ticket_"));
        assert!(qr.ends_with(".png"));
    }

    let res = client
        .get(format!("{}/events/EVT-1/capacity", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["reserved"], 2);
}

#[tokio::test]
async fn booking_rejections_map_to_status_codes() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/bookings", srv.base_url))
        .json(&json!({ "event_id": "EVT-1", "email": "booker@example.com", "attendees": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/bookings", srv.base_url))
        .json(&json!({
            "event_id": "EVT-SMALL",
            "email": "booker@example.com",
            "attendees": [
                { "full_name": "Ada", "email": "ada@example.com", "ticket_type": "WS" },
                { "full_name": "Bob", "email": "bob@example.com", "ticket_type": "WS" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "capacity_exceeded");
    assert_eq!(body["requested"], 2);
    assert_eq!(body["available"], 1);

    let res = client
        .post(format!("{}/bookings", srv.base_url))
        .json(&json!({
            "event_id": "EVT-1",
            "email": "booker@example.com",
            "attendees": [
                { "full_name": "Ada", "email": "ada@example.com", "ticket_type": "GA",
                  "merchandise": [{ "item": "mug", "quantity": 1 }] }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unknown_item");

    let res = client
        .post(format!("{}/bookings", srv.base_url))
        .json(&json!({
            "event_id": "EVT-DRAFT",
            "email": "booker@example.com",
            "attendees": [{ "full_name": "Ada", "email": "ada@example.com", "ticket_type": "GA" }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Failed attempts hold no seats.
    let res = client
        .get(format!("{}/events/EVT-1/capacity", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["reserved"], 0);
}

#[tokio::test]
async fn registration_and_ticket_lookups() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/registrations", srv.base_url))
        .query(&[("email", "booker@example.com"), ("event_id", "EVT-1")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "has_registration": false }));

    book(&client, &srv.base_url, &two_attendee_booking()).await;

    let res = client
        .get(format!("{}/registrations", srv.base_url))
        .query(&[("email", "Booker@Example.com"), ("event_id", "EVT-1")])
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["has_registration"], true);
    assert_eq!(body["event_name"], "RustConf");
    assert_eq!(body["attendees"].as_array().unwrap().len(), 2);
    assert_eq!(body["tickets"].as_array().unwrap().len(), 2);

    let res = client
        .get(format!("{}/tickets", srv.base_url))
        .query(&[("email", "bob@example.com"), ("event_id", "EVT-1")])
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["has_ticket"], true);
    assert_eq!(body["ticket_type"], "VIP");
    assert_eq!(body["ticket_price"], 250);
    assert_eq!(body["venue"], "Hall A");
    assert_eq!(body["merchandise"][0]["item"], "shirt");

    let res = client
        .get(format!("{}/tickets/status", srv.base_url))
        .query(&[("email", "carol@example.com"), ("event_id", "EVT-1")])
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "has_ticket": false }));

    let res = client
        .get(format!("{}/tickets", srv.base_url))
        .query(&[("email", ""), ("event_id", "EVT-1")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ticket_download_is_limited_to_holder_and_booker() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = book(&client, &srv.base_url, &two_attendee_booking()).await;
    let ada_ticket = created["tickets"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["email"] == "ada@example.com")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();
    let url = format!("{}/tickets/{}/download", srv.base_url, ada_ticket);

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.get(&url).header(USER_HEADER, "mallory@example.com").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client.get(&url).header(USER_HEADER, "booker@example.com").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(&url).header(USER_HEADER, "ada@example.com").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["event_name"], "RustConf");
    let qr = body["qr_code"].as_str().unwrap().to_string();

    let res = client.get(format!("{}{}", srv.base_url, qr)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/png");
    let bytes = res.bytes().await.unwrap();
    assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);

    let res = client
        .get(format!("{}/tickets/mine", srv.base_url))
        .header(USER_HEADER, "ada@example.com")
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn cancel_releases_capacity_and_revokes_tickets() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = book(&client, &srv.base_url, &two_attendee_booking()).await;
    let id = created["registration_id"].as_str().unwrap().to_string();
    let cancel_url = format!("{}/registrations/{}/cancel", srv.base_url, id);

    let res = client.post(&cancel_url).header(USER_HEADER, "ada@example.com").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client.post(&cancel_url).header(USER_HEADER, "booker@example.com").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "Cancelled");

    let res = client
        .get(format!("{}/tickets/status", srv.base_url))
        .query(&[("email", "ada@example.com"), ("event_id", "EVT-1")])
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["has_ticket"], false);

    let res = client
        .get(format!("{}/events/EVT-1/capacity", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["reserved"], 0);
}

#[tokio::test]
async fn only_the_booker_confirms_payment() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = book(&client, &srv.base_url, &two_attendee_booking()).await;
    let id = created["registration_id"].as_str().unwrap().to_string();
    let url = format!("{}/registrations/{}/confirm", srv.base_url, id);

    let res = client.post(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.post(&url).header(USER_HEADER, "ada@example.com").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client.post(&url).header(USER_HEADER, "booker@example.com").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "Confirmed");
    assert_eq!(body["payment_status"], "Paid");
}

#[tokio::test]
async fn attendee_can_change_their_merchandise() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = book(&client, &srv.base_url, &two_attendee_booking()).await;
    let id = created["registration_id"].as_str().unwrap().to_string();
    let url = format!("{}/registrations/{}/attendees/merchandise", srv.base_url, id);
    let body = json!({ "attendee_email": "ada@example.com", "merchandise": [{ "item": "shirt", "quantity": 2 }] });

    let res = client.put(&url).json(&body).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .put(&url)
        .header(USER_HEADER, "bob@example.com")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .put(&url)
        .header(USER_HEADER, "ada@example.com")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let detail: serde_json::Value = res.json().await.unwrap();
    // GA 100 + two shirts at 30 + VIP 250.
    assert_eq!(detail["total_amount"], 410);
}

#[tokio::test]
async fn check_in_marks_ticket_used() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = book(&client, &srv.base_url, &two_attendee_booking()).await;
    let ticket = created["tickets"][0]["id"].as_str().unwrap().to_string();
    let url = format!("{}/tickets/{}/check-in", srv.base_url, ticket);

    let res = client.post(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.post(&url).header(USER_HEADER, "bob@example.com").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client.post(&url).header(USER_HEADER, "ada@example.com").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["checked_in"], true);
    assert_eq!(body["status"], "CheckedIn");

    let res = client.post(format!("{}/tickets/not-a-uuid/check-in", srv.base_url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ticket_types_are_sorted_by_price() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/events/EVT-1/ticket-types", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let ids: Vec<&str> = body.as_array().unwrap().iter().map(|t| t["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["GA", "VIP"]);

    let res = client
        .get(format!("{}/events/NOPE/ticket-types", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
