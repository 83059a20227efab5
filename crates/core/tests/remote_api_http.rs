//! HTTP-level tests for [`HttpRemoteApi`] against a wiremock server.
//!
//! These verify the request shapes (paths, query parameters, API key
//! header, JSON bodies) and the status → error mapping.

use std::time::Duration;

use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use contactsync_core::errors::RemoteApiError;
use contactsync_core::models::{Client, ContactPayload, RemoteContact};
use contactsync_core::remote::{HttpRemoteApi, RemoteApi};

fn api(server: &MockServer) -> HttpRemoteApi {
    HttpRemoteApi::new(server.uri(), "key_123", Duration::from_secs(5))
}

fn jane_contact(id: u64) -> RemoteContact {
    RemoteContact {
        id,
        name: "Jane Doe".into(),
        email: "jane@x.com".into(),
        title: "Account Manager".into(),
        department: "Sales".into(),
        phone: "0301234567".into(),
        mobile: "01701234567".into(),
        extension: "1234".into(),
        client_id: 101,
    }
}

fn jane_payload() -> ContactPayload {
    ContactPayload {
        name: "Jane Doe".into(),
        email: "jane@x.com".into(),
        title: "Account Manager".into(),
        department: "Sales".into(),
        phone: "0301234567".into(),
        mobile: "01701234567".into(),
        extension: "1234".into(),
        client_id: 101,
    }
}

#[tokio::test]
async fn find_by_email_sends_query_and_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contacts"))
        .and(query_param("email", "jane@x.com"))
        .and(header("X-Api-Key", "key_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![jane_contact(7)]))
        .expect(1)
        .mount(&server)
        .await;

    let found = api(&server)
        .find_contact_by_email("jane@x.com")
        .await
        .unwrap();
    let contact = found.expect("contact should be found");
    assert_eq!(contact.id, 7);
    assert_eq!(contact.client_id, 101);
}

#[tokio::test]
async fn find_by_email_empty_result_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contacts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<RemoteContact>::new()))
        .mount(&server)
        .await;

    let found = api(&server)
        .find_contact_by_email("nobody@x.com")
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn find_by_email_multiple_matches_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contacts"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(vec![jane_contact(7), jane_contact(8)]),
        )
        .mount(&server)
        .await;

    let result = api(&server).find_contact_by_email("jane@x.com").await;
    assert!(matches!(
        result,
        Err(RemoteApiError::AmbiguousEmail { count: 2, .. })
    ));
}

#[tokio::test]
async fn create_posts_payload_to_contacts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/contacts"))
        .and(header("X-Api-Key", "key_123"))
        .and(body_json(jane_payload()))
        .respond_with(ResponseTemplate::new(201).set_body_json(jane_contact(42)))
        .expect(1)
        .mount(&server)
        .await;

    let created = api(&server).create_contact(&jane_payload()).await.unwrap();
    assert_eq!(created.id, 42);
}

#[tokio::test]
async fn update_puts_payload_to_contact_id() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/contacts/7"))
        .and(body_json(jane_payload()))
        .respond_with(ResponseTemplate::new(200).set_body_json(jane_contact(7)))
        .expect(1)
        .mount(&server)
        .await;

    let updated = api(&server).update_contact(7, &jane_payload()).await.unwrap();
    assert_eq!(updated.id, 7);
}

#[tokio::test]
async fn update_missing_contact_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/contacts/999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = api(&server).update_contact(999, &jane_payload()).await;
    assert!(matches!(result, Err(RemoteApiError::ContactNotFound(999))));
}

#[tokio::test]
async fn list_clients_returns_live_list() {
    let server = MockServer::start().await;
    let clients = vec![
        Client {
            id: 101,
            name: "Acme GmbH".into(),
        },
        Client {
            id: 102,
            name: "Workshop AG".into(),
        },
    ];
    Mock::given(method("GET"))
        .and(path("/clients"))
        .and(header("X-Api-Key", "key_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(clients.clone()))
        .mount(&server)
        .await;

    let listed = api(&server).list_clients().await.unwrap();
    assert_eq!(listed, clients);
}

#[tokio::test]
async fn unauthorized_maps_to_authentication_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clients"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = api(&server).list_clients().await;
    assert!(matches!(
        result,
        Err(RemoteApiError::AuthenticationFailed(_))
    ));
}

#[tokio::test]
async fn server_error_maps_to_api_error_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contacts"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = api(&server).find_contact_by_email("jane@x.com").await;
    assert!(matches!(
        result,
        Err(RemoteApiError::ApiError { status: 500, .. })
    ));
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_tolerated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<Client>::new()))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpRemoteApi::new(
        format!("{}/", server.uri()),
        "key_123",
        Duration::from_secs(5),
    );
    let listed = api.list_clients().await.unwrap();
    assert!(listed.is_empty());
}
