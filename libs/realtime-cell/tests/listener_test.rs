use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use realtime_cell::{SlotEvent, SlotEventChannel, SlotUpdateListener};
use schedule_cell::AvailabilityStore;
use shared_api::BookingApiClient;
use shared_config::AppConfig;

const DEBOUNCE: Duration = Duration::from_millis(100);

async fn schedule_request_count(mock_server: &MockServer, doctor_id: Uuid) -> usize {
    let expected = format!("/api/schedule/{}", doctor_id);
    mock_server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == expected)
        .count()
}

async fn test_store(mock_server: &MockServer) -> (Arc<AvailabilityStore>, Uuid) {
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/api/schedule/{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(mock_server)
        .await;

    let api = Arc::new(BookingApiClient::new(&AppConfig {
        booking_api_url: mock_server.uri(),
        booking_api_key: "test-api-key".to_string(),
        paystack_secret_key: String::new(),
        paystack_base_url: "https://api.paystack.co".to_string(),
        push_gateway_url: String::new(),
    }));

    (Arc::new(AvailabilityStore::new(api, doctor_id)), doctor_id)
}

#[tokio::test]
async fn test_event_triggers_refetch() {
    let mock_server = MockServer::start().await;
    let (store, doctor_id) = test_store(&mock_server).await;
    let channel = SlotEventChannel::new();

    let _handle = SlotUpdateListener::subscribe(store, channel.subscribe(), DEBOUNCE);

    channel.publish(SlotEvent::SlotUpdated);
    tokio::time::sleep(DEBOUNCE * 4).await;

    assert_eq!(schedule_request_count(&mock_server, doctor_id).await, 1);
}

#[tokio::test]
async fn test_event_burst_coalesces_into_one_refetch() {
    let mock_server = MockServer::start().await;
    let (store, doctor_id) = test_store(&mock_server).await;
    let channel = SlotEventChannel::new();

    let _handle = SlotUpdateListener::subscribe(store, channel.subscribe(), DEBOUNCE);

    for _ in 0..5 {
        channel.publish(SlotEvent::SlotUpdated);
    }
    tokio::time::sleep(DEBOUNCE * 4).await;

    assert_eq!(schedule_request_count(&mock_server, doctor_id).await, 1);
}

#[tokio::test]
async fn test_dropped_handle_stops_refetching() {
    let mock_server = MockServer::start().await;
    let (store, doctor_id) = test_store(&mock_server).await;
    let channel = SlotEventChannel::new();

    let handle = SlotUpdateListener::subscribe(store, channel.subscribe(), DEBOUNCE);
    drop(handle);
    tokio::time::sleep(Duration::from_millis(20)).await;

    channel.publish(SlotEvent::SlotUpdated);
    tokio::time::sleep(DEBOUNCE * 4).await;

    assert_eq!(schedule_request_count(&mock_server, doctor_id).await, 0);
    assert_eq!(channel.subscriber_count(), 0);
}

#[tokio::test]
async fn test_unsubscribe_is_deterministic() {
    let mock_server = MockServer::start().await;
    let (store, _doctor_id) = test_store(&mock_server).await;
    let channel = SlotEventChannel::new();

    let handle = SlotUpdateListener::subscribe(store, channel.subscribe(), DEBOUNCE);
    assert!(handle.is_active());

    handle.unsubscribe();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(channel.subscriber_count(), 0);
}

#[tokio::test]
async fn test_refetch_failure_keeps_listener_alive() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/api/schedule/{}", doctor_id)))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let api = Arc::new(BookingApiClient::new(&AppConfig {
        booking_api_url: mock_server.uri(),
        booking_api_key: "test-api-key".to_string(),
        paystack_secret_key: String::new(),
        paystack_base_url: "https://api.paystack.co".to_string(),
        push_gateway_url: String::new(),
    }));
    let store = Arc::new(AvailabilityStore::new(api, doctor_id));
    let channel = SlotEventChannel::new();

    let handle = SlotUpdateListener::subscribe(store, channel.subscribe(), DEBOUNCE);

    channel.publish(SlotEvent::SlotUpdated);
    tokio::time::sleep(DEBOUNCE * 4).await;

    // First refetch failed; the listener still reacts to the next push.
    channel.publish(SlotEvent::SlotUpdated);
    tokio::time::sleep(DEBOUNCE * 4).await;

    assert!(handle.is_active());
    assert_eq!(schedule_request_count(&mock_server, doctor_id).await, 2);
}
