//! Integration tests for reservation mutations and queries.

mod common;

use chrono::{Duration, Utc};
use common::{new_reservation, tomorrow, FailingDispatcher, RecordingDispatcher, TestServer};
use tablecast::error::{ServiceError, StoreError, ValidationError};
use tablecast::model::{ReservationFilter, ReservationPatch, ReservationStatus};
use tablecast::notify::template::DEFAULT_MESSAGE_SUBJECT;
use tokio_test::assert_ok;

#[tokio::test]
async fn test_create_and_get() {
    let server = TestServer::start(RecordingDispatcher::default()).await;

    let created = assert_ok!(server.service.create_reservation(tomorrow("res-1")).await);
    assert_eq!(created.id, "res-1");
    assert_eq!(created.status, ReservationStatus::Open);

    let fetched = server.service.get_reservation("res-1").await.unwrap();
    assert_eq!(fetched, created);

    server.stop().await;
}

#[tokio::test]
async fn test_empty_id_gets_generated() {
    let server = TestServer::start(RecordingDispatcher::default()).await;

    let created = server
        .service
        .create_reservation(tomorrow(""))
        .await
        .unwrap();
    assert!(uuid::Uuid::parse_str(&created.id).is_ok());

    server.stop().await;
}

#[tokio::test]
async fn test_rejected_create_writes_nothing() {
    let server = TestServer::start(RecordingDispatcher::default()).await;

    let mut missing_time = tomorrow("bad-1");
    missing_time.reserve_at = None;
    let err = server
        .service
        .create_reservation(missing_time)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::MissingReserveAt)
    ));

    let mut past = tomorrow("bad-2");
    past.created_at = Some(Utc::now());
    past.reserve_at = Some(Utc::now() - Duration::hours(1));
    let err = server.service.create_reservation(past).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::ReserveAtInPast)
    ));
    assert_eq!(
        err.to_string(),
        "Du kannst nicht in die Vergangenheit reservieren."
    );

    assert!(server
        .service
        .list_reservations(None)
        .await
        .unwrap()
        .is_empty());

    server.stop().await;
}

#[tokio::test]
async fn test_update_resets_status_to_open() {
    let server = TestServer::start(RecordingDispatcher::default()).await;
    server
        .service
        .create_reservation(tomorrow("res-2"))
        .await
        .unwrap();

    let confirmed = server
        .service
        .update_reservation_status("res-2", ReservationStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(confirmed.status, ReservationStatus::Confirmed);

    let updated = server
        .service
        .update_reservation(
            "res-2",
            ReservationPatch {
                last_name: Some("Smith".into()),
                amount: Some(6),
                notes: Some("Fensterplatz".into()),
                ..ReservationPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, ReservationStatus::Open);
    assert_eq!(updated.amount, 6);
    assert_eq!(updated.notes.as_deref(), Some("Fensterplatz"));
    assert_eq!(updated.last_name, "Smith");
    assert_eq!(updated.email, confirmed.email);

    let stored = server.service.get_reservation("res-2").await.unwrap();
    assert_eq!(stored, updated);

    server.stop().await;
}

#[tokio::test]
async fn test_update_does_not_revalidate() {
    let server = TestServer::start(RecordingDispatcher::default()).await;
    server
        .service
        .create_reservation(tomorrow("res-3"))
        .await
        .unwrap();

    let updated = server
        .service
        .update_reservation(
            "res-3",
            ReservationPatch {
                amount: Some(0),
                ..ReservationPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.amount, 0);

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let server = TestServer::start(RecordingDispatcher::default()).await;

    let err = server.service.get_reservation("nope").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(ref id) if id == "nope"));

    let err = server
        .service
        .update_reservation("nope", ReservationPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));

    let err = server
        .service
        .update_reservation_status("nope", ReservationStatus::Declined)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));

    server.stop().await;
}

#[tokio::test]
async fn test_list_filters_and_orders_newest_first() {
    let server = TestServer::start(RecordingDispatcher::default()).await;
    let base = Utc::now() + Duration::days(2);

    for (id, offset, amount) in [("a-1", 0, 2), ("a-2", 2, 6), ("b-1", 1, 4)] {
        server
            .service
            .create_reservation(new_reservation(id, base + Duration::hours(offset), amount))
            .await
            .unwrap();
    }
    server
        .service
        .update_reservation_status("b-1", ReservationStatus::Canceled)
        .await
        .unwrap();

    let all = server.service.list_reservations(None).await.unwrap();
    let ids: Vec<_> = all.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["a-2", "b-1", "a-1"]);

    let by_id = server
        .service
        .list_reservations(Some(ReservationFilter {
            id: Some("a-".into()),
            ..ReservationFilter::default()
        }))
        .await
        .unwrap();
    assert_eq!(by_id.len(), 2);

    let canceled = server
        .service
        .list_reservations(Some(ReservationFilter {
            status: Some(ReservationStatus::Canceled),
            ..ReservationFilter::default()
        }))
        .await
        .unwrap();
    assert_eq!(canceled.len(), 1);
    assert_eq!(canceled[0].id, "b-1");

    let big = server
        .service
        .list_reservations(Some(ReservationFilter {
            min_amount: Some(5),
            ..ReservationFilter::default()
        }))
        .await
        .unwrap();
    assert_eq!(big.len(), 1);
    assert_eq!(big[0].id, "a-2");

    let window = server
        .service
        .list_reservations(Some(ReservationFilter {
            date_from: Some(base),
            date_to: Some(base + Duration::hours(1)),
            ..ReservationFilter::default()
        }))
        .await
        .unwrap();
    let ids: Vec<_> = window.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["b-1", "a-1"]);

    server.stop().await;
}

#[tokio::test]
async fn test_send_message_uses_default_subject() {
    let recorder = RecordingDispatcher::default();
    let server = TestServer::start(recorder.clone()).await;
    server
        .service
        .create_reservation(tomorrow("msg-1"))
        .await
        .unwrap();

    server
        .service
        .send_message("msg-1", None, "<p>Ihr Tisch ist bereit.</p>")
        .await
        .unwrap();
    server
        .service
        .send_message("msg-1", Some("Rückfrage"), "<p>Allergien?</p>")
        .await
        .unwrap();

    let sent = recorder.messages();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].subject, DEFAULT_MESSAGE_SUBJECT);
    assert_eq!(sent[0].to, "lena.hoffmann@example.de");
    assert_eq!(sent[1].subject, "Rückfrage");
    assert_eq!(sent[1].body_html, "<p>Allergien?</p>");

    server.stop().await;
}

#[tokio::test]
async fn test_send_message_errors() {
    let server = TestServer::start(FailingDispatcher).await;

    let err = server
        .service
        .send_message("missing", None, "<p>Hallo</p>")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Store(StoreError::NotFound(_))));

    server
        .service
        .create_reservation(tomorrow("msg-2"))
        .await
        .unwrap();
    let err = server
        .service
        .send_message("msg-2", None, "<p>Hallo</p>")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Dispatch(_)));

    server.stop().await;
}

#[tokio::test]
async fn test_data_survives_restart() {
    let server = TestServer::start(RecordingDispatcher::default()).await;
    server
        .service
        .create_reservation(tomorrow("persist-1"))
        .await
        .unwrap();
    let fixture = server.stop().await;

    let server = tablecast::server::Server::start_with(
        &fixture.config,
        RecordingDispatcher::default(),
    )
    .await
    .unwrap();
    let service = server.service();
    let fetched = service.get_reservation("persist-1").await.unwrap();
    assert_eq!(fetched.id, "persist-1");

    drop(service);
    server.shutdown().await.unwrap();
}
