//! Integration tests for occupancy statistics.

mod common;

use chrono::{Days, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Europe::Berlin;
use common::{new_reservation, RecordingDispatcher, TestServer};
use tablecast::model::ReservationStatus;
use tablecast::stats::local_to_utc;

fn future_day(days: u64) -> NaiveDate {
    Utc::now()
        .with_timezone(&Berlin)
        .date_naive()
        .checked_add_days(Days::new(days))
        .unwrap()
}

fn at(day: NaiveDate, hour: u32, minute: u32) -> chrono::DateTime<Utc> {
    let local = day.and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap());
    local_to_utc(Berlin, local).unwrap()
}

#[tokio::test]
async fn test_day_totals_and_buckets() {
    let server = TestServer::start(RecordingDispatcher::default()).await;
    let service = &server.service;
    let day = future_day(7);

    service
        .create_reservation(new_reservation("s-1", at(day, 17, 15), 2))
        .await
        .unwrap();
    service
        .create_reservation(new_reservation("s-2", at(day, 19, 0), 6))
        .await
        .unwrap();
    service
        .create_reservation(new_reservation("s-3", at(day, 18, 0), 4))
        .await
        .unwrap();
    service
        .update_reservation_status("s-3", ReservationStatus::Confirmed)
        .await
        .unwrap();
    // Next day, outside the requested date.
    service
        .create_reservation(new_reservation("s-4", at(future_day(8), 19, 0), 3))
        .await
        .unwrap();

    let stats = service.get_stats(Some(day)).await.unwrap();
    assert_eq!(stats.total_reservation, 3);
    assert_eq!(stats.total_person, 12);
    assert_eq!(stats.total_big_reservation, 1);
    assert_eq!(stats.total_open_reservation, 2);
    assert_eq!(stats.total_confirmed_reservation, 1);
    assert_eq!(stats.total_canceled_reservation, 0);
    assert_eq!(stats.total_declined_reservation, 0);

    assert_eq!(stats.by_hours.len(), 11);
    let first = &stats.by_hours[0];
    assert_eq!((first.starts_at.hour(), first.starts_at.minute()), (17, 0));
    assert_eq!(first.total_reservation, 1);
    assert_eq!(first.total_person, 2);
    assert_eq!(first.total_big_reservation, 0);

    // 18:00 only holds the confirmed reservation, which is not counted.
    assert_eq!(stats.by_hours[2].total_reservation, 0);

    let seven = &stats.by_hours[4];
    assert_eq!((seven.starts_at.hour(), seven.starts_at.minute()), (19, 0));
    assert_eq!(seven.total_reservation, 1);
    assert_eq!(seven.total_person, 6);
    assert_eq!(seven.total_big_reservation, 1);

    let open_in_buckets: i64 = stats.by_hours.iter().map(|b| b.total_reservation).sum();
    assert_eq!(open_in_buckets, 2);

    server.stop().await;
}

#[tokio::test]
async fn test_totals_without_date_cover_whole_table() {
    let server = TestServer::start(RecordingDispatcher::default()).await;
    let service = &server.service;

    service
        .create_reservation(new_reservation("w-1", at(future_day(3), 20, 0), 5))
        .await
        .unwrap();
    service
        .create_reservation(new_reservation("w-2", at(future_day(10), 18, 30), 2))
        .await
        .unwrap();
    service
        .update_reservation_status("w-2", ReservationStatus::Declined)
        .await
        .unwrap();

    let stats = service.get_stats(None).await.unwrap();
    assert_eq!(stats.total_reservation, 2);
    assert_eq!(stats.total_person, 7);
    assert_eq!(stats.total_big_reservation, 1);
    assert_eq!(stats.total_open_reservation, 1);
    assert_eq!(stats.total_declined_reservation, 1);

    // Buckets describe today, which has no reservations.
    assert_eq!(stats.by_hours.len(), 11);
    assert!(stats.by_hours.iter().all(|b| b.total_reservation == 0));

    server.stop().await;
}

#[tokio::test]
async fn test_empty_day() {
    let server = TestServer::start(RecordingDispatcher::default()).await;

    let stats = server
        .service
        .get_stats(Some(future_day(1)))
        .await
        .unwrap();
    assert_eq!(stats.total_reservation, 0);
    assert_eq!(stats.total_person, 0);
    assert_eq!(stats.by_hours.len(), 11);

    let json = serde_json::to_value(&stats).unwrap();
    assert!(json.get("totalBigReservation").is_some());
    assert!(json["byHours"][0].get("startsAt").is_some());

    server.stop().await;
}
