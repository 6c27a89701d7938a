//! Occupancy aggregation over the evening service window.
//!
//! Statistics are computed for one local calendar day. Bucket boundaries are
//! built in the restaurant's zone and converted to UTC before they are
//! compared with stored `reserve_at` values; starts are inclusive, ends
//! exclusive.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};
use serde::Serialize;

use crate::error::StoreError;
use crate::model::{ReservationStatus, BIG_PARTY_SIZE};
use crate::storage::from_db_time;
use crate::storage::reader::ReaderPool;
use crate::storage::to_db_time;

/// First bucket start, local time.
pub const SERVICE_START: (u32, u32) = (17, 0);
/// End of the last bucket, local time.
pub const SERVICE_END: (u32, u32) = (22, 30);
/// Width of one occupancy bucket.
pub const BUCKET_MINUTES: i64 = 30;

/// One half-open `[starts_at, ends_at)` reporting interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyBucket {
    pub starts_at: DateTime<FixedOffset>,
    pub ends_at: DateTime<FixedOffset>,
    pub total_reservation: i64,
    pub total_person: i64,
    pub total_big_reservation: i64,
}

/// Point-in-time summary of the reservation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationStats {
    pub total_reservation: i64,
    pub total_person: i64,
    pub total_big_reservation: i64,
    pub total_open_reservation: i64,
    pub total_confirmed_reservation: i64,
    pub total_canceled_reservation: i64,
    pub total_declined_reservation: i64,
    pub by_hours: Vec<OccupancyBucket>,
}

/// Read-only aggregator over the reservation table.
#[derive(Clone)]
pub struct AvailabilityAggregator {
    readers: ReaderPool,
    tz: Tz,
}

impl AvailabilityAggregator {
    pub fn new(readers: ReaderPool, tz: Tz) -> Self {
        Self { readers, tz }
    }

    /// The zone bucket boundaries are expressed in.
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Today's date in the restaurant's zone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    /// Compute statistics.
    ///
    /// With a `date`, the totals cover that local day only; without one they
    /// cover the whole table. Occupancy buckets always describe a single day,
    /// `date` or today.
    #[tracing::instrument(skip(self))]
    pub fn stats(&self, date: Option<NaiveDate>) -> Result<ReservationStats, StoreError> {
        let day_range = date.map(|d| day_bounds(self.tz, d)).transpose()?;
        let day = date.unwrap_or_else(|| self.today());

        let conn = self.readers.get()?;

        let mut sql = String::from(
            "SELECT COUNT(*), \
                COALESCE(SUM(amount), 0), \
                COALESCE(SUM(CASE WHEN amount >= ? THEN 1 ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN status = 'OPEN' THEN 1 ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN status = 'CONFIRMED' THEN 1 ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN status = 'CANCELED' THEN 1 ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN status = 'DECLINED' THEN 1 ELSE 0 END), 0) \
             FROM reservations",
        );
        let mut args = vec![Value::Integer(i64::from(BIG_PARTY_SIZE))];
        if let Some((start, end)) = &day_range {
            sql.push_str(" WHERE reserve_at >= ? AND reserve_at < ?");
            args.push(Value::Text(to_db_time(start)));
            args.push(Value::Text(to_db_time(end)));
        }

        let mut stats = conn
            .query_row(&sql, params_from_iter(args.iter()), |row| {
                Ok(ReservationStats {
                    total_reservation: row.get(0)?,
                    total_person: row.get(1)?,
                    total_big_reservation: row.get(2)?,
                    total_open_reservation: row.get(3)?,
                    total_confirmed_reservation: row.get(4)?,
                    total_canceled_reservation: row.get(5)?,
                    total_declined_reservation: row.get(6)?,
                    by_hours: Vec::new(),
                })
            })
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let buckets = service_buckets(self.tz, day)?;
        let (Some(window_start), Some(window_end)) = (buckets.first(), buckets.last()) else {
            return Ok(stats);
        };

        let mut stmt = conn
            .prepare(
                "SELECT reserve_at, amount FROM reservations \
                 WHERE status = ?1 AND reserve_at >= ?2 AND reserve_at < ?3",
            )
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let open = stmt
            .query_map(
                params![
                    ReservationStatus::Open,
                    to_db_time(&window_start.0),
                    to_db_time(&window_end.1)
                ],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i32>(1)?)),
            )
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|e| StoreError::Storage(e.to_string()))?
            .into_iter()
            .map(|(raw, amount)| {
                from_db_time(&raw)
                    .map(|at| (at, amount))
                    .map_err(|e| StoreError::Storage(format!("bad reserve_at {raw:?}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        stats.by_hours = fill_buckets(self.tz, &buckets, &open);

        tracing::debug!(
            %day,
            total = stats.total_reservation,
            open_in_window = open.len(),
            "Computed reservation stats"
        );
        Ok(stats)
    }
}

/// Resolve a local wall-clock time to UTC.
///
/// Ambiguous times (autumn DST fold) take the earlier instant; times that
/// fall into a spring-forward gap move to the first valid instant after it.
pub fn local_to_utc(tz: Tz, local: NaiveDateTime) -> Result<DateTime<Utc>, StoreError> {
    let resolved = tz
        .from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest());
    resolved
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| StoreError::Storage(format!("cannot resolve local time {local} in {tz}")))
}

/// UTC bounds of the local calendar day `[00:00, next 00:00)`.
pub fn day_bounds(tz: Tz, date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), StoreError> {
    let next = date
        .succ_opt()
        .ok_or_else(|| StoreError::Storage(format!("no day after {date}")))?;
    Ok((
        local_to_utc(tz, date.and_time(NaiveTime::MIN))?,
        local_to_utc(tz, next.and_time(NaiveTime::MIN))?,
    ))
}

/// UTC bounds of every 30-minute bucket between 17:00 and 22:30 local.
pub fn service_buckets(
    tz: Tz,
    date: NaiveDate,
) -> Result<Vec<(DateTime<Utc>, DateTime<Utc>)>, StoreError> {
    let at = |(h, m): (u32, u32)| {
        NaiveTime::from_hms_opt(h, m, 0)
            .map(|t| date.and_time(t))
            .ok_or_else(|| StoreError::Storage(format!("invalid service time {h}:{m}")))
    };
    let end = at(SERVICE_END)?;
    let step = Duration::minutes(BUCKET_MINUTES);

    let mut buckets = Vec::new();
    let mut current = at(SERVICE_START)?;
    while current < end {
        let next = current + step;
        buckets.push((local_to_utc(tz, current)?, local_to_utc(tz, next)?));
        current = next;
    }
    Ok(buckets)
}

/// Count OPEN reservations per bucket.
fn fill_buckets(
    tz: Tz,
    buckets: &[(DateTime<Utc>, DateTime<Utc>)],
    open: &[(DateTime<Utc>, i32)],
) -> Vec<OccupancyBucket> {
    buckets
        .iter()
        .map(|&(start, end)| {
            let mut bucket = OccupancyBucket {
                starts_at: start.with_timezone(&tz).fixed_offset(),
                ends_at: end.with_timezone(&tz).fixed_offset(),
                total_reservation: 0,
                total_person: 0,
                total_big_reservation: 0,
            };
            for &(_, amount) in open.iter().filter(|(at, _)| *at >= start && *at < end) {
                bucket.total_reservation += 1;
                bucket.total_person += i64::from(amount);
                if amount >= BIG_PARTY_SIZE {
                    bucket.total_big_reservation += 1;
                }
            }
            bucket
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use chrono_tz::Europe::Berlin;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_eleven_half_hour_buckets() {
        let buckets = service_buckets(Berlin, date(2026, 7, 3)).unwrap();
        assert_eq!(buckets.len(), 11);

        let first = buckets[0].0.with_timezone(&Berlin);
        let last = buckets[10].1.with_timezone(&Berlin);
        assert_eq!((first.hour(), first.minute()), (17, 0));
        assert_eq!((last.hour(), last.minute()), (22, 30));

        for (start, end) in &buckets {
            assert_eq!(*end - *start, Duration::minutes(30));
        }
        for pair in buckets.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }

    #[test]
    fn test_day_bounds_follow_local_midnight() {
        // Summer time: Berlin is UTC+2.
        let (start, end) = day_bounds(Berlin, date(2026, 7, 3)).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 7, 2, 22, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 7, 3, 22, 0, 0).unwrap());

        // Clocks go back on 2026-10-25, so that local day lasts 25 hours.
        let (start, end) = day_bounds(Berlin, date(2026, 10, 25)).unwrap();
        assert_eq!(end - start, Duration::hours(25));
    }

    #[test]
    fn test_fill_buckets_is_half_open() {
        let buckets = service_buckets(Berlin, date(2026, 7, 3)).unwrap();
        let first_start = buckets[0].0;
        let first_end = buckets[0].1;

        let open = vec![
            (first_start, 2),
            (first_end, 6),
            (first_start - Duration::seconds(1), 3),
        ];
        let filled = fill_buckets(Berlin, &buckets, &open);

        assert_eq!(filled[0].total_reservation, 1);
        assert_eq!(filled[0].total_person, 2);
        assert_eq!(filled[0].total_big_reservation, 0);
        assert_eq!(filled[1].total_reservation, 1);
        assert_eq!(filled[1].total_big_reservation, 1);
        assert_eq!(filled.iter().map(|b| b.total_reservation).sum::<i64>(), 2);
    }

    #[test]
    fn test_gap_time_moves_forward() {
        // 02:30 does not exist on 2026-03-29 in Berlin.
        let local = date(2026, 3, 29).and_hms_opt(2, 30, 0).unwrap();
        let resolved = local_to_utc(Berlin, local).unwrap();
        assert_eq!(resolved, Utc.with_ymd_and_hms(2026, 3, 29, 1, 30, 0).unwrap());
    }
}
