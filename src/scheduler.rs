//! Daily background refresh.
//!
//! Sleeps until the configured local wall-clock time, forces a refresh, and
//! repeats. The next tick is published on the service so the status endpoint
//! can report it.

use crate::service::HackathonService;
use chrono::{DateTime, Local, NaiveTime, TimeDelta, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// The first instant strictly after `now` whose wall-clock time is `at`.
///
/// A time skipped by a DST transition falls on the first valid instant an
/// hour later.
pub fn next_occurrence<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let local_now = now.naive_local();
    let mut day = local_now.date();
    if day.and_time(at) <= local_now {
        day = day.succ_opt().unwrap_or(day);
    }
    let naive = day.and_time(at);
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + TimeDelta::hours(1))).earliest())
        .unwrap_or_else(|| now.clone() + TimeDelta::days(1))
}

/// Spawn the daily refresh loop.
pub fn spawn_daily_refresh(service: Arc<HackathonService>, at: NaiveTime) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Local::now();
            let next = next_occurrence(&now, at);
            service.set_next_refresh(Some(next.with_timezone(&Utc))).await;
            info!(next = %next, "Scheduled daily refresh");

            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            sleep(wait).await;

            info!("Daily refresh starting");
            match service.refresh_now().await {
                Ok(0) => warn!("Daily refresh produced an empty feed"),
                Ok(count) => info!(count, "Daily refresh stored hackathons"),
                Err(e) => error!(error = %e, "Daily refresh failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
            .and_utc()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_later_today() {
        let now = utc(2025, 3, 10, 8, 15);
        assert_eq!(next_occurrence(&now, hm(9, 0)), utc(2025, 3, 10, 9, 0));
    }

    #[test]
    fn test_already_passed_rolls_to_tomorrow() {
        let now = utc(2025, 3, 10, 8, 15);
        assert_eq!(next_occurrence(&now, hm(0, 0)), utc(2025, 3, 11, 0, 0));
    }

    #[test]
    fn test_exact_time_rolls_to_tomorrow() {
        let now = utc(2025, 3, 10, 0, 0);
        assert_eq!(next_occurrence(&now, hm(0, 0)), utc(2025, 3, 11, 0, 0));
    }

    #[test]
    fn test_month_and_year_boundaries() {
        assert_eq!(next_occurrence(&utc(2025, 1, 31, 23, 0), hm(6, 0)), utc(2025, 2, 1, 6, 0));
        assert_eq!(next_occurrence(&utc(2025, 12, 31, 23, 59), hm(0, 0)), utc(2026, 1, 1, 0, 0));
    }

    #[test]
    fn test_local_time_is_in_the_future() {
        let now = Local::now();
        let next = next_occurrence(&now, hm(3, 30));
        assert!(next > now);
        assert!(next - now <= TimeDelta::hours(25));
    }
}
