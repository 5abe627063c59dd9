//! Turning the stop times of a trip into the stations shown to a passenger.
//!
//! Local time is a naive fixed offset from UTC. It does not follow daylight
//! saving rules, so the offset has to be configured for the season.

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};
use contracts::station::{Geo, Station};
use database::StopTime;

const CENTRAL_STATION: &str = "Centralstation";
const CENTRAL_STATION_SHORT: &str = "C";
const STATION_SUFFIX: &str = " station";

/// Shortens a stop name for display, "Stockholm Centralstation" becomes "Stockholm C".
pub fn clean_name(name: &str) -> String {
    name.replace(CENTRAL_STATION, CENTRAL_STATION_SHORT)
        .replace(STATION_SUFFIX, "")
}

/// Coffee is not served at every fourth and every fifth stop of a trip.
pub fn coffee_available(stop_sequence: i32) -> bool {
    !(stop_sequence % 4 == 0 || stop_sequence % 5 == 0)
}

/// Seconds after midnight for a GTFS `HH:MM:SS` time, hours may go past 23.
pub fn parse_clock_s(text: &str) -> Option<i64> {
    let mut parts = text.trim().split(':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds: i64 = parts.next()?.parse().ok()?;

    if parts.next().is_some() || hours < 0 || !(0..60).contains(&minutes) || !(0..60).contains(&seconds) {
        return None;
    }

    hours
        .checked_mul(3600)?
        .checked_add(minutes * 60 + seconds)
}

pub fn local_seconds_of_day(now: DateTime<Utc>, offset: FixedOffset) -> i64 {
    i64::from(now.with_timezone(&offset).num_seconds_from_midnight())
}

/// The calendar date trips are looked up for.
pub fn service_date(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// Keeps the stops the train has yet to reach, in the order given.
pub fn upcoming_stations(
    stop_times: Vec<StopTime>,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Vec<Station> {
    let now_s = local_seconds_of_day(now, offset);

    stop_times
        .into_iter()
        .filter_map(|stop_time| {
            let arrival_s = match parse_clock_s(&stop_time.arrival_time) {
                Some(arrival_s) => arrival_s,
                None => {
                    warn!(
                        "skipping stop '{}' with unreadable arrival time '{}'",
                        stop_time.stop_id, stop_time.arrival_time
                    );
                    return None;
                }
            };

            let countdown_s = arrival_s - now_s;
            if countdown_s <= 0 {
                return None;
            }

            Some(Station::new(
                stop_time.stop_id,
                clean_name(&stop_time.stop_name),
                coffee_available(stop_time.stop_sequence),
                false,
                Geo::new(stop_time.stop_lat, stop_time.stop_lon),
                countdown_s,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cest() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).unwrap()
    }

    fn stop_time(id: &str, name: &str, arrival_time: &str, stop_sequence: i32) -> StopTime {
        StopTime::new(
            id.to_owned(),
            name.to_owned(),
            59.33,
            18.06,
            arrival_time.to_owned(),
            stop_sequence,
        )
    }

    #[test]
    fn clean_name_test() {
        assert_eq!(clean_name("Stockholm Centralstation"), "Stockholm C");
        assert_eq!(clean_name("Uppsala station"), "Uppsala");
        assert_eq!(clean_name("Knivsta"), "Knivsta");
        assert_eq!(clean_name("Arlanda C"), "Arlanda C");
    }

    #[test]
    fn coffee_available_test() {
        for sequence in 0..200 {
            let expected = !(sequence % 4 == 0 || sequence % 5 == 0);
            assert_eq!(coffee_available(sequence), expected, "{}", sequence);
        }
        assert!(coffee_available(1));
        assert!(!coffee_available(4));
        assert!(!coffee_available(5));
        assert!(!coffee_available(20));
        assert!(coffee_available(21));
    }

    #[test]
    fn parse_clock_test() {
        assert_eq!(parse_clock_s("00:00:00"), Some(0));
        assert_eq!(parse_clock_s("08:30:15"), Some(30615));
        assert_eq!(parse_clock_s("8:30:15"), Some(30615));
        assert_eq!(parse_clock_s("25:10:00"), Some(90600));

        for invalid in &["", "08:30", "08:60:00", "08:30:00:00", "aa:bb:cc", "-1:00:00"] {
            assert_eq!(parse_clock_s(invalid), None, "{:?}", invalid);
        }
    }

    #[test]
    fn huge_clock_hours_are_unreadable() {
        assert_eq!(parse_clock_s("3000000000000000:00:00"), None);
        assert_eq!(parse_clock_s("99999999999999999999:00:00"), None);

        let now = Utc.with_ymd_and_hms(2021, 6, 1, 8, 0, 0).unwrap();
        let stop_times = vec![
            stop_time("1", "Knivsta", "3000000000000000:00:00", 1),
            stop_time("2", "Uppsala station", "10:40:00", 2),
        ];

        let stations = upcoming_stations(stop_times, now, cest());

        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].id, "2");
    }

    #[test]
    fn local_time_uses_offset() {
        let now = Utc.with_ymd_and_hms(2021, 6, 1, 22, 30, 0).unwrap();

        assert_eq!(local_seconds_of_day(now, cest()), 30 * 60);
        assert_eq!(
            service_date(now, cest()),
            NaiveDate::from_ymd_opt(2021, 6, 2).unwrap()
        );
        assert_eq!(
            service_date(now, FixedOffset::east_opt(0).unwrap()),
            NaiveDate::from_ymd_opt(2021, 6, 1).unwrap()
        );
    }

    #[test]
    fn passed_stops_are_dropped() {
        // 10:00 local
        let now = Utc.with_ymd_and_hms(2021, 6, 1, 8, 0, 0).unwrap();
        let stop_times = vec![
            stop_time("1", "Stockholm Centralstation", "10:05:00", 1),
            stop_time("2", "Arlanda C", "10:20:00", 2),
            stop_time("3", "Knivsta", "09:59:00", 3),
            stop_time("4", "Uppsala station", "10:40:00", 4),
            stop_time("5", "Gävle C", "11:30:00", 5),
        ];

        let stations = upcoming_stations(stop_times, now, cest());

        let ids: Vec<_> = stations.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "4", "5"]);

        let countdowns: Vec<_> = stations.iter().map(|s| s.time).collect();
        assert_eq!(countdowns, vec![300, 1200, 2400, 5400]);
        assert!(countdowns.windows(2).all(|w| w[0] <= w[1]));

        assert_eq!(stations[0].title, "Stockholm C");
        assert_eq!(stations[2].title, "Uppsala");
        assert!(stations[0].is_coffee);
        assert!(!stations[2].is_coffee);
        assert!(!stations[3].is_coffee);
        assert!(stations.iter().all(|s| !s.is_food));
    }

    #[test]
    fn arrival_at_now_is_passed() {
        let now = Utc.with_ymd_and_hms(2021, 6, 1, 8, 0, 0).unwrap();
        let stop_times = vec![
            stop_time("1", "Stockholm Centralstation", "10:00:00", 1),
            stop_time("2", "Arlanda C", "10:00:01", 2),
            stop_time("3", "Märsta", "not a time", 3),
        ];

        let stations = upcoming_stations(stop_times, now, cest());

        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].id, "2");
        assert_eq!(stations[0].time, 1);
    }

    #[test]
    fn every_countdown_is_positive() {
        let now = Utc.with_ymd_and_hms(2021, 6, 1, 10, 17, 42).unwrap();
        let stop_times: Vec<_> = (0..48)
            .map(|i| {
                let arrival = format!("{:02}:{:02}:00", i / 2, (i % 2) * 30);
                stop_time(&i.to_string(), "Stop", &arrival, i)
            })
            .collect();

        let stations = upcoming_stations(stop_times, now, cest());

        assert!(!stations.is_empty());
        assert!(stations.iter().all(|s| s.time > 0));
    }
}
