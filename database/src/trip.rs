use crate::{Database, DatabaseResult, DbTransaction};
use chrono::NaiveDate;

pub type TripDatabase = Database<Trip>;

/// A trip from the imported GTFS feed.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
#[non_exhaustive]
pub struct Trip {
    pub route_id: String,
    pub service_id: String,
    pub trip_id: String,
    pub trip_headsign: String,
    pub trip_short_name: String,
}

/// One scheduled stop of a trip, joined with the stop it refers to.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
#[non_exhaustive]
pub struct StopTime {
    pub stop_id: String,
    pub stop_name: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
    /// `HH:MM:SS` as written in the feed, hours may go past 23.
    pub arrival_time: String,
    pub stop_sequence: i32,
}

impl StopTime {
    pub fn new(
        stop_id: String,
        stop_name: String,
        stop_lat: f64,
        stop_lon: f64,
        arrival_time: String,
        stop_sequence: i32,
    ) -> Self {
        Self {
            stop_id,
            stop_name,
            stop_lat,
            stop_lon,
            arrival_time,
            stop_sequence,
        }
    }
}

/// `calendar_dates.exception_type` for a date the service is added on.
const SERVICE_ADDED: i32 = 1;

impl TripDatabase {
    /// Finds the trip called `short_name` that runs on `service_date`.
    ///
    /// When several do, the one with the earliest first arrival wins.
    pub async fn get_active_trip(
        &self,
        tx: &mut DbTransaction<'_>,
        short_name: &str,
        service_date: NaiveDate,
    ) -> DatabaseResult<Option<Trip>> {
        let trip = sqlx::query_as::<_, Trip>(
            "
            SELECT trips.route_id::TEXT AS route_id,
                trips.service_id::TEXT AS service_id,
                trips.trip_id::TEXT AS trip_id,
                COALESCE(trips.trip_headsign::TEXT, '') AS trip_headsign,
                trips.trip_short_name::TEXT AS trip_short_name
            FROM trips
            JOIN calendar_dates cal ON cal.service_id = trips.service_id
            WHERE trips.trip_short_name = $1
                AND cal.date::TEXT = $2
                AND cal.exception_type::INT4 = $3
            ORDER BY (SELECT MIN(st.arrival_time::TEXT::INTERVAL) FROM stop_times st WHERE st.trip_id = trips.trip_id),
                trips.trip_id
            LIMIT 1",
        )
        .bind(short_name)
        .bind(service_date.format("%Y%m%d").to_string())
        .bind(SERVICE_ADDED)
        .fetch_optional(&mut *tx)
        .await?;

        Ok(trip)
    }

    pub async fn get_stop_times(
        &self,
        tx: &mut DbTransaction<'_>,
        trip_id: &str,
    ) -> DatabaseResult<Vec<StopTime>> {
        let stop_times = sqlx::query_as::<_, StopTime>(
            "
            SELECT stops.stop_id::TEXT AS stop_id,
                stops.stop_name::TEXT AS stop_name,
                stops.stop_lat::FLOAT8 AS stop_lat,
                stops.stop_lon::FLOAT8 AS stop_lon,
                st.arrival_time::TEXT AS arrival_time,
                st.stop_sequence::INT4 AS stop_sequence
            FROM stop_times st
            JOIN stops ON stops.stop_id = st.stop_id
            WHERE st.trip_id = $1
            ORDER BY st.stop_sequence",
        )
        .bind(trip_id)
        .fetch_all(&mut *tx)
        .await?;

        Ok(stop_times)
    }
}
