use crate::{
    app::{AppError, AppResult, ParamsError},
    schedule,
};
use chrono::{FixedOffset, Utc};
use contracts::{station::*, *};
use database::{Trip, TripDatabase};
use std::{convert::TryFrom, sync::Arc};

pub struct StationController {
    trip_db: Arc<TripDatabase>,
    offset: FixedOffset,
}

impl StationController {
    pub fn new(trip_db: Arc<TripDatabase>, offset: FixedOffset) -> Self {
        Self { trip_db, offset }
    }

    pub async fn get_stations(
        &self,
        request: JsonRpcRequest,
    ) -> AppResult<get_stations::MethodResult> {
        use get_stations::{MethodResult, Params};
        let params = Params::try_from(request)?;

        let now = Utc::now();
        let service_date = schedule::service_date(now, self.offset);

        let mut tx = self.trip_db.begin().await?;

        let trip: Trip = match self
            .trip_db
            .get_active_trip(&mut tx, &params.train, service_date)
            .await?
        {
            Some(trip) => trip,
            None => {
                info!("no trip '{}' runs on {}", params.train, service_date);
                return Err(AppError::not_found());
            }
        };

        let stop_times = self.trip_db.get_stop_times(&mut tx, &trip.trip_id).await?;
        self.trip_db.commit(tx).await?;

        let stations = schedule::upcoming_stations(stop_times, now, self.offset);
        if stations.is_empty() {
            info!("trip '{}' has no stops left", trip.trip_id);
            return Err(AppError::not_found());
        }

        Ok(MethodResult::new(stations))
    }
}

impl ParamsError for get_stations::InvalidParams {}
