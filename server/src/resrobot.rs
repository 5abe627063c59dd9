//! Looking up when a train actually arrives at a stop, using the ResRobot
//! arrival board.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use isahc::{config::Configurable, AsyncReadResponseExt, HttpClient};
use serde::Deserialize;
use std::{error::Error, fmt::Display, time::Duration};

/// Resolves the time a train arrives at a stop.
#[async_trait]
pub trait TimeResolver: Send + Sync {
    async fn resolve(&self, station: &str, train: &str) -> Result<DateTime<Utc>, ResolveError>;
}

#[derive(Clone, Debug)]
pub struct ResRobotSettings {
    pub url: String,
    pub key: String,
    pub operator: String,
    pub max_journeys: u32,
    pub timeout: Duration,
    /// Offset of the local times on the arrival board.
    pub offset: FixedOffset,
}

pub struct ResRobotClient {
    http_client: HttpClient,
    settings: ResRobotSettings,
}

impl ResRobotClient {
    pub fn new(settings: ResRobotSettings) -> Result<Self, isahc::Error> {
        let http_client = HttpClient::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            http_client,
            settings,
        })
    }

    fn arrival_board_url(&self, station: &str) -> String {
        format!(
            "{}?accessId={}&id={}&maxJourneys={}&format=json&operators={}&passlist=0",
            self.settings.url,
            urlencoding::encode(&self.settings.key),
            urlencoding::encode(station),
            self.settings.max_journeys,
            urlencoding::encode(&self.settings.operator),
        )
    }

    async fn get_arrival_board(&self, station: &str) -> Result<ArrivalBoard, ResolveError> {
        let request = isahc::Request::builder()
            .method("GET")
            .uri(self.arrival_board_url(station))
            .body(())
            .map_err(ResolveError::InvalidRequest)?;

        let mut response = self
            .http_client
            .send_async(request)
            .await
            .map_err(ResolveError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(ResolveError::Body)?;

        if !status.is_success() {
            return Err(ResolveError::Status(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(ResolveError::Parse)
    }
}

#[async_trait]
impl TimeResolver for ResRobotClient {
    async fn resolve(&self, station: &str, train: &str) -> Result<DateTime<Utc>, ResolveError> {
        let timer = std::time::Instant::now();
        let board = self.get_arrival_board(station).await?;
        debug!(
            "retrieved {} arrivals for station '{}' in {:?}",
            board.arrivals.len(),
            station,
            timer.elapsed()
        );

        board
            .arrival_of(train, self.settings.offset)
            .map(|arrival| arrival.with_timezone(&Utc))
    }
}

#[derive(Debug, Deserialize)]
pub struct ArrivalBoard {
    #[serde(rename = "Arrival", default)]
    arrivals: Vec<Arrival>,
}

#[derive(Debug, Deserialize)]
struct Arrival {
    time: String,
    date: String,
    #[serde(rename = "transportNumber", default)]
    transport_number: Option<String>,
}

impl ArrivalBoard {
    /// Arrival time of the first entry run as `train`.
    pub fn arrival_of(
        &self,
        train: &str,
        offset: FixedOffset,
    ) -> Result<DateTime<FixedOffset>, ResolveError> {
        let arrival = self
            .arrivals
            .iter()
            .find(|arrival| arrival.transport_number.as_deref() == Some(train))
            .ok_or_else(|| ResolveError::TrainNotFound(train.to_owned()))?;

        let local = format!("{}T{}", arrival.date, arrival.time);
        NaiveDateTime::parse_from_str(&local, "%Y-%m-%dT%H:%M:%S")
            .ok()
            .and_then(|naive| offset.from_local_datetime(&naive).single())
            .ok_or(ResolveError::Timestamp(local))
    }
}

#[derive(Debug)]
pub enum ResolveError {
    InvalidRequest(isahc::http::Error),
    Transport(isahc::Error),
    Status(u16, String),
    Body(std::io::Error),
    Parse(serde_json::Error),
    Timestamp(String),
    TrainNotFound(String),
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let output = match self {
            ResolveError::InvalidRequest(e) => format!("error creating HTTP request: '{}'", e),
            ResolveError::Transport(e) => format!("error getting HTTP data: '{}'", e),
            ResolveError::Status(status, body) => {
                format!("wrong response code '{}' with body '{}'", status, body)
            }
            ResolveError::Body(e) => format!("error reading response body: '{}'", e),
            ResolveError::Parse(e) => format!("error parsing response json: '{}'", e),
            ResolveError::Timestamp(value) => format!("error parsing time '{}'", value),
            ResolveError::TrainNotFound(train) => {
                format!("train '{}' not found on arrival board", train)
            }
        };

        write!(f, "{}", output)
    }
}

impl Error for ResolveError {}
