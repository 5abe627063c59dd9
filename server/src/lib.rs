#![allow(clippy::new_without_default)]

use app::{App, AppError};
use chrono::FixedOffset;
use contracts::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use futures::future;
use hyper::{body::Buf, Body, Request, Response, StatusCode};
use resrobot::ResRobotSettings;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::{fmt::Debug, path::PathBuf, sync::Arc, time::Duration};
use structopt::StructOpt;

pub mod app;
pub mod controller;
pub mod resrobot;
pub mod schedule;

#[macro_use]
extern crate log;

#[derive(StructOpt, Debug, Clone)]
pub struct Opts {
    #[structopt(long, default_value = "3000", env = "ORDERS_LISTEN_PORT")]
    pub port: u16,
    #[structopt(long, env = "ORDERS_DATABASE_ADDR")]
    pub database_addr: String,
    #[structopt(long, default_value = "10", env = "ORDERS_DATABASE_POOL_SIZE")]
    pub database_pool_size: u32,
    /// CA certificate the database server is verified against.
    #[structopt(long, env = "ORDERS_DATABASE_ROOT_CERT")]
    pub database_root_cert: Option<PathBuf>,
    #[structopt(long, env = "ORDERS_RESROBOT_API_KEY", hide_env_values = true)]
    pub resrobot_api_key: String,
    #[structopt(
        long,
        default_value = "https://api.resrobot.se/v2.1/arrivalBoard",
        env = "ORDERS_RESROBOT_URL"
    )]
    pub resrobot_url: String,
    #[structopt(long, default_value = "74", env = "ORDERS_RESROBOT_OPERATOR")]
    pub resrobot_operator: String,
    #[structopt(long, default_value = "50", env = "ORDERS_RESROBOT_MAX_JOURNEYS")]
    pub resrobot_max_journeys: u32,
    #[structopt(long, default_value = "10", env = "ORDERS_RESROBOT_TIMEOUT_S")]
    pub resrobot_timeout_s: u64,
    /// Offset of local time from UTC, e.g. "+02:00". Daylight saving is not applied.
    #[structopt(
        long,
        default_value = "+02:00",
        env = "ORDERS_LOCAL_UTC_OFFSET",
        parse(try_from_str = parse_utc_offset)
    )]
    pub local_utc_offset: FixedOffset,
    #[structopt(
        long,
        default_value = "60",
        env = "ORDERS_TASK_WINDOW_MINUTES",
        parse(try_from_str = parse_window_minutes)
    )]
    pub task_window_minutes: i64,
}

impl Opts {
    pub fn resrobot_settings(&self) -> ResRobotSettings {
        ResRobotSettings {
            url: self.resrobot_url.clone(),
            key: self.resrobot_api_key.clone(),
            operator: self.resrobot_operator.clone(),
            max_journeys: self.resrobot_max_journeys,
            timeout: Duration::from_secs(self.resrobot_timeout_s),
            offset: self.local_utc_offset,
        }
    }

    pub fn task_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.task_window_minutes)
    }
}

/// At most a week.
const MAX_TASK_WINDOW_MINUTES: i64 = 7 * 24 * 60;

pub fn parse_window_minutes(value: &str) -> Result<i64, String> {
    let minutes: i64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid task window '{}': {}", value, e))?;

    if !(1..=MAX_TASK_WINDOW_MINUTES).contains(&minutes) {
        return Err(format!(
            "task window must be between 1 and {} minutes, got {}",
            MAX_TASK_WINDOW_MINUTES, minutes
        ));
    }

    Ok(minutes)
}

/// Parses `+HH:MM` or `-HH:MM`.
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, String> {
    let invalid = || format!("invalid utc offset '{}', expected e.g. '+02:00'", value);

    let trimmed = value.trim();
    let (sign, rest) = if let Some(rest) = trimmed.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = trimmed.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(invalid());
    };

    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(invalid());
    }
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

pub async fn entry_point(
    webserver: Arc<Webserver>,
    request: Request<Body>,
) -> Result<Response<Body>, hyper::Error> {
    Ok(webserver.handle_request(request).await)
}

pub struct Webserver {
    app: Arc<App>,
}

impl Webserver {
    pub fn new(app: Arc<App>) -> Self {
        Self { app }
    }

    pub async fn handle_request(&self, request: Request<Body>) -> Response<Body> {
        match (request.method(), request.uri().path()) {
            (&hyper::Method::POST, "/api") => {
                let response_body = self.api_route(request).await;
                generic_json_response(response_body, 200)
            }
            (&hyper::Method::GET, "/api/ping") => text_response("pong", 200),
            _invalid => {
                error!("invalid http method or route request: '{:?}'", request);
                generic_json_response(invalid_route(), 200)
            }
        }
    }

    async fn api_route(&self, request: Request<Body>) -> Vec<JsonRpcResponse> {
        match Self::get_body_as_json(request).await {
            Ok(JsonValue::Array(values)) => {
                let results: Vec<_> = values
                    .into_iter()
                    .map(|v| self.parse_and_handle_single(v))
                    .collect();

                let results: Vec<_> = future::join_all(results)
                    .await
                    .into_iter()
                    .map(|res| match res {
                        Ok(response) => response,
                        Err(error) => {
                            error!("error handling request: '{:?}'", error.context);
                            Some(JsonRpcResponse::error(error.rpc_error, None))
                        }
                    })
                    .collect();
                results.into_iter().flatten().collect()
            }
            Ok(_) => {
                error!("request contains non-array JSON");
                vec![JsonRpcResponse::error(
                    JsonRpcError::invalid_request().with_message("non-array json is not supported"),
                    None,
                )]
            }
            Err(error) => {
                error!("error parsing request as json: '{:?}'", error.context);
                vec![JsonRpcResponse::error(error.rpc_error, None)]
            }
        }
    }

    async fn parse_and_handle_single(
        &self,
        request: JsonValue,
    ) -> Result<Option<JsonRpcResponse>, AppError> {
        match serde_json::from_value::<JsonRpcRequest>(request) {
            Ok(request) => {
                if request.is_notification() {
                    let _ = self.app.handle_single(request).await;
                    Ok(None)
                } else {
                    Ok(Some(self.app.handle_single(request).await))
                }
            }
            Err(serde_error) => {
                Err(AppError::from(JsonRpcError::invalid_request()).with_context(&serde_error))
            }
        }
    }

    /// Attempts to parse the body of a request as json
    async fn get_body_as_json(request: Request<Body>) -> Result<JsonValue, AppError> {
        let buf = hyper::body::aggregate(request)
            .await
            .map_err(|hyper_error| AppError::invalid_request().with_context(&hyper_error))?;
        let json: JsonValue = serde_json::from_reader(buf.reader())
            .map_err(|serde_error| AppError::invalid_request().with_context(&serde_error))?;

        Ok(json)
    }
}

fn generic_json_response<T>(body: T, status: u16) -> Response<Body>
where
    T: Serialize,
{
    match serde_json::to_vec(&body) {
        Ok(b) => Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Body::from(b))
            .unwrap_or_else(|e| internal_server_error(&e)),
        Err(e) => internal_server_error(&e),
    }
}

fn text_response(body: &'static str, status: u16) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(Body::from(body))
        .unwrap_or_else(|e| internal_server_error(&e))
}

fn internal_server_error<E: Debug>(error: &E) -> Response<Body> {
    error!("error building response: '{:?}'", error);
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

fn invalid_route() -> Vec<JsonRpcResponse> {
    let error = JsonRpcError::invalid_request().with_message("invalid route");
    let response = JsonRpcResponse::error(error, None);

    vec![response]
}
