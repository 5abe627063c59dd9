use contracts::{
    order::add_order, station::get_stations, task::get_tasks, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, Method,
};
use isahc::{http::method, AsyncReadResponseExt};
use serde::de::DeserializeOwned;
use std::{
    error::Error,
    fmt::Display,
    sync::atomic::{AtomicU64, Ordering},
};

#[macro_use]
extern crate log;

pub struct OrderingClient {
    url: String,
    client: isahc::HttpClient,
    next_id: AtomicU64,
}

impl OrderingClient {
    pub fn new(url: String) -> OrderingClientBuilder {
        OrderingClientBuilder::new(url)
    }

    fn from_builder(builder: OrderingClientBuilder) -> Result<Self, OrderingBuilderError> {
        let url = normalize_url(&builder.url)?;
        let client = isahc::HttpClient::new().map_err(OrderingBuilderError::HttpClient)?;

        Ok(Self {
            url,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    fn api_url(&self) -> String {
        format!("{}/api", self.url)
    }

    fn ping_url(&self) -> String {
        format!("{}/api/ping", self.url)
    }

    pub async fn ping(&self) -> Result<bool, OrderingClientError> {
        let body = self.client.get_async(self.ping_url()).await?.text().await?;
        Ok(body == "pong")
    }

    pub async fn get_stations(
        &self,
        train: &str,
    ) -> Result<get_stations::MethodResult, OrderingClientError> {
        let params = get_stations::Params::new(train)
            .map_err(|e| OrderingClientError::InvalidParams(e.to_string()))?;
        self.call(Method::GetStations, params).await
    }

    pub async fn add_order(
        &self,
        params: add_order::Params,
    ) -> Result<add_order::MethodResult, OrderingClientError> {
        self.call(Method::AddOrder, params).await
    }

    pub async fn get_tasks(&self) -> Result<get_tasks::MethodResult, OrderingClientError> {
        self.call(Method::GetTasks, get_tasks::Params::new()).await
    }

    async fn call<P, T>(&self, method: Method, params: P) -> Result<T, OrderingClientError>
    where
        P: serde::Serialize,
        T: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        let request = JsonRpcRequest::new(method, params, Some(id))?;
        trace!("sending request: {:?}", request);

        let responses = self.send_batch(vec![request]).await?;
        decode_single(responses)
    }

    pub async fn send_batch(
        &self,
        requests: Vec<JsonRpcRequest>,
    ) -> Result<Vec<JsonRpcResponse>, OrderingClientError> {
        let http_request = isahc::Request::builder()
            .uri(self.api_url())
            .method(method::Method::POST)
            .header("Content-Type", "application/json")
            .body(serde_json::to_vec(&requests)?)?;

        let response: Vec<JsonRpcResponse> =
            self.client.send_async(http_request).await?.json().await?;

        Ok(response)
    }
}

fn normalize_url(url: &str) -> Result<String, OrderingBuilderError> {
    let mut url = url.trim();
    while let Some(without_trailing_slash) = url.strip_suffix('/') {
        url = without_trailing_slash;
    }

    if url.is_empty() || !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(OrderingBuilderError::InvalidUrl);
    }

    Ok(url.to_owned())
}

fn decode_single<T>(mut responses: Vec<JsonRpcResponse>) -> Result<T, OrderingClientError>
where
    T: DeserializeOwned,
{
    if responses.is_empty() {
        return Err(OrderingClientError::EmptyResponse);
    }

    let response = responses.remove(0);
    if let Some(error) = response.error {
        return Err(OrderingClientError::Webserver(error));
    }

    response
        .result_as()?
        .ok_or(OrderingClientError::EmptyResponse)
}

pub struct OrderingClientBuilder {
    url: String,
}

impl OrderingClientBuilder {
    fn new(url: String) -> Self {
        Self { url }
    }

    pub fn build(self) -> Result<OrderingClient, OrderingBuilderError> {
        OrderingClient::from_builder(self)
    }
}

#[derive(Debug)]
pub enum OrderingBuilderError {
    InvalidUrl,
    HttpClient(isahc::Error),
}

impl Display for OrderingBuilderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderingBuilderError::InvalidUrl => write!(f, "invalid url"),
            OrderingBuilderError::HttpClient(e) => write!(f, "error creating http client: '{}'", e),
        }
    }
}

impl Error for OrderingBuilderError {}

#[derive(Debug)]
pub enum OrderingClientError {
    IsahcError(isahc::Error),
    HttpError(isahc::http::Error),
    IoError(std::io::Error),
    Webserver(JsonRpcError),
    SerdeError(serde_json::Error),
    InvalidParams(String),
    EmptyResponse,
}

impl Display for OrderingClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let output = match self {
            OrderingClientError::IsahcError(e) => format!("isahc error: '{}'", e),
            OrderingClientError::HttpError(e) => format!("isahc http error: '{}'", e),
            OrderingClientError::IoError(e) => format!("error reading response: '{}'", e),
            OrderingClientError::Webserver(e) => {
                format!("webserver error {}: '{}'", e.code, e.message)
            }
            OrderingClientError::SerdeError(serde_error) => {
                format!("serde error: '{}'", serde_error)
            }
            OrderingClientError::InvalidParams(message) => {
                format!("invalid params: '{}'", message)
            }
            OrderingClientError::EmptyResponse => "response contained no result".to_owned(),
        };

        write!(f, "{}", output)
    }
}

impl From<isahc::Error> for OrderingClientError {
    fn from(e: isahc::Error) -> Self {
        Self::IsahcError(e)
    }
}

impl From<isahc::http::Error> for OrderingClientError {
    fn from(e: isahc::http::Error) -> Self {
        Self::HttpError(e)
    }
}

impl From<std::io::Error> for OrderingClientError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

impl From<serde_json::Error> for OrderingClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerdeError(e)
    }
}

impl From<JsonRpcError> for OrderingClientError {
    fn from(e: JsonRpcError) -> Self {
        Self::Webserver(e)
    }
}

impl Error for OrderingClientError {}
