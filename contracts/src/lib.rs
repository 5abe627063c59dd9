#![allow(clippy::new_without_default)]

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{fmt::Display, str::FromStr};

pub mod order;
pub mod station;
pub mod task;

mod method_names {
    pub const GET_STATIONS: &str = "get_stations";
    pub const ADD_ORDER: &str = "add_order";
    pub const GET_TASKS: &str = "get_tasks";
}

pub mod error_codes {
    pub mod standard {
        pub const INVALID_REQUEST: i32 = -32600;
        pub const METHOD_NOT_FOUND: i32 = -32601;
        pub const INVALID_PARAMS: i32 = -32602;
        pub const INTERNAL_ERROR: i32 = -32603;
    }

    pub mod application {
        pub const NOT_FOUND: i32 = -31999;
    }
}

/// A JSONRPC method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Get the upcoming stations of a train
    GetStations,
    /// Place an order for delivery at a station
    AddOrder,
    /// Get the orders that are due for delivery
    GetTasks,
}

impl FromStr for Method {
    type Err = (); // any failure means the method simply doesn't exist
    fn from_str(s: &str) -> Result<Method, Self::Err> {
        use method_names::*;
        use Method::*;
        match s {
            GET_STATIONS => Ok(GetStations),
            ADD_ORDER => Ok(AddOrder),
            GET_TASKS => Ok(GetTasks),
            _ => Err(()),
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use method_names::*;
        use Method::*;
        let output = match self {
            GetStations => GET_STATIONS,
            AddOrder => ADD_ORDER,
            GetTasks => GET_TASKS,
        };
        write!(f, "{}", output)
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, Copy)]
pub enum JsonRpcVersion {
    #[serde(alias = "2.0", rename = "2.0")]
    Two,
}

/// A JSONRPC request.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
#[non_exhaustive]
pub struct JsonRpcRequest {
    /// JSONRPC version.
    pub jsonrpc: JsonRpcVersion,
    /// RPC method to call.
    pub method: String,
    /// Parameters to pass to the method.
    #[serde(default)]
    pub params: Value,
    /// A response to this request should contain this same id (provided by the requester).
    /// If the request is a notification, then `id` is `None`.
    pub id: Option<String>,
}

impl JsonRpcRequest {
    pub fn new<T>(method: Method, params: T, id: Option<String>) -> Result<Self, serde_json::Error>
    where
        T: Serialize,
    {
        Ok(Self {
            jsonrpc: JsonRpcVersion::Two,
            method: method.to_string(),
            params: serde_json::to_value(params)?,
            id,
        })
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// A JSONRPC response object. Contains _either_ a `result` (in case of success) or `error` (in case of failure).
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
#[non_exhaustive]
pub struct JsonRpcResponse {
    /// JSONRPC version of the response.
    pub jsonrpc: JsonRpcVersion,
    /// Optional data to be returned in case of success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Optional data to be returned in case of failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Id corresponding to `id` property of request (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl JsonRpcResponse {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Deserialize the contained json result (if any)
    pub fn result_as<T>(self) -> Result<Option<T>, serde_json::Error>
    where
        T: DeserializeOwned,
    {
        Ok(match self.result {
            Some(r) => {
                let deserialized: T = serde_json::from_value(r)?;
                Some(deserialized)
            }
            None => None,
        })
    }

    /// Create a `JsonRpcResponse` with a `result` property (indicating success).
    pub fn success<T: Serialize>(result: T, id: Option<String>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion::Two,
            result: Some(serde_json::to_value(result).expect("infallible")),
            error: None,
            id,
        }
    }

    /// Create a `JsonRpcResponse` with an `error` property (indicating failure).
    pub fn error(error: JsonRpcError, id: Option<String>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion::Two,
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// Error object to be returned in a `JsonRpcResponse` if something failed.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
#[non_exhaustive]
pub struct JsonRpcError {
    /// JSONRPC error code.
    pub code: i32,
    /// Short description of what went wrong.
    pub message: String,
    /// Optional field containing structured error information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    fn new(code: ErrorCode, message: String, data: Option<Value>) -> Self {
        Self {
            code: code.into(),
            message,
            data,
        }
    }

    /// Set the `message` property on `self`.
    pub fn with_message<T>(mut self, message: T) -> Self
    where
        T: Into<String>,
    {
        self.message = message.into();
        self
    }

    /// Constructor for a "Method not found" JSONRPC error.
    ///
    /// ## Definition
    /// The method does not exist / is not available.
    pub fn method_not_found() -> Self {
        Self::new(
            ErrorCode::MethodNotFound,
            "Method not found".to_owned(),
            None,
        )
    }

    /// Constructor for a "Invalid request" JSONRPC error.
    ///
    /// ## Definition
    /// The JSON sent is not a valid Request object.
    pub fn invalid_request() -> Self {
        Self::new(
            ErrorCode::InvalidRequest,
            "Invalid request".to_owned(),
            None,
        )
    }

    /// Constructor for an "Invalid params" JSONRPC error.
    ///
    /// ## Definition
    /// Invalid method parameter(s).
    pub fn invalid_params() -> Self {
        Self::new(ErrorCode::InvalidParams, "Invalid params".to_owned(), None)
    }

    /// Constructor for an "Internal error" JSONRPC error.
    ///
    /// ## Definition
    /// Internal JSON-RPC error.
    pub fn internal_error() -> Self {
        Self::new(ErrorCode::InternalError, "Internal error".to_owned(), None)
    }

    /// Constructor for an "Application error" webserver error.
    ///
    /// This error means your request could not be processed due to a failure in the application level logic.
    ///
    /// # Panics
    /// If `code` is in the range reserved by JSON-RPC, -32768 to -32000.
    pub fn application_error(code: i32) -> Self {
        if ErrorCode::is_reserved(code) {
            panic!("error code '{}' is reserved by JSON-RPC", code);
        }
        Self {
            code,
            message: String::new(),
            data: None,
        }
    }

    /// Constructor for a "Not found" webserver error.
    ///
    /// The request was well-formed but nothing matched it.
    pub fn not_found() -> Self {
        Self::application_error(error_codes::application::NOT_FOUND).with_message("not found")
    }

    pub fn database_error() -> Self {
        Self::internal_error().with_message("database error")
    }

    pub fn is_not_found(&self) -> bool {
        self.code == error_codes::application::NOT_FOUND
    }
}

/// Code identifying which type of error has occurred.
pub enum ErrorCode {
    /// The JSON received was not a valid JSONRPC request object.
    InvalidRequest,
    /// The method does not exist / is not available.
    MethodNotFound,
    /// Invalid method parameter(s).
    InvalidParams,
    /// Internal JSONRPC error.
    InternalError,
}

impl ErrorCode {
    pub fn is_reserved(code: i32) -> bool {
        (-32768..=-32000).contains(&code)
    }
}

impl From<ErrorCode> for i32 {
    fn from(error_code: ErrorCode) -> Self {
        match error_code {
            ErrorCode::InvalidRequest => error_codes::standard::INVALID_REQUEST,
            ErrorCode::MethodNotFound => error_codes::standard::METHOD_NOT_FOUND,
            ErrorCode::InvalidParams => error_codes::standard::INVALID_PARAMS,
            ErrorCode::InternalError => error_codes::standard::INTERNAL_ERROR,
        }
    }
}

fn invalid_params_serde_message(err: &serde_json::Error) -> String {
    format!("invalid format of params object: '{}'", err)
}

fn generic_invalid_value_message(param_name: &str) -> String {
    format!("invalid value of '{}'", param_name)
}

fn invalid_value_because_message(param_name: &str, clarification: &str) -> String {
    format!(
        "{}, {}",
        generic_invalid_value_message(param_name),
        clarification
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_round_trip() {
        for method in &[Method::GetStations, Method::AddOrder, Method::GetTasks] {
            assert_eq!(Method::from_str(&method.to_string()), Ok(*method));
        }
        assert!(Method::from_str("get_weather").is_err());
    }

    #[test]
    fn request_without_params_or_id() {
        let json = r#"{"jsonrpc": "2.0", "method": "get_tasks"}"#;
        let request: JsonRpcRequest = serde_json::from_str(json).unwrap();

        assert!(request.is_notification());
        assert_eq!(request.params, Value::Null);
    }

    #[test]
    fn not_found_is_application_error() {
        let error = JsonRpcError::not_found();
        assert!(error.is_not_found());
        assert!(!ErrorCode::is_reserved(error.code));
    }

    #[test]
    fn error_response_skips_result() {
        let response = JsonRpcResponse::error(JsonRpcError::database_error(), Some("1".into()));
        let json = serde_json::to_value(&response).unwrap();

        assert!(json.get("result").is_none());
        assert_eq!(json["error"]["code"], -32603);
        assert_eq!(json["error"]["message"], "database error");
        assert!(!response.is_success());
    }
}
