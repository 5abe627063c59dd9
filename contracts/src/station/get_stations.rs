use super::Station;
use crate::JsonRpcRequest;
use std::{
    convert::{TryFrom, TryInto},
    error::Error,
    fmt::Display,
};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "ParamsBuilder")]
#[non_exhaustive]
pub struct Params {
    pub train: String,
}

impl Params {
    /// ## Error
    /// * If `train` is empty or only whitespace.
    pub fn new(train: &str) -> Result<Self, InvalidParams> {
        let train = train.trim();
        if train.is_empty() {
            return Err(InvalidParams::EmptyTrain);
        }

        Ok(Self {
            train: train.to_owned(),
        })
    }
}

impl TryFrom<JsonRpcRequest> for Params {
    type Error = InvalidParams;

    fn try_from(request: JsonRpcRequest) -> Result<Self, Self::Error> {
        let builder: ParamsBuilder =
            serde_json::from_value(request.params).map_err(InvalidParams::InvalidFormat)?;

        builder.try_into()
    }
}

impl TryFrom<ParamsBuilder> for Params {
    type Error = InvalidParams;

    fn try_from(builder: ParamsBuilder) -> Result<Self, Self::Error> {
        Params::new(&builder.train)
    }
}

#[derive(serde::Deserialize)]
struct ParamsBuilder {
    train: String,
}

#[derive(Debug)]
pub enum InvalidParams {
    InvalidFormat(serde_json::Error),
    EmptyTrain,
}

impl Error for InvalidParams {}

impl Display for InvalidParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let output = match self {
            InvalidParams::InvalidFormat(serde_error) => {
                crate::invalid_params_serde_message(serde_error)
            }
            InvalidParams::EmptyTrain => {
                crate::invalid_value_because_message("train", "train can't be empty")
            }
        };
        write!(f, "{}", output)
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
#[non_exhaustive]
pub struct MethodResult {
    pub stations: Vec<Station>,
}

impl MethodResult {
    pub fn new(stations: Vec<Station>) -> Self {
        Self { stations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{station::Geo, Method};
    use serde_json::json;

    #[test]
    fn params_test() {
        assert_eq!(Params::new("X2134").unwrap().train, "X2134");
        assert_eq!(Params::new("  2134 ").unwrap().train, "2134");

        for invalid in &["", "   "] {
            assert!(
                matches!(Params::new(invalid), Err(InvalidParams::EmptyTrain)),
                "{:?}",
                invalid
            );
        }
    }

    #[test]
    fn from_request() {
        let request =
            JsonRpcRequest::new(Method::GetStations, json!({ "train": "2134" }), None).unwrap();
        let params = Params::try_from(request).unwrap();
        assert_eq!(params.train, "2134");

        let request =
            JsonRpcRequest::new(Method::GetStations, json!({ "carriage": "3" }), None).unwrap();
        assert!(matches!(
            Params::try_from(request),
            Err(InvalidParams::InvalidFormat(_))
        ));

        let request =
            JsonRpcRequest::new(Method::GetStations, json!({ "train": "" }), None).unwrap();
        let error = Params::try_from(request).unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid value of 'train', train can't be empty"
        );
    }

    #[test]
    fn result_serialization() {
        let result = MethodResult::new(vec![Station::new(
            "740000001".to_owned(),
            "Stockholm C".to_owned(),
            true,
            false,
            Geo::new(59.330, 18.058),
            1200,
        )]);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            json!({
                "stations": [{
                    "id": "740000001",
                    "title": "Stockholm C",
                    "is_coffee": true,
                    "is_food": false,
                    "geo": { "lat": 59.330, "lon": 18.058 },
                    "time": 1200
                }]
            })
        );
    }
}
