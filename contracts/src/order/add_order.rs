use super::OrderItem;
use crate::JsonRpcRequest;
use std::{
    convert::{TryFrom, TryInto},
    error::Error,
    fmt::Display,
};
use uuid::Uuid;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "ParamsBuilder")]
#[non_exhaustive]
pub struct Params {
    pub train: String,
    pub carriage: String,
    pub station: String,
    pub repeat_order: bool,
    pub delivery: bool,
    pub order: Vec<OrderItem>,
}

impl Params {
    /// ## Error
    /// * If `train` is empty or only whitespace.
    pub fn new(
        train: &str,
        carriage: String,
        station: String,
        repeat_order: bool,
        delivery: bool,
        order: Vec<OrderItem>,
    ) -> Result<Self, InvalidParams> {
        let train = train.trim();
        if train.is_empty() {
            return Err(InvalidParams::EmptyTrain);
        }

        Ok(Self {
            train: train.to_owned(),
            carriage,
            station,
            repeat_order,
            delivery,
            order,
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
        Params::new(
            &builder.train,
            builder.carriage,
            builder.station,
            builder.repeat_order,
            builder.delivery,
            builder.order,
        )
    }
}

#[derive(serde::Deserialize)]
struct ParamsBuilder {
    train: String,
    #[serde(default)]
    carriage: String,
    #[serde(default)]
    station: String,
    #[serde(default)]
    repeat_order: bool,
    #[serde(default)]
    delivery: bool,
    #[serde(default)]
    order: Vec<OrderItem>,
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
    pub id: Uuid,
}

impl MethodResult {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deser() {
        let json = r#"
        {
            "train": "2134",
            "carriage": "4",
            "station": "740000001",
            "repeat_order": true,
            "delivery": false,
            "order": [
                { "category": "latte", "quantity": 2 },
                { "category": "sandwich", "quantity": 1 }
            ]
        }
        "#;
        let params = serde_json::from_str::<Params>(json).unwrap();

        assert_eq!(params.train, "2134");
        assert_eq!(params.carriage, "4");
        assert!(params.repeat_order);
        assert!(!params.delivery);
        assert_eq!(
            params.order,
            vec![
                OrderItem::new("latte".to_owned(), 2),
                OrderItem::new("sandwich".to_owned(), 1)
            ]
        );
    }

    #[test]
    fn optional_fields_default() {
        let params = serde_json::from_str::<Params>(r#"{ "train": "X2134" }"#).unwrap();

        assert_eq!(params.carriage, "");
        assert_eq!(params.station, "");
        assert!(!params.repeat_order);
        assert!(!params.delivery);
        assert!(params.order.is_empty());
    }

    #[test]
    fn train_is_required() {
        let invalids = [
            r#"{ "carriage": "4" }"#,
            r#"{ "train": "" }"#,
            r#"{ "train": " ", "station": "Cst" }"#,
            r#"{ "train": "2134", "order": [{ "category": "latte", "quantity": -1 }] }"#,
        ];

        for invalid in &invalids {
            let params = serde_json::from_str::<Params>(invalid);
            assert!(params.is_err(), "{:?}", params);
        }
    }
}
