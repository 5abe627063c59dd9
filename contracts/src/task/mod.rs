use crate::order::OrderItem;

pub mod get_tasks;

/// An order that is due for delivery.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct Task {
    pub train: String,
    pub carriage: String,
    pub station: String,
    pub repeat_order: bool,
    pub delivery: bool,
    pub order: Vec<OrderItem>,
    /// When the train arrives at `station`, in seconds since the unix epoch.
    pub arrival_time: i64,
    /// When the order was placed, in seconds since the unix epoch.
    pub create_time: i64,
}

impl Task {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        train: String,
        carriage: String,
        station: String,
        repeat_order: bool,
        delivery: bool,
        order: Vec<OrderItem>,
        arrival_time: i64,
        create_time: i64,
    ) -> Self {
        Self {
            train,
            carriage,
            station,
            repeat_order,
            delivery,
            order,
            arrival_time,
            create_time,
        }
    }
}
