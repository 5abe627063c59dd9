pub mod add_order;

/// One line of an order, e.g. two cappuccinos.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct OrderItem {
    pub category: String,
    pub quantity: u32,
}

impl OrderItem {
    pub fn new(category: String, quantity: u32) -> Self {
        Self { category, quantity }
    }
}
