pub use order::OrderController;
pub use station::StationController;
pub use task::TaskController;

mod order;
mod station;
mod task;
