use crate::app::{AppError, AppResult, ParamsError};
use chrono::{DateTime, Duration, Utc};
use contracts::{order::OrderItem, task::*, *};
use database::{Order as DbOrder, OrderDatabase};
use std::{convert::TryFrom, sync::Arc};

pub struct TaskController {
    order_db: Arc<OrderDatabase>,
    window: Duration,
}

impl TaskController {
    pub fn new(order_db: Arc<OrderDatabase>, window: Duration) -> Self {
        Self { order_db, window }
    }

    pub async fn get_tasks(&self, request: JsonRpcRequest) -> AppResult<get_tasks::MethodResult> {
        use get_tasks::{MethodResult, Params};
        let _params = Params::try_from(request)?;

        let (from, to) = worklist_window(Utc::now(), self.window);
        let orders = self.order_db.get_orders_between(from, to).await?;

        let tasks = orders
            .into_iter()
            .map(|order| TaskWrapper::try_from(order).map(|w| w.0))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("{} tasks between {} and {}", tasks.len(), from, to);
        Ok(MethodResult::new(tasks))
    }
}

/// The trailing interval ending at `now` that delivery times are listed for.
pub fn worklist_window(now: DateTime<Utc>, window: Duration) -> (DateTime<Utc>, DateTime<Utc>) {
    (now - window, now)
}

struct TaskWrapper(Task);

impl TryFrom<DbOrder> for TaskWrapper {
    type Error = AppError;

    fn try_from(db_order: DbOrder) -> Result<Self, Self::Error> {
        let arrival_time = db_order.delivery_time_s().ok_or_else(|| {
            AppError::internal_error()
                .with_context(&format!("order '{}' has no delivery time", db_order.id))
        })?;
        let create_time = db_order.created_s();

        let order = db_order
            .items
            .0
            .into_iter()
            .map(|item| OrderItem::new(item.category, item.quantity))
            .collect();

        Ok(TaskWrapper(Task::new(
            db_order.train,
            db_order.carriage,
            db_order.station,
            db_order.repeat_order,
            db_order.delivery,
            order,
            arrival_time,
            create_time,
        )))
    }
}

impl ParamsError for get_tasks::InvalidParams {}
