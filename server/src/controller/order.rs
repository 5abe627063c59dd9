use crate::{
    app::{AppError, AppResult, ParamsError},
    resrobot::TimeResolver,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contracts::{order::*, *};
use database::{
    Database, DatabaseResult, DbTransaction, InsertionResult, NewOrder, Order as DbOrder,
    OrderDatabase, OrderItem as DbOrderItem,
};
use std::{convert::TryFrom, sync::Arc};
use uuid::Uuid;

/// The writes an order goes through, all inside one transaction.
#[async_trait]
pub trait OrderStore: Send + Sync {
    type Tx: Send;

    async fn begin(&self) -> DatabaseResult<Self::Tx>;

    async fn insert_order(
        &self,
        tx: &mut Self::Tx,
        order: &NewOrder,
    ) -> DatabaseResult<InsertionResult>;

    /// Must leave `tx` usable when it fails.
    async fn set_delivery_time(
        &self,
        tx: &mut Self::Tx,
        id: &str,
        delivery_time: DateTime<Utc>,
    ) -> DatabaseResult<bool>;

    async fn commit(&self, tx: Self::Tx) -> DatabaseResult<()>;
}

#[async_trait]
impl OrderStore for OrderDatabase {
    type Tx = DbTransaction<'static>;

    async fn begin(&self) -> DatabaseResult<Self::Tx> {
        Database::<DbOrder>::begin(self).await
    }

    async fn insert_order(
        &self,
        tx: &mut Self::Tx,
        order: &NewOrder,
    ) -> DatabaseResult<InsertionResult> {
        Database::<DbOrder>::insert_order(self, tx, order).await
    }

    async fn set_delivery_time(
        &self,
        tx: &mut Self::Tx,
        id: &str,
        delivery_time: DateTime<Utc>,
    ) -> DatabaseResult<bool> {
        Database::<DbOrder>::set_delivery_time(self, tx, id, delivery_time).await
    }

    async fn commit(&self, tx: Self::Tx) -> DatabaseResult<()> {
        Database::<DbOrder>::commit(self, tx).await
    }
}

pub struct OrderController<S = OrderDatabase> {
    order_db: Arc<S>,
    resolver: Arc<dyn TimeResolver>,
}

impl<S: OrderStore> OrderController<S> {
    pub fn new(order_db: Arc<S>, resolver: Arc<dyn TimeResolver>) -> Self {
        Self { order_db, resolver }
    }

    pub async fn add_order(&self, request: JsonRpcRequest) -> AppResult<add_order::MethodResult> {
        use add_order::{MethodResult, Params};
        let params = Params::try_from(request)?;
        let id = Uuid::new_v4();

        let new_order = make_db_order(id, params);

        let mut tx = self.order_db.begin().await?;

        match self.order_db.insert_order(&mut tx, &new_order).await? {
            InsertionResult::Inserted => {}
            InsertionResult::AlreadyExists => {
                return Err(AppError::internal_error()
                    .with_context(&format!("order id '{}' already exists", new_order.id)));
            }
        }

        if let Some(delivery_time) = self
            .resolve_delivery_time(&new_order.station, &new_order.train)
            .await
        {
            match self
                .order_db
                .set_delivery_time(&mut tx, &new_order.id, delivery_time)
                .await
            {
                Ok(true) => debug!("order '{}' delivered at {}", new_order.id, delivery_time),
                Ok(false) => warn!("order '{}' already had a delivery time", new_order.id),
                Err(e) => warn!(
                    "error setting delivery time of order '{}': '{}'",
                    new_order.id, e
                ),
            }
        }

        self.order_db.commit(tx).await?;

        info!("added order '{}' for train '{}'", id, new_order.train);
        Ok(MethodResult::new(id))
    }

    /// `None` when the arrival could not be looked up, the order is kept without a time.
    async fn resolve_delivery_time(&self, station: &str, train: &str) -> Option<DateTime<Utc>> {
        match self.resolver.resolve(station, train).await {
            Ok(delivery_time) => Some(delivery_time),
            Err(e) => {
                warn!(
                    "no delivery time for train '{}' at station '{}': {}",
                    train, station, e
                );
                None
            }
        }
    }
}

fn make_db_order(id: Uuid, params: add_order::Params) -> NewOrder {
    NewOrder {
        id: id.to_string(),
        items: params
            .order
            .into_iter()
            .map(|item| DbOrderItem::new(item.category, item.quantity))
            .collect(),
        train: params.train,
        carriage: params.carriage,
        station: params.station,
        repeat_order: params.repeat_order,
        delivery: params.delivery,
    }
}

impl ParamsError for add_order::InvalidParams {}
