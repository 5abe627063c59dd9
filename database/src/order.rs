use crate::{Database, DatabaseResult, DbTransaction, InsertionResult};
use chrono::{DateTime, Utc};
use sqlx::{types::Json, Acquire};

pub type OrderDatabase = Database<Order>;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OrderItem {
    pub category: String,
    pub quantity: u32,
}

impl OrderItem {
    pub fn new(category: String, quantity: u32) -> Self {
        Self { category, quantity }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Order {
    pub id: String,
    pub train: String,
    pub carriage: String,
    pub station: String,
    pub repeat_order: bool,
    pub delivery: bool,
    pub items: Json<Vec<OrderItem>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
}

impl Order {
    pub fn delivery_time_s(&self) -> Option<i64> {
        self.delivery_time.map(|ts| ts.timestamp())
    }

    pub fn created_s(&self) -> i64 {
        self.created.timestamp()
    }
}

/// The columns of an order that are known when it is placed.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: String,
    pub train: String,
    pub carriage: String,
    pub station: String,
    pub repeat_order: bool,
    pub delivery: bool,
    pub items: Vec<OrderItem>,
}

impl OrderDatabase {
    pub async fn insert_order(
        &self,
        tx: &mut DbTransaction<'_>,
        order: &NewOrder,
    ) -> DatabaseResult<InsertionResult> {
        let query_result = sqlx::query(
            "
            INSERT INTO orders (id, train, carriage, station, repeat_order, delivery, items)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING",
        )
        .bind(&order.id)
        .bind(&order.train)
        .bind(&order.carriage)
        .bind(&order.station)
        .bind(order.repeat_order)
        .bind(order.delivery)
        .bind(Json(&order.items))
        .execute(&mut *tx)
        .await?;

        InsertionResult::from_changed_rows(query_result.rows_affected())
    }

    /// Attaches a delivery time to an order that has none yet.
    ///
    /// Runs inside a savepoint, so a failing update leaves `tx` usable and the
    /// order as it was inserted.
    pub async fn set_delivery_time(
        &self,
        tx: &mut DbTransaction<'_>,
        id: &str,
        delivery_time: DateTime<Utc>,
    ) -> DatabaseResult<bool> {
        let mut savepoint = Acquire::begin(&mut *tx).await?;

        let query_result = sqlx::query(
            "UPDATE orders SET delivery_time = $1 WHERE id = $2 AND delivery_time IS NULL",
        )
        .bind(delivery_time)
        .bind(id)
        .execute(&mut savepoint)
        .await?;

        savepoint.commit().await?;

        Ok(query_result.rows_affected() == 1)
    }

    /// All orders with a delivery time in `[from, to]`, soonest first.
    pub async fn get_orders_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DatabaseResult<Vec<Order>> {
        let mut tx = self.begin().await?;
        let orders = self.orders_between(&mut tx, from, to).await?;
        self.commit(tx).await?;

        Ok(orders)
    }

    pub async fn orders_between(
        &self,
        tx: &mut DbTransaction<'_>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DatabaseResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "
            SELECT id, train, carriage, station, repeat_order, delivery, items, delivery_time, created
            FROM orders
            WHERE delivery_time BETWEEN $1 AND $2
            ORDER BY delivery_time, created, id",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&mut *tx)
        .await?;

        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn epoch_seconds_test() {
        let order = Order {
            id: "5c0d1c6e-6c8f-4a53-9a1e-0d4b3f1f6c11".to_string(),
            train: "2134".to_string(),
            carriage: "4".to_string(),
            station: "740000001".to_string(),
            repeat_order: false,
            delivery: true,
            items: Json(vec![OrderItem::new("latte".to_string(), 2)]),
            delivery_time: Some(Utc.with_ymd_and_hms(2021, 2, 22, 10, 2, 44).unwrap()),
            created: Utc.with_ymd_and_hms(2021, 2, 22, 9, 30, 0).unwrap(),
        };

        assert_eq!(order.delivery_time_s(), Some(1613988164));
        assert_eq!(order.created_s(), 1613986200);

        let unresolved = Order {
            delivery_time: None,
            ..order
        };
        assert_eq!(unresolved.delivery_time_s(), None);
    }

    fn new_order(id: &str, train: &str) -> NewOrder {
        NewOrder {
            id: id.to_owned(),
            train: train.to_owned(),
            carriage: "4".to_owned(),
            station: "Cst".to_owned(),
            repeat_order: false,
            delivery: true,
            items: vec![OrderItem::new("coffee".to_owned(), 2)],
        }
    }

    /// Orders in a temporary table that disappears with the transaction.
    async fn orders_tx(db: &OrderDatabase) -> DbTransaction<'static> {
        let mut tx = db.begin().await.unwrap();
        let ddl = include_str!("../sql/orders.sql").replace(
            "CREATE TABLE IF NOT EXISTS orders",
            "CREATE TEMP TABLE orders",
        );
        sqlx::Executor::execute(&mut tx, ddl.as_str()).await.unwrap();
        tx
    }

    #[tokio::test]
    #[ignore = "needs ORDERS_TEST_DATABASE_ADDR"]
    async fn worklist_window_pg() {
        let db = OrderDatabase::new(crate::tests::test_pool().await);
        let mut tx = orders_tx(&db).await;

        let placed = Utc.with_ymd_and_hms(2021, 6, 1, 8, 0, 0).unwrap();
        let later = new_order("a", "X2134");
        let sooner = new_order("b", "X2134");
        let unresolved = new_order("c", "X2134");

        for order in &[&later, &sooner, &unresolved] {
            assert_eq!(
                db.insert_order(&mut tx, order).await.unwrap(),
                InsertionResult::Inserted
            );
        }
        assert!(db
            .set_delivery_time(&mut tx, "a", placed + Duration::minutes(45))
            .await
            .unwrap());
        assert!(db
            .set_delivery_time(&mut tx, "b", placed + Duration::minutes(10))
            .await
            .unwrap());

        let at_50 = placed + Duration::minutes(50);
        let orders = db
            .orders_between(&mut tx, at_50 - Duration::minutes(60), at_50)
            .await
            .unwrap();
        let ids: Vec<_> = orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(orders
            .windows(2)
            .all(|w| w[0].delivery_time <= w[1].delivery_time));
        assert_eq!(orders[1].items.0, vec![OrderItem::new("coffee".to_owned(), 2)]);

        let at_125 = placed + Duration::minutes(125);
        let orders = db
            .orders_between(&mut tx, at_125 - Duration::minutes(60), at_125)
            .await
            .unwrap();
        assert!(orders.is_empty());

        let everything = db
            .orders_between(
                &mut tx,
                Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap(),
            )
            .await
            .unwrap();
        assert!(everything.iter().all(|o| o.id != "c"));
    }

    #[tokio::test]
    #[ignore = "needs ORDERS_TEST_DATABASE_ADDR"]
    async fn delivery_time_is_set_once_pg() {
        let db = OrderDatabase::new(crate::tests::test_pool().await);
        let mut tx = orders_tx(&db).await;
        let order = new_order("a", "X2134");
        let first = Utc.with_ymd_and_hms(2021, 6, 1, 8, 45, 0).unwrap();

        assert_eq!(
            db.insert_order(&mut tx, &order).await.unwrap(),
            InsertionResult::Inserted
        );
        assert_eq!(
            db.insert_order(&mut tx, &order).await.unwrap(),
            InsertionResult::AlreadyExists
        );

        assert!(db.set_delivery_time(&mut tx, "a", first).await.unwrap());
        assert!(!db
            .set_delivery_time(&mut tx, "a", first + Duration::hours(1))
            .await
            .unwrap());
        assert!(!db.set_delivery_time(&mut tx, "missing", first).await.unwrap());

        let orders = db
            .orders_between(&mut tx, first, first + Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].delivery_time, Some(first));
    }
}
