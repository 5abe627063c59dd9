use sqlx::{
    pool::PoolConnection,
    postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode},
    Postgres, Transaction,
};
use std::{fmt::Display, marker::PhantomData, path::PathBuf, str::FromStr, time};

#[macro_use]
extern crate log;

mod order;
mod trip;

pub use order::*;
pub use sqlx::postgres::PgPool as Pool;
pub use trip::*;

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// A transaction on a pooled connection. Rolls back when dropped without a commit.
pub type DbTransaction<'c> = Transaction<'c, Postgres>;

#[derive(Clone)]
pub struct PoolSettings {
    pub addr: String,
    pub max_connections: u32,
    /// CA certificate to verify the server against. Without it the connection
    /// falls back to whatever `sslmode` the address asks for.
    pub root_cert: Option<PathBuf>,
}

impl PoolSettings {
    pub fn new(addr: String, max_connections: u32, root_cert: Option<PathBuf>) -> Self {
        Self {
            addr,
            max_connections,
            root_cert,
        }
    }

    fn connect_options(&self) -> DatabaseResult<PgConnectOptions> {
        let mut options = PgConnectOptions::from_str(&self.addr)?;
        if let Some(root_cert) = &self.root_cert {
            options = options
                .ssl_mode(PgSslMode::VerifyFull)
                .ssl_root_cert(root_cert);
        }
        Ok(options)
    }

    /// Opens the connection pool shared by every `Database` handle.
    pub async fn connect(&self) -> DatabaseResult<PgPool> {
        let options = self.connect_options()?;
        let timer = time::Instant::now();
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect_with(options)
            .await?;
        info!(
            "opened database pool with at most {} connections in {:?}",
            self.max_connections,
            timer.elapsed()
        );
        Ok(pool)
    }
}

pub struct Database<T> {
    pool: PgPool,
    _phantom: PhantomData<T>,
}

impl<T> Database<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: PhantomData,
        }
    }

    async fn get_connection(&self) -> DatabaseResult<PoolConnection<Postgres>> {
        trace!("acquiring database connection");
        let timer = time::Instant::now();
        let conn = self.pool.acquire().await?;
        trace!("acquired database connection in {:?}", timer.elapsed());
        Ok(conn)
    }

    /// Starts a transaction on a connection of its own.
    pub async fn begin(&self) -> DatabaseResult<DbTransaction<'static>> {
        trace!("starting database transaction");
        let timer = time::Instant::now();
        let tx = self.pool.begin().await?;
        trace!("started database transaction in {:?}", timer.elapsed());
        Ok(tx)
    }

    pub async fn commit(&self, tx: DbTransaction<'_>) -> DatabaseResult<()> {
        let timer = time::Instant::now();
        tx.commit().await?;
        trace!("committed database transaction in {:?}", timer.elapsed());
        Ok(())
    }

    /// Checks that a connection can be acquired and answers a trivial query.
    pub async fn ping(&self) -> DatabaseResult<()> {
        let mut db = self.get_connection().await?;
        let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&mut db).await?;
        Ok(())
    }
}

#[derive(Debug)]
pub enum DatabaseError {
    SqlxError(sqlx::Error),
    UnexpectedRowCount(u64),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(sqlx_error: sqlx::Error) -> Self {
        DatabaseError::SqlxError(sqlx_error)
    }
}

impl Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let output = match self {
            DatabaseError::SqlxError(e) => e.to_string(),
            DatabaseError::UnexpectedRowCount(rows) => {
                format!("statement changed {} rows", rows)
            }
        };

        write!(f, "{}", output)
    }
}

impl std::error::Error for DatabaseError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertionResult {
    Inserted,
    AlreadyExists,
}

impl InsertionResult {
    pub(crate) fn from_changed_rows(changed_rows: u64) -> DatabaseResult<Self> {
        match changed_rows {
            1 => Ok(Self::Inserted),
            0 => Ok(Self::AlreadyExists),
            more => Err(DatabaseError::UnexpectedRowCount(more)),
        }
    }
}
