use crate::{
    controller::{OrderController, StationController, TaskController},
    resrobot::{ResRobotClient, TimeResolver},
    Opts,
};
use contracts::*;
use database::{Database, DatabaseError, Pool, PoolSettings};
use std::{
    error::Error,
    fmt::{Debug, Display},
    str::FromStr,
    sync::Arc,
};

pub type AppResult<T> = Result<T, AppError>;

pub struct App {
    station_controller: StationController,
    order_controller: OrderController,
    task_controller: TaskController,
}

impl App {
    /// Connects to the database and checks that it answers.
    pub async fn new(opts: Opts) -> AppResult<Self> {
        let pool = PoolSettings::new(
            opts.database_addr.clone(),
            opts.database_pool_size,
            opts.database_root_cert.clone(),
        )
        .connect()
        .await?;

        Database::<()>::new(pool.clone()).ping().await?;
        info!("database connected");

        let resolver = Arc::new(ResRobotClient::new(opts.resrobot_settings())?);

        Ok(Self::with_parts(&opts, pool, resolver))
    }

    pub fn with_parts(opts: &Opts, pool: Pool, resolver: Arc<dyn TimeResolver>) -> Self {
        let trip_db = Arc::new(Database::new(pool.clone()));
        let order_db = Arc::new(Database::new(pool));

        let station_controller = StationController::new(trip_db, opts.local_utc_offset);
        let order_controller = OrderController::new(order_db.clone(), resolver);
        let task_controller = TaskController::new(order_db, opts.task_window());

        Self {
            station_controller,
            order_controller,
            task_controller,
        }
    }

    /// Handle a single JSON RPC request
    pub async fn handle_single(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let timer = std::time::Instant::now();
        let id = request.id.clone();

        let method = request.method.to_owned();
        info!(
            "handling request with id {:?} with method: '{}'",
            id, request.method
        );

        let result = match Method::from_str(&method) {
            Err(_) => Err(AppError::from(JsonRpcError::method_not_found())),
            Ok(method) => {
                trace!("request: {:?}", request);
                let id = id.clone();
                match method {
                    Method::GetStations => self
                        .station_controller
                        .get_stations(request)
                        .await
                        .map(|result| JsonRpcResponse::success(result, id)),
                    Method::AddOrder => self
                        .order_controller
                        .add_order(request)
                        .await
                        .map(|result| JsonRpcResponse::success(result, id)),
                    Method::GetTasks => self
                        .task_controller
                        .get_tasks(request)
                        .await
                        .map(|result| JsonRpcResponse::success(result, id)),
                }
            }
        };

        let elapsed = timer.elapsed();
        info!(
            "handled request with id {:?} and method: '{}' in {:?}",
            id, method, elapsed
        );

        match result {
            Ok(ok) => ok,
            Err(err) => {
                if err.context.is_some() {
                    error!("error with context: {:?}", err);
                }
                JsonRpcResponse::error(err.rpc_error, id)
            }
        }
    }
}

/// An error that is sent back to the caller as `rpc_error`, while `context`
/// only ever ends up in the log.
#[derive(Debug)]
pub struct AppError {
    pub rpc_error: JsonRpcError,
    pub context: Option<String>,
}

impl AppError {
    pub fn with_context<T>(mut self, value: &T) -> Self
    where
        T: Debug,
    {
        self.context = Some(format!("{:?}", value));
        self
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.rpc_error.message = message.to_owned();
        self
    }

    pub fn invalid_request() -> Self {
        Self::from(JsonRpcError::invalid_request())
    }

    pub fn invalid_params() -> Self {
        Self::from(JsonRpcError::invalid_params())
    }

    pub fn internal_error() -> Self {
        Self::from(JsonRpcError::internal_error())
    }

    pub fn database_error() -> Self {
        Self::from(JsonRpcError::database_error())
    }

    pub fn not_found() -> Self {
        Self::from(JsonRpcError::not_found())
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.context {
            Some(context) => write!(f, "{} ({})", self.rpc_error.message, context),
            None => write!(f, "{}", self.rpc_error.message),
        }
    }
}

impl Error for AppError {}

impl From<JsonRpcError> for AppError {
    fn from(rpc_error: JsonRpcError) -> Self {
        Self {
            rpc_error,
            context: None,
        }
    }
}

impl From<DatabaseError> for AppError {
    fn from(db_error: DatabaseError) -> Self {
        AppError::database_error().with_context(&db_error)
    }
}

impl From<isahc::Error> for AppError {
    fn from(e: isahc::Error) -> Self {
        AppError::internal_error().with_context(&e)
    }
}

pub trait ParamsError: Error {}

impl<T> From<T> for AppError
where
    T: ParamsError,
{
    fn from(err: T) -> Self {
        AppError::invalid_params()
            .with_message(&err.to_string())
            .with_context(&err)
    }
}
