use hyper::{
    service::{make_service_fn, service_fn},
    Server,
};
use server::{app::App, entry_point, Opts, Webserver};
use std::sync::Arc;
use structopt::StructOpt;

#[macro_use]
extern crate log;

#[tokio::main]
async fn main() {
    let env = std::env::var("ORDERS_ENV").unwrap_or_else(|_| "test".to_string());
    let env_file = format!("{}.env", env);
    let env_loaded = dotenv::from_filename(&env_file);

    pretty_env_logger::formatted_timed_builder()
        .parse_filters(&std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    if let Err(e) = env_loaded {
        warn!(
            "{} not loaded from '{:?}': {}",
            env_file,
            std::env::current_dir().unwrap_or_default(),
            e
        );
    }

    let opts = Opts::from_args();

    let app = match App::new(opts.clone()).await {
        Ok(app) => Arc::new(app),
        Err(e) => {
            error!("error starting application: {}", e);
            std::process::exit(1);
        }
    };

    let webserver = Arc::new(Webserver::new(app));

    let addr = ([0, 0, 0, 0], opts.port).into();

    let service = make_service_fn(|_| {
        let webserver = webserver.clone();
        async {
            Ok::<_, hyper::Error>(service_fn(move |request| {
                let webserver = webserver.clone();
                entry_point(webserver, request)
            }))
        }
    });

    let server = Server::bind(&addr).serve(service);

    info!("starting server on {:?}", addr);
    if let Err(e) = server.await {
        error!("server error: {}", e);
    }
}
