#[macro_use]
extern crate log;

mod config;
mod engine_handlers;
mod health_handlers;
mod logging;
mod page_handlers;
mod routes;
mod schemas;

use jokebox_rs_engine as engine;
use jokebox_rs_storage::sqlite::SqliteJokeStore;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() {
    logging_init();

    info!("Parsing config path from argv");
    let config_path = get_config_path_from_argv().unwrap_or_else(|err_msg| {
        eprintln!("Problem parsing arguments: {:?}", err_msg);
        std::process::exit(1);
    });

    info!("Reading application config from {}", config_path.display());
    let config = read_config(&config_path).unwrap_or_else(|err_msg| {
        error!("{}", err_msg);
        std::process::exit(1);
    });

    let socket_addr = config.server.get_socket_addr().unwrap_or_else(|e| {
        error!("Invalid server address '{}': {}", config.server.ip, e);
        std::process::exit(1);
    });

    let store = SqliteJokeStore::open(&config.database.path).unwrap_or_else(|e| {
        error!("Failed to open database '{}': {}", config.database.path, e);
        std::process::exit(1);
    });

    info!("Initialising engine api");
    let api = Arc::new(engine::Api::new(Arc::new(store)));

    info!("Starting web server on {}", socket_addr);
    let routes = routes::build_routes(api);
    let bound = warp::serve(routes).try_bind_with_graceful_shutdown(socket_addr, ctrlc_handler());
    let server = match bound {
        Ok((_, server)) => server,
        Err(e) => {
            error!("Failed to bind {}: {}", socket_addr, e);
            std::process::exit(1);
        }
    };
    server.await;

    info!("Shutting down");
}

fn logging_init() {
    // If log level is not explicitly set,
    // set to info by default
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();
}

/// Wrapper around tokio::signal::ctrl_c
async fn ctrlc_handler() {
    signal::ctrl_c().await.ok();
    info!("SIGINT detected");
}

fn get_config_path_from_argv() -> Result<PathBuf, String> {
    let args: Vec<String> = std::env::args().collect();
    args.get(1)
        .ok_or(String::from("Missing arg"))
        .map(|p| PathBuf::from(p))
}

fn read_config(path: &PathBuf) -> Result<config::Config, String> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    toml::from_str(&config_str).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}
