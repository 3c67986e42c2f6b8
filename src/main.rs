use std::net::{SocketAddr, TcpListener};

use actix_web::{App, HttpServer, middleware};
use anyhow::Result;
use clap::Parser;
use log::{error, info, warn};

use confserve::{
    ConfServeConfig, SecurityMiddleware, StartupError, args::CliArgs, errors,
    server::configure_app,
};

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .init();

    let config = ConfServeConfig::try_from_args(args)?;

    run(config).inspect_err(|e| errors::log_error_chain(e.to_string()))?;
    Ok(())
}

#[actix_web::main]
async fn run(config: ConfServeConfig) -> Result<(), StartupError> {
    let listeners = bind_interfaces(&config)?;

    if !config.path.is_dir() {
        warn!(
            "{} is not an existing directory, listing will fail until it is created",
            config.path.display()
        );
    }

    let addresses = listeners
        .iter()
        .filter_map(|l| l.local_addr().ok())
        .map(|addr| format!("http://{addr}"))
        .collect::<Vec<_>>()
        .join(", ");
    info!(
        "Managing '{}' files in {} at {addresses}",
        config.suffix,
        config.path.display()
    );

    let limiter = SecurityMiddleware::shared_state();
    let inner = config.clone();
    let mut srv = HttpServer::new(move || {
        App::new()
            .wrap(SecurityMiddleware::with_state(
                inner.security.clone(),
                limiter.clone(),
            ))
            .wrap(middleware::Condition::new(
                inner.verbose,
                middleware::Logger::default(),
            ))
            .configure(|c| configure_app(c, &inner))
    });

    for listener in listeners {
        srv = srv
            .listen(listener)
            .map_err(|e| StartupError::IoError("Failed to attach listener".to_string(), e))?;
    }

    srv.run()
        .await
        .map_err(|e| StartupError::IoError("Failed to run server".to_string(), e))
}

/// Binds every configured interface, tolerating the ones that fail as long as one works.
///
/// On dual-stack hosts `[::]` already covers IPv4, so the `0.0.0.0` bind is expected to fail.
fn bind_interfaces(config: &ConfServeConfig) -> Result<Vec<TcpListener>, StartupError> {
    let mut listeners = Vec::new();
    for ip in &config.interfaces {
        let addr = SocketAddr::new(*ip, config.port);
        match TcpListener::bind(addr) {
            Ok(listener) => listeners.push(listener),
            Err(e) if listeners.is_empty() && config.interfaces.len() == 1 => {
                error!("Failed to bind {addr}: {e}");
                return Err(StartupError::IoError(format!("Failed to bind {addr}"), e));
            }
            Err(e) => warn!("Skipping {addr}: {e}"),
        }
    }

    if listeners.is_empty() {
        return Err(StartupError::NoBindableInterface(config.port));
    }
    Ok(listeners)
}
