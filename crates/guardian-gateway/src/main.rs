//! Guardian Security Gateway Server
//!
//! Binary entry point: loads and validates the YAML configuration, builds
//! the gateway service, and runs the HTTP listener with the full middleware
//! stack and route surface.

use guardian_rs::config::settings::load_config_from_env;
use guardian_rs::config::validation::ConfigValidator;
use guardian_rs::logs::logger::configure_logger;
use guardian_rs::middleware::security::security_headers;
use guardian_rs::routes::{auth_http, health, metrics, proxy};
use guardian_rs::routes::metrics::MetricsCollector;
use guardian_rs::services::gateway::GatewayService;
use guardian_rs::services::http::{Forwarder, DEFAULT_UPSTREAM_TIMEOUT};

use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info};
use tokio::signal;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Parse configuration, then bring up logging with its settings.
    let config = match load_config_from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    configure_logger(&config.logging);

    info!(
        "Starting {} v{}",
        config.general.gateway_name, config.general.version
    );

    // Configuration errors are fatal at startup; warnings are already logged.
    let validation = ConfigValidator::validate_comprehensive(&config);
    if !validation.is_valid {
        error!("Configuration validation failed:");
        for e in &validation.errors {
            error!("  - {}", e);
        }
        std::process::exit(1);
    }

    let service = match GatewayService::from_config(&config) {
        Ok(service) => service,
        Err(e) => {
            error!("Failed to initialize gateway: {}", e);
            std::process::exit(1);
        }
    };
    service.start();

    let service = web::Data::new(service);
    let forwarder = Forwarder::new(DEFAULT_UPSTREAM_TIMEOUT);
    let metrics_collector = MetricsCollector::default();

    let host = config.general.listen_address.clone();
    let port = config.general.listen_port;
    info!("Starting server on {}:{}", host, port);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .app_data(web::Data::new(forwarder.clone()))
            .app_data(web::Data::new(metrics_collector.clone()))
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T"#,
            ))
            .wrap(security_headers())
            .configure(health::configure_health)
            .configure(metrics::configure_metrics)
            .configure(auth_http::configure_auth_routes)
            // The proxy catch-all goes last so it cannot swallow the
            // endpoints above.
            .configure(proxy::configure_proxy)
    })
    .bind((host.as_str(), port))?
    .run();

    info!("Server started successfully");

    // Graceful shutdown handling
    tokio::select! {
        result = server => {
            match result {
                Ok(_) => info!("Server stopped gracefully"),
                Err(e) => error!("Server error: {}", e),
            }
        }
        _ = signal::ctrl_c() => {
            info!("Received shutdown signal, stopping server...");
        }
    }

    Ok(())
}
