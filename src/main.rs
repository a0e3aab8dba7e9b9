use std::{process::ExitCode, sync::Arc};

use hello_auth_server::{
    auth::{
        upstream::{UnconfiguredAuthHandler, UpstreamAuthHandler, DEFAULT_UPSTREAM_TIMEOUT},
        AuthHandler,
    },
    build_app,
    config::{load_dotenv, Config, DEFAULT_DOTENV_PATH},
    logging, AppState,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = load_dotenv(DEFAULT_DOTENV_PATH);
    logging::init_logging();

    match dotenv {
        Ok(true) => info!(path = DEFAULT_DOTENV_PATH, "loaded environment file"),
        Ok(false) => {}
        Err(err) => {
            warn!(path = DEFAULT_DOTENV_PATH, error = %err, "failed to load environment file")
        }
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "server terminated");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let auth_handler = auth_handler_for(&config)?;

    let bind_socket = config.bind_socket()?;
    let state = AppState::new(
        auth_handler,
        config.trusted_origin.clone(),
        config.auth_default_host.clone(),
    );
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(bind_socket)
        .await
        .map_err(|err| format!("failed to bind {bind_socket}: {err}"))?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        trusted_origin = ?config.trusted_origin,
        "server starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

fn auth_handler_for(config: &Config) -> Result<Arc<dyn AuthHandler>, reqwest::Error> {
    match &config.auth_service_url {
        Some(url) => {
            let handler = UpstreamAuthHandler::new(url.clone(), DEFAULT_UPSTREAM_TIMEOUT)?;
            info!(auth_service_url = %handler.base_url(), "relaying auth requests upstream");
            Ok(Arc::new(handler))
        }
        None => {
            warn!("AUTH_SERVICE_URL is not set; /api/auth/* requests will fail");
            Ok(Arc::new(UnconfiguredAuthHandler))
        }
    }
}
