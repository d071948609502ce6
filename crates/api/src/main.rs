use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use voxbridge_api::state::AppState;
use voxbridge_api::build_router;
use voxbridge_config::Settings;
use voxbridge_relay::backend::remote_ws::{CredentialSource, RemoteRecognizer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = Settings::load().context("loading settings")?;

    let credentials = match (&settings.recognizer.token_env, &settings.recognizer.token) {
        (Some(var), _) => CredentialSource::Env(var.clone()),
        (None, Some(token)) => CredentialSource::Static(token.clone()),
        (None, None) => {
            warn!("no recognizer credentials configured, connecting with an empty token");
            CredentialSource::Static(String::new())
        }
    };
    let backend = Arc::new(
        RemoteRecognizer::new(settings.recognizer.url.clone(), credentials)
            .context("constructing recognizer client")?,
    );

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let app = build_router(AppState::new(settings, backend));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "voxbridge listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
