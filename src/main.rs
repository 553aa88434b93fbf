mod app;
mod config;
mod error;
mod state;
mod store;
mod waitlist;

const DEFAULT_LOG_FILTER: &str = "waitlist=debug,axum=info,tower_http=info";

fn log_filter(rust_log: Option<String>) -> String {
    rust_log
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

fn wants_json_logs(log_format: Option<&str>) -> bool {
    log_format.is_some_and(|v| v.eq_ignore_ascii_case("json"))
}

/// Plain text by default; `LOG_FORMAT=json` for one JSON object per event.
fn init_tracing() {
    let env_filter = log_filter(std::env::var("RUST_LOG").ok());
    let log_format = std::env::var("LOG_FORMAT").ok();

    if wants_json_logs(log_format.as_deref()) {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let app_state = state::AppState::init().await?;
    let config = app_state.config.clone();

    let app = app::build_app(app_state);
    app::serve(app, &config).await
}
