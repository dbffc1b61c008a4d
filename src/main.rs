mod api;
mod app;
mod catalog;
mod config;
mod error;
mod matcher;
mod middleware;
mod model;
mod service;

use anyhow::Context;
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::OnceLock,
};
use tokio::net::TcpListener;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    filter::filter_fn, fmt::layer as fmt_layer, prelude::*, EnvFilter, Registry,
};

const CRATE_TARGET: &str = "promo_matcher";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::AppConfig::from_env().context("failed to load configuration")?;
    setup_tracing(&config)?;
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .context("invalid SERVER_BIND address")?;

    tracing::info!(
        %addr,
        threshold = config.matcher.threshold,
        max_results = config.matcher.max_results,
        "starting server"
    );

    let app = app::build_router(&config).await?;
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await.context("server failed")?;

    Ok(())
}

fn setup_tracing(config: &config::AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.logging.level.as_deref().unwrap_or("info"))
    });

    let own_filter = filter_fn(|meta| meta.target().starts_with(CRATE_TARGET));
    let other_filter = filter_fn(|meta| !meta.target().starts_with(CRATE_TARGET));

    // An empty LOG_FILE_PATH keeps logs on stdout only.
    let file_layer = match log_file_target(&config.logging.file) {
        Some((directory, file_name)) => {
            std::fs::create_dir_all(&directory)
                .with_context(|| format!("failed to create log directory {:?}", directory))?;
            let (writer, guard) = tracing_appender::non_blocking(rolling::daily(directory, file_name));
            static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
            let _ = FILE_GUARD.set(guard);

            Some(
                fmt_layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(own_filter.clone()),
            )
        }
        None => None,
    };

    let stdout_own = fmt_layer()
        .with_writer(std::io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_filter(own_filter);

    let stdout_general = fmt_layer()
        .with_writer(std::io::stdout)
        .with_filter(other_filter);

    Registry::default()
        .with(env_filter)
        .with(stdout_own)
        .with(stdout_general)
        .with(file_layer)
        .try_init()
        .context("failed to init tracing subscriber")?;

    Ok(())
}

/// Directory and file name of the rolling log, or `None` when file logging is off.
fn log_file_target(path: &str) -> Option<(PathBuf, String)> {
    let path = Path::new(path.trim());
    let file_name = path.file_name()?.to_str()?.to_string();
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((directory, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_target_splits_directory_and_name() {
        assert_eq!(
            log_file_target("logs/promo-matcher.log"),
            Some((PathBuf::from("logs"), "promo-matcher.log".to_string()))
        );
        assert_eq!(
            log_file_target("matcher.log"),
            Some((PathBuf::from("."), "matcher.log".to_string()))
        );
    }

    #[test]
    fn blank_log_path_disables_file_logging() {
        assert_eq!(log_file_target(""), None);
        assert_eq!(log_file_target("   "), None);
        assert_eq!(log_file_target("logs/.."), None);
    }
}
