use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use rightlane::analysis::GeminiClient;
use rightlane::cli::Repl;
use rightlane::config::AppConfig;
use rightlane::session::{Services, Session};
use rightlane::store::{KeyValueStore, LibSqlStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Invalid configuration")?;

    // Initialize tracing. The terminal is also the REPL, so logs can go to a
    // rolling file instead of stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _log_guard = match config.log_dir {
        Some(ref dir) => {
            let appender = tracing_appender::rolling::daily(dir, "rightlane.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    };

    let api_key = config.require_api_key()?.clone();

    eprintln!("RightLane v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Analysis model: {}", config.gemini.analysis_model);
    eprintln!("   Chat model: {}", config.gemini.chat_model);
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!("   Type /help for commands. /quit to exit.\n");

    // ── Storage ─────────────────────────────────────────────────────────
    let store: Arc<dyn KeyValueStore> = Arc::new(
        LibSqlStore::new_local(&config.db_path, &config.user)
            .await
            .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?,
    );

    // ── Services ────────────────────────────────────────────────────────
    let gemini = Arc::new(GeminiClient::new(api_key, config.gemini.clone())?);
    let services = Services {
        analysis: gemini.clone(),
        conversation: gemini,
    };

    let session = Session::load(store, services, config.chat.clone()).await;
    Repl::new(session).run().await;

    eprintln!("Goodbye.");
    Ok(())
}
