//! sweep - entry point for the command-line Gmail cleaner

use sweep::config::Settings;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting sweep");

    let settings = Settings::from_env();
    if let Err(e) = sweep::cli::run(settings).await {
        tracing::error!("Application error: {}", e);
        std::process::exit(1);
    }
}
