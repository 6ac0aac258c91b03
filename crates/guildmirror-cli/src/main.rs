use clap::Parser;
use guildmirror_cli::cli::{exit_code, Cli};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json);

    tracing::info!("guildmirror starting");

    let prepared = match cli.prepare() {
        Ok(Some(prepared)) => prepared,
        Ok(None) => return ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("operation interrupted by the user");
            on_interrupt.cancel();
        }
    });

    let result = prepared.execute(cancel).await;
    match &result {
        Ok(_) => tracing::info!("check your Discord server to see the results"),
        Err(e) => tracing::error!("cloning failed: {e:#}"),
    }
    ExitCode::from(exit_code(&result))
}
