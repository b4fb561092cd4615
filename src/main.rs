// Start of file: src/main.rs

use task_manager::core::faults::install_panic_hook;
use task_manager::core::logging::init_tracing;
use task_manager::{initialize, Lifecycle, OsSignals};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // set up logging
    init_tracing();

    // Signals are taken over before the port is bound, so a SIGTERM during
    // startup is queued for the lifecycle instead of killing the process
    let signals: OsSignals = OsSignals::install()?;

    let app = initialize().await?;

    // Register global process events and graceful shutdown
    install_panic_hook(app.logger.clone());
    let lifecycle: Lifecycle = Lifecycle::new(app.logger.clone(), app.environment.shutdown_timeout());

    let exit_code: i32 = lifecycle.run(app, signals).await;
    std::process::exit(exit_code);
}

// End of file: src/main.rs
