mod cli;
mod config;
mod platform;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use vigil_scheduler::{
    ChannelCompletionHandler, Diagnostics, LogStorage, Scheduler, SessionFactories,
    StorageDispatcher,
};

use crate::cli::AgentArgs;
use crate::config::AgentConfig;
use crate::platform::PlatformSessionFactory;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = AgentArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => AgentConfig::from_file(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => {
            info!("No config file given, sampling host platform defaults");
            AgentConfig::platform_defaults().context("invalid default configuration")?
        }
    };
    if let Some(workers) = args.workers {
        config.scheduler.worker_threads = workers;
    }

    let tasks = config.build_tasks().context("failed to build tasks")?;
    if tasks.is_empty() {
        warn!("No tasks configured; the agent will idle until stopped");
    }

    if args.check {
        for task in &tasks {
            println!("{task}");
        }
        println!("{} tasks OK", tasks.len());
        return Ok(());
    }

    info!(
        endpoint = %config.agent.endpoint,
        tasks = tasks.len(),
        workers = config.scheduler.resolved_worker_threads(),
        "starting vigil-agent"
    );

    let diagnostics = Arc::new(Diagnostics::new());
    let (handler, receiver) =
        ChannelCompletionHandler::bounded(config.storage.buffer_size, Arc::clone(&diagnostics));
    let dispatcher = StorageDispatcher::new(
        receiver,
        LogStorage,
        &config.storage,
        Arc::clone(&diagnostics),
    )
    .spawn()
    .context("failed to start storage dispatcher")?;

    let sessions = SessionFactories::new().with(Arc::new(PlatformSessionFactory::new()));
    let scheduler = Arc::new(Scheduler::new(
        config.scheduler.clone(),
        sessions,
        Arc::new(handler),
        Arc::clone(&diagnostics),
    ));
    for task in tasks {
        scheduler.register_task(Arc::new(task));
    }

    // Install signal handlers for graceful shutdown.
    let handle = scheduler.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        handle.shutdown();
    });

    // The scheduler loop blocks its thread until shutdown.
    let runner = Arc::clone(&scheduler);
    tokio::task::spawn_blocking(move || runner.run())
        .await
        .context("scheduler thread panicked")??;

    // Dropping the scheduler drops the last completion sender, which lets the
    // dispatcher flush and exit.
    drop(scheduler);
    tokio::task::spawn_blocking(move || dispatcher.join())
        .await
        .context("storage dispatcher join failed")?
        .map_err(|_| anyhow!("storage dispatcher panicked"))?;

    diagnostics.report();
    info!("vigil-agent exited cleanly");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                error!(error = %e, "failed to register SIGTERM handler");
                if let Err(e) = ctrl_c.await {
                    error!(error = %e, "failed to listen for ctrl_c");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = ctrl_c.await {
            error!(error = %e, "failed to listen for ctrl_c");
        }
    }
}
