use std::net::SocketAddr;
use std::sync::Arc;

use afterglow_core::AfterglowConfig;
use afterglow_scheduler::{
    compute_next_fire, upcoming_sunset, Clock, ScheduleSettings, SchedulerEngine, SystemClock,
};
use clap::Parser;
use tracing::{error, info, warn};

mod app;
mod http;
mod push;

/// Daily sunset-quality push service.
#[derive(Debug, Parser)]
#[command(name = "afterglow-gateway", version, about)]
struct Cli {
    /// Config file (default: $AFTERGLOW_CONFIG, then ~/.afterglow/afterglow.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<String>,

    /// Validate the config, print the next push and sunset, then exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "afterglow_gateway=info,afterglow_scheduler=info,tower_http=debug".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    let config = AfterglowConfig::load(cli.config.as_deref())?;
    config.validate()?;
    let settings = ScheduleSettings::from_config(&config)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    if cli.check {
        return print_check(&config, &settings, clock.as_ref());
    }

    let task = push::PushTask::from_config(&config, Arc::clone(&clock))?;

    info!(
        city = %config.location.city,
        location = %settings.location,
        offset = %settings.offset,
        trigger = %settings.policy,
        "afterglow starting"
    );

    let (engine, handle) = SchedulerEngine::new(settings, Arc::new(task), clock);
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let mut engine_task = tokio::spawn(engine.run(shutdown_rx));

    let addr: SocketAddr = config.server.socket_addr()?;
    let state = Arc::new(app::AppState::new(config, handle));
    let router = app::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Afterglow gateway listening on {}", addr);
    info!("  GET|POST /trigger-push   manual push");
    info!("  GET      /health         liveness");
    info!("  GET      /config         schedule and loop state");
    info!("  GET      /sunset-time    next sunset");

    let server = async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    };

    tokio::select! {
        served = server => {
            served?;
            info!("HTTP server stopped");
        }
        finished = &mut engine_task => {
            // The loop only ends on its own when the schedule is unusable.
            return match finished {
                Ok(Ok(())) => Err(anyhow::anyhow!("scheduler stopped unexpectedly")),
                Ok(Err(e)) => {
                    error!("scheduler failed: {e}");
                    Err(anyhow::Error::new(e).context("scheduler configuration error"))
                }
                Err(join) => Err(join.into()),
            };
        }
    }

    // signal scheduler to stop
    let _ = shutdown_tx.send(true);
    match engine_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("scheduler exited with error during shutdown: {e}"),
        Err(e) => warn!("scheduler task panicked: {e}"),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// `--check`: report what the service would do without starting it.
fn print_check(
    config: &AfterglowConfig,
    settings: &ScheduleSettings,
    clock: &dyn Clock,
) -> anyhow::Result<()> {
    let now = clock.now();
    let next = compute_next_fire(&settings.policy, &settings.location, settings.offset, now)?;
    let sunset = upcoming_sunset(&settings.location, settings.offset, now);

    println!("config ok");
    println!("  city:        {}", config.location.city);
    println!("  location:    {}", settings.location);
    println!("  offset:      {}", settings.offset);
    println!("  trigger:     {}", settings.policy);
    println!("  listen:      {}:{}", config.server.bind, config.server.port);
    println!("  next push:   {}", next.at.format(http::TIME_FORMAT));
    println!(
        "  next sunset: {} ({:?})",
        sunset.instant.format(http::TIME_FORMAT),
        sunset.condition
    );
    Ok(())
}
