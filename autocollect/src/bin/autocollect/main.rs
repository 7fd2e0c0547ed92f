use {
    anyhow::Context as _,
    autocollect::{app, cli::Args},
    clap::Parser,
    std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    tracing::info,
    tracing_subscriber::{filter::LevelFilter, EnvFilter},
};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env()?,
        )
        .init();

    let config = args.into_config()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    ctrlc::set_handler({
        let shutdown = shutdown.clone();
        move || {
            info!("stopping");
            shutdown.store(true, Ordering::Relaxed);
        }
    })
    .context("failed to set Ctrl+C handler")?;

    info!(
        "watching {:?} (threshold {}, {})",
        config.window_title,
        config.threshold,
        if config.full_screen {
            "full screen"
        } else {
            "window only"
        }
    );
    app::run(&config, &shutdown)
}
