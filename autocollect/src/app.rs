use {
    crate::{config::Config, control::ControlLoop},
    autocollect_desktop::{parse_key, Context, KeyTrigger},
    std::sync::atomic::AtomicBool,
    tracing::info,
};

/// Runs the bot against the real desktop until `shutdown` is set.
pub fn run(config: &Config, shutdown: &AtomicBool) -> anyhow::Result<()> {
    let key = parse_key(&config.debug_key)?;
    let context = Context::new()?;
    let mut control = ControlLoop::init(config, &context, context.clone(), context.clone())?;

    control.start_listener(KeyTrigger::listen(key)?, config.debounce())?;
    info!(
        "press {:?} to save the next frame to {:?}, Ctrl+C to stop",
        key, config.debug_dir
    );
    control.run(shutdown)
}
