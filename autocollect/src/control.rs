use {
    crate::{
        capture::Capturer,
        config::Config,
        debug_flag::{self, DebugFlag},
        dispatcher::{CollectOutcome, Dispatcher},
        error::StartupError,
        platform::{Pointer, ScreenSource, TriggerSource, WindowLocator},
        template::{load_template, MarkerTemplate},
    },
    anyhow::{bail, Context as _},
    itertools::Itertools,
    std::{
        sync::atomic::{AtomicBool, Ordering},
        thread::sleep,
        time::Duration,
    },
    tracing::{debug, info, warn},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Templates are loaded and the target window is known.
    Init,
    /// The debug hotkey listener is running.
    Ready,
    Running,
    Stopped,
}

#[derive(Debug)]
pub struct Marker {
    name: String,
    template: Option<MarkerTemplate>,
    collected: u64,
}

impl Marker {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> Option<&MarkerTemplate> {
        self.template.as_ref()
    }

    pub fn collected(&self) -> u64 {
        self.collected
    }
}

/// Runs capture, matching and clicking for every marker at a fixed cadence.
pub struct ControlLoop<S, P> {
    dispatcher: Dispatcher<S, P>,
    markers: Vec<Marker>,
    pass_interval: Duration,
    state: LoopState,
}

impl<S: ScreenSource, P: Pointer> ControlLoop<S, P> {
    /// Loads the marker templates and finds the target window.
    ///
    /// Fails with [`StartupError`] if there is nothing to collect or the window
    /// is not open. Missing templates are not fatal.
    pub fn init<L: WindowLocator>(
        config: &Config,
        locator: &L,
        source: S,
        pointer: P,
    ) -> anyhow::Result<Self> {
        if config.markers.is_empty() {
            return Err(StartupError::NoMarkers.into());
        }
        let markers = config
            .markers
            .iter()
            .map(|marker| Marker {
                name: marker.name.clone(),
                template: load_template(&marker.name, &marker.path),
                collected: 0,
            })
            .collect_vec();

        let window = locator
            .locate(&config.window_title)
            .context("failed to look up target window")?
            .ok_or_else(|| StartupError::WindowNotFound {
                title: config.window_title.clone(),
            })?;
        info!("found {:?} at {}", config.window_title, window);
        let region = if config.full_screen {
            None
        } else {
            Some(window)
        };

        let capturer = Capturer::new(source, region, DebugFlag::new(), &config.debug_dir);
        Ok(Self {
            dispatcher: Dispatcher::new(
                capturer,
                config.matcher(),
                pointer,
                config.dispatch_settings(),
            ),
            markers,
            pass_interval: config.pass_interval(),
            state: LoopState::Init,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn debug_flag(&self) -> &DebugFlag {
        self.dispatcher.capturer().debug_flag()
    }

    /// Collected counts per marker, in configured order.
    pub fn totals(&self) -> Vec<(&str, u64)> {
        self.markers
            .iter()
            .map(|marker| (marker.name(), marker.collected()))
            .collect()
    }

    /// Starts the debug snapshot listener on `trigger`.
    pub fn start_listener<T>(&mut self, trigger: T, debounce: Duration) -> anyhow::Result<()>
    where
        T: TriggerSource + 'static,
    {
        if self.state != LoopState::Init {
            bail!("debug listener can only be started once, state is {:?}", self.state);
        }
        debug_flag::spawn_listener(trigger, self.debug_flag().clone(), debounce)?;
        self.state = LoopState::Ready;
        Ok(())
    }

    /// Runs passes until `shutdown` is set.
    pub fn run(&mut self, shutdown: &AtomicBool) -> anyhow::Result<()> {
        if self.state != LoopState::Ready {
            bail!("control loop is not ready, state is {:?}", self.state);
        }
        self.state = LoopState::Running;
        info!("collecting {}", self.markers.iter().map(Marker::name).join(", "));

        while !shutdown.load(Ordering::Relaxed) {
            self.run_pass(shutdown);
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            sleep(self.pass_interval);
        }

        self.state = LoopState::Stopped;
        info!(
            "stopped, collected {}",
            self.totals()
                .into_iter()
                .map(|(name, count)| format!("{name}: {count}"))
                .join(", ")
        );
        Ok(())
    }

    /// Runs `collect` for every marker once and returns the number of clicks.
    ///
    /// Errors are logged and the pass moves on to the next marker.
    pub fn run_pass(&mut self, shutdown: &AtomicBool) -> usize {
        let mut clicks = 0;
        for marker in &mut self.markers {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            match self.dispatcher.collect(marker.template.as_ref()) {
                Ok(outcome) => {
                    if let CollectOutcome::Interrupted { clicked, remaining } = outcome {
                        debug!(
                            "{}: batch interrupted after {} clicks, {} left",
                            marker.name, clicked, remaining
                        );
                    }
                    clicks += outcome.clicks();
                    marker.collected += outcome.clicks() as u64;
                }
                Err(err) => warn!("{}: collection failed: {:?}", marker.name, err),
            }
        }
        clicks
    }
}
