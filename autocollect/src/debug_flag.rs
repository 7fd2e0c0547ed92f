use {
    crate::platform::TriggerSource,
    anyhow::Context as _,
    std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        thread,
        time::{Duration, Instant},
    },
    tracing::{info, warn},
};

/// Process-wide "save the next snapshot" request.
///
/// Written by the hotkey listener, consumed by the capturer. A request that
/// arrives while another one is still pending is merged into it.
#[derive(Debug, Clone, Default)]
pub struct DebugFlag(Arc<AtomicBool>);

impl DebugFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Clears the flag and returns whether it was set.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Drops triggers that follow an accepted one within `window`.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    pub fn accept(&mut self, now: Instant) -> bool {
        let too_soon = self
            .last_accepted
            .is_some_and(|last| now.saturating_duration_since(last) < self.window);
        if !too_soon {
            self.last_accepted = Some(now);
        }
        !too_soon
    }
}

/// Starts a detached thread that sets `flag` on every (debounced) trigger.
///
/// The thread is never joined; it ends with the process or when the trigger
/// source fails.
pub fn spawn_listener<T>(mut trigger: T, flag: DebugFlag, debounce: Duration) -> anyhow::Result<()>
where
    T: TriggerSource + 'static,
{
    thread::Builder::new()
        .name("debug-toggle".into())
        .spawn(move || {
            let mut debouncer = Debouncer::new(debounce);
            loop {
                if let Err(err) = trigger.wait_for_trigger() {
                    warn!("debug toggle listener stopped: {:?}", err);
                    break;
                }
                if debouncer.accept(Instant::now()) {
                    info!("debug snapshot requested");
                    flag.set();
                }
            }
        })
        .context("failed to spawn debug toggle listener")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::sync::mpsc::{self, Receiver},
    };

    #[test]
    fn take_clears_the_flag() {
        let flag = DebugFlag::new();
        assert!(!flag.take());
        flag.set();
        flag.set();
        assert!(flag.is_set());
        assert!(flag.take());
        assert!(!flag.is_set());
        assert!(!flag.take());
    }

    #[test]
    fn clones_share_state() {
        let flag = DebugFlag::new();
        flag.clone().set();
        assert!(flag.take());
    }

    #[test]
    fn debouncer_drops_triggers_inside_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        assert!(debouncer.accept(start));
        assert!(!debouncer.accept(start + Duration::from_millis(10)));
        assert!(!debouncer.accept(start + Duration::from_millis(99)));
        assert!(debouncer.accept(start + Duration::from_millis(100)));
        assert!(!debouncer.accept(start + Duration::from_millis(150)));
        assert!(debouncer.accept(start + Duration::from_millis(250)));
    }

    struct ChannelTrigger(Receiver<()>);

    impl TriggerSource for ChannelTrigger {
        fn wait_for_trigger(&mut self) -> anyhow::Result<()> {
            Ok(self.0.recv()?)
        }
    }

    #[test]
    fn listener_sets_flag_once_per_burst() {
        let (sender, receiver) = mpsc::channel();
        let flag = DebugFlag::new();
        spawn_listener(
            ChannelTrigger(receiver),
            flag.clone(),
            Duration::from_secs(60),
        )
        .unwrap();

        sender.send(()).unwrap();
        let started = Instant::now();
        while !flag.is_set() {
            assert!(started.elapsed() < Duration::from_secs(5), "flag was not set");
            thread::sleep(Duration::from_millis(5));
        }
        assert!(flag.take());

        // A bounce right after the first press is ignored.
        sender.send(()).unwrap();
        thread::sleep(Duration::from_millis(100));
        assert!(!flag.is_set());

        // Dropping the sender stops the listener without touching the flag.
        drop(sender);
        thread::sleep(Duration::from_millis(20));
        assert!(!flag.is_set());
    }
}
