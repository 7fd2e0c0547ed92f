use {
    crate::{
        capture::Capturer,
        interrupt::{InterruptMonitor, DEFAULT_INTERRUPT_THRESHOLD},
        matcher::Matcher,
        platform::{Pointer, ScreenSource},
        template::MarkerTemplate,
    },
    std::{thread::sleep, time::Duration},
    tracing::{debug, info},
};

pub const DEFAULT_CLICK_DELAY: Duration = Duration::from_millis(50);

/// Result of one detect-and-click cycle for a marker type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectOutcome {
    /// The marker has no template; nothing was captured or clicked.
    NoTemplate,
    /// Nothing matched; the pointer was not touched.
    NoHits,
    /// The user moved the pointer; the rest of the batch was dropped and the
    /// pointer left where the user put it.
    Interrupted { clicked: usize, remaining: usize },
    /// Every hit was clicked and the pointer returned to where it started.
    Completed { clicked: usize },
}

impl CollectOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, CollectOutcome::Completed { .. })
    }

    pub fn clicks(&self) -> usize {
        match *self {
            CollectOutcome::NoTemplate | CollectOutcome::NoHits => 0,
            CollectOutcome::Interrupted { clicked, .. } | CollectOutcome::Completed { clicked } => {
                clicked
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Pointer movement (Manhattan distance, px) that counts as the user taking over.
    pub interrupt_threshold: i32,
    /// Pause after each click so the target registers it.
    pub click_delay: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            interrupt_threshold: DEFAULT_INTERRUPT_THRESHOLD,
            click_delay: DEFAULT_CLICK_DELAY,
        }
    }
}

pub struct Dispatcher<S, P> {
    capturer: Capturer<S>,
    matcher: Matcher,
    pointer: P,
    settings: DispatchSettings,
}

impl<S: ScreenSource, P: Pointer> Dispatcher<S, P> {
    pub fn new(
        capturer: Capturer<S>,
        matcher: Matcher,
        pointer: P,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            capturer,
            matcher,
            pointer,
            settings,
        }
    }

    pub fn capturer(&self) -> &Capturer<S> {
        &self.capturer
    }

    /// Captures the screen, clicks every hit of `template` and puts the pointer back.
    ///
    /// Before each click the pointer is compared with where the bot last left
    /// it. If the user has moved it, the batch stops immediately and the pointer
    /// is not restored.
    pub fn collect(&self, template: Option<&MarkerTemplate>) -> anyhow::Result<CollectOutcome> {
        let Some(template) = template else {
            return Ok(CollectOutcome::NoTemplate);
        };
        let original = self.pointer.position()?;
        let mut monitor = InterruptMonitor::new(original, self.settings.interrupt_threshold);

        let hits = {
            let snapshot = self.capturer.capture()?;
            self.matcher.find(Some(template), &snapshot)
        };
        if hits.is_empty() {
            return Ok(CollectOutcome::NoHits);
        }
        debug!("{}: {} hits", template.name(), hits.len());

        for (index, hit) in hits.iter().enumerate() {
            let current = self.pointer.position()?;
            if monitor.intervened(current) {
                info!(
                    "{}: pointer moved to {} by the user, skipping {} hits",
                    template.name(),
                    current,
                    hits.len() - index
                );
                return Ok(CollectOutcome::Interrupted {
                    clicked: index,
                    remaining: hits.len() - index,
                });
            }
            self.pointer.click(hit.point)?;
            monitor.observe(self.pointer.position()?);
            info!(
                "{}: collected at {} (score {:.3})",
                template.name(),
                hit.point,
                hit.score
            );
            if !self.settings.click_delay.is_zero() {
                sleep(self.settings.click_delay);
            }
        }

        self.pointer.move_to(original)?;
        Ok(CollectOutcome::Completed {
            clicked: hits.len(),
        })
    }
}
