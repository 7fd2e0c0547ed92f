#[cfg(all(unix, not(target_os = "macos")))]
mod linux;

#[cfg(all(unix, not(target_os = "macos")))]
use crate::linux as imp;

#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "windows")]
use crate::windows as imp;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "macos")]
use crate::macos as imp;

mod key;
mod window;

pub use {
    crate::{
        key::{parse_key, KeyTrigger},
        window::Window,
    },
    rdev::Key,
};

use {
    anyhow::{ensure, Context as _},
    enigo::{Button, Coordinate, Direction, Enigo, Mouse},
    image::{imageops, RgbaImage},
    std::sync::{Arc, Mutex, MutexGuard, PoisonError},
    tracing::trace,
};

struct ContextData {
    imp: imp::Context,
    enigo: Mutex<Enigo>,
}

/// Shared handle to the desktop: windows, screen pixels and the system pointer.
#[derive(Clone)]
pub struct Context(Arc<ContextData>);

impl Context {
    #[allow(clippy::new_without_default)]
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self(Arc::new(ContextData {
            imp: imp::Context::new()?,
            enigo: Mutex::new(Enigo::new(&enigo::Settings::default())?),
        })))
    }

    fn enigo(&self) -> MutexGuard<'_, Enigo> {
        self.0.enigo.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the first window whose title contains `title`.
    pub fn find_window(&self, title: &str) -> anyhow::Result<Option<Window>> {
        let windows = xcap::Window::all()?
            .into_iter()
            .map(|inner| Window::new(self.clone(), inner));
        Ok(first_with_title(windows, title, |window| Ok(window.title()?)))
    }

    pub fn mouse_position(&self) -> anyhow::Result<(i32, i32)> {
        Ok(self.enigo().location()?)
    }

    pub fn mouse_move_global(&self, x: i32, y: i32) -> anyhow::Result<()> {
        self.enigo().move_mouse(x, y, Coordinate::Abs)?;
        Ok(())
    }

    /// Moves the pointer to a global position and clicks the left button there.
    pub fn mouse_left_click_at(&self, x: i32, y: i32) -> anyhow::Result<()> {
        let mut enigo = self.enigo();
        enigo.move_mouse(x, y, Coordinate::Abs)?;
        enigo.button(Button::Left, Direction::Click)?;
        Ok(())
    }

    /// Captures the primary monitor and returns the image with the global
    /// position of its top-left corner.
    pub fn capture_full_screen(&self) -> anyhow::Result<(RgbaImage, (i32, i32))> {
        let monitors = xcap::Monitor::all()?;
        let monitor = primary_or_first(&monitors, |monitor| monitor.is_primary())
            .context("no monitors found")?;
        Ok((monitor.capture_image()?, (monitor.x()?, monitor.y()?)))
    }

    /// Captures a rectangle given in global coordinates.
    ///
    /// The rectangle is taken from the monitor that contains its top-left corner
    /// and is clipped to that monitor's bounds.
    pub fn capture_rect(
        &self,
        left: i32,
        top: i32,
        width: u32,
        height: u32,
    ) -> anyhow::Result<RgbaImage> {
        let monitor = xcap::Monitor::from_point(left, top)
            .with_context(|| format!("no monitor contains point ({left}, {top})"))?;
        let image = monitor.capture_image()?;
        let x = u32::try_from(left - monitor.x()?).unwrap_or(0);
        let y = u32::try_from(top - monitor.y()?).unwrap_or(0);
        ensure!(
            x < image.width() && y < image.height(),
            "rectangle at ({left}, {top}) is outside of the monitor"
        );
        let width = width.min(image.width() - x);
        let height = height.min(image.height() - y);
        Ok(imageops::crop_imm(&image, x, y, width, height).to_image())
    }
}

/// Picks the primary monitor, or the first one if none reports being primary.
fn primary_or_first<M, E: std::fmt::Debug>(
    monitors: &[M],
    is_primary: impl Fn(&M) -> Result<bool, E>,
) -> Option<&M> {
    monitors
        .iter()
        .find(|monitor| match is_primary(monitor) {
            Ok(primary) => primary,
            Err(err) => {
                trace!("failed to query monitor: {:?}", err);
                false
            }
        })
        .or_else(|| monitors.first())
}

/// Picks the first window whose title contains `title`.
///
/// Windows that could not be inspected or fail to report a title are skipped.
fn first_with_title<W>(
    windows: impl IntoIterator<Item = anyhow::Result<W>>,
    title: &str,
    window_title: impl Fn(&W) -> anyhow::Result<String>,
) -> Option<W> {
    for window in windows {
        let window = match window {
            Ok(window) => window,
            Err(err) => {
                trace!("skipping window: {:?}", err);
                continue;
            }
        };
        match window_title(&window) {
            Ok(window_title) if window_title.contains(title) => return Some(window),
            Ok(_) => {}
            Err(err) => trace!("failed to get window title: {:?}", err),
        }
    }
    None
}
