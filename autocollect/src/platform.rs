//! Services the bot needs from the desktop.
//!
//! The control loop only talks to these traits. `autocollect_desktop::Context`
//! implements them for the real screen (see `crate::desktop`); tests use fakes.

use crate::{
    capture::Snapshot,
    geometry::{Point, Region},
};

/// Finds the target window and reports its screen rectangle.
pub trait WindowLocator {
    /// Returns `None` if no window title contains `title`.
    fn locate(&self, title: &str) -> anyhow::Result<Option<Region>>;
}

/// Raw pixel source.
pub trait ScreenSource {
    /// Grabs `region`, or the whole screen if `None`, as RGB pixels.
    fn grab(&self, region: Option<Region>) -> anyhow::Result<Snapshot>;
}

/// The system pointer.
pub trait Pointer {
    fn position(&self) -> anyhow::Result<Point>;
    fn move_to(&self, point: Point) -> anyhow::Result<()>;
    /// Moves to `point` and clicks the primary button there.
    fn click(&self, point: Point) -> anyhow::Result<()>;
}

/// Out-of-band signal, e.g. a global hotkey.
pub trait TriggerSource: Send {
    /// Blocks until the next trigger. An error means no more triggers will come.
    fn wait_for_trigger(&mut self) -> anyhow::Result<()>;
}

impl<T: ScreenSource + ?Sized> ScreenSource for &T {
    fn grab(&self, region: Option<Region>) -> anyhow::Result<Snapshot> {
        (**self).grab(region)
    }
}

impl<T: Pointer + ?Sized> Pointer for &T {
    fn position(&self) -> anyhow::Result<Point> {
        (**self).position()
    }

    fn move_to(&self, point: Point) -> anyhow::Result<()> {
        (**self).move_to(point)
    }

    fn click(&self, point: Point) -> anyhow::Result<()> {
        (**self).click(point)
    }
}
