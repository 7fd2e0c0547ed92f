//! Platform traits backed by the real desktop.

use {
    crate::{
        capture::Snapshot,
        geometry::{Point, Region},
        platform::{Pointer, ScreenSource, TriggerSource, WindowLocator},
    },
    autocollect_desktop::{Context, KeyTrigger},
    image::DynamicImage,
    std::{thread::sleep, time::Duration},
    tracing::warn,
};

// Time for the window manager to apply activation and maximization
// before the geometry is read.
const SETTLE_DELAY: Duration = Duration::from_millis(300);

impl WindowLocator for Context {
    /// Brings the window to the front and maximizes it before reporting its
    /// rectangle. Both steps are best-effort.
    fn locate(&self, title: &str) -> anyhow::Result<Option<Region>> {
        let Some(window) = self.find_window(title)? else {
            return Ok(None);
        };
        if let Err(err) = window.activate() {
            warn!("failed to activate window {}: {:?}", window.id(), err);
        }
        if let Err(err) = window.maximize() {
            warn!("failed to maximize window {}: {:?}", window.id(), err);
        }
        sleep(SETTLE_DELAY);
        Ok(Some(Region {
            left: window.x()?,
            top: window.y()?,
            width: window.width()?,
            height: window.height()?,
        }))
    }
}

impl ScreenSource for Context {
    fn grab(&self, region: Option<Region>) -> anyhow::Result<Snapshot> {
        let (image, origin) = match region {
            Some(region) => (
                self.capture_rect(region.left, region.top, region.width, region.height)?,
                region.origin(),
            ),
            None => {
                let (image, origin) = self.capture_full_screen()?;
                (image, origin.into())
            }
        };
        Ok(Snapshot::new(
            DynamicImage::ImageRgba8(image).to_rgb8(),
            origin,
        ))
    }
}

impl Pointer for Context {
    fn position(&self) -> anyhow::Result<Point> {
        Ok(self.mouse_position()?.into())
    }

    fn move_to(&self, point: Point) -> anyhow::Result<()> {
        self.mouse_move_global(point.x, point.y)
    }

    fn click(&self, point: Point) -> anyhow::Result<()> {
        self.mouse_left_click_at(point.x, point.y)
    }
}

impl TriggerSource for KeyTrigger {
    fn wait_for_trigger(&mut self) -> anyhow::Result<()> {
        self.wait()
    }
}
