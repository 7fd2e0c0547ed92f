use {
    anyhow::{bail, ensure},
    autocollect::{
        platform::{Pointer, ScreenSource, TriggerSource, WindowLocator},
        Config, ControlLoop, LoopState, MarkerConfig, Point, Region, Snapshot,
    },
    image::{imageops, Rgb, RgbImage},
    std::{
        cell::{Cell, RefCell},
        fs,
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    },
};

const WINDOW: Region = Region {
    left: 200,
    top: 100,
    width: 160,
    height: 90,
};

struct GardenWindow;

impl WindowLocator for GardenWindow {
    fn locate(&self, title: &str) -> anyhow::Result<Option<Region>> {
        Ok((title == "Garden").then_some(WINDOW))
    }
}

/// Fails the first grab and requests shutdown after `last_grab`.
struct ScriptedScreen<'a> {
    image: RgbImage,
    grabs: Cell<usize>,
    last_grab: usize,
    shutdown: &'a AtomicBool,
}

impl ScreenSource for ScriptedScreen<'_> {
    fn grab(&self, region: Option<Region>) -> anyhow::Result<Snapshot> {
        let grab = self.grabs.get() + 1;
        self.grabs.set(grab);
        ensure!(grab > 1, "display is not ready");
        if grab >= self.last_grab {
            self.shutdown.store(true, Ordering::Relaxed);
        }
        let region = region.unwrap_or(WINDOW);
        Ok(Snapshot::new(self.image.clone(), region.origin()))
    }
}

#[derive(Default)]
struct RecordingPointer {
    position: Cell<Point>,
    clicks: RefCell<Vec<Point>>,
}

impl Pointer for RecordingPointer {
    fn position(&self) -> anyhow::Result<Point> {
        Ok(self.position.get())
    }

    fn move_to(&self, point: Point) -> anyhow::Result<()> {
        self.position.set(point);
        Ok(())
    }

    fn click(&self, point: Point) -> anyhow::Result<()> {
        self.clicks.borrow_mut().push(point);
        self.position.set(point);
        Ok(())
    }
}

struct NoHotkey;

impl TriggerSource for NoHotkey {
    fn wait_for_trigger(&mut self) -> anyhow::Result<()> {
        bail!("no hotkey")
    }
}

#[test]
fn runs_until_shutdown_and_survives_capture_errors() {
    let dir = tempfile::tempdir().unwrap();
    let sun = RgbImage::from_pixel(16, 16, Rgb([250, 210, 30]));
    sun.save(dir.path().join("sun.png")).unwrap();
    let snapshots = dir.path().join("snapshots");

    let mut image = RgbImage::from_pixel(160, 90, Rgb([20, 60, 20]));
    imageops::replace(&mut image, &sun, 30, 40);
    imageops::replace(&mut image, &sun, 100, 10);

    let config = Config {
        window_title: "Garden".into(),
        markers: vec![
            MarkerConfig::new("sun", dir.path().join("sun.png")),
            MarkerConfig::new("coin", dir.path().join("missing.png")),
        ],
        click_delay_ms: 0,
        pass_interval_ms: 1,
        debug_dir: snapshots.clone(),
        ..Config::default()
    };
    let shutdown = AtomicBool::new(false);
    let screen = ScriptedScreen {
        image,
        grabs: Cell::new(0),
        last_grab: 3,
        shutdown: &shutdown,
    };
    let pointer = RecordingPointer::default();
    pointer.position.set(Point::new(5, 5));

    let mut control = ControlLoop::init(&config, &GardenWindow, &screen, &pointer).unwrap();
    control
        .start_listener(NoHotkey, Duration::from_millis(100))
        .unwrap();
    control.debug_flag().set();
    control.run(&shutdown).unwrap();

    assert_eq!(control.state(), LoopState::Stopped);
    // Pass 1 fails to capture, passes 2 and 3 click both suns.
    assert_eq!(screen.grabs.get(), 3);
    let expected = [Point::new(308, 118), Point::new(238, 148)];
    assert_eq!(
        *pointer.clicks.borrow(),
        [expected, expected].concat()
    );
    assert_eq!(pointer.position.get(), Point::new(5, 5));
    assert_eq!(control.totals(), vec![("sun", 4), ("coin", 0)]);

    // The pending debug request survives the failed capture and is used once.
    let saved: Vec<_> = fs::read_dir(&snapshots).unwrap().collect();
    assert_eq!(saved.len(), 1);
    assert!(!control.debug_flag().is_set());
}

#[test]
fn refuses_to_start_without_the_window() {
    let dir = tempfile::tempdir().unwrap();
    let shutdown = AtomicBool::new(false);
    let screen = ScriptedScreen {
        image: RgbImage::new(10, 10),
        grabs: Cell::new(0),
        last_grab: 1,
        shutdown: &shutdown,
    };
    let config = Config {
        window_title: "Some other game".into(),
        markers: vec![MarkerConfig::new("sun", dir.path().join("sun.png"))],
        ..Config::default()
    };

    let err = ControlLoop::init(&config, &GardenWindow, &screen, RecordingPointer::default())
        .err()
        .unwrap();
    assert!(err.to_string().contains("Some other game"));
    assert_eq!(screen.grabs.get(), 0);
}
