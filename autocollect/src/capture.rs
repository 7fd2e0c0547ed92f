use {
    crate::{
        debug_flag::DebugFlag,
        geometry::{Point, Region},
        platform::ScreenSource,
    },
    anyhow::Context as _,
    chrono::{DateTime, Utc},
    image::RgbImage,
    std::path::{Path, PathBuf},
    tracing::{info, warn},
};

/// Pixels of one capture together with the screen position of their top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    image: RgbImage,
    origin: Point,
}

impl Snapshot {
    pub fn new(image: RgbImage, origin: Point) -> Self {
        Self { image, origin }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn origin(&self) -> Point {
        self.origin
    }
}

/// File name used for a debug snapshot taken at `time`.
pub fn debug_snapshot_name(time: DateTime<Utc>) -> String {
    format!("debug-{}.png", time.timestamp())
}

/// Captures the watched region and saves a copy when a debug snapshot was requested.
pub struct Capturer<S> {
    source: S,
    region: Option<Region>,
    debug_flag: DebugFlag,
    debug_dir: PathBuf,
}

impl<S: ScreenSource> Capturer<S> {
    pub fn new(
        source: S,
        region: Option<Region>,
        debug_flag: DebugFlag,
        debug_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            region,
            debug_flag,
            debug_dir: debug_dir.into(),
        }
    }

    pub fn debug_flag(&self) -> &DebugFlag {
        &self.debug_flag
    }

    pub fn capture(&self) -> anyhow::Result<Snapshot> {
        let snapshot = self
            .source
            .grab(self.region)
            .context("failed to capture screen")?;
        if self.debug_flag.take() {
            let path = self.debug_dir.join(debug_snapshot_name(Utc::now()));
            match save_snapshot(&snapshot, &path) {
                Ok(()) => info!("saved debug snapshot to {:?}", path),
                Err(err) => warn!("failed to save debug snapshot: {:?}", err),
            }
        }
        Ok(snapshot)
    }
}

fn save_snapshot(snapshot: &Snapshot, path: &Path) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        fs_err::create_dir_all(dir)?;
    }
    snapshot
        .image()
        .save(path)
        .with_context(|| format!("failed to write {:?}", path))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        chrono::TimeZone,
        image::Rgb,
        std::{cell::Cell, fs},
    };

    struct FixedScreen {
        grabs: Cell<usize>,
        fail: bool,
    }

    impl ScreenSource for FixedScreen {
        fn grab(&self, region: Option<Region>) -> anyhow::Result<Snapshot> {
            anyhow::ensure!(!self.fail, "screen is gone");
            self.grabs.set(self.grabs.get() + 1);
            let origin = region.map(|r| r.origin()).unwrap_or_default();
            Ok(Snapshot::new(
                RgbImage::from_pixel(8, 8, Rgb([10, 20, 30])),
                origin,
            ))
        }
    }

    fn screen() -> FixedScreen {
        FixedScreen {
            grabs: Cell::new(0),
            fail: false,
        }
    }

    fn saved_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn snapshot_name_uses_unix_seconds() {
        let time = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(debug_snapshot_name(time), "debug-1714564800.png");
    }

    #[test]
    fn snapshot_origin_is_region_origin() {
        let region = Region {
            left: 40,
            top: 25,
            width: 8,
            height: 8,
        };
        let capturer = Capturer::new(screen(), Some(region), DebugFlag::new(), ".");
        assert_eq!(capturer.capture().unwrap().origin(), Point::new(40, 25));
    }

    #[test]
    fn debug_flag_is_consumed_by_one_capture() {
        let dir = tempfile::tempdir().unwrap();
        let flag = DebugFlag::new();
        let capturer = Capturer::new(screen(), None, flag.clone(), dir.path());

        capturer.capture().unwrap();
        assert!(saved_files(dir.path()).is_empty());

        flag.set();
        capturer.capture().unwrap();
        assert!(!flag.is_set());
        let files = saved_files(dir.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].starts_with("debug-") && files[0].ends_with(".png"));
        fs::remove_file(dir.path().join(&files[0])).unwrap();

        capturer.capture().unwrap();
        assert!(saved_files(dir.path()).is_empty());
        assert_eq!(capturer.source.grabs.get(), 3);
    }

    #[test]
    fn persistence_failure_does_not_fail_capture() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("file");
        fs::write(&not_a_dir, b"").unwrap();

        let flag = DebugFlag::new();
        let capturer = Capturer::new(screen(), None, flag.clone(), &not_a_dir);
        flag.set();
        assert!(capturer.capture().is_ok());
        assert!(!flag.is_set());
    }

    #[test]
    fn failed_grab_keeps_debug_request() {
        let flag = DebugFlag::new();
        let capturer = Capturer::new(
            FixedScreen {
                grabs: Cell::new(0),
                fail: true,
            },
            None,
            flag.clone(),
            ".",
        );
        flag.set();
        assert!(capturer.capture().is_err());
        assert!(flag.is_set());
    }
}
