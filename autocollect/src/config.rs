use {
    crate::{
        dispatcher::{DispatchSettings, DEFAULT_CLICK_DELAY},
        interrupt::DEFAULT_INTERRUPT_THRESHOLD,
        matcher::{Matcher, DEFAULT_DEDUP_RADIUS, DEFAULT_THRESHOLD},
    },
    anyhow::{ensure, Context as _},
    serde::{Deserialize, Serialize},
    std::{path::Path, path::PathBuf, time::Duration},
};

/// A marker type to look for and the image file of its template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    pub name: String,
    pub path: PathBuf,
}

impl MarkerConfig {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Run configuration. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Substring of the target window title.
    pub window_title: String,
    /// Markers are collected in this order on every pass.
    pub markers: Vec<MarkerConfig>,
    pub threshold: f64,
    /// Matches closer than this (px) are treated as one marker.
    pub dedup_radius: f64,
    /// Pointer movement (Manhattan distance, px) that hands control back to the user.
    pub interrupt_threshold: i32,
    pub click_delay_ms: u64,
    pub pass_interval_ms: u64,
    /// Hotkey that saves the next captured frame.
    pub debug_key: String,
    pub debounce_ms: u64,
    pub debug_dir: PathBuf,
    /// Capture the whole screen instead of the window rectangle.
    pub full_screen: bool,
}

// Templates are cut from a 2560x1600 screen and only match at that resolution.
const TEMPLATE_DIR: &str = "template/2560_1600";

impl Default for Config {
    fn default() -> Self {
        let template_dir = Path::new(TEMPLATE_DIR);
        Self {
            window_title: "Plants vs. Zombies".into(),
            markers: vec![
                MarkerConfig::new("sun", template_dir.join("sun.png")),
                MarkerConfig::new("silver_coin", template_dir.join("silver_coin.png")),
            ],
            threshold: DEFAULT_THRESHOLD,
            dedup_radius: DEFAULT_DEDUP_RADIUS,
            interrupt_threshold: DEFAULT_INTERRUPT_THRESHOLD,
            click_delay_ms: DEFAULT_CLICK_DELAY.as_millis() as u64,
            pass_interval_ms: 100,
            debug_key: "F10".into(),
            debounce_ms: 100,
            debug_dir: PathBuf::from("."),
            full_screen: false,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs_err::read_to_string(path)?;
        serde_json::from_str(&text).with_context(|| format!("invalid config file {:?}", path))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.threshold > 0.0 && self.threshold <= 1.0,
            "threshold must be in (0, 1], got {}",
            self.threshold
        );
        ensure!(
            self.dedup_radius >= 0.0,
            "dedup_radius must not be negative, got {}",
            self.dedup_radius
        );
        ensure!(
            self.interrupt_threshold >= 0,
            "interrupt_threshold must not be negative, got {}",
            self.interrupt_threshold
        );
        ensure!(!self.markers.is_empty(), "at least one marker is required");
        ensure!(!self.window_title.is_empty(), "window_title must not be empty");
        Ok(())
    }

    pub fn matcher(&self) -> Matcher {
        Matcher::new(self.threshold, self.dedup_radius)
    }

    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            interrupt_threshold: self.interrupt_threshold,
            click_delay: Duration::from_millis(self.click_delay_ms),
        }
    }

    pub fn pass_interval(&self) -> Duration {
        Duration::from_millis(self.pass_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
