use {
    crate::config::Config,
    clap::Parser,
    std::path::PathBuf,
};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON config file. Fields it omits keep their defaults.
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Substring of the target window title.
    #[clap(long)]
    pub window_title: Option<String>,
    /// Minimum match score, in (0, 1].
    #[clap(long)]
    pub threshold: Option<f64>,
    /// Where debug snapshots are written.
    #[clap(long)]
    pub debug_dir: Option<PathBuf>,
    /// Hotkey that saves the next captured frame, e.g. F10.
    #[clap(long)]
    pub debug_key: Option<String>,
    /// Watch the whole screen instead of the game window.
    #[clap(long)]
    pub full_screen: bool,
}

impl Args {
    /// Loads the config file, if any, and applies the command line on top of it.
    pub fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(window_title) = self.window_title {
            config.window_title = window_title;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(debug_dir) = self.debug_dir {
            config.debug_dir = debug_dir;
        }
        if let Some(debug_key) = self.debug_key {
            config.debug_key = debug_key;
        }
        if self.full_screen {
            config.full_screen = true;
        }
        config.validate()?;
        Ok(config)
    }
}
