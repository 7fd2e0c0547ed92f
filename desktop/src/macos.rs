use {
    anyhow::{ensure, Context as _},
    std::process::Command,
    tracing::debug,
};

pub struct Context {}

impl Context {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {})
    }

    // Accessibility APIs need a running event loop to see app list changes,
    // so this goes through a separate osascript process instead.
    pub fn activate_window(&self, window: &crate::Window) -> anyhow::Result<()> {
        let app_name = window.app_name()?;
        let output = Command::new("osascript")
            .args(["-e", &format!("tell application {app_name:?} to activate")])
            .output()
            .context("failed to execute osascript")?;
        ensure!(output.status.success(), "osascript failed: {:?}", output);
        Ok(())
    }

    pub fn maximize_window(&self, window: &crate::Window) -> anyhow::Result<()> {
        debug!(
            "maximizing is not supported on macos, keeping window {} as is",
            window.id()
        );
        Ok(())
    }
}
