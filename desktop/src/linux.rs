use {
    anyhow::{bail, Context as _},
    std::process::Command,
};

pub struct Context {}

impl Context {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {})
    }

    fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<()> {
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("failed to execute command: {program} {args:?}"))?;
        if !status.success() {
            bail!("{program} failed with status {:?}", status);
        }
        Ok(())
    }

    pub fn activate_window(&self, window: &crate::Window) -> anyhow::Result<()> {
        self.run(
            "xdotool",
            &["windowactivate", "--sync", &window.id().to_string()],
        )
    }

    // `xdotool` has no maximize command.
    pub fn maximize_window(&self, window: &crate::Window) -> anyhow::Result<()> {
        self.run(
            "wmctrl",
            &[
                "-i",
                "-r",
                &window.id().to_string(),
                "-b",
                "add,maximized_vert,maximized_horz",
            ],
        )
    }
}
