use {
    anyhow::{bail, Context as _},
    rdev::{EventType, Key},
    std::{
        sync::mpsc::{self, Receiver},
        thread,
    },
    tracing::{trace, warn},
};

/// Parses a key name such as `F10` or `ScrollLock` (case-insensitive).
pub fn parse_key(name: &str) -> anyhow::Result<Key> {
    let key = match name.trim().to_ascii_lowercase().as_str() {
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        "esc" | "escape" => Key::Escape,
        "pause" => Key::Pause,
        "scrolllock" => Key::ScrollLock,
        "printscreen" => Key::PrintScreen,
        "insert" => Key::Insert,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        _ => bail!("unsupported key name: {name:?}"),
    };
    Ok(key)
}

/// Global hotkey listener.
///
/// Presses of the key are observed system-wide on a detached thread and
/// delivered to [`KeyTrigger::wait`]. The thread lives until the process exits.
pub struct KeyTrigger {
    key: Key,
    presses: Receiver<()>,
}

impl KeyTrigger {
    pub fn listen(key: Key) -> anyhow::Result<Self> {
        let (sender, presses) = mpsc::channel();
        thread::Builder::new()
            .name("key-listener".into())
            .spawn(move || {
                let result = rdev::listen(move |event| {
                    let EventType::KeyPress(pressed) = event.event_type else {
                        return;
                    };
                    if pressed == key {
                        trace!("key {:?} pressed", key);
                        // The receiver is gone only when the trigger was dropped.
                        let _ = sender.send(());
                    }
                });
                if let Err(err) = result {
                    warn!("global key listener stopped: {:?}", err);
                }
            })
            .context("failed to spawn key listener thread")?;
        Ok(Self { key, presses })
    }

    /// Blocks until the next press of the key.
    pub fn wait(&self) -> anyhow::Result<()> {
        self.presses
            .recv()
            .with_context(|| format!("listener for key {:?} has stopped", self.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_function_keys_case_insensitively() {
        assert_eq!(parse_key("F10").unwrap(), Key::F10);
        assert_eq!(parse_key("f10").unwrap(), Key::F10);
        assert_eq!(parse_key(" F1 ").unwrap(), Key::F1);
    }

    #[test]
    fn parses_named_keys() {
        assert_eq!(parse_key("Esc").unwrap(), Key::Escape);
        assert_eq!(parse_key("ScrollLock").unwrap(), Key::ScrollLock);
        assert_eq!(parse_key("PageDown").unwrap(), Key::PageDown);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(parse_key("F13").is_err());
        assert!(parse_key("").is_err());
        assert!(parse_key("ctrl+s").is_err());
    }
}
