use thiserror::Error;

/// Conditions that prevent the bot from starting at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartupError {
    #[error("no window with {title:?} in its title; start the game first")]
    WindowNotFound { title: String },
    #[error("no markers configured")]
    NoMarkers,
}
