pub mod app;
pub mod capture;
pub mod cli;
pub mod config;
pub mod control;
pub mod debug_flag;
pub mod desktop;
pub mod dispatcher;
pub mod error;
pub mod geometry;
pub mod interrupt;
pub mod matcher;
pub mod platform;
pub mod template;

#[cfg(test)]
mod testing;

pub use crate::{
    capture::{Capturer, Snapshot},
    config::{Config, MarkerConfig},
    control::{ControlLoop, LoopState},
    debug_flag::DebugFlag,
    dispatcher::{CollectOutcome, DispatchSettings, Dispatcher},
    error::StartupError,
    geometry::{Point, Region},
    matcher::{MarkerHit, Matcher},
    template::MarkerTemplate,
};
