//! # Brewmate Core Library
//!
//! Core logic for the Brewmate tea brewing timer. Every operation is
//! available through the standalone `brewmate` CLI, which is a thin
//! interactive layer over this crate.
//!
//! ## Architecture
//!
//! - **Brew engine**: a wall-clock state machine over a profile's pour
//!   schedule. It never sleeps; the caller passes `now` into every step.
//! - **Brew session**: owns one engine and drives it from a chain of clock
//!   timers, pushing [`BrewEvent`]s to registered observers.
//! - **Storage**: JSON profiles, tasting records and settings, plus a TOML
//!   configuration file, all under one data directory.
//! - **Reports**: rating trends and rendered daily report images.
//!
//! ## Key Components
//!
//! - [`BrewSession`]: the active brew and its timing loop
//! - [`Clock`]: time source, [`SystemClock`] in production and
//!   [`VirtualClock`] in tests
//! - [`SessionObserver`]: notification contract for display layers
//! - [`ProfileStore`] / [`RecordStore`]: persisted tea data

pub mod error;
pub mod events;
pub mod profile;
pub mod record;
pub mod report;
pub mod stats;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, ProfileError, Result};
pub use events::BrewEvent;
pub use profile::TeaProfile;
pub use record::{Evaluation, ExportFormat, TastingRecord};
pub use report::{CardReportRenderer, DailyReport, ReportRenderer};
pub use stats::TrendReport;
pub use storage::{Config, DataLayout, ProfileStore, RecordStore, Settings, Theme};
pub use timer::{
    BrewEngine, BrewSession, BrewSnapshot, BrewState, ChannelObserver, Clock, LogObserver,
    SessionId, SessionObserver, SystemClock, VirtualClock,
};
