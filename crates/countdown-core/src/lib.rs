//! Timer, daily aggregation and flat-file persistence for Countdown Master.
//!
//! Nothing in this crate touches a window: the UI shell drives [`timer::Countdown`]
//! and [`tracker::Tracker`] from its frame loop and renders what [`heatmap`] and
//! [`report`] compute.

pub mod calendar;
pub mod color;
pub mod config;
pub mod format;
pub mod gamepad;
pub mod heatmap;
pub mod log_store;
pub mod profile;
pub mod report;
pub mod settings;
pub mod timer;
pub mod tracker;
