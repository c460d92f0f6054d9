//! Prediction task tracker library
//!
//! Submits prediction jobs to a remote service and follows each task's
//! status until it finishes.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod form;
pub mod monitor;
pub mod state;
