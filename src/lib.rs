//! Taskboard library
//!
//! Per-user tasks with ordered subtasks behind a JSON/HTTP API. This module
//! exports the core components for testing and integration.

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod service;
pub mod types;
pub mod validation;
