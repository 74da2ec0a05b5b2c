//! # HTMLQuest Shared Library
//!
//! Domain types, persistence and business rules shared by the HTMLQuest API
//! server and its integration tests.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, JWT tokens, request auth context, role checks
//! - `db`: Connection pool and migrations
//! - `models`: Database rows and their queries
//! - `progression`: Lesson navigation gate and quiz grading
//! - `evaluator`: Stepwise basic-project evaluator and the scoring seam
//! - `social`: Comment threading for the project hub
//! - `push`: Outbound push notification delivery
//! - `notifications`: In-process realtime channel for admin sessions

pub mod auth;
pub mod db;
pub mod evaluator;
pub mod models;
pub mod notifications;
pub mod progression;
pub mod push;
pub mod social;

/// Current version of the HTMLQuest shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
