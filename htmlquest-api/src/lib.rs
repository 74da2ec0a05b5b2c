//! # HTMLQuest API Server Library
//!
//! HTTP surface for the HTMLQuest learning platform: lessons with quiz
//! gating, the stepwise basic-project evaluator, the project hub,
//! evaluations, push device registration and the admin notification feed.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Authentication and security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
