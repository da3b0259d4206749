//! A minimal HTTP service template.
//!
//! An Axum server with a sample endpoint and a health endpoint, whose
//! middleware stack tags every request/response exchange with an
//! `X-Correlation-Id` and exposes that header to cross-origin clients.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, health).
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`health`] -- `GET /health` endpoint handler returning runtime diagnostics.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`middleware`] -- Tower middleware layers, including correlation-id
//!   propagation.
//! - [`sample`] -- `GET /api/sample` endpoint handler.
//! - [`server`] -- Axum server setup, middleware ordering, shared application
//!   state, and graceful shutdown.

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod error;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod sample;
pub mod server;
