//! # Taskboard API Server Library
//!
//! HTTP layer of the kanban service: routing, authentication, validation
//! and error mapping on top of the stores in `taskboard-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Validated JSON extractor
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
