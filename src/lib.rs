//! SalesPad Outreach API Library
//!
//! Records sales leads, their messages and event logs in PostgreSQL, and
//! simulates outbound dispatch through an in-process mock job queue and a
//! stubbed AI reply generator.
//!
//! # Modules
//!
//! - `ai_service`: Stubbed AI reply generator.
//! - `app`: Router assembly and middleware.
//! - `config`: Configuration management.
//! - `db`: Database connection, pool management and migrations.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `lead_service`: Lead business actions and event logging.
//! - `lead_store`: Persistence trait and PostgreSQL implementation.
//! - `memory_store`: In-memory persistence for tests.
//! - `models`: Data models and request/response types.
//! - `openapi`: OpenAPI document generation.
//! - `queue_service`: Mock job queue with retry simulation.

pub mod ai_service;
pub mod app;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod lead_service;
pub mod lead_store;
pub mod memory_store;
pub mod models;
pub mod openapi;
pub mod queue_service;
