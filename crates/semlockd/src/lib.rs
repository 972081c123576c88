//! semlock Daemon - Named semaphore registry and TCP server
//!
//! This crate provides the infrastructure for the semlock daemon:
//! - `registry` - Registry actor owning every semaphore and session
//! - `server` - TCP server and per-connection protocol handling
//! - `heartbeat` - Periodic liveness sweeps
//! - `recorder` - Audit log of registry events
//! - `config` - Layered daemon configuration
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       semlockd daemon                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐   │
//! │  │  DaemonServer   │────▶│     RegistryActor           │   │
//! │  │     (TCP)       │     │ (semaphores + sessions)     │   │
//! │  └────────┬────────┘     └──────┬───────────────┬──────┘   │
//! │           │                     │ events        ▲          │
//! │           │ connections         ▼               │ sweeps   │
//! │           ▼              ┌──────────────┐ ┌───────────┐    │
//! │  ┌─────────────────┐     │EventRecorder │ │ Heartbeat │    │
//! │  │ConnectionHandler│     └──────────────┘ └───────────┘    │
//! │  │  (per session)  │                                       │
//! │  └─────────────────┘                                       │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

pub mod config;
pub mod heartbeat;
pub mod recorder;
pub mod registry;
pub mod server;
