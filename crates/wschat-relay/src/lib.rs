//! wschat Relay - Development relay server for the chat client
//!
//! This crate stands in for the hosted WebSocket backend during local
//! development and in tests:
//! - `registry` - Connection registry actor owning every outbound queue
//! - `server` - WebSocket server accepting clients and routing requests
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      wschat-relay                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐   │
//! │  │   RelayServer   │────▶│     RegistryActor           │   │
//! │  │  (TcpListener)  │     │  (connection table owner)   │   │
//! │  └────────┬────────┘     └──────────────┬──────────────┘   │
//! │           │                             │                   │
//! │           │ connections                 │ frames            │
//! │           ▼                             ▼                   │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐   │
//! │  │ConnectionHandler│◀────│   mpsc outbound queues      │   │
//! │  │  (per client)   │     │   (one per connection)      │   │
//! │  └─────────────────┘     └─────────────────────────────┘   │
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

pub mod registry;
pub mod server;

pub use registry::{spawn_registry, spawn_registry_with_capacity, RegistryHandle};
pub use server::{RelayServer, ServerError, DEFAULT_BIND_ADDR};
