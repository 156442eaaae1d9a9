//! Connection registry using Actor pattern.
//!
//! The registry is the relay's single source of truth for which connections
//! exist. It maps each connection id to the outbound queue drained by that
//! connection's writer, and fans broadcasts out over those queues.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌─────────────────┐     ┌──────────────────┐
//! │ConnectionHandler │────▶│  RegistryActor  │────▶│ per-connection   │
//! │  (per client)    │     │                 │     │ outbound queues  │
//! └──────────────────┘     └─────────────────┘     └──────────────────┘
//!         │                       │
//!         │   RegistryCommand     │   RegistryEvent
//!         │   (mpsc channel)      │   (broadcast)
//!         ▼                       ▼
//!   Register/SendTo/        HashMap<ConnectionId,
//!   Broadcast               Outbox>
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All operations in this module follow the panic-free policy:
//! - No `.unwrap()` or `.expect()` in production code
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

use tokio::sync::{broadcast, mpsc};

mod actor;
mod commands;
mod handle;

pub use actor::{RegistryActor, MAX_CONNECTIONS};
pub use commands::{
    BroadcastReport, Outbox, RegistryCommand, RegistryError, RegistryEvent, RemovalReason,
};
pub use handle::RegistryHandle;

/// Channel buffer sizes
const COMMAND_BUFFER: usize = 100;
const EVENT_BUFFER: usize = 100;

/// Spawn the registry actor with the default capacity.
///
/// # Example
///
/// ```no_run
/// use wschat_relay::registry::spawn_registry;
///
/// #[tokio::main]
/// async fn main() {
///     let handle = spawn_registry();
///     let count = handle.connection_count().await;
/// }
/// ```
pub fn spawn_registry() -> RegistryHandle {
    spawn_registry_with_capacity(MAX_CONNECTIONS)
}

/// Spawn the registry actor accepting at most `max_connections`.
pub fn spawn_registry_with_capacity(max_connections: usize) -> RegistryHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

    let actor = RegistryActor::with_capacity(cmd_rx, event_tx.clone(), max_connections);
    tokio::spawn(actor.run());

    RegistryHandle::new(cmd_tx, event_tx)
}
