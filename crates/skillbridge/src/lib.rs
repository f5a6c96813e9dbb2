//! # Skillbridge
//!
//! Server-side bridge between a game server and the skillbridge client mod.
//! Small binary frames travel both ways over one named side channel; on top
//! of that, this crate provides a request/response correlation engine so
//! server-side callers can ask a player to aim and await their pointer
//! location (or a cancellation) without blocking a thread.
//!
//! ## Architecture Overview
//!
//! * **Wire codec** ([`skillbridge_protocol`]) - stateless frame
//!   encode/decode
//! * **Correlation table** - at most one pending request per actor, keyed by
//!   [`ActorId`]
//! * **Request engine** - pairs outbound request frames with inbound
//!   replies, enforces the acceptance-distance check, and resolves every
//!   correlation exactly once
//! * **Public API** ([`SkillBridge`]) - callback and future request forms
//!   plus the fire-and-forget effect senders
//!
//! ## Host integration
//!
//! The bridge owns no sockets and no world state. The host injects three
//! collaborators at construction:
//!
//! * [`FrameTransport`] - actor-addressed byte channel to clients
//! * [`HostRuntime`] - live actor positions and the capability query
//! * [`TickScheduler`] - submission onto the authoritative main loop
//!   ([`TickQueue`] is the bundled single-consumer implementation)
//!
//! and wires three lifecycle calls into its own plumbing:
//! [`SkillBridge::handle_frame`] on channel receive,
//! [`SkillBridge::handle_disconnect`] on session end, and
//! [`SkillBridge::shutdown`] at teardown.
//!
//! ## Thread Safety
//!
//! Inbound frames may arrive concurrently across distinct actors and off
//! the host's main loop. The correlation table is internally synchronized
//! per key; whichever trigger (accept, reject, supersede, disconnect,
//! cancel) removes an entry first wins, and the losers are no-ops. All
//! user-visible continuations are redispatched through the tick scheduler so
//! observable side effects stay on the host's single-threaded context.

pub use bridge::{AimFuture, SkillBridge};
pub use config::{BridgeConfig, DEFAULT_CHANNEL};
pub use error::{RequestError, TransportError};
pub use executor::{TickQueue, TickQueueRunner};
pub use host::{FrameTransport, HostRuntime, TickScheduler};
pub use types::{
    current_timestamp_millis, ActorId, AimLocation, AimResult, Orientation, Position,
};

pub mod bridge;
pub mod config;
pub mod correlation;
pub mod engine;
pub mod error;
pub mod executor;
pub mod host;
pub mod types;

#[cfg(test)]
mod tests;
