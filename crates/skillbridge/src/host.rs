//! Host collaborator traits.
//!
//! The bridge owns no sockets, no world state, and no scheduler of its own;
//! the host server supplies all three through these seams. Implementations
//! live with the host integration and are injected when the bridge is
//! constructed.

use crate::error::TransportError;
use crate::types::{ActorId, Position};
use async_trait::async_trait;

/// Actor-addressed, message-oriented byte channel to connected clients.
///
/// The only guarantee required of implementations is that a single actor's
/// frames are delivered in send order, or not at all. Sends are
/// fire-and-forget; there is no delivery acknowledgement at this layer.
#[async_trait]
pub trait FrameTransport: Send + Sync {
    /// Sends one complete frame to the given actor over the side channel.
    async fn send_frame(&self, actor: ActorId, payload: Vec<u8>) -> Result<(), TransportError>;
}

/// Queries answered by the host game engine.
pub trait HostRuntime: Send + Sync {
    /// The actor's current position, or `None` if the actor is no longer in
    /// the world. Consulted at reply time for the acceptance-distance check.
    fn actor_position(&self, actor: ActorId) -> Option<Position>;

    /// Whether the connected game version supports the mod protocol.
    /// Consulted once; the engine caches the answer for process lifetime.
    fn protocol_supported(&self) -> bool;
}

/// Submission onto the host's single-threaded authoritative execution
/// context.
///
/// Correlation state transitions may happen on any thread, but every
/// user-visible continuation (callback, future completion) is posted through
/// this seam so observable side effects on game state stay on the host's
/// main loop.
pub trait TickScheduler: Send + Sync {
    /// Queues a task for execution on the authoritative context.
    fn submit(&self, task: Box<dyn FnOnce() + Send>);
}
