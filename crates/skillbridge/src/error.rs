//! Error taxonomy for the correlation engine and transport seam.
//!
//! Resolution errors are a closed set of tagged variants rather than
//! exception types: they cross thread and continuation boundaries when a
//! correlation resolves off the issuing context.

use crate::types::ActorId;
use skillbridge_protocol::CodecError;

/// Errors that can occur sending a frame through the host transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The frame could not be handed to the channel for this actor.
    #[error("failed to send frame to actor {actor}: {reason}")]
    SendFailed { actor: ActorId, reason: String },
    /// The channel for this actor no longer exists.
    #[error("channel closed for actor {actor}")]
    ChannelClosed { actor: ActorId },
}

/// Terminal outcomes of a failed or displaced aim request.
///
/// Exactly one of these (or a success) reaches the original caller's
/// callback/future; no error is retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The connected game version does not support the protocol. Checked
    /// before any frame is sent or correlation created.
    #[error("the connected game version does not support the mod protocol")]
    UnsupportedEnvironment,
    /// A newer request for the same actor displaced this one.
    #[error("request superseded by a newer request for the same actor")]
    Superseded,
    /// The actor disconnected or explicitly cancelled while the request was
    /// pending.
    #[error("request cancelled by actor disconnect or explicit cancel")]
    Cancelled,
    /// The reply's claimed location was farther from the actor's live
    /// position than the acceptance-distance threshold allows. Treated as a
    /// possible-tamper signal.
    #[error("reply location {measured:.3} exceeds acceptance threshold {allowed:.3}")]
    DistanceViolation { measured: f64, allowed: f64 },
    /// The request frame could not be encoded.
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] CodecError),
    /// The request frame could not be delivered to the transport.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}
