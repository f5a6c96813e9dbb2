//! The request engine: one request/response exchange end to end.
//!
//! Per correlation the state machine is `Issued` → one of `Accepted`,
//! `Rejected`, `Superseded`, `Disconnected`, `CancelledByActor`, all
//! terminal. The first trigger to remove the table entry wins; every other
//! trigger finds no entry and is a no-op. Completions are posted through the
//! tick scheduler so user-visible continuations run on the host's
//! authoritative context, while these transitions may run on any thread the
//! transport delivers frames on.

use crate::correlation::{Completion, CorrelationTable, PendingCorrelation};
use crate::error::RequestError;
use crate::host::{FrameTransport, HostRuntime, TickScheduler};
use crate::types::{current_timestamp_millis, ActorId, AimLocation, AimResult, Orientation, Position};
use skillbridge_protocol::{AimConfirm, AimResponse, Packet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Orchestrates correlations between outbound request frames and inbound
/// reply frames. One instance per bridge, owned by [`crate::SkillBridge`].
pub struct RequestEngine {
    table: CorrelationTable,
    transport: Arc<dyn FrameTransport>,
    host: Arc<dyn HostRuntime>,
    scheduler: Arc<dyn TickScheduler>,
    /// Capability flag, computed once and cached for process lifetime.
    supported: OnceLock<bool>,
    /// Issue-token source. Each issued request gets a distinct token so a
    /// rollback can tell its own correlation from one that displaced it.
    next_token: AtomicU64,
}

impl RequestEngine {
    pub fn new(
        transport: Arc<dyn FrameTransport>,
        host: Arc<dyn HostRuntime>,
        scheduler: Arc<dyn TickScheduler>,
    ) -> Self {
        Self {
            table: CorrelationTable::new(),
            transport,
            host,
            scheduler,
            supported: OnceLock::new(),
            next_token: AtomicU64::new(0),
        }
    }

    /// Whether the connected game version supports the protocol. The host is
    /// asked once; the answer is cached.
    pub fn is_supported(&self) -> bool {
        *self.supported.get_or_init(|| self.host.protocol_supported())
    }

    /// Fails fast with `UnsupportedEnvironment` on an unsupported host. No
    /// frame is sent and no correlation is created on the error path.
    pub fn ensure_supported(&self) -> Result<(), RequestError> {
        if self.is_supported() {
            Ok(())
        } else {
            Err(RequestError::UnsupportedEnvironment)
        }
    }

    /// Number of correlations currently pending.
    pub fn pending_count(&self) -> usize {
        self.table.len()
    }

    /// Whether the given actor has a request in flight.
    pub fn has_pending(&self, actor: ActorId) -> bool {
        self.table.contains(actor)
    }

    /// The acceptance-distance threshold of the actor's pending request,
    /// if any.
    pub fn pending_threshold(&self, actor: ActorId) -> Option<f64> {
        self.table.max_distance_of(actor)
    }

    /// Issues a request: registers the correlation (displacing and
    /// superseding any prior one for the actor), then sends the request
    /// frame. A transport failure rolls the fresh correlation back and
    /// resolves it with the transport error. The rollback is scoped to the
    /// issue token, so a newer request that displaced this one while the
    /// send was in flight stays pending.
    pub async fn issue(
        &self,
        actor: ActorId,
        max_distance: f64,
        frame: Vec<u8>,
        completion: Completion,
    ) {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        if let Some(displaced) = self
            .table
            .insert(actor, PendingCorrelation::new(max_distance, token, completion))
        {
            debug!("superseding pending aim request for actor {actor}");
            self.resolve(displaced, Err(RequestError::Superseded));
        }

        if let Err(err) = self.transport.send_frame(actor, frame).await {
            warn!("failed to send aim request to actor {actor}: {err}");
            if let Some(pending) = self.table.remove_matching(actor, token) {
                self.resolve(pending, Err(err.into()));
            }
        }
    }

    /// Inbound-frame handler for the side channel. Never propagates errors:
    /// a malformed or unexpected frame is logged and dropped so one bad
    /// frame cannot disrupt delivery of the frames behind it.
    pub async fn handle_frame(&self, actor: ActorId, bytes: &[u8]) {
        let packet = match Packet::decode(bytes) {
            Ok(packet) => packet,
            Err(err) => {
                warn!("dropping malformed frame from actor {actor}: {err}");
                return;
            }
        };

        match packet {
            Packet::AimResponse(response) => self.handle_aim_response(actor, response).await,
            other => {
                warn!(
                    "dropping unexpected inbound {:?} frame from actor {actor}",
                    other.message_type()
                );
            }
        }
    }

    /// Resolves the actor's correlation against a decoded reply: accepted if
    /// the claimed location is within the threshold of the actor's live
    /// position (boundary inclusive), rejected as a possible-tamper signal
    /// otherwise.
    async fn handle_aim_response(&self, actor: ActorId, response: AimResponse) {
        let Some(pending) = self.table.remove(actor) else {
            debug!("dropping unsolicited aim response from actor {actor}");
            return;
        };

        let Some(actor_position) = self.host.actor_position(actor) else {
            // Actor left between the transport delivering the frame and us
            // handling it; same outcome as a disconnect.
            debug!("actor {actor} gone before aim response was handled");
            self.resolve(pending, Err(RequestError::Cancelled));
            return;
        };

        let claimed = Position::new(response.x, response.y, response.z);
        let measured = claimed.distance(&actor_position);
        let allowed = pending.max_distance();

        if measured <= allowed {
            self.send_confirmation(actor, true).await;
            let result = AimResult {
                actor,
                location: AimLocation {
                    position: claimed,
                    orientation: Orientation {
                        yaw: response.yaw,
                        pitch: response.pitch,
                    },
                },
                skill_id: response.skill_id,
                timestamp: current_timestamp_millis(),
            };
            self.resolve(pending, Ok(result));
        } else {
            warn!(
                "actor {actor} sent an implausible aim reply for skill '{}': \
                 {measured:.3} blocks away, threshold {allowed:.3}, possible tampering",
                response.skill_id
            );
            self.resolve(pending, Err(RequestError::DistanceViolation { measured, allowed }));
        }
    }

    /// Session-end hook. Resolves any pending correlation `Cancelled` and
    /// removes it. Idempotent: a second disconnect finds nothing to do. No
    /// confirmation frame is sent; the actor's channel is already gone.
    pub fn handle_disconnect(&self, actor: ActorId) {
        if let Some(pending) = self.table.remove(actor) {
            debug!("cancelling pending aim request for disconnected actor {actor}");
            self.resolve(pending, Err(RequestError::Cancelled));
        }
    }

    /// Explicit in-session cancel. Same resolution as a disconnect, but the
    /// client is still connected, so an AIM_CONFIRM(false) frame is sent to
    /// dismiss its indicator. Returns whether a request was actually
    /// cancelled.
    pub async fn cancel(&self, actor: ActorId) -> bool {
        let Some(pending) = self.table.remove(actor) else {
            return false;
        };
        self.send_confirmation(actor, false).await;
        self.resolve(pending, Err(RequestError::Cancelled));
        true
    }

    /// Bulk teardown: resolves every pending correlation `Cancelled`.
    /// Invoked at shutdown.
    pub fn shutdown(&self) {
        let drained = self.table.drain();
        if !drained.is_empty() {
            debug!("tearing down {} pending aim request(s)", drained.len());
        }
        for (_, pending) in drained {
            self.resolve(pending, Err(RequestError::Cancelled));
        }
    }

    /// Sends the uncorrelated AIM_CONFIRM acknowledgement frame. Send-only;
    /// a transport failure here is logged and swallowed.
    async fn send_confirmation(&self, actor: ActorId, accepted: bool) {
        let frame = match (AimConfirm { accepted }).encode() {
            Ok(frame) => frame,
            Err(err) => {
                warn!("failed to encode confirmation frame: {err}");
                return;
            }
        };
        if let Err(err) = self.transport.send_frame(actor, frame).await {
            warn!("failed to send confirmation frame to actor {actor}: {err}");
        }
    }

    /// Posts the terminal outcome to the host's authoritative context.
    fn resolve(&self, pending: PendingCorrelation, result: Result<AimResult, RequestError>) {
        if let Some(completion) = pending.into_completion() {
            self.scheduler.submit(Box::new(move || completion(result)));
        }
    }
}

impl std::fmt::Debug for RequestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestEngine")
            .field("pending", &self.table.len())
            .field("supported", &self.supported.get())
            .finish()
    }
}
