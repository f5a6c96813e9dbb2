//! The public bridge service.
//!
//! [`SkillBridge`] is the single service instance the host constructs at
//! startup and tears down at shutdown. Every request kind comes in two
//! equivalent shapes, callback handles or a future, both delegating to the
//! request engine; the fire-and-forget effect senders are a single
//! encode-and-send with no correlation.

use crate::config::BridgeConfig;
use crate::correlation::Completion;
use crate::engine::RequestEngine;
use crate::error::RequestError;
use crate::host::{FrameTransport, HostRuntime, TickScheduler};
use crate::types::{ActorId, AimResult, Position};
use skillbridge_protocol::{
    AimRequest, CircleShockwave, CodecError, EntityShow, EntityShowRemove, Flicker, Ghost, Packet,
    PlayerNavigation, PressAimRequest, SectorShockwave, SquareShockwave,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::warn;
use uuid::Uuid;

/// A future resolving exactly once with the outcome of an aim request.
///
/// Completion is posted through the tick scheduler before the future
/// resolves, so awaiting it observes the same ordering as the callback form.
pub struct AimFuture {
    inner: AimFutureInner,
}

impl std::fmt::Debug for AimFuture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.inner {
            AimFutureInner::Ready(_) => "ready",
            AimFutureInner::Waiting(_) => "waiting",
        };
        f.debug_struct("AimFuture").field("state", &state).finish()
    }
}

enum AimFutureInner {
    /// Request failed synchronously; outcome is already known.
    Ready(Option<Result<AimResult, RequestError>>),
    /// Waiting on the correlation to resolve.
    Waiting(oneshot::Receiver<Result<AimResult, RequestError>>),
}

impl AimFuture {
    fn ready(result: Result<AimResult, RequestError>) -> Self {
        Self {
            inner: AimFutureInner::Ready(Some(result)),
        }
    }

    fn waiting(rx: oneshot::Receiver<Result<AimResult, RequestError>>) -> Self {
        Self {
            inner: AimFutureInner::Waiting(rx),
        }
    }
}

impl Future for AimFuture {
    type Output = Result<AimResult, RequestError>;

    /// # Panics
    ///
    /// Panics if polled again after returning `Poll::Ready`, per the
    /// standard future contract.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            AimFutureInner::Ready(slot) => {
                Poll::Ready(slot.take().expect("AimFuture polled after completion"))
            }
            AimFutureInner::Waiting(rx) => Pin::new(rx)
                .poll(cx)
                .map(|received| received.unwrap_or(Err(RequestError::Cancelled))),
        }
    }
}

/// Server-side bridge to the game-client mod.
///
/// Constructed with the host's transport, runtime queries, and tick
/// scheduler injected; holds the only correlation state in the system and
/// clears it via [`SkillBridge::shutdown`].
pub struct SkillBridge {
    engine: RequestEngine,
    transport: Arc<dyn FrameTransport>,
    config: BridgeConfig,
}

impl SkillBridge {
    pub fn new(
        transport: Arc<dyn FrameTransport>,
        host: Arc<dyn HostRuntime>,
        scheduler: Arc<dyn TickScheduler>,
        config: BridgeConfig,
    ) -> Self {
        Self {
            engine: RequestEngine::new(transport.clone(), host, scheduler),
            transport,
            config,
        }
    }

    /// Builds a bridge with the default configuration.
    pub fn with_defaults(
        transport: Arc<dyn FrameTransport>,
        host: Arc<dyn HostRuntime>,
        scheduler: Arc<dyn TickScheduler>,
    ) -> Self {
        Self::new(transport, host, scheduler, BridgeConfig::default())
    }

    /// The side-channel identifier to register with the host messaging
    /// system.
    pub fn channel(&self) -> &str {
        &self.config.channel
    }

    /// Whether the connected game version supports the mod protocol.
    pub fn is_supported(&self) -> bool {
        self.engine.is_supported()
    }

    /// Whether the given actor currently has an aim request in flight.
    pub fn has_pending(&self, actor: ActorId) -> bool {
        self.engine.has_pending(actor)
    }

    /// Number of aim requests currently in flight across all actors.
    pub fn pending_count(&self) -> usize {
        self.engine.pending_count()
    }

    /// The acceptance-distance threshold of the actor's pending aim
    /// request, if any.
    pub fn pending_threshold(&self, actor: ActorId) -> Option<f64> {
        self.engine.pending_threshold(actor)
    }

    // ========================================================================
    // Aim requests
    // ========================================================================

    /// Asks the player to aim with a fixed-size indicator, reporting the
    /// outcome through callback handles.
    ///
    /// The acceptance-distance threshold is `radius + size`. On an
    /// unsupported host the failure handle is invoked synchronously and no
    /// frame is sent. Resolution handles run on the host's authoritative
    /// context via the tick scheduler.
    pub async fn request_aiming(
        &self,
        actor: ActorId,
        skill_id: &str,
        picture: &str,
        size: f64,
        radius: f64,
        on_success: impl FnOnce(AimResult) + Send + 'static,
        on_failure: impl FnOnce(RequestError) + Send + 'static,
    ) {
        if let Err(err) = self.engine.ensure_supported() {
            on_failure(err);
            return;
        }
        let frame = AimRequest {
            skill_id: skill_id.to_string(),
            picture: picture.to_string(),
            size,
            radius,
        }
        .encode();
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                on_failure(err.into());
                return;
            }
        };

        let completion = Box::new(move |result: Result<AimResult, RequestError>| match result {
            Ok(info) => on_success(info),
            Err(err) => on_failure(err),
        });
        self.engine.issue(actor, radius + size, frame, completion).await;
    }

    /// Future form of [`SkillBridge::request_aiming`].
    pub async fn request_aiming_future(
        &self,
        actor: ActorId,
        skill_id: &str,
        picture: &str,
        size: f64,
        radius: f64,
    ) -> AimFuture {
        if let Err(err) = self.engine.ensure_supported() {
            return AimFuture::ready(Err(err));
        }
        let frame = AimRequest {
            skill_id: skill_id.to_string(),
            picture: picture.to_string(),
            size,
            radius,
        }
        .encode();
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => return AimFuture::ready(Err(err.into())),
        };

        let (tx, rx) = oneshot::channel();
        let completion: Completion = Box::new(move |result| {
            let _ = tx.send(result);
        });
        self.engine.issue(actor, radius + size, frame, completion).await;
        AimFuture::waiting(rx)
    }

    /// Asks the player to aim with a charge-up indicator growing from
    /// `min_size` to `max_size`, reporting through callback handles.
    ///
    /// `max_tick` is advisory for the client; the server never expires the
    /// correlation on it. The acceptance-distance threshold is
    /// `radius + max_size`.
    #[allow(clippy::too_many_arguments)]
    pub async fn request_press_aiming(
        &self,
        actor: ActorId,
        skill_id: &str,
        picture: &str,
        min_size: f64,
        max_size: f64,
        radius: f64,
        max_tick: i64,
        on_success: impl FnOnce(AimResult) + Send + 'static,
        on_failure: impl FnOnce(RequestError) + Send + 'static,
    ) {
        if let Err(err) = self.engine.ensure_supported() {
            on_failure(err);
            return;
        }
        let frame = PressAimRequest {
            skill_id: skill_id.to_string(),
            picture: picture.to_string(),
            min_size,
            max_size,
            radius,
            max_tick,
        }
        .encode();
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                on_failure(err.into());
                return;
            }
        };

        let completion = Box::new(move |result: Result<AimResult, RequestError>| match result {
            Ok(info) => on_success(info),
            Err(err) => on_failure(err),
        });
        self.engine
            .issue(actor, radius + max_size, frame, completion)
            .await;
    }

    /// Future form of [`SkillBridge::request_press_aiming`].
    #[allow(clippy::too_many_arguments)]
    pub async fn request_press_aiming_future(
        &self,
        actor: ActorId,
        skill_id: &str,
        picture: &str,
        min_size: f64,
        max_size: f64,
        radius: f64,
        max_tick: i64,
    ) -> AimFuture {
        if let Err(err) = self.engine.ensure_supported() {
            return AimFuture::ready(Err(err));
        }
        let frame = PressAimRequest {
            skill_id: skill_id.to_string(),
            picture: picture.to_string(),
            min_size,
            max_size,
            radius,
            max_tick,
        }
        .encode();
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => return AimFuture::ready(Err(err.into())),
        };

        let (tx, rx) = oneshot::channel();
        let completion: Completion = Box::new(move |result| {
            let _ = tx.send(result);
        });
        self.engine
            .issue(actor, radius + max_size, frame, completion)
            .await;
        AimFuture::waiting(rx)
    }

    /// Explicitly cancels the actor's pending aim request. The client is
    /// sent AIM_CONFIRM(false) to dismiss its indicator; the caller's
    /// callback/future resolves `Cancelled`. Returns whether a request was
    /// pending.
    pub async fn cancel_aiming(&self, actor: ActorId) -> bool {
        self.engine.cancel(actor).await
    }

    // ========================================================================
    // Lifecycle surface for the host
    // ========================================================================

    /// Inbound-frame handler to register on the side channel. Frames for
    /// other channels are ignored; malformed frames are logged and dropped.
    pub async fn handle_frame(&self, channel: &str, actor: ActorId, bytes: &[u8]) {
        if channel != self.config.channel {
            return;
        }
        self.engine.handle_frame(actor, bytes).await;
    }

    /// Session-end hook: resolves the actor's pending request `Cancelled`,
    /// if any. Safe to call repeatedly.
    pub fn handle_disconnect(&self, actor: ActorId) {
        self.engine.handle_disconnect(actor);
    }

    /// Clears every pending correlation, resolving each `Cancelled`. Invoke
    /// once at server shutdown.
    pub fn shutdown(&self) {
        self.engine.shutdown();
    }

    // ========================================================================
    // Fire-and-forget effect senders
    // ========================================================================

    /// Ghost trail following `target`'s movement, visible to `viewer`.
    pub async fn apply_ghost_effect(
        &self,
        viewer: ActorId,
        target: ActorId,
        duration_ms: i64,
        density: i32,
        gap: i32,
    ) {
        let frame = Ghost {
            target_actor_id: target.to_string(),
            duration_ms,
            density,
            gap,
        }
        .encode();
        self.send_one_way(viewer, frame).await;
    }

    /// After-image left in place on `target`, visible to `viewer`.
    /// `fade_duration_ms` of -1 disables fading.
    pub async fn apply_flicker_effect(
        &self,
        viewer: ActorId,
        target: ActorId,
        timeout_ms: i64,
        alpha: f32,
        fade_duration_ms: i64,
        scale: f32,
    ) {
        let frame = Flicker {
            target_actor_id: target.to_string(),
            timeout_ms,
            alpha,
            fade_duration_ms,
            scale,
        }
        .encode();
        self.send_one_way(viewer, frame).await;
    }

    /// Projects an entity silhouette at `position`, visible to `viewer`.
    /// `entity_id` and `group` together key the projection for later
    /// removal.
    #[allow(clippy::too_many_arguments)]
    pub async fn apply_entity_show_effect(
        &self,
        viewer: ActorId,
        entity_id: Uuid,
        group: &str,
        position: Position,
        timeout_ms: i64,
        rotate_x: f32,
        rotate_y: f32,
        rotate_z: f32,
        scale: f32,
    ) {
        let frame = EntityShow {
            entity_id: entity_id.to_string(),
            group: group.to_string(),
            x: position.x,
            y: position.y,
            z: position.z,
            timeout_ms,
            rotate_x,
            rotate_y,
            rotate_z,
            scale,
        }
        .encode();
        self.send_one_way(viewer, frame).await;
    }

    /// Removes a projected entity silhouette.
    pub async fn remove_entity_show_effect(&self, viewer: ActorId, entity_id: Uuid, group: &str) {
        let frame = EntityShowRemove {
            entity_id: entity_id.to_string(),
            group: group.to_string(),
        }
        .encode();
        self.send_one_way(viewer, frame).await;
    }

    /// Starts client-side pathing toward a block position.
    pub async fn start_navigation(&self, actor: ActorId, x: i32, y: i32, z: i32, range: i32) {
        let frame = PlayerNavigation { x, y, z, range }.encode();
        self.send_one_way(actor, frame).await;
    }

    /// Stops client-side pathing.
    pub async fn stop_navigation(&self, actor: ActorId) {
        let frame = Packet::PlayerNavigationStop.encode();
        self.send_one_way(actor, frame).await;
    }

    /// Rectangular shockwave effect centered at `position`.
    pub async fn send_square_shockwave(
        &self,
        actor: ActorId,
        position: Position,
        length: f64,
        width: f64,
        yaw: f64,
    ) {
        let frame = SquareShockwave {
            x: position.x,
            y: position.y,
            z: position.z,
            length,
            width,
            yaw,
        }
        .encode();
        self.send_one_way(actor, frame).await;
    }

    /// Circular shockwave effect centered at `position`.
    pub async fn send_circle_shockwave(&self, actor: ActorId, position: Position, radius: f64) {
        let frame = CircleShockwave {
            x: position.x,
            y: position.y,
            z: position.z,
            radius,
        }
        .encode();
        self.send_one_way(actor, frame).await;
    }

    /// Sector shockwave effect centered at `position`, opening `angle`
    /// degrees around `yaw`.
    pub async fn send_sector_shockwave(
        &self,
        actor: ActorId,
        position: Position,
        radius: f64,
        yaw: f64,
        angle: f64,
    ) {
        let frame = SectorShockwave {
            x: position.x,
            y: position.y,
            z: position.z,
            radius,
            yaw,
            angle,
        }
        .encode();
        self.send_one_way(actor, frame).await;
    }

    /// One-way send: encode and transport failures are logged and swallowed
    /// so fire-and-forget callers always return normally.
    async fn send_one_way(&self, actor: ActorId, frame: Result<Vec<u8>, CodecError>) {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                warn!("failed to encode effect frame for actor {actor}: {err}");
                return;
            }
        };
        if let Err(err) = self.transport.send_frame(actor, frame).await {
            warn!("failed to send effect frame to actor {actor}: {err}");
        }
    }
}

impl std::fmt::Debug for SkillBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillBridge")
            .field("channel", &self.config.channel)
            .field("engine", &self.engine)
            .finish()
    }
}
