//! End-to-end scenarios for the correlation engine and public API, driven
//! through mock host collaborators.

use crate::*;
use async_trait::async_trait;
use skillbridge_protocol::{AimResponse, MessageType, Packet};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Transport that records every outbound frame and can be told to fail.
struct RecordingTransport {
    sent: Mutex<Vec<(ActorId, Vec<u8>)>>,
    fail_sends: AtomicBool,
}

impl RecordingTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
        })
    }

    fn sent_to(&self, actor: ActorId) -> Vec<Packet> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| *to == actor)
            .map(|(_, bytes)| Packet::decode(bytes).expect("recorded frame decodes"))
            .collect()
    }
}

#[async_trait]
impl FrameTransport for RecordingTransport {
    async fn send_frame(&self, actor: ActorId, payload: Vec<u8>) -> Result<(), TransportError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::SendFailed {
                actor,
                reason: "injected failure".into(),
            });
        }
        self.sent.lock().unwrap().push((actor, payload));
        Ok(())
    }
}

/// Transport whose first send parks until released, then fails. Later
/// sends record and succeed.
struct StalledFirstSendTransport {
    sent: Mutex<Vec<(ActorId, Vec<u8>)>>,
    calls: AtomicUsize,
    first_entered: Notify,
    release_first: Notify,
}

impl StalledFirstSendTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            first_entered: Notify::new(),
            release_first: Notify::new(),
        })
    }
}

#[async_trait]
impl FrameTransport for StalledFirstSendTransport {
    async fn send_frame(&self, actor: ActorId, payload: Vec<u8>) -> Result<(), TransportError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.first_entered.notify_one();
            self.release_first.notified().await;
            return Err(TransportError::SendFailed {
                actor,
                reason: "link dropped mid-send".into(),
            });
        }
        self.sent.lock().unwrap().push((actor, payload));
        Ok(())
    }
}

/// Host with a fixed capability answer and a settable position per actor.
struct TestHost {
    positions: Mutex<HashMap<ActorId, Position>>,
    supported: bool,
}

impl TestHost {
    fn supported_with(actor: ActorId, position: Position) -> Arc<Self> {
        let host = Arc::new(Self {
            positions: Mutex::new(HashMap::new()),
            supported: true,
        });
        host.positions.lock().unwrap().insert(actor, position);
        host
    }

    fn unsupported() -> Arc<Self> {
        Arc::new(Self {
            positions: Mutex::new(HashMap::new()),
            supported: false,
        })
    }

    fn remove_actor(&self, actor: ActorId) {
        self.positions.lock().unwrap().remove(&actor);
    }
}

impl HostRuntime for TestHost {
    fn actor_position(&self, actor: ActorId) -> Option<Position> {
        self.positions.lock().unwrap().get(&actor).copied()
    }

    fn protocol_supported(&self) -> bool {
        self.supported
    }
}

/// Scheduler that runs submissions inline, for deterministic assertions.
struct InlineScheduler;

impl TickScheduler for InlineScheduler {
    fn submit(&self, task: Box<dyn FnOnce() + Send>) {
        task();
    }
}

fn bridge_with(host: Arc<TestHost>) -> (SkillBridge, Arc<RecordingTransport>) {
    init_tracing();
    let transport = RecordingTransport::new();
    let bridge = SkillBridge::with_defaults(transport.clone(), host, Arc::new(InlineScheduler));
    (bridge, transport)
}

fn aim_reply(skill_id: &str, x: f64, y: f64, z: f64) -> Vec<u8> {
    AimResponse {
        skill_id: skill_id.to_string(),
        x,
        y,
        z,
        yaw: 90.0,
        pitch: -10.0,
    }
    .encode()
    .expect("reply encodes")
}

#[tokio::test(flavor = "multi_thread")]
async fn reply_at_exact_threshold_is_accepted() {
    let actor = ActorId::new();
    let host = TestHost::supported_with(actor, Position::new(0.0, 0.0, 0.0));
    let (bridge, transport) = bridge_with(host);

    let issued_at = current_timestamp_millis();
    let future = bridge
        .request_aiming_future(actor, "skill_fireball", "circle.png", 1.0, 5.0)
        .await;
    assert!(bridge.has_pending(actor));

    // Threshold is radius + size = 6.0; a reply at exactly 6.0 is inside.
    bridge
        .handle_frame(DEFAULT_CHANNEL, actor, &aim_reply("skill_fireball", 6.0, 0.0, 0.0))
        .await;

    let result = future.await.expect("accepted");
    assert_eq!(result.actor, actor);
    assert_eq!(result.skill_id, "skill_fireball");
    assert_eq!(result.location.position, Position::new(6.0, 0.0, 0.0));
    assert_eq!(result.location.orientation.yaw, 90.0);
    assert!(result.timestamp >= issued_at);
    assert!(!bridge.has_pending(actor));

    let frames = transport.sent_to(actor);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].message_type(), MessageType::AimRequest);
    assert!(matches!(
        &frames[1],
        Packet::AimConfirm(confirm) if confirm.accepted
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn reply_beyond_threshold_is_rejected_without_confirmation() {
    let actor = ActorId::new();
    let host = TestHost::supported_with(actor, Position::new(0.0, 0.0, 0.0));
    let (bridge, transport) = bridge_with(host);

    let future = bridge
        .request_aiming_future(actor, "skill_fireball", "circle.png", 1.0, 5.0)
        .await;

    bridge
        .handle_frame(DEFAULT_CHANNEL, actor, &aim_reply("skill_fireball", 6.01, 0.0, 0.0))
        .await;

    assert!(matches!(
        future.await,
        Err(RequestError::DistanceViolation { measured, allowed })
            if measured > 6.0 && allowed == 6.0
    ));
    assert!(!bridge.has_pending(actor));

    // Only the request frame went out; rejection sends no confirmation.
    let frames = transport.sent_to(actor);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].message_type(), MessageType::AimRequest);
}

#[tokio::test(flavor = "multi_thread")]
async fn second_request_supersedes_the_first() {
    let actor = ActorId::new();
    let host = TestHost::supported_with(actor, Position::new(0.0, 0.0, 0.0));
    let (bridge, _transport) = bridge_with(host);

    let first = bridge
        .request_aiming_future(actor, "skill_a", "a.png", 1.0, 5.0)
        .await;
    let second = bridge
        .request_aiming_future(actor, "skill_b", "b.png", 1.0, 5.0)
        .await;

    assert!(matches!(first.await, Err(RequestError::Superseded)));
    assert!(bridge.has_pending(actor));

    bridge
        .handle_frame(DEFAULT_CHANNEL, actor, &aim_reply("skill_b", 1.0, 0.0, 0.0))
        .await;
    let result = second.await.expect("second request accepted");
    assert_eq!(result.skill_id, "skill_b");
}

#[tokio::test(flavor = "multi_thread")]
async fn disconnect_cancels_and_is_idempotent() {
    let actor = ActorId::new();
    let host = TestHost::supported_with(actor, Position::new(0.0, 0.0, 0.0));
    let (bridge, transport) = bridge_with(host);

    let future = bridge
        .request_aiming_future(actor, "skill_a", "a.png", 1.0, 5.0)
        .await;

    bridge.handle_disconnect(actor);
    assert!(matches!(future.await, Err(RequestError::Cancelled)));
    assert!(!bridge.has_pending(actor));

    // Double-disconnect finds nothing to do.
    bridge.handle_disconnect(actor);

    // Raw disconnect sends no confirmation frame over the dead channel.
    let frames = transport.sent_to(actor);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].message_type(), MessageType::AimRequest);
}

#[tokio::test(flavor = "multi_thread")]
async fn explicit_cancel_sends_false_confirmation() {
    let actor = ActorId::new();
    let host = TestHost::supported_with(actor, Position::new(0.0, 0.0, 0.0));
    let (bridge, transport) = bridge_with(host);

    let future = bridge
        .request_aiming_future(actor, "skill_a", "a.png", 1.0, 5.0)
        .await;

    assert!(bridge.cancel_aiming(actor).await);
    assert!(matches!(future.await, Err(RequestError::Cancelled)));

    let frames = transport.sent_to(actor);
    assert_eq!(frames.len(), 2);
    assert!(matches!(
        &frames[1],
        Packet::AimConfirm(confirm) if !confirm.accepted
    ));

    // Nothing left to cancel.
    assert!(!bridge.cancel_aiming(actor).await);
}

#[tokio::test(flavor = "multi_thread")]
async fn unsupported_environment_fails_synchronously() {
    let actor = ActorId::new();
    let (bridge, transport) = bridge_with(TestHost::unsupported());

    assert!(!bridge.is_supported());

    let future = bridge
        .request_aiming_future(actor, "skill_a", "a.png", 1.0, 5.0)
        .await;
    assert!(matches!(future.await, Err(RequestError::UnsupportedEnvironment)));
    assert!(!bridge.has_pending(actor));
    assert!(transport.sent_to(actor).is_empty());

    let failed = Arc::new(AtomicBool::new(false));
    let flag = failed.clone();
    bridge
        .request_aiming(
            actor,
            "skill_a",
            "a.png",
            1.0,
            5.0,
            |_| panic!("must not succeed"),
            move |err| {
                assert!(matches!(err, RequestError::UnsupportedEnvironment));
                flag.store(true, Ordering::SeqCst);
            },
        )
        .await;
    // Failure handle fires synchronously, before any scheduling.
    assert!(failed.load(Ordering::SeqCst));
    assert!(transport.sent_to(actor).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_and_unexpected_frames_are_dropped() {
    let actor = ActorId::new();
    let host = TestHost::supported_with(actor, Position::new(0.0, 0.0, 0.0));
    let (bridge, _transport) = bridge_with(host);

    let future = bridge
        .request_aiming_future(actor, "skill_a", "a.png", 1.0, 5.0)
        .await;

    // Unknown header, truncated payload, outbound-only type: all dropped.
    bridge.handle_frame(DEFAULT_CHANNEL, actor, &99i32.to_be_bytes()).await;
    bridge.handle_frame(DEFAULT_CHANNEL, actor, &[0, 0]).await;
    bridge
        .handle_frame(
            DEFAULT_CHANNEL,
            actor,
            &Packet::PlayerNavigationStop.encode().unwrap(),
        )
        .await;
    assert!(bridge.has_pending(actor));

    // A frame for some other channel is ignored entirely.
    bridge
        .handle_frame("othermod:main", actor, &aim_reply("skill_a", 1.0, 0.0, 0.0))
        .await;
    assert!(bridge.has_pending(actor));

    // The correlation still resolves normally afterwards.
    bridge
        .handle_frame(DEFAULT_CHANNEL, actor, &aim_reply("skill_a", 1.0, 0.0, 0.0))
        .await;
    assert!(future.await.is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn unsolicited_reply_is_dropped() {
    let actor = ActorId::new();
    let host = TestHost::supported_with(actor, Position::new(0.0, 0.0, 0.0));
    let (bridge, transport) = bridge_with(host);

    bridge
        .handle_frame(DEFAULT_CHANNEL, actor, &aim_reply("skill_a", 1.0, 0.0, 0.0))
        .await;
    assert!(!bridge.has_pending(actor));
    assert!(transport.sent_to(actor).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn reply_after_actor_left_the_world_cancels() {
    let actor = ActorId::new();
    let host = TestHost::supported_with(actor, Position::new(0.0, 0.0, 0.0));
    let (bridge, _transport) = bridge_with(host.clone());

    let future = bridge
        .request_aiming_future(actor, "skill_a", "a.png", 1.0, 5.0)
        .await;

    host.remove_actor(actor);
    bridge
        .handle_frame(DEFAULT_CHANNEL, actor, &aim_reply("skill_a", 1.0, 0.0, 0.0))
        .await;
    assert!(matches!(future.await, Err(RequestError::Cancelled)));
}

#[tokio::test(flavor = "multi_thread")]
async fn transport_failure_on_issue_rolls_the_correlation_back() {
    let actor = ActorId::new();
    let host = TestHost::supported_with(actor, Position::new(0.0, 0.0, 0.0));
    let (bridge, transport) = bridge_with(host);
    transport.fail_sends.store(true, Ordering::SeqCst);

    let future = bridge
        .request_aiming_future(actor, "skill_a", "a.png", 1.0, 5.0)
        .await;
    assert!(matches!(future.await, Err(RequestError::Transport(_))));
    assert!(!bridge.has_pending(actor));
}

#[test]
fn bridge_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SkillBridge>();
    assert_send_sync::<crate::correlation::CorrelationTable>();
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_send_rollback_leaves_a_superseding_request_pending() {
    init_tracing();
    let actor = ActorId::new();
    let host = TestHost::supported_with(actor, Position::new(0.0, 0.0, 0.0));
    let transport = StalledFirstSendTransport::new();
    let bridge = Arc::new(SkillBridge::with_defaults(
        transport.clone(),
        host,
        Arc::new(InlineScheduler),
    ));

    // The first request parks inside the transport send.
    let first_task = {
        let bridge = bridge.clone();
        tokio::spawn(async move {
            bridge
                .request_aiming_future(actor, "skill_a", "a.png", 1.0, 5.0)
                .await
        })
    };
    transport.first_entered.notified().await;

    // A second request displaces the first while its send is in flight.
    let second = bridge
        .request_aiming_future(actor, "skill_b", "b.png", 1.0, 5.0)
        .await;

    // The first send now fails; its rollback must not take out the second
    // correlation, whose frame was delivered.
    transport.release_first.notify_one();
    let first = first_task.await.expect("first issue completed");
    assert!(matches!(first.await, Err(RequestError::Superseded)));
    assert!(bridge.has_pending(actor));

    bridge
        .handle_frame(DEFAULT_CHANNEL, actor, &aim_reply("skill_b", 1.0, 0.0, 0.0))
        .await;
    let result = second.await.expect("second request resolves on its reply");
    assert_eq!(result.skill_id, "skill_b");
}

#[tokio::test(flavor = "multi_thread")]
async fn press_aim_uses_max_size_for_the_threshold() {
    let actor = ActorId::new();
    let host = TestHost::supported_with(actor, Position::new(0.0, 0.0, 0.0));
    let (bridge, transport) = bridge_with(host);

    let future = bridge
        .request_press_aiming_future(actor, "charge", "charge.png", 1.0, 3.0, 5.0, 40)
        .await;

    let frames = transport.sent_to(actor);
    assert!(matches!(
        &frames[0],
        Packet::PressAimRequest(request)
            if request.max_tick == 40 && request.max_size == 3.0
    ));

    // Threshold is radius + max_size = 8.0.
    assert_eq!(bridge.pending_threshold(actor), Some(8.0));
    bridge
        .handle_frame(DEFAULT_CHANNEL, actor, &aim_reply("charge", 8.0, 0.0, 0.0))
        .await;
    assert!(future.await.is_ok());
    assert_eq!(bridge.pending_threshold(actor), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn callbacks_run_only_when_the_tick_queue_drains() {
    let actor = ActorId::new();
    let host = TestHost::supported_with(actor, Position::new(0.0, 0.0, 0.0));
    let transport = RecordingTransport::new();
    let (queue, mut runner) = TickQueue::new();
    let bridge = SkillBridge::with_defaults(transport.clone(), host, Arc::new(queue));

    let succeeded = Arc::new(AtomicUsize::new(0));
    let counter = succeeded.clone();
    bridge
        .request_aiming(
            actor,
            "skill_a",
            "a.png",
            1.0,
            5.0,
            move |result| {
                assert_eq!(result.skill_id, "skill_a");
                counter.fetch_add(1, Ordering::SeqCst);
            },
            |err| panic!("unexpected failure: {err}"),
        )
        .await;

    bridge
        .handle_frame(DEFAULT_CHANNEL, actor, &aim_reply("skill_a", 1.0, 0.0, 0.0))
        .await;

    // Resolution happened, but the continuation waits for the main loop.
    assert!(!bridge.has_pending(actor));
    assert_eq!(succeeded.load(Ordering::SeqCst), 0);

    assert_eq!(runner.drain_pending(), 1);
    assert_eq!(succeeded.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_cancels_every_pending_request() {
    let actor_a = ActorId::new();
    let actor_b = ActorId::new();
    let host = TestHost::supported_with(actor_a, Position::new(0.0, 0.0, 0.0));
    host.positions
        .lock()
        .unwrap()
        .insert(actor_b, Position::new(10.0, 0.0, 0.0));
    let (bridge, _transport) = bridge_with(host);

    let future_a = bridge
        .request_aiming_future(actor_a, "skill_a", "a.png", 1.0, 5.0)
        .await;
    let future_b = bridge
        .request_aiming_future(actor_b, "skill_b", "b.png", 1.0, 5.0)
        .await;

    assert_eq!(bridge.pending_count(), 2);
    bridge.shutdown();
    assert!(matches!(future_a.await, Err(RequestError::Cancelled)));
    assert!(matches!(future_b.await, Err(RequestError::Cancelled)));
    assert_eq!(bridge.pending_count(), 0);
    assert!(!bridge.has_pending(actor_a));
    assert!(!bridge.has_pending(actor_b));
}

#[tokio::test(flavor = "multi_thread")]
async fn effect_senders_put_the_expected_frames_on_the_wire() {
    let viewer = ActorId::new();
    let target = ActorId::new();
    let host = TestHost::supported_with(viewer, Position::new(0.0, 0.0, 0.0));
    let (bridge, transport) = bridge_with(host);

    bridge.apply_ghost_effect(viewer, target, 2000, 10, 2).await;
    bridge
        .apply_flicker_effect(viewer, target, 1500, 0.5, -1, 1.0)
        .await;
    bridge.start_navigation(viewer, 100, 64, -200, 3).await;
    bridge.stop_navigation(viewer).await;
    bridge
        .send_circle_shockwave(viewer, Position::new(1.0, 2.0, 3.0), 6.0)
        .await;
    bridge
        .send_square_shockwave(viewer, Position::new(1.0, 2.0, 3.0), 10.0, 4.0, 90.0)
        .await;
    bridge
        .send_sector_shockwave(viewer, Position::new(1.0, 2.0, 3.0), 6.0, 45.0, 120.0)
        .await;

    let frames = transport.sent_to(viewer);
    let types: Vec<MessageType> = frames.iter().map(|frame| frame.message_type()).collect();
    assert_eq!(
        types,
        vec![
            MessageType::Ghost,
            MessageType::Flicker,
            MessageType::PlayerNavigation,
            MessageType::PlayerNavigationStop,
            MessageType::CircleShockwave,
            MessageType::SquareShockwave,
            MessageType::SectorShockwave,
        ]
    );
    assert!(matches!(
        &frames[0],
        Packet::Ghost(ghost) if ghost.target_actor_id == target.to_string()
    ));

    // Fire-and-forget senders never touch the correlation table.
    assert!(!bridge.has_pending(viewer));
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_requests_for_distinct_actors_resolve_independently() {
    let actors: Vec<ActorId> = (0..8).map(|_| ActorId::new()).collect();
    let host = TestHost::supported_with(actors[0], Position::new(0.0, 0.0, 0.0));
    for actor in &actors[1..] {
        host.positions
            .lock()
            .unwrap()
            .insert(*actor, Position::new(0.0, 0.0, 0.0));
    }
    let transport = RecordingTransport::new();
    let bridge = Arc::new(SkillBridge::with_defaults(
        transport.clone(),
        host,
        Arc::new(InlineScheduler),
    ));

    let mut futures = Vec::new();
    for actor in &actors {
        futures.push(
            bridge
                .request_aiming_future(*actor, "skill_a", "a.png", 1.0, 5.0)
                .await,
        );
    }

    let mut handles = Vec::new();
    for actor in &actors {
        let bridge = bridge.clone();
        let actor = *actor;
        handles.push(tokio::spawn(async move {
            bridge
                .handle_frame(DEFAULT_CHANNEL, actor, &aim_reply("skill_a", 1.0, 0.0, 0.0))
                .await;
        }));
    }
    for handle in handles {
        handle.await.expect("reply task completed");
    }

    let results = futures::future::join_all(futures).await;
    assert!(results.iter().all(|result| result.is_ok()));
}
