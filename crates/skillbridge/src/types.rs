//! Core type definitions for the bridge.
//!
//! These are the building blocks shared by the correlation engine and the
//! public API: actor identity, world positions, and the resolved result of a
//! successful aim exchange.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a connected actor (player).
///
/// A wrapper around UUID that provides type safety and serves as the sole
/// correlation key: at most one pending aim correlation exists per actor at
/// any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl ActorId {
    /// Creates a new random actor ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for ActorId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::str::FromStr for ActorId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 3D position in the game world, double precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another position.
    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// View orientation: yaw and pitch in degrees, single precision as carried
/// on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
}

/// A full aim location: where the player pointed and which way they faced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AimLocation {
    pub position: Position,
    pub orientation: Orientation,
}

/// The resolved result of a successful aim exchange. Immutable after
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AimResult {
    /// The actor that replied.
    pub actor: ActorId,
    /// The accepted aim location.
    pub location: AimLocation,
    /// The caller-supplied correlation tag echoed back by the client.
    pub skill_id: String,
    /// Acceptance time, milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Returns the current Unix timestamp in milliseconds.
///
/// # Panics
///
/// Panics if the system clock is set to a time before the Unix epoch.
pub fn current_timestamp_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
