//! Typed packet structs for every frame kind.
//!
//! Each struct encodes to a full frame (header + payload) and decodes from a
//! [`FrameReader`] positioned just past the header. Field order inside each
//! `encode`/`decode` pair is the wire contract; reordering either side breaks
//! interoperability with the client mod.

use crate::codec::{FrameReader, FrameWriter};
use crate::error::CodecError;
use crate::message::MessageType;

/// Server → client: ask the player to aim with a fixed-size indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct AimRequest {
    pub skill_id: String,
    pub picture: String,
    pub size: f64,
    pub radius: f64,
}

impl AimRequest {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = FrameWriter::new(MessageType::AimRequest);
        writer.write_utf(&self.skill_id)?;
        writer.write_utf(&self.picture)?;
        writer.write_f64(self.size).write_f64(self.radius);
        Ok(writer.into_bytes())
    }

    pub fn decode(reader: &mut FrameReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            skill_id: reader.read_utf()?,
            picture: reader.read_utf()?,
            size: reader.read_f64()?,
            radius: reader.read_f64()?,
        })
    }
}

/// Server → client: acknowledge acceptance (`true`) or cancellation (`false`)
/// of an aim exchange. Send-only, never correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AimConfirm {
    pub accepted: bool,
}

impl AimConfirm {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = FrameWriter::new(MessageType::AimConfirm);
        writer.write_bool(self.accepted);
        Ok(writer.into_bytes())
    }

    pub fn decode(reader: &mut FrameReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            accepted: reader.read_bool()?,
        })
    }
}

/// Server → client: ghost trail following a target actor's movement.
#[derive(Debug, Clone, PartialEq)]
pub struct Ghost {
    pub target_actor_id: String,
    pub duration_ms: i64,
    pub density: i32,
    pub gap: i32,
}

impl Ghost {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = FrameWriter::new(MessageType::Ghost);
        writer.write_utf(&self.target_actor_id)?;
        writer
            .write_i64(self.duration_ms)
            .write_i32(self.density)
            .write_i32(self.gap);
        Ok(writer.into_bytes())
    }

    pub fn decode(reader: &mut FrameReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            target_actor_id: reader.read_utf()?,
            duration_ms: reader.read_i64()?,
            density: reader.read_i32()?,
            gap: reader.read_i32()?,
        })
    }
}

/// Client → server: the player's accepted aim location. The only inbound
/// frame the server expects.
#[derive(Debug, Clone, PartialEq)]
pub struct AimResponse {
    pub skill_id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
}

impl AimResponse {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = FrameWriter::new(MessageType::AimResponse);
        writer.write_utf(&self.skill_id)?;
        writer
            .write_f64(self.x)
            .write_f64(self.y)
            .write_f64(self.z)
            .write_f32(self.yaw)
            .write_f32(self.pitch);
        Ok(writer.into_bytes())
    }

    pub fn decode(reader: &mut FrameReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            skill_id: reader.read_utf()?,
            x: reader.read_f64()?,
            y: reader.read_f64()?,
            z: reader.read_f64()?,
            yaw: reader.read_f32()?,
            pitch: reader.read_f32()?,
        })
    }
}

/// Server → client: after-image left in place on a target actor.
#[derive(Debug, Clone, PartialEq)]
pub struct Flicker {
    pub target_actor_id: String,
    pub timeout_ms: i64,
    pub alpha: f32,
    pub fade_duration_ms: i64,
    pub scale: f32,
}

impl Flicker {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = FrameWriter::new(MessageType::Flicker);
        writer.write_utf(&self.target_actor_id)?;
        writer
            .write_i64(self.timeout_ms)
            .write_f32(self.alpha)
            .write_i64(self.fade_duration_ms)
            .write_f32(self.scale);
        Ok(writer.into_bytes())
    }

    pub fn decode(reader: &mut FrameReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            target_actor_id: reader.read_utf()?,
            timeout_ms: reader.read_i64()?,
            alpha: reader.read_f32()?,
            fade_duration_ms: reader.read_i64()?,
            scale: reader.read_f32()?,
        })
    }
}

/// Server → client: ask the player to aim with a charge-up indicator that
/// grows from `min_size` to `max_size` over at most `max_tick` ticks.
/// `max_tick` is advisory for the client only; the server never expires a
/// correlation on it.
#[derive(Debug, Clone, PartialEq)]
pub struct PressAimRequest {
    pub skill_id: String,
    pub picture: String,
    pub min_size: f64,
    pub max_size: f64,
    pub radius: f64,
    pub max_tick: i64,
}

impl PressAimRequest {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = FrameWriter::new(MessageType::PressAimRequest);
        writer.write_utf(&self.skill_id)?;
        writer.write_utf(&self.picture)?;
        writer
            .write_f64(self.min_size)
            .write_f64(self.max_size)
            .write_f64(self.radius)
            .write_i64(self.max_tick);
        Ok(writer.into_bytes())
    }

    pub fn decode(reader: &mut FrameReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            skill_id: reader.read_utf()?,
            picture: reader.read_utf()?,
            min_size: reader.read_f64()?,
            max_size: reader.read_f64()?,
            radius: reader.read_f64()?,
            max_tick: reader.read_i64()?,
        })
    }
}

/// Server → client: project an entity silhouette at a world location.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityShow {
    pub entity_id: String,
    pub group: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub timeout_ms: i64,
    pub rotate_x: f32,
    pub rotate_y: f32,
    pub rotate_z: f32,
    pub scale: f32,
}

impl EntityShow {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = FrameWriter::new(MessageType::EntityShow);
        writer.write_utf(&self.entity_id)?;
        writer.write_utf(&self.group)?;
        writer
            .write_f64(self.x)
            .write_f64(self.y)
            .write_f64(self.z)
            .write_i64(self.timeout_ms)
            .write_f32(self.rotate_x)
            .write_f32(self.rotate_y)
            .write_f32(self.rotate_z)
            .write_f32(self.scale);
        Ok(writer.into_bytes())
    }

    pub fn decode(reader: &mut FrameReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            entity_id: reader.read_utf()?,
            group: reader.read_utf()?,
            x: reader.read_f64()?,
            y: reader.read_f64()?,
            z: reader.read_f64()?,
            timeout_ms: reader.read_i64()?,
            rotate_x: reader.read_f32()?,
            rotate_y: reader.read_f32()?,
            rotate_z: reader.read_f32()?,
            scale: reader.read_f32()?,
        })
    }
}

/// Server → client: remove a projected entity silhouette.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityShowRemove {
    pub entity_id: String,
    pub group: String,
}

impl EntityShowRemove {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = FrameWriter::new(MessageType::EntityShowRemove);
        writer.write_utf(&self.entity_id)?;
        writer.write_utf(&self.group)?;
        Ok(writer.into_bytes())
    }

    pub fn decode(reader: &mut FrameReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            entity_id: reader.read_utf()?,
            group: reader.read_utf()?,
        })
    }
}

/// Server → client: start client-side pathing toward a block position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerNavigation {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub range: i32,
}

impl PlayerNavigation {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = FrameWriter::new(MessageType::PlayerNavigation);
        writer
            .write_i32(self.x)
            .write_i32(self.y)
            .write_i32(self.z)
            .write_i32(self.range);
        Ok(writer.into_bytes())
    }

    pub fn decode(reader: &mut FrameReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            x: reader.read_i32()?,
            y: reader.read_i32()?,
            z: reader.read_i32()?,
            range: reader.read_i32()?,
        })
    }
}

/// Server → client: rectangular shockwave effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareShockwave {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub length: f64,
    pub width: f64,
    pub yaw: f64,
}

impl SquareShockwave {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = FrameWriter::new(MessageType::SquareShockwave);
        writer
            .write_f64(self.x)
            .write_f64(self.y)
            .write_f64(self.z)
            .write_f64(self.length)
            .write_f64(self.width)
            .write_f64(self.yaw);
        Ok(writer.into_bytes())
    }

    pub fn decode(reader: &mut FrameReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            x: reader.read_f64()?,
            y: reader.read_f64()?,
            z: reader.read_f64()?,
            length: reader.read_f64()?,
            width: reader.read_f64()?,
            yaw: reader.read_f64()?,
        })
    }
}

/// Server → client: circular shockwave effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleShockwave {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub radius: f64,
}

impl CircleShockwave {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = FrameWriter::new(MessageType::CircleShockwave);
        writer
            .write_f64(self.x)
            .write_f64(self.y)
            .write_f64(self.z)
            .write_f64(self.radius);
        Ok(writer.into_bytes())
    }

    pub fn decode(reader: &mut FrameReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            x: reader.read_f64()?,
            y: reader.read_f64()?,
            z: reader.read_f64()?,
            radius: reader.read_f64()?,
        })
    }
}

/// Server → client: sector shockwave effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectorShockwave {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub radius: f64,
    pub yaw: f64,
    pub angle: f64,
}

impl SectorShockwave {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = FrameWriter::new(MessageType::SectorShockwave);
        writer
            .write_f64(self.x)
            .write_f64(self.y)
            .write_f64(self.z)
            .write_f64(self.radius)
            .write_f64(self.yaw)
            .write_f64(self.angle);
        Ok(writer.into_bytes())
    }

    pub fn decode(reader: &mut FrameReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            x: reader.read_f64()?,
            y: reader.read_f64()?,
            z: reader.read_f64()?,
            radius: reader.read_f64()?,
            yaw: reader.read_f64()?,
            angle: reader.read_f64()?,
        })
    }
}

/// A fully decoded frame of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    AimRequest(AimRequest),
    AimConfirm(AimConfirm),
    Ghost(Ghost),
    AimResponse(AimResponse),
    Flicker(Flicker),
    PressAimRequest(PressAimRequest),
    /// Reserved header 7; always empty.
    MouseRequest,
    EntityShow(EntityShow),
    EntityShowRemove(EntityShowRemove),
    PlayerNavigation(PlayerNavigation),
    PlayerNavigationStop,
    SquareShockwave(SquareShockwave),
    CircleShockwave(CircleShockwave),
    SectorShockwave(SectorShockwave),
}

impl Packet {
    /// The message type this packet encodes as.
    pub fn message_type(&self) -> MessageType {
        match self {
            Packet::AimRequest(_) => MessageType::AimRequest,
            Packet::AimConfirm(_) => MessageType::AimConfirm,
            Packet::Ghost(_) => MessageType::Ghost,
            Packet::AimResponse(_) => MessageType::AimResponse,
            Packet::Flicker(_) => MessageType::Flicker,
            Packet::PressAimRequest(_) => MessageType::PressAimRequest,
            Packet::MouseRequest => MessageType::MouseRequest,
            Packet::EntityShow(_) => MessageType::EntityShow,
            Packet::EntityShowRemove(_) => MessageType::EntityShowRemove,
            Packet::PlayerNavigation(_) => MessageType::PlayerNavigation,
            Packet::PlayerNavigationStop => MessageType::PlayerNavigationStop,
            Packet::SquareShockwave(_) => MessageType::SquareShockwave,
            Packet::CircleShockwave(_) => MessageType::CircleShockwave,
            Packet::SectorShockwave(_) => MessageType::SectorShockwave,
        }
    }

    /// Encodes this packet into a complete frame.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        match self {
            Packet::AimRequest(p) => p.encode(),
            Packet::AimConfirm(p) => p.encode(),
            Packet::Ghost(p) => p.encode(),
            Packet::AimResponse(p) => p.encode(),
            Packet::Flicker(p) => p.encode(),
            Packet::PressAimRequest(p) => p.encode(),
            Packet::MouseRequest => {
                Ok(FrameWriter::new(MessageType::MouseRequest).into_bytes())
            }
            Packet::EntityShow(p) => p.encode(),
            Packet::EntityShowRemove(p) => p.encode(),
            Packet::PlayerNavigation(p) => p.encode(),
            Packet::PlayerNavigationStop => {
                Ok(FrameWriter::new(MessageType::PlayerNavigationStop).into_bytes())
            }
            Packet::SquareShockwave(p) => p.encode(),
            Packet::CircleShockwave(p) => p.encode(),
            Packet::SectorShockwave(p) => p.encode(),
        }
    }

    /// Decodes a complete frame into its typed packet.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = FrameReader::new(bytes);
        let packet = match reader.read_header()? {
            MessageType::AimRequest => Packet::AimRequest(AimRequest::decode(&mut reader)?),
            MessageType::AimConfirm => Packet::AimConfirm(AimConfirm::decode(&mut reader)?),
            MessageType::Ghost => Packet::Ghost(Ghost::decode(&mut reader)?),
            MessageType::AimResponse => Packet::AimResponse(AimResponse::decode(&mut reader)?),
            MessageType::Flicker => Packet::Flicker(Flicker::decode(&mut reader)?),
            MessageType::PressAimRequest => {
                Packet::PressAimRequest(PressAimRequest::decode(&mut reader)?)
            }
            MessageType::MouseRequest => Packet::MouseRequest,
            MessageType::EntityShow => Packet::EntityShow(EntityShow::decode(&mut reader)?),
            MessageType::EntityShowRemove => {
                Packet::EntityShowRemove(EntityShowRemove::decode(&mut reader)?)
            }
            MessageType::PlayerNavigation => {
                Packet::PlayerNavigation(PlayerNavigation::decode(&mut reader)?)
            }
            MessageType::PlayerNavigationStop => Packet::PlayerNavigationStop,
            MessageType::SquareShockwave => {
                Packet::SquareShockwave(SquareShockwave::decode(&mut reader)?)
            }
            MessageType::CircleShockwave => {
                Packet::CircleShockwave(CircleShockwave::decode(&mut reader)?)
            }
            MessageType::SectorShockwave => {
                Packet::SectorShockwave(SectorShockwave::decode(&mut reader)?)
            }
        };
        Ok(packet)
    }
}
