//! Message-type registry for the side channel.
//!
//! Header values are hand-matched against the client mod; adding a type here
//! without a matching client decoder breaks the channel silently, so the
//! numeric values are part of the wire contract.

use crate::error::CodecError;

/// Every frame kind exchanged over the side channel, keyed by its 4-byte
/// big-endian signed header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Server → client: ask the player to aim (fixed-size indicator).
    AimRequest,
    /// Server → client: acknowledge acceptance (`true`) or cancellation (`false`).
    AimConfirm,
    /// Server → client: ghost trail effect on a target actor.
    Ghost,
    /// Client → server: the player's accepted aim location.
    AimResponse,
    /// Server → client: flicker after-image effect on a target actor.
    Flicker,
    /// Server → client: ask the player to aim with a charge-up indicator.
    PressAimRequest,
    /// Reserved header; carries no payload and is never sent by the server.
    MouseRequest,
    /// Server → client: project an entity silhouette at a location.
    EntityShow,
    /// Server → client: remove a projected entity silhouette.
    EntityShowRemove,
    /// Server → client: start client-side pathing toward a block position.
    PlayerNavigation,
    /// Server → client: stop client-side pathing.
    PlayerNavigationStop,
    /// Server → client: rectangular shockwave effect.
    SquareShockwave,
    /// Server → client: circular shockwave effect.
    CircleShockwave,
    /// Server → client: sector shockwave effect.
    SectorShockwave,
}

impl MessageType {
    /// The wire header value for this message type.
    pub fn header(self) -> i32 {
        match self {
            MessageType::AimRequest => 1,
            MessageType::AimConfirm => 2,
            MessageType::Ghost => 3,
            MessageType::AimResponse => 4,
            MessageType::Flicker => 5,
            MessageType::PressAimRequest => 6,
            MessageType::MouseRequest => 7,
            MessageType::EntityShow => 8,
            MessageType::EntityShowRemove => 9,
            MessageType::PlayerNavigation => 10,
            MessageType::PlayerNavigationStop => 11,
            MessageType::SquareShockwave => 12,
            MessageType::CircleShockwave => 13,
            MessageType::SectorShockwave => 14,
        }
    }
}

impl TryFrom<i32> for MessageType {
    type Error = CodecError;

    fn try_from(header: i32) -> Result<Self, Self::Error> {
        match header {
            1 => Ok(MessageType::AimRequest),
            2 => Ok(MessageType::AimConfirm),
            3 => Ok(MessageType::Ghost),
            4 => Ok(MessageType::AimResponse),
            5 => Ok(MessageType::Flicker),
            6 => Ok(MessageType::PressAimRequest),
            7 => Ok(MessageType::MouseRequest),
            8 => Ok(MessageType::EntityShow),
            9 => Ok(MessageType::EntityShowRemove),
            10 => Ok(MessageType::PlayerNavigation),
            11 => Ok(MessageType::PlayerNavigationStop),
            12 => Ok(MessageType::SquareShockwave),
            13 => Ok(MessageType::CircleShockwave),
            14 => Ok(MessageType::SectorShockwave),
            other => Err(CodecError::UnknownMessageType(other)),
        }
    }
}
