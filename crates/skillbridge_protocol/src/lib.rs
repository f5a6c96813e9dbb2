//! # Skillbridge Wire Codec
//!
//! Binary frame encoding and decoding for the skillbridge side channel.
//! Every frame is a 4-byte big-endian signed message-type header followed by
//! a fixed-order payload of big-endian fixed-width fields. There is no
//! versioning field: both ends must agree on the field order out of band.
//!
//! ## Key Types
//!
//! - [`MessageType`] - The message-type registry (header value per frame kind)
//! - [`FrameWriter`] / [`FrameReader`] - Append-only builder and bounds-checked cursor
//! - [`Packet`] - Typed representation of every frame kind
//! - [`CodecError`] - Decode/encode failure taxonomy
//!
//! ## Design Principles
//!
//! - **No state**: encoding and decoding are pure functions over byte buffers
//! - **Fail typed**: a short buffer, an unknown header, or invalid UTF-8 is a
//!   [`CodecError`], never a panic
//! - **Exact layout**: the payload layout is determined entirely by the header
//!   and must match the client mod byte for byte

pub use codec::{FrameReader, FrameWriter};
pub use error::CodecError;
pub use message::MessageType;
pub use packets::{
    AimConfirm, AimRequest, AimResponse, CircleShockwave, EntityShow, EntityShowRemove, Flicker,
    Ghost, Packet, PlayerNavigation, PressAimRequest, SectorShockwave, SquareShockwave,
};

pub mod codec;
pub mod error;
pub mod message;
pub mod packets;
