//! Sensor wire protocol
//!
//! The sensor speaks a minimal binary protocol over the serial link:
//!
//! - **Commands** ([`Command`]) are 2-byte sequences written by the host to
//!   start streaming one axis or to stop streaming.
//! - **Frames** are 4-byte units `[high, low, 0x01, 0x01]` streamed by the
//!   sensor; [`FrameDecoder`] recovers them from arbitrarily split chunks.
//!
//! There is no length prefix or escaping. The trailing `0x01 0x01` marker is
//! the only synchronization aid, so payload bytes that happen to look like a
//! marker can produce a false frame. The decoder always takes the earliest
//! matching 4-byte window and makes no attempt to detect such collisions.

pub mod command;
pub mod decoder;

pub use command::Command;
pub use decoder::{decode, encode_frame, raw_to_g, DecodeStats, DecoderState, FrameDecoder, FRAME_MARKER};
