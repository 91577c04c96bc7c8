//! Wire protocol shared by the banking server and client.
//!
//! One command per message, one reply per command. Every message is text
//! followed by a single NUL byte; undecodable bytes read as U+FFFD.

pub mod codec;
pub mod reply;
pub mod request;

pub use codec::{CodecError, MessageCodec};
pub use request::{Request, Verb};
