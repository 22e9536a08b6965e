//! # Transaction Decoding
//!
//! Recovering the protocol payload ([`payload`]) and attributing the sender
//! ([`sender`]). Both halves are pure functions over the frozen transaction
//! view and a registry snapshot; the validator stitches them together.

pub mod payload;
pub mod sender;

pub use payload::{DecodeError, DetectedPayload, EncodingClass, PayloadHeader};
pub use sender::{resolve_sender, sender_by_contribution, SenderError};
