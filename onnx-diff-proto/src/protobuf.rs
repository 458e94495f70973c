//! Low-level Protocol Buffers message decoder.
//!
//! This module decodes [Protocol Buffers](https://protobuf.dev/) messages from
//! a byte slice. Decoders have control over which types are used for message
//! fields and which fields are read or skipped.
//!
//! See <https://protobuf.dev/programming-guides/encoding/> for a description
//! of the wire format.
//!
//! # Defining decoders
//!
//! Define a type into which a message will be deserialized and implement
//! [`DecodeMessage`] for it. `DecodeMessage` implementations iterate over
//! [`Fields`] and update the struct according to each field's number.

mod errors;
mod field;
mod message;
pub mod varint;

pub use errors::{ErrorKind, ProtobufError};
pub use field::{Field, FieldValue, Fields};
pub use message::DecodeMessage;

#[cfg(test)]
pub(crate) use field::MessageWriter;
