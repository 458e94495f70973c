//! This crate provides a decoder for [ONNX][onnx] model files, limited to the
//! messages and fields needed to compare two versions of a model.
//!
//! # About ONNX models
//!
//! ONNX models are [Protocol Buffers][protobuf] messages using the `ModelProto`
//! schema from
//! [onnx.proto](https://github.com/onnx/onnx/blob/main/onnx/onnx.proto3). The
//! `ModelProto` message carries model-level metadata (IR version, producer,
//! opset imports) and a graph describing operators, inputs, outputs and
//! weights.
//!
//! # Usage
//!
//! ```no_run
//! use onnx_diff_proto::onnx::ModelProto;
//! use onnx_diff_proto::protobuf::DecodeMessage;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let buf = std::fs::read("model.onnx")?;
//!     let model = ModelProto::decode(&buf)?;
//!
//!     let op_count = model.graph.as_ref().map(|g| g.node.len()).unwrap_or(0);
//!     println!("Model has {} operators", op_count);
//!     Ok(())
//! }
//! ```
//!
//! # Design
//!
//! A comparison needs the whole graph structure of both models resident in
//! memory, so the decoder works on an in-memory buffer. Weight payloads are
//! copied out of the buffer only for initializers, where the comparison needs
//! their length, and for attribute tensors, which are compared structurally.
//!
//! Fields that are not used by the comparison (doc strings on nodes, sparse
//! initializers, training info...) are skipped.
//!
//! [onnx]: https://onnx.ai/onnx/
//! [protobuf]: https://protobuf.dev/

// This is a crate for parsing potentially untrusted files, so it is preferable
// to avoid unsafe code.
#![forbid(unsafe_code)]

pub mod onnx;
pub mod protobuf;
