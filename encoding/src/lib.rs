#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    unused_qualifications,
    unused_import_braces
)]
//! DLIS encoding primitives.
//!
//! This crate provides the byte-level building blocks for producing RP66 v1
//! streams: big-endian encoders for every writable representation code, the
//! logical-record segmenter, the visible-record packer with its buffered
//! writer, and the storage unit label.
//!
//! All APIs are based on synchronous I/O.

pub mod encode;
pub mod segment;
pub mod sul;
pub mod visible;

pub use encode::{encode_value, value_size};
pub use segment::{EflrType, IflrType, LogicalRecord, RecordType, SegmentAttributes, Segmenter};
pub use sul::StorageUnitLabel;
pub use visible::VisibleRecordWriter;
