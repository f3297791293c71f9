#![crate_type = "lib"]
#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features
)]
#![warn(
    missing_debug_implementations,
    missing_docs,
    unused_qualifications,
    unused_import_braces
)]

//! This is the core DLIS library, containing the concepts, data structures
//! and traits specific to RP66 v1 content: representation codes, primitive
//! attribute values, and object names.
//!

pub mod name;
pub mod reprcode;
pub mod value;

pub use name::{AttRef, ObName, ObjRef};
pub use reprcode::RepCode;
pub use value::{InferencePolicy, Value, ValueType, C};
