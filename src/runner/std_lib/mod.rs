//! Host-side collaborators of the container.
//!
//! This module contains the value codec used for `serialize`/`unserialize`, the storage
//! driver registry and the observer notification protocol.

pub mod drivers;
pub mod observer;
pub mod serialize;

pub use serialize::{serialize, unserialize, SerializationCodec, TextCodec};
