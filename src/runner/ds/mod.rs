//! Data structures: host values, keyed collections, host objects and the container itself.

pub mod array_key;
pub mod array_object;
pub mod diagnostic;
pub mod error;
pub mod iterator;
pub mod keyed_collection;
pub mod object;
pub mod operations;
pub mod value;
