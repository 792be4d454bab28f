//! Generators for synthetic activity data.
//!
//! - [`StreamGenerator`]: time, distance, altitude, position and heart rate streams

pub mod stream;

pub use stream::{GenerateError, GeneratedStream, StreamGenerator};
