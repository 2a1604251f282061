//! Stream decoding for server-sent-events chat responses
//!
//! [`SseDecoder`] frames raw bytes into `data:` lines and decodes them;
//! [`ChunkStream`] drives a response body through the decoder one read at a
//! time while honoring a [`crate::CancellationToken`].

pub mod chunks;
pub mod decoder;

pub use chunks::ChunkStream;
pub use decoder::{SseDecoder, SseLine};
