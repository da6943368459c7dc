//! Blocked, shuffled, multi-threaded compression of typed binary
//! buffers.
//!
//! A buffer of fixed-size elements is cut into cache-sized blocks, each
//! block is byte-transposed so bytes of equal significance sit next to
//! each other, and an interchangeable entropy coder squeezes the
//! result. The artifact is self-describing and supports whole-buffer
//! decompression as well as decoding an arbitrary element range, and
//! blocks compress and decompress in parallel without changing a single
//! output byte.
//!
//! ```
//! let values: Vec<u8> = (0u32..4096).flat_map(|i| i.to_le_bytes()).collect();
//! let mut compressed = vec![0u8; values.len() + 1024];
//! let cbytes = blosc1::compress(5, true, 4, &values, &mut compressed).unwrap();
//! let mut restored = vec![0u8; values.len()];
//! let nbytes = blosc1::decompress(&compressed[..cbytes], &mut restored).unwrap();
//! assert_eq!(nbytes, values.len());
//! assert_eq!(restored, values);
//! ```

pub mod constants;
pub mod error;
pub mod shuffle;

mod api;
mod backends;
mod block;
mod buffer;
mod context;
mod header;
mod pipeline;
mod tune;

pub use api::*;
pub use constants::*;
pub use context::{compress_ctx, decompress_ctx, Cparams, Dparams};
pub use error::{Error, Result};
