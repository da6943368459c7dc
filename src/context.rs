//! Explicit-parameter entry points.
//!
//! These are the primary interface: everything the call needs travels
//! in a parameter struct, and no process-wide state is read or written.
//! The stateless wrappers in [`crate::api`] are thin adapters over
//! these.

use crate::backends;
use crate::constants::*;
use crate::error::Result;
use crate::pipeline;

/// Compression parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cparams {
    /// Public compressor code (`BLOSC_BLOSCLZ`, `BLOSC_LZ4`, ...).
    pub compcode: u8,
    /// Compression level, `0` (plain copy) to `9`.
    pub clevel: i32,
    /// Apply the byte-transpose filter before coding.
    pub doshuffle: bool,
    /// Size in bytes of one logical element of the buffer.
    pub typesize: usize,
    /// Forced block size; `0` selects the automatic heuristic.
    pub blocksize: usize,
    /// Worker threads for the block scheduler.
    pub nthreads: usize,
}

impl Default for Cparams {
    fn default() -> Cparams {
        Cparams {
            compcode: BLOSC_BLOSCLZ,
            clevel: 5,
            doshuffle: true,
            typesize: 8,
            blocksize: 0,
            nthreads: 1,
        }
    }
}

/// Decompression parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dparams {
    /// Worker threads for the block scheduler.
    pub nthreads: usize,
}

impl Default for Dparams {
    fn default() -> Dparams {
        Dparams { nthreads: 1 }
    }
}

/// Compress `src` into `dest` with explicit parameters.
///
/// Returns the total artifact length (header included). See
/// [`crate::api::compress`] for the wire-format contract.
pub fn compress_ctx(params: &Cparams, src: &[u8], dest: &mut [u8]) -> Result<usize> {
    let backend = backends::by_compcode(params.compcode)?;
    pipeline::compress(
        backend,
        params.clevel,
        params.doshuffle,
        params.typesize,
        params.blocksize,
        params.nthreads,
        src,
        dest,
    )
}

/// Decompress a whole artifact into `dest` with explicit parameters.
pub fn decompress_ctx(params: &Dparams, src: &[u8], dest: &mut [u8]) -> Result<usize> {
    pipeline::decompress(params.nthreads, src, dest)
}
