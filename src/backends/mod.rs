//! Entropy-coder backends and the registry tying codes, names and
//! on-wire formats together.
//!
//! Every backend is a pair of one-shot functions over byte slices:
//! `compress` writes at most `dest.len()` bytes and returns the count,
//! with `0` meaning "did not compress or would not fit"; `decompress`
//! must produce exactly the caller-expected length. Backends whose
//! encoded form can exceed the input advertise a `worst_case` bound,
//! and backends with a non-standard native level range advertise a
//! `level_scale` mapping from the public 1..=9 scale.

pub(crate) mod blosclz;

use crate::constants::*;
use crate::error::{Error, Result};
use std::io::Write;

/// Descriptor for one compression backend.
pub(crate) struct Backend {
    pub compcode: u8,
    pub compformat: u8,
    pub name: &'static str,
    pub libname: &'static str,
    pub version_format: u8,
    pub available: bool,
    pub compress: fn(clevel: i32, src: &[u8], dest: &mut [u8]) -> usize,
    pub decompress: fn(src: &[u8], dest: &mut [u8]) -> Result<usize>,
    pub worst_case: Option<fn(usize) -> usize>,
    pub level_scale: Option<fn(i32) -> i32>,
}

pub(crate) static BACKENDS: [Backend; 6] = [
    Backend {
        compcode: BLOSC_BLOSCLZ,
        compformat: BLOSC_BLOSCLZ_FORMAT,
        name: BLOSC_BLOSCLZ_COMPNAME,
        libname: BLOSC_BLOSCLZ_LIBNAME,
        version_format: BLOSC_BLOSCLZ_VERSION_FORMAT,
        available: true,
        compress: blosclz_compress,
        decompress: blosclz_decompress,
        worst_case: None,
        level_scale: None,
    },
    Backend {
        compcode: BLOSC_LZ4,
        compformat: BLOSC_LZ4_FORMAT,
        name: BLOSC_LZ4_COMPNAME,
        libname: BLOSC_LZ4_LIBNAME,
        version_format: BLOSC_LZ4_VERSION_FORMAT,
        available: true,
        compress: lz4_compress,
        decompress: lz4_decompress,
        worst_case: None,
        level_scale: None,
    },
    Backend {
        compcode: BLOSC_LZ4HC,
        compformat: BLOSC_LZ4HC_FORMAT,
        name: BLOSC_LZ4HC_COMPNAME,
        libname: BLOSC_LZ4_LIBNAME,
        version_format: BLOSC_LZ4HC_VERSION_FORMAT,
        available: true,
        compress: lz4_compress,
        decompress: lz4_decompress,
        worst_case: None,
        // The HC encoder's native range is 1..=16.
        level_scale: Some(|clevel| 2 * clevel - 1),
    },
    Backend {
        compcode: BLOSC_SNAPPY,
        compformat: BLOSC_SNAPPY_FORMAT,
        name: BLOSC_SNAPPY_COMPNAME,
        libname: BLOSC_SNAPPY_LIBNAME,
        version_format: BLOSC_SNAPPY_VERSION_FORMAT,
        available: true,
        compress: snappy_compress,
        decompress: snappy_decompress,
        worst_case: Some(snap::raw::max_compress_len),
        level_scale: None,
    },
    Backend {
        compcode: BLOSC_ZLIB,
        compformat: BLOSC_ZLIB_FORMAT,
        name: BLOSC_ZLIB_COMPNAME,
        libname: BLOSC_ZLIB_LIBNAME,
        version_format: BLOSC_ZLIB_VERSION_FORMAT,
        available: true,
        compress: zlib_compress,
        decompress: zlib_decompress,
        worst_case: None,
        level_scale: None,
    },
    Backend {
        compcode: BLOSC_ZSTD,
        compformat: BLOSC_ZSTD_FORMAT,
        name: BLOSC_ZSTD_COMPNAME,
        libname: BLOSC_ZSTD_LIBNAME,
        version_format: BLOSC_ZSTD_VERSION_FORMAT,
        available: true,
        compress: zstd_compress,
        decompress: zstd_decompress,
        worst_case: None,
        level_scale: None,
    },
];

/// Look a backend up by its public code.
pub(crate) fn by_compcode(compcode: u8) -> Result<&'static Backend> {
    BACKENDS
        .iter()
        .find(|b| b.compcode == compcode && b.available)
        .ok_or_else(|| Error::UnsupportedBackend(format!("code {}", compcode)))
}

/// Look a backend up by its public name.
pub(crate) fn by_name(name: &str) -> Result<&'static Backend> {
    BACKENDS
        .iter()
        .find(|b| b.name == name && b.available)
        .ok_or_else(|| Error::UnsupportedBackend(name.to_string()))
}

/// Resolve the decoder for an on-wire format code. Formats shared by
/// several encoders (LZ4/LZ4HC) resolve to the canonical decoder entry.
pub(crate) fn decoder_for_format(compformat: u8) -> Result<&'static Backend> {
    BACKENDS
        .iter()
        .find(|b| b.compformat == compformat && b.available)
        .ok_or_else(|| Error::UnsupportedBackend(format!("wire format {}", compformat)))
}

/* Slice adapters over the codec crates. Encoders report 0 instead of an
   error so the block compressor can fall back to storing raw bytes. */

fn blosclz_compress(clevel: i32, src: &[u8], dest: &mut [u8]) -> usize {
    blosclz::compress(clevel, src, dest)
}

fn blosclz_decompress(src: &[u8], dest: &mut [u8]) -> Result<usize> {
    match blosclz::decompress(src, dest) {
        0 => Err(Error::BackendError("blosclz rejected the stream")),
        n => Ok(n),
    }
}

fn lz4_compress(_clevel: i32, src: &[u8], dest: &mut [u8]) -> usize {
    lz4_flex::block::compress_into(src, dest).unwrap_or(0)
}

fn lz4_decompress(src: &[u8], dest: &mut [u8]) -> Result<usize> {
    lz4_flex::block::decompress_into(src, dest)
        .map_err(|_| Error::BackendError("lz4 rejected the stream"))
}

fn snappy_compress(_clevel: i32, src: &[u8], dest: &mut [u8]) -> usize {
    let bound = snap::raw::max_compress_len(src.len());
    if bound == 0 {
        // Input too large for the format.
        return 0;
    }
    let mut encoder = snap::raw::Encoder::new();
    if dest.len() >= bound {
        return encoder.compress(src, dest).unwrap_or(0);
    }
    // The encoder refuses to start without worst-case room; stage and
    // copy back whatever actually fits.
    let mut staged = vec![0u8; bound];
    match encoder.compress(src, &mut staged) {
        Ok(n) if n <= dest.len() => {
            dest[..n].copy_from_slice(&staged[..n]);
            n
        }
        _ => 0,
    }
}

fn snappy_decompress(src: &[u8], dest: &mut [u8]) -> Result<usize> {
    snap::raw::Decoder::new()
        .decompress(src, dest)
        .map_err(|_| Error::BackendError("snappy rejected the stream"))
}

fn zlib_compress(clevel: i32, src: &[u8], dest: &mut [u8]) -> usize {
    let level = clevel.clamp(1, 9) as u32;
    let cursor = std::io::Cursor::new(dest);
    let mut encoder = flate2::write::ZlibEncoder::new(cursor, flate2::Compression::new(level));
    if encoder.write_all(src).is_err() {
        return 0;
    }
    match encoder.finish() {
        Ok(cursor) => cursor.position() as usize,
        Err(_) => 0,
    }
}

fn zlib_decompress(src: &[u8], dest: &mut [u8]) -> Result<usize> {
    let mut decoder = flate2::read::ZlibDecoder::new(src);
    let mut cursor = std::io::Cursor::new(dest);
    std::io::copy(&mut decoder, &mut cursor)
        .map(|n| n as usize)
        .map_err(|_| Error::BackendError("zlib rejected the stream"))
}

fn zstd_compress(clevel: i32, src: &[u8], dest: &mut [u8]) -> usize {
    zstd::bulk::compress_to_buffer(src, dest, clevel.clamp(1, 9)).unwrap_or(0)
}

fn zstd_decompress(src: &[u8], dest: &mut [u8]) -> Result<usize> {
    zstd::bulk::decompress_to_buffer(src, dest)
        .map_err(|_| Error::BackendError("zstd rejected the stream"))
}
