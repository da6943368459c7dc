//! Stateless entry points and artifact introspection.
//!
//! The classic call style keeps the selected compressor, the thread
//! count and an optional forced block size in one process-wide settings
//! record. The record sits behind a single lock that is held for the
//! whole of any compress or decompress call, so a concurrent
//! reconfiguration can never tear a call in two. Code that wants no
//! shared state should use [`crate::compress_ctx`] /
//! [`crate::decompress_ctx`] instead.

use std::sync::Mutex;

use crate::backends;
use crate::constants::*;
use crate::error::Result;
use crate::header::Header;
use crate::pipeline;

struct Settings {
    compcode: u8,
    nthreads: usize,
    blocksize: usize,
}

static SETTINGS: Mutex<Settings> = Mutex::new(Settings {
    compcode: BLOSC_BLOSCLZ,
    nthreads: 1,
    blocksize: 0,
});

/// Compress `src` into `dest` using the process-wide settings.
///
/// `clevel` ranges over `0..=9` (`0` stores a plain copy), `doshuffle`
/// enables the byte-transpose filter, and `typesize` is the element
/// width the transpose groups by. Returns the total artifact length,
/// header included. Destinations that cannot hold even the plain-copy
/// fallback yield [`Error::BufferTooSmall`].
pub fn compress(
    clevel: i32,
    doshuffle: bool,
    typesize: usize,
    src: &[u8],
    dest: &mut [u8],
) -> Result<usize> {
    let settings = SETTINGS.lock().unwrap();
    let backend = backends::by_compcode(settings.compcode)?;
    pipeline::compress(
        backend,
        clevel,
        doshuffle,
        typesize,
        settings.blocksize,
        settings.nthreads,
        src,
        dest,
    )
}

/// Decompress a whole artifact into `dest` using the process-wide
/// settings. Returns the number of bytes produced.
pub fn decompress(src: &[u8], dest: &mut [u8]) -> Result<usize> {
    let settings = SETTINGS.lock().unwrap();
    pipeline::decompress(settings.nthreads, src, dest)
}

/// Decode `nitems` elements starting at element `start` into `dest`,
/// touching only the blocks that intersect the range.
pub fn getitem(src: &[u8], start: usize, nitems: usize, dest: &mut [u8]) -> Result<usize> {
    pipeline::getitem(src, start, nitems, dest)
}

/// Select the compressor used by [`compress`]. Returns its public code.
pub fn set_compressor(name: &str) -> Result<u8> {
    let backend = backends::by_name(name)?;
    SETTINGS.lock().unwrap().compcode = backend.compcode;
    Ok(backend.compcode)
}

/// Name of the currently selected compressor.
pub fn get_compressor() -> &'static str {
    let compcode = SETTINGS.lock().unwrap().compcode;
    // The settings record only ever holds registered codes.
    backends::by_compcode(compcode).map(|b| b.name).unwrap_or(BLOSC_BLOSCLZ_COMPNAME)
}

/// Set the worker thread count; values below 1 are treated as 1.
/// Returns the previous count.
pub fn set_nthreads(nthreads: usize) -> usize {
    let mut settings = SETTINGS.lock().unwrap();
    std::mem::replace(&mut settings.nthreads, nthreads.max(1))
}

/// Current worker thread count.
pub fn get_nthreads() -> usize {
    SETTINGS.lock().unwrap().nthreads
}

/// Force a block size for subsequent [`compress`] calls; `0` restores
/// the automatic heuristic.
pub fn set_blocksize(blocksize: usize) {
    SETTINGS.lock().unwrap().blocksize = blocksize;
}

/// Uncompressed length, artifact length, and block size of an artifact.
pub fn cbuffer_sizes(src: &[u8]) -> Result<(usize, usize, usize)> {
    let header = Header::read(src)?;
    Ok((header.nbytes, header.cbytes, header.blocksize))
}

/// Element width and raw flags byte of an artifact.
pub fn cbuffer_metainfo(src: &[u8]) -> Result<(usize, u8)> {
    let header = Header::read(src)?;
    Ok((header.typesize, header.flags))
}

/// Container format version and compressor framing version.
pub fn cbuffer_versions(src: &[u8]) -> Result<(u8, u8)> {
    let header = Header::read(src)?;
    Ok((header.version, header.versionlz))
}

/// Display name of the compression library that produced an artifact.
pub fn cbuffer_complib(src: &[u8]) -> Result<&'static str> {
    let header = Header::read(src)?;
    Ok(backends::decoder_for_format(header.compformat())?.libname)
}

/// Comma-separated names of the compressors available in this build.
pub fn list_compressors() -> String {
    backends::BACKENDS
        .iter()
        .filter(|b| b.available)
        .map(|b| b.name)
        .collect::<Vec<_>>()
        .join(",")
}

/// Translate a compressor name to its public code.
pub fn compname_to_compcode(name: &str) -> Result<u8> {
    Ok(backends::by_name(name)?.compcode)
}

/// Translate a public compressor code to its name.
pub fn compcode_to_compname(compcode: u8) -> Result<&'static str> {
    Ok(backends::by_compcode(compcode)?.name)
}
