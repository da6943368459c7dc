//! Serial and parallel drivers over the per-block pipeline.
//!
//! Compression packs block payloads back to back and records each
//! block's absolute start offset in the header table, so the artifact
//! layout is fixed by block index alone. The parallel compressor
//! therefore runs in two phases: workers compress blocks into private
//! staging buffers in any order, then a single pack pass assigns
//! offsets and copies payloads in index order. The output is
//! byte-identical for every thread count. Decompression needs no such
//! ordering because the start table pins every block's location.

use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::backends::{self, Backend};
use crate::block::{compress_block, decompress_block, BlockParams};
use crate::buffer::AlignedBuf;
use crate::constants::*;
use crate::error::{Error, Result};
use crate::header::{read_bstart, write_bstart, Header};
use crate::tune;

/// Full compression driver: plan, schedule, and fall back to a plain
/// copy when the data refuses to shrink.
pub(crate) fn compress(
    backend: &'static Backend,
    clevel: i32,
    doshuffle: bool,
    typesize: usize,
    forced_blocksize: usize,
    nthreads: usize,
    src: &[u8],
    dest: &mut [u8],
) -> Result<usize> {
    let nbytes = src.len();
    if !(0..=9).contains(&clevel) {
        return Err(Error::BadArg("compression level must be in 0..=9"));
    }
    if typesize == 0 {
        return Err(Error::BadArg("typesize zero is reserved"));
    }
    if nbytes > BLOSC_MAX_BUFFERSIZE {
        return Err(Error::BadArg("buffer exceeds the format size limit"));
    }
    // Oversized elements degrade to a plain byte stream.
    let typesize = if typesize > BLOSC_MAX_TYPESIZE { 1 } else { typesize };

    let blocksize = tune::compute_blocksize(backend.compcode, clevel, typesize, nbytes, forced_blocksize);
    let nblocks = if nbytes == 0 { 0 } else { (nbytes + blocksize - 1) / blocksize };
    let leftover = if nbytes == 0 { 0 } else { nbytes % blocksize };
    let overhead = BLOSC_MIN_HEADER_LENGTH + 4 * nblocks;

    let mut flags = backend.compformat << 5;
    if doshuffle {
        flags |= BLOSC_DOSHUFFLE;
    }
    if clevel == 0 || nbytes < BLOSC_MIN_BUFFERSIZE {
        flags |= BLOSC_MEMCPYED;
    }

    if dest.len() < overhead {
        return Err(Error::BufferTooSmall { needed: overhead, capacity: dest.len() });
    }

    if flags & BLOSC_MEMCPYED == 0 {
        let params = BlockParams {
            backend,
            clevel: backend.level_scale.map_or(clevel, |scale| scale(clevel)),
            flags,
            typesize,
        };
        // The artifact must never beat the plain-copy bound, so the
        // scheduler's budget is capped at nbytes plus overhead even
        // when the destination is roomier.
        let budget = dest.len().min(overhead + nbytes);
        let packed = if nthreads <= 1 || nbytes <= blocksize {
            serial_compress(&params, src, &mut dest[..budget], blocksize, nblocks, leftover, overhead)?
        } else {
            parallel_compress(
                &params,
                src,
                &mut dest[..budget],
                blocksize,
                nblocks,
                leftover,
                overhead,
                nthreads,
            )?
        };

        if let Some(cbytes) = packed {
            Header {
                version: BLOSC_VERSION_FORMAT,
                versionlz: backend.version_format,
                flags,
                typesize,
                nbytes,
                blocksize,
                cbytes,
            }
            .write(dest);
            return Ok(cbytes);
        }
        // The buffer is incompressible at this budget; retry as a plain
        // copy if that fits.
        flags |= BLOSC_MEMCPYED;
    }

    let cbytes = overhead + nbytes;
    if dest.len() < cbytes {
        return Err(Error::BufferTooSmall { needed: cbytes, capacity: dest.len() });
    }
    dest[BLOSC_MIN_HEADER_LENGTH..overhead].fill(0);
    dest[overhead..cbytes].copy_from_slice(src);
    Header {
        version: BLOSC_VERSION_FORMAT,
        versionlz: backend.version_format,
        flags,
        typesize,
        nbytes,
        blocksize,
        cbytes,
    }
    .write(dest);
    Ok(cbytes)
}

/// Length of block `index`.
fn block_len(index: usize, nblocks: usize, blocksize: usize, leftover: usize) -> (usize, bool) {
    let leftoverblock = leftover > 0 && index == nblocks - 1;
    (if leftoverblock { leftover } else { blocksize }, leftoverblock)
}

/// One thread walks the blocks in order, compressing straight into the
/// destination. Returns `Ok(None)` when a block does not fit.
fn serial_compress(
    params: &BlockParams,
    src: &[u8],
    dest: &mut [u8],
    blocksize: usize,
    nblocks: usize,
    leftover: usize,
    overhead: usize,
) -> Result<Option<usize>> {
    let mut tmp = AlignedBuf::zeroed(blocksize);
    let mut ntbytes = overhead;

    for i in 0..nblocks {
        let (len, leftoverblock) = block_len(i, nblocks, blocksize, leftover);
        let start = i * blocksize;
        write_bstart(dest, i, ntbytes);
        let written = compress_block(
            params,
            leftoverblock,
            &src[start..start + len],
            &mut dest[ntbytes..],
            &mut tmp,
        )?;
        if written == 0 {
            return Ok(None);
        }
        ntbytes += written;
    }
    Ok(Some(ntbytes))
}

/// Two-phase parallel compression: stage per block, then pack serially.
#[allow(clippy::too_many_arguments)]
fn parallel_compress(
    params: &BlockParams,
    src: &[u8],
    dest: &mut [u8],
    blocksize: usize,
    nblocks: usize,
    leftover: usize,
    overhead: usize,
    nthreads: usize,
) -> Result<Option<usize>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(nthreads)
        .build()
        .map_err(|_| Error::ThreadPool)?;

    // Sticky giveup: after one worker fails, the rest skip their blocks.
    let giveup = AtomicBool::new(false);

    // Staging capacity covers the raw-split worst case (one length
    // prefix per split plus the block itself), so a staged block can
    // only fail on a hard backend error.
    let staging_cap = blocksize + 4 * params.typesize;

    let staged: Result<Vec<Vec<u8>>> = pool.install(|| {
        (0..nblocks)
            .into_par_iter()
            .map_init(
                || (AlignedBuf::zeroed(blocksize), AlignedBuf::zeroed(staging_cap)),
                |(tmp, tmp2), i| {
                    if giveup.load(Ordering::Relaxed) {
                        return Ok(Vec::new());
                    }
                    let (len, leftoverblock) = block_len(i, nblocks, blocksize, leftover);
                    let start = i * blocksize;
                    let result = compress_block(
                        params,
                        leftoverblock,
                        &src[start..start + len],
                        tmp2,
                        tmp,
                    )
                    .map(|written| tmp2[..written].to_vec());
                    if result.is_err() {
                        giveup.store(true, Ordering::Relaxed);
                    }
                    result
                },
            )
            .collect()
    });
    let staged = staged?;

    // Pack phase: offsets are assigned in block-index order, making the
    // layout identical to the serial path.
    let mut ntbytes = overhead;
    for (i, chunk) in staged.iter().enumerate() {
        if chunk.is_empty() || ntbytes + chunk.len() > dest.len() {
            return Ok(None);
        }
        write_bstart(dest, i, ntbytes);
        dest[ntbytes..ntbytes + chunk.len()].copy_from_slice(chunk);
        ntbytes += chunk.len();
    }
    Ok(Some(ntbytes))
}

/// Full decompression driver.
pub(crate) fn decompress(nthreads: usize, src: &[u8], dest: &mut [u8]) -> Result<usize> {
    let header = Header::read(src)?;
    if header.nbytes > dest.len() {
        return Err(Error::HeaderCorrupt("declared size exceeds destination capacity"));
    }
    if src.len() < header.cbytes {
        return Err(Error::HeaderCorrupt("source shorter than declared cbytes"));
    }
    if header.nbytes == 0 {
        return Ok(0);
    }

    let overhead = header.overhead();
    if header.cbytes < overhead {
        return Err(Error::HeaderCorrupt("block start table truncated"));
    }

    if header.memcpyed() {
        if header.cbytes != overhead + header.nbytes {
            return Err(Error::HeaderCorrupt("plain-copy artifact with wrong cbytes"));
        }
        dest[..header.nbytes].copy_from_slice(&src[overhead..overhead + header.nbytes]);
        return Ok(header.nbytes);
    }

    let backend = backends::decoder_for_format(header.compformat())?;
    if nthreads <= 1 || header.nbytes <= header.blocksize {
        serial_decompress(backend, &header, src, dest)
    } else {
        parallel_decompress(backend, &header, src, dest, nthreads)
    }
}

/// Bounds-checked block start for block `index`.
fn checked_bstart(src: &[u8], index: usize, overhead: usize, cbytes: usize) -> Result<usize> {
    let bstart = read_bstart(src, index);
    if bstart < 0 {
        return Err(Error::HeaderCorrupt("negative block start"));
    }
    let bstart = bstart as usize;
    if bstart < overhead || bstart >= cbytes {
        return Err(Error::HeaderCorrupt("block start outside the artifact"));
    }
    Ok(bstart)
}

fn serial_decompress(
    backend: &'static Backend,
    header: &Header,
    src: &[u8],
    dest: &mut [u8],
) -> Result<usize> {
    let nblocks = header.nblocks();
    let overhead = header.overhead();
    let leftover = header.leftover();
    let mut tmp = AlignedBuf::zeroed(header.blocksize);
    let mut tmp2 = AlignedBuf::zeroed(header.blocksize + 4 * header.typesize);
    let mut total = 0usize;

    for i in 0..nblocks {
        let (len, leftoverblock) = block_len(i, nblocks, header.blocksize, leftover);
        let bstart = checked_bstart(src, i, overhead, header.cbytes)?;
        let start = i * header.blocksize;
        total += decompress_block(
            backend,
            header.typesize,
            header.flags,
            leftoverblock,
            &src[bstart..header.cbytes],
            &mut dest[start..start + len],
            &mut tmp,
            &mut tmp2,
        )?;
    }
    Ok(total)
}

fn parallel_decompress(
    backend: &'static Backend,
    header: &Header,
    src: &[u8],
    dest: &mut [u8],
    nthreads: usize,
) -> Result<usize> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(nthreads)
        .build()
        .map_err(|_| Error::ThreadPool)?;

    let nblocks = header.nblocks();
    let overhead = header.overhead();
    let leftover = header.leftover();
    let giveup = AtomicBool::new(false);

    // Blocks land in disjoint destination chunks; no ordering needed.
    let totals: Result<Vec<usize>> = pool.install(|| {
        dest[..header.nbytes]
            .par_chunks_mut(header.blocksize)
            .enumerate()
            .map_init(
                || {
                    (
                        AlignedBuf::zeroed(header.blocksize),
                        AlignedBuf::zeroed(header.blocksize + 4 * header.typesize),
                    )
                },
                |(tmp, tmp2), (i, out_block)| {
                    if giveup.load(Ordering::Relaxed) {
                        return Ok(0);
                    }
                    let leftoverblock = leftover > 0 && i == nblocks - 1;
                    let result = checked_bstart(src, i, overhead, header.cbytes).and_then(|bstart| {
                        decompress_block(
                            backend,
                            header.typesize,
                            header.flags,
                            leftoverblock,
                            &src[bstart..header.cbytes],
                            out_block,
                            tmp,
                            tmp2,
                        )
                    });
                    if result.is_err() {
                        giveup.store(true, Ordering::Relaxed);
                    }
                    result
                },
            )
            .collect()
    });

    let total: usize = totals?.iter().sum();
    if total != header.nbytes {
        return Err(Error::BackendError("blocks decoded to the wrong total length"));
    }
    Ok(total)
}

/// Decode the element range `[start, start + nitems)` without touching
/// the rest of the buffer. Single-threaded: whole blocks are decoded
/// into scratch and the intersecting span is copied out.
pub(crate) fn getitem(src: &[u8], start: usize, nitems: usize, dest: &mut [u8]) -> Result<usize> {
    let header = Header::read(src)?;
    if src.len() < header.cbytes {
        return Err(Error::HeaderCorrupt("source shorter than declared cbytes"));
    }

    let nitems_total = header.nbytes / header.typesize;
    let stop = start.checked_add(nitems).ok_or(Error::BadArg("item range overflows"))?;
    if start > nitems_total || stop > nitems_total {
        return Err(Error::BadArg("item range outside the buffer"));
    }

    let start_byte = start * header.typesize;
    let stop_byte = stop * header.typesize;
    let want = stop_byte - start_byte;
    if dest.len() < want {
        return Err(Error::BufferTooSmall { needed: want, capacity: dest.len() });
    }
    if want == 0 {
        return Ok(0);
    }

    let overhead = header.overhead();
    if header.cbytes < overhead {
        return Err(Error::HeaderCorrupt("block start table truncated"));
    }

    if header.memcpyed() {
        if header.cbytes != overhead + header.nbytes {
            return Err(Error::HeaderCorrupt("plain-copy artifact with wrong cbytes"));
        }
        dest[..want].copy_from_slice(&src[overhead + start_byte..overhead + stop_byte]);
        return Ok(want);
    }

    let backend = backends::decoder_for_format(header.compformat())?;
    let nblocks = header.nblocks();
    let leftover = header.leftover();
    let mut block_buf = AlignedBuf::zeroed(header.blocksize);
    let mut tmp = AlignedBuf::zeroed(header.blocksize);
    let mut tmp2 = AlignedBuf::zeroed(header.blocksize + 4 * header.typesize);
    let mut written = 0usize;

    for i in 0..nblocks {
        let (len, leftoverblock) = block_len(i, nblocks, header.blocksize, leftover);
        let block_start = i * header.blocksize;
        let block_stop = block_start + len;
        if block_stop <= start_byte || block_start >= stop_byte {
            continue;
        }

        let bstart = checked_bstart(src, i, overhead, header.cbytes)?;
        decompress_block(
            backend,
            header.typesize,
            header.flags,
            leftoverblock,
            &src[bstart..header.cbytes],
            &mut block_buf[..len],
            &mut tmp,
            &mut tmp2,
        )?;

        let copy_start = start_byte.max(block_start) - block_start;
        let copy_stop = stop_byte.min(block_stop) - block_start;
        dest[written..written + copy_stop - copy_start]
            .copy_from_slice(&block_buf[copy_start..copy_stop]);
        written += copy_stop - copy_start;
    }

    Ok(written)
}
