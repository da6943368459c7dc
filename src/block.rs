//! Per-block compression and decompression.
//!
//! A block is shuffled (optionally), partitioned into equal splits, and
//! every split is run through the backend with a 4-byte little-endian
//! length prefix. A split whose backend call fails, or compresses to
//! exactly its own size, is stored raw with `split_clen == split_ulen`;
//! the decoder recognizes that case without consulting the backend.

use crate::backends::Backend;
use crate::buffer::SCRATCH_ALIGN;
use crate::constants::*;
use crate::error::{Error, Result};
use crate::header::{load_i32, store_i32};
use crate::shuffle;

/// Immutable per-call parameters shared by every block worker.
pub(crate) struct BlockParams {
    pub backend: &'static Backend,
    /// Backend-native level (already rescaled where applicable).
    pub clevel: i32,
    pub flags: u8,
    pub typesize: usize,
}

/// Number of splits for one block. Small typesizes split per byte lane
/// so each lane of the transposed stream is coded on its own; anything
/// else, and the short trailing block, stays whole.
pub(crate) fn split_count(typesize: usize, block_len: usize, leftoverblock: bool) -> usize {
    if typesize > 1
        && typesize <= BLOSC_MAX_SPLITS
        && block_len / typesize >= BLOSC_MIN_BUFFERSIZE
        && !leftoverblock
    {
        typesize
    } else {
        1
    }
}

/// Compress one block into `dest`.
///
/// Returns the number of bytes written, or `Ok(0)` when the block does
/// not fit the remaining budget (`dest.len()`). `tmp` must hold at
/// least `input.len()` bytes of shuffle scratch.
pub(crate) fn compress_block(
    params: &BlockParams,
    leftoverblock: bool,
    input: &[u8],
    dest: &mut [u8],
    tmp: &mut [u8],
) -> Result<usize> {
    let block_len = input.len();

    let work: &[u8] = if params.flags & BLOSC_DOSHUFFLE != 0 && params.typesize > 1 {
        shuffle::shuffle(params.typesize, input, tmp);
        &tmp[..block_len]
    } else {
        input
    };

    let nsplits = split_count(params.typesize, block_len, leftoverblock);
    let split_len = block_len / nsplits;
    let mut out_pos = 0usize;

    for split in work.chunks_exact(split_len) {
        // Budget left after the split's own length prefix.
        if dest.len() < out_pos + 4 + 1 {
            return Ok(0);
        }
        let budget = dest.len() - out_pos - 4;

        let mut maxout = match params.backend.worst_case {
            Some(worst) => worst(split_len),
            None => split_len,
        };
        maxout = maxout.min(budget);

        let window = &mut dest[out_pos + 4..out_pos + 4 + maxout];
        let mut csize = (params.backend.compress)(params.clevel, split, window);

        if csize == 0 || csize == split_len {
            // Incompressible split: store it verbatim.
            if budget < split_len {
                return Ok(0);
            }
            dest[out_pos + 4..out_pos + 4 + split_len].copy_from_slice(split);
            csize = split_len;
        }

        store_i32(dest, out_pos, csize as i32);
        out_pos += 4 + csize;
    }

    Ok(out_pos)
}

/// Decompress one block payload into `out` (sized to exactly the
/// block's uncompressed length).
///
/// `src` runs from the block's start offset to the end of the artifact;
/// splits are consumed from its front. `tmp` holds the still-shuffled
/// block, `tmp2` is aligned spill space for the unshuffle when the
/// caller's destination is not.
pub(crate) fn decompress_block(
    backend: &'static Backend,
    typesize: usize,
    flags: u8,
    leftoverblock: bool,
    src: &[u8],
    out: &mut [u8],
    tmp: &mut [u8],
    tmp2: &mut [u8],
) -> Result<usize> {
    let block_len = out.len();
    let shuffled = flags & BLOSC_DOSHUFFLE != 0 && typesize > 1;
    let nsplits = split_count(typesize, block_len, leftoverblock);
    let split_len = block_len / nsplits;
    // Only a forged header can make the splits not tile the block.
    if split_len * nsplits != block_len {
        return Err(Error::HeaderCorrupt("block length not divisible into splits"));
    }
    let mut in_pos = 0usize;

    {
        let target: &mut [u8] = if shuffled { &mut tmp[..block_len] } else { &mut *out };
        let mut out_pos = 0usize;

        for _ in 0..nsplits {
            if src.len() < in_pos + 4 {
                return Err(Error::HeaderCorrupt("block payload truncated"));
            }
            let csize = load_i32(src, in_pos);
            in_pos += 4;
            if csize < 0 {
                return Err(Error::HeaderCorrupt("negative split length"));
            }
            let csize = csize as usize;
            if src.len() < in_pos + csize {
                return Err(Error::HeaderCorrupt("split length exceeds payload"));
            }

            let piece = &src[in_pos..in_pos + csize];
            let slot = &mut target[out_pos..out_pos + split_len];
            if csize == split_len {
                slot.copy_from_slice(piece);
            } else {
                let produced = (backend.decompress)(piece, slot)?;
                if produced != split_len {
                    return Err(Error::BackendError("split decoded to the wrong length"));
                }
            }
            in_pos += csize;
            out_pos += split_len;
        }
    }

    if shuffled {
        if out.as_ptr() as usize % SCRATCH_ALIGN == 0 {
            shuffle::unshuffle(typesize, &tmp[..block_len], out);
        } else {
            // Keep the vector kernels on an aligned destination, then
            // copy out.
            shuffle::unshuffle(typesize, &tmp[..block_len], tmp2);
            out.copy_from_slice(&tmp2[..block_len]);
        }
    }

    Ok(block_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends;
    use crate::buffer::AlignedBuf;

    fn params(compcode: u8, flags: u8, typesize: usize) -> BlockParams {
        BlockParams {
            backend: backends::by_compcode(compcode).unwrap(),
            clevel: 5,
            flags,
            typesize,
        }
    }

    #[test]
    fn split_rule() {
        assert_eq!(split_count(4, 4096, false), 4);
        assert_eq!(split_count(1, 4096, false), 1); // single lane
        assert_eq!(split_count(17, 1 << 20, false), 1); // too wide
        assert_eq!(split_count(4, 256, false), 1); // lanes too short
        assert_eq!(split_count(4, 4096, true), 1); // trailing block
    }

    #[test]
    fn block_roundtrip_with_shuffle() {
        let typesize = 4;
        let block: Vec<u8> = (0..8192u32)
            .flat_map(|i| i.to_le_bytes())
            .collect();
        let p = params(BLOSC_BLOSCLZ, BLOSC_DOSHUFFLE, typesize);

        let mut tmp = AlignedBuf::zeroed(block.len());
        let mut dest = vec![0u8; block.len() + 4 * typesize];
        let written = compress_block(&p, false, &block, &mut dest, &mut tmp).unwrap();
        assert!(written > 0);
        assert!(written < block.len());

        let mut out = AlignedBuf::zeroed(block.len());
        let mut tmp2 = AlignedBuf::zeroed(block.len());
        let n = decompress_block(
            p.backend,
            typesize,
            p.flags,
            false,
            &dest[..written],
            &mut out,
            &mut tmp,
            &mut tmp2,
        )
        .unwrap();
        assert_eq!(n, block.len());
        assert_eq!(&out[..], &block[..]);
    }

    #[test]
    fn raw_splits_when_budget_is_just_enough() {
        // Random-ish bytes do not compress; each split must be stored
        // raw, which succeeds exactly when the budget holds ulen + 4
        // per split.
        let typesize = 2;
        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        let block: Vec<u8> = (0..1024)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                state as u8
            })
            .collect();
        let p = params(BLOSC_BLOSCLZ, BLOSC_DOSHUFFLE, typesize);
        let mut tmp = vec![0u8; block.len()];

        let mut dest = vec![0u8; block.len() + 4 * typesize];
        let written = compress_block(&p, false, &block, &mut dest, &mut tmp).unwrap();
        assert_eq!(written, block.len() + 4 * typesize);

        // One byte short: the block no longer fits.
        let mut short = vec![0u8; block.len() + 4 * typesize - 1];
        let written = compress_block(&p, false, &block, &mut short, &mut tmp).unwrap();
        assert_eq!(written, 0);
    }

    #[test]
    fn corrupt_payload_is_rejected() {
        let typesize = 4;
        let block = vec![0u8; 4096];
        let p = params(BLOSC_LZ4, BLOSC_DOSHUFFLE, typesize);
        let mut tmp = vec![0u8; block.len()];
        let mut dest = vec![0u8; block.len() + 16];
        let written = compress_block(&p, false, &block, &mut dest, &mut tmp).unwrap();
        assert!(written > 0);

        let mut out = vec![0u8; block.len()];
        let mut tmp2 = vec![0u8; block.len()];
        // Truncated payload.
        let err = decompress_block(
            p.backend,
            typesize,
            p.flags,
            false,
            &dest[..2],
            &mut out,
            &mut tmp,
            &mut tmp2,
        );
        assert!(err.is_err());

        // Negative split length.
        store_i32(&mut dest, 0, -7);
        let err = decompress_block(
            p.backend,
            typesize,
            p.flags,
            false,
            &dest[..written],
            &mut out,
            &mut tmp,
            &mut tmp2,
        );
        assert!(err.is_err());
    }
}
