//! Blocksize selection heuristic.

use crate::constants::*;

// BloscLZ match offsets degrade past 64 Ki elements per block.
const BLOSCLZ_MAX_ELEMENTS: usize = 64 * 1024;

/// Pick the uncompressed block length for one compression call.
///
/// The automatic policy targets L1 residency for the fast codecs and
/// larger working sets for the slow, high-ratio ones; buffers of common
/// numeric widths get a SIMD-friendly stride. A non-zero `forced` value
/// overrides the heuristic (floored at [`BLOSC_MIN_BUFFERSIZE`]).
///
/// The result is always positive, never larger than `nbytes`, and a
/// multiple of `typesize` unless `nbytes < typesize` (degenerate byte
/// blocks).
pub(crate) fn compute_blocksize(
    compcode: u8,
    clevel: i32,
    typesize: usize,
    nbytes: usize,
    forced: usize,
) -> usize {
    if nbytes < typesize {
        return 1;
    }

    let mut blocksize;
    if forced > 0 {
        blocksize = forced.max(BLOSC_MIN_BUFFERSIZE);
    } else if nbytes >= 4 * L1 {
        blocksize = 4 * L1;
        // High-compression-ratio codecs amortize better over bigger blocks.
        if matches!(compcode, BLOSC_ZLIB | BLOSC_LZ4HC | BLOSC_ZSTD) {
            blocksize *= 8;
        }
        match clevel {
            0 => blocksize /= 16,
            1..=3 => blocksize /= 8,
            4 | 5 => blocksize /= 4,
            6 => blocksize /= 2,
            7 | 8 => {}
            _ => blocksize *= 2,
        }
    } else if nbytes > 256 && matches!(typesize, 2 | 4 | 8 | 16) {
        // Align the single block to a 16-element stride.
        blocksize = nbytes - nbytes % (16 * typesize);
    } else {
        blocksize = nbytes;
    }

    if blocksize > nbytes {
        blocksize = nbytes;
    }
    if blocksize > typesize {
        blocksize -= blocksize % typesize;
    }
    if compcode == BLOSC_BLOSCLZ && blocksize > BLOSCLZ_MAX_ELEMENTS * typesize {
        blocksize = BLOSCLZ_MAX_ELEMENTS * typesize;
    }

    blocksize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_positive_and_element_aligned() {
        let codecs = [
            BLOSC_BLOSCLZ,
            BLOSC_LZ4,
            BLOSC_LZ4HC,
            BLOSC_SNAPPY,
            BLOSC_ZLIB,
            BLOSC_ZSTD,
        ];
        for &compcode in &codecs {
            for clevel in 0..=9 {
                for typesize in [1usize, 2, 3, 4, 8, 16, 17, 255] {
                    for nbytes in [1usize, 100, 257, 4096, 130_000, 1 << 20, 10 << 20] {
                        let blocksize =
                            compute_blocksize(compcode, clevel, typesize, nbytes, 0);
                        assert!(blocksize > 0);
                        assert!(blocksize <= nbytes.max(1));
                        if nbytes >= typesize && blocksize > typesize {
                            assert_eq!(
                                blocksize % typesize,
                                0,
                                "codec={} clevel={} typesize={} nbytes={}",
                                compcode,
                                clevel,
                                typesize,
                                nbytes
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn degenerate_tiny_buffer() {
        assert_eq!(compute_blocksize(BLOSC_BLOSCLZ, 5, 8, 3, 0), 1);
    }

    #[test]
    fn override_is_floored() {
        assert_eq!(compute_blocksize(BLOSC_BLOSCLZ, 5, 1, 1 << 20, 64), 128);
        assert_eq!(compute_blocksize(BLOSC_BLOSCLZ, 5, 1, 1 << 20, 4096), 4096);
        // Still clamped to the buffer.
        assert_eq!(compute_blocksize(BLOSC_BLOSCLZ, 5, 1, 200, 4096), 200);
    }

    #[test]
    fn level_scaling_above_l1_threshold() {
        let nbytes = 16 << 20;
        assert_eq!(compute_blocksize(BLOSC_LZ4, 0, 1, nbytes, 0), 4 * L1 / 16);
        assert_eq!(compute_blocksize(BLOSC_LZ4, 2, 1, nbytes, 0), 4 * L1 / 8);
        assert_eq!(compute_blocksize(BLOSC_LZ4, 5, 1, nbytes, 0), 4 * L1 / 4);
        assert_eq!(compute_blocksize(BLOSC_LZ4, 6, 1, nbytes, 0), 4 * L1 / 2);
        assert_eq!(compute_blocksize(BLOSC_LZ4, 8, 1, nbytes, 0), 4 * L1);
        assert_eq!(compute_blocksize(BLOSC_LZ4, 9, 1, nbytes, 0), 8 * L1);
        // Slow codecs start from an 8x bigger block.
        assert_eq!(compute_blocksize(BLOSC_ZLIB, 8, 1, nbytes, 0), 32 * L1);
    }

    #[test]
    fn blosclz_block_is_capped() {
        let blocksize = compute_blocksize(BLOSC_BLOSCLZ, 9, 1, 16 << 20, 0);
        assert!(blocksize <= BLOSCLZ_MAX_ELEMENTS);
        // Other codecs keep the big block.
        assert_eq!(compute_blocksize(BLOSC_LZ4, 9, 1, 16 << 20, 0), 8 * L1);
    }

    #[test]
    fn simd_stride_for_medium_buffers() {
        // Below 4*L1 with a vector-width typesize: single block, aligned
        // down to 16 elements.
        assert_eq!(compute_blocksize(BLOSC_BLOSCLZ, 5, 4, 1000, 0), 960);
        assert_eq!(compute_blocksize(BLOSC_BLOSCLZ, 5, 8, 70_000, 0), 69_888);
        // Odd typesize takes the whole buffer, element-rounded.
        assert_eq!(compute_blocksize(BLOSC_BLOSCLZ, 5, 3, 1000, 0), 999);
    }
}
