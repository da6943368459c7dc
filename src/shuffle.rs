//! Byte-transpose filter.
//!
//! `shuffle` regroups the k-th byte of every element so that bytes of
//! equal significance become contiguous, which is what makes numeric
//! buffers compressible by the entropy coders downstream. `unshuffle`
//! is the exact inverse. Both operate on one block at a time.

/// Transpose `src` into `dest` over elements of `typesize` bytes.
///
/// Bytes beyond the last whole element (`src.len() % typesize`) are
/// copied through unchanged. With `typesize <= 1` this degenerates to a
/// plain copy.
pub fn shuffle(typesize: usize, src: &[u8], dest: &mut [u8]) {
    debug_assert!(dest.len() >= src.len());
    let dest = &mut dest[..src.len()];
    match typesize {
        0 | 1 => dest.copy_from_slice(src),
        2 => shuffle_lanes::<2>(src, dest),
        4 => shuffle_lanes::<4>(src, dest),
        8 => shuffle_lanes::<8>(src, dest),
        16 => shuffle_lanes::<16>(src, dest),
        _ => shuffle_any(typesize, src, dest),
    }
}

/// Inverse of [`shuffle`].
pub fn unshuffle(typesize: usize, src: &[u8], dest: &mut [u8]) {
    debug_assert!(dest.len() >= src.len());
    let dest = &mut dest[..src.len()];
    match typesize {
        0 | 1 => dest.copy_from_slice(src),
        2 => unshuffle_lanes::<2>(src, dest),
        4 => unshuffle_lanes::<4>(src, dest),
        8 => unshuffle_lanes::<8>(src, dest),
        16 => unshuffle_lanes::<16>(src, dest),
        _ => unshuffle_any(typesize, src, dest),
    }
}

/// Fixed-width kernel for the common numeric widths. The constant lane
/// count lets the compiler unroll the inner loop and vectorize the
/// strided stores.
fn shuffle_lanes<const T: usize>(src: &[u8], dest: &mut [u8]) {
    let nel = src.len() / T;
    for (i, elem) in src.chunks_exact(T).enumerate() {
        for (j, &byte) in elem.iter().enumerate() {
            dest[j * nel + i] = byte;
        }
    }
    let tail = nel * T;
    dest[tail..].copy_from_slice(&src[tail..]);
}

fn unshuffle_lanes<const T: usize>(src: &[u8], dest: &mut [u8]) {
    let nel = dest.len() / T;
    let tail = nel * T;
    for (i, elem) in dest[..tail].chunks_exact_mut(T).enumerate() {
        for (j, byte) in elem.iter_mut().enumerate() {
            *byte = src[j * nel + i];
        }
    }
    dest[tail..].copy_from_slice(&src[tail..]);
}

/* Plain nested loops for every other typesize. */

fn shuffle_any(typesize: usize, src: &[u8], dest: &mut [u8]) {
    let nel = src.len() / typesize;
    for j in 0..typesize {
        for i in 0..nel {
            dest[j * nel + i] = src[i * typesize + j];
        }
    }
    let tail = nel * typesize;
    dest[tail..].copy_from_slice(&src[tail..]);
}

fn unshuffle_any(typesize: usize, src: &[u8], dest: &mut [u8]) {
    let nel = src.len() / typesize;
    for i in 0..nel {
        for j in 0..typesize {
            dest[i * typesize + j] = src[j * nel + i];
        }
    }
    let tail = nel * typesize;
    dest[tail..].copy_from_slice(&src[tail..]);
}
