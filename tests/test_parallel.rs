//! The parallel scheduler must never change a single output byte.

use blosc1::{compress_ctx, decompress_ctx, Cparams, Dparams, BLOSC_LZ4, BLOSC_ZSTD};

fn sample(len: usize) -> Vec<u8> {
    // Compressible but non-trivial: interleaved ramps with a slow drift.
    (0..len).map(|i| ((i / 64) ^ (i % 64)) as u8).collect()
}

fn compress_with_threads(params: &Cparams, src: &[u8], nthreads: usize) -> Vec<u8> {
    let params = Cparams { nthreads, ..*params };
    let mut compressed = vec![0u8; src.len() + 8192];
    let cbytes = compress_ctx(&params, src, &mut compressed).unwrap();
    compressed.truncate(cbytes);
    compressed
}

#[test]
fn artifact_is_identical_for_every_thread_count() {
    let src = sample(4 << 20);
    let params = Cparams { typesize: 4, clevel: 5, ..Cparams::default() };

    let reference = compress_with_threads(&params, &src, 1);
    for nthreads in [2usize, 4, 8] {
        let parallel = compress_with_threads(&params, &src, nthreads);
        assert_eq!(
            reference, parallel,
            "artifact differs between 1 and {} threads",
            nthreads
        );
    }
}

#[test]
fn thread_identity_holds_with_a_leftover_block() {
    // A block size that does not divide nbytes.
    let src = sample(1_000_000);
    let params = Cparams {
        typesize: 8,
        blocksize: 65536,
        ..Cparams::default()
    };
    let reference = compress_with_threads(&params, &src, 1);
    let parallel = compress_with_threads(&params, &src, 4);
    assert_eq!(reference, parallel);
}

#[test]
fn parallel_decompression_matches() {
    let src = sample(4 << 20);
    let params = Cparams { typesize: 4, clevel: 5, ..Cparams::default() };
    let compressed = compress_with_threads(&params, &src, 4);

    for nthreads in [1usize, 2, 8] {
        let mut restored = vec![0u8; src.len()];
        let dbytes =
            decompress_ctx(&Dparams { nthreads }, &compressed, &mut restored).unwrap();
        assert_eq!(dbytes, src.len());
        assert_eq!(restored, src, "nthreads={}", nthreads);
    }
}

#[test]
fn parallel_roundtrip_across_backends() {
    let src = sample(2 << 20);
    for compcode in [BLOSC_LZ4, BLOSC_ZSTD] {
        let params = Cparams { compcode, typesize: 4, ..Cparams::default() };
        let serial = compress_with_threads(&params, &src, 1);
        let parallel = compress_with_threads(&params, &src, 4);
        assert_eq!(serial, parallel, "compcode={}", compcode);

        let mut restored = vec![0u8; src.len()];
        decompress_ctx(&Dparams { nthreads: 4 }, &parallel, &mut restored).unwrap();
        assert_eq!(restored, src, "compcode={}", compcode);
    }
}
