//! Partial decode of element ranges, against both codec and plain-copy
//! artifacts.

use blosc1::{compress_ctx, getitem, Cparams, Error};

fn compress_items(params: &Cparams, items: &[u32]) -> Vec<u8> {
    let src: &[u8] = bytemuck::cast_slice(items);
    let mut compressed = vec![0u8; src.len() + 4096];
    let cbytes = compress_ctx(params, src, &mut compressed).unwrap();
    compressed.truncate(cbytes);
    compressed
}

#[test]
fn arithmetic_sequence_range() {
    // 64 KiB of consecutive u32 values.
    let items: Vec<u32> = (0..16_384).collect();
    let params = Cparams { typesize: 4, clevel: 1, ..Cparams::default() };
    let compressed = compress_items(&params, &items);

    let mut out = [0u8; 40];
    let n = getitem(&compressed, 100, 10, &mut out).unwrap();
    assert_eq!(n, 40);
    let expected: Vec<u32> = (100..110).collect();
    assert_eq!(&out[..], bytemuck::cast_slice::<u32, u8>(&expected));
}

#[test]
fn every_alignment_of_a_small_window() {
    let items: Vec<u32> = (0..10_000).map(|i| i * 3 + 1).collect();
    let params = Cparams {
        typesize: 4,
        blocksize: 512, // many blocks, so windows straddle boundaries
        ..Cparams::default()
    };
    let compressed = compress_items(&params, &items);

    for start in [0usize, 1, 127, 128, 129, 5000, 9995] {
        let nitems = 5.min(items.len() - start);
        let mut out = vec![0u8; nitems * 4];
        let n = getitem(&compressed, start, nitems, &mut out).unwrap();
        assert_eq!(n, nitems * 4);
        let expected: &[u8] = bytemuck::cast_slice(&items[start..start + nitems]);
        assert_eq!(out, expected, "start={}", start);
    }
}

#[test]
fn whole_buffer_range_equals_decompress() {
    let items: Vec<u32> = (0..50_000).map(|i| i ^ 0xA5A5).collect();
    let params = Cparams { typesize: 4, ..Cparams::default() };
    let compressed = compress_items(&params, &items);

    let mut out = vec![0u8; items.len() * 4];
    let n = getitem(&compressed, 0, items.len(), &mut out).unwrap();
    assert_eq!(n, items.len() * 4);
    assert_eq!(out, bytemuck::cast_slice::<u32, u8>(&items));
}

#[test]
fn plain_copy_artifacts_support_ranges() {
    let items: Vec<u32> = (0..4096).collect();
    let params = Cparams { typesize: 4, clevel: 0, ..Cparams::default() };
    let compressed = compress_items(&params, &items);

    let mut out = [0u8; 64];
    let n = getitem(&compressed, 2000, 16, &mut out).unwrap();
    assert_eq!(n, 64);
    let expected: &[u8] = bytemuck::cast_slice(&items[2000..2016]);
    assert_eq!(&out[..], expected);
}

#[test]
fn out_of_range_requests_are_rejected() {
    let items: Vec<u32> = (0..1000).collect();
    let params = Cparams { typesize: 4, ..Cparams::default() };
    let compressed = compress_items(&params, &items);

    let mut out = vec![0u8; 4096];
    assert!(matches!(
        getitem(&compressed, 999, 2, &mut out),
        Err(Error::BadArg(_))
    ));
    assert!(matches!(
        getitem(&compressed, 1001, 0, &mut out),
        Err(Error::BadArg(_))
    ));

    // Destination shorter than the requested range.
    let mut tiny = [0u8; 7];
    assert!(matches!(
        getitem(&compressed, 0, 2, &mut tiny),
        Err(Error::BufferTooSmall { .. })
    ));
}
