// Wire-format constants for the Blosc1 container.

/* Container framing version written into byte 0 of every artifact.
   1 -> pre-1.0 experimental framing
   2 -> the stable framing implemented by this crate */
pub const BLOSC_VERSION_FORMAT: u8 = 2;

// Fixed header length (the bstarts table follows it).
pub const BLOSC_MIN_HEADER_LENGTH: usize = 16;

// Buffers smaller than this are stored as a plain copy.
pub const BLOSC_MIN_BUFFERSIZE: usize = 128;

// Maximum typesize before the buffer is treated as a plain byte stream.
// Must fit in the single-byte header field.
pub const BLOSC_MAX_TYPESIZE: usize = 255;

// Maximum number of per-block splits; also the largest typesize that
// still triggers the per-byte split layout.
pub const BLOSC_MAX_SPLITS: usize = 16;

// Maximum source buffer size. Offsets inside an artifact are signed
// 32-bit, so the payload plus header must stay below i32::MAX.
pub const BLOSC_MAX_BUFFERSIZE: usize = (i32::MAX as usize) - BLOSC_MIN_HEADER_LENGTH;

// L1 data cache size assumed by the blocksize heuristic.
pub const L1: usize = 32 * 1024;

/* Header flag bits (byte 2). Bits 2..4 are reserved and zero;
   bits 5..7 carry the on-wire compressor format. */
pub const BLOSC_DOSHUFFLE: u8 = 0x1; // byte-transpose was applied
pub const BLOSC_MEMCPYED: u8 = 0x2; // payload is a plain copy, no codec

/* Public codes for the compressors shipped with the crate. */
pub const BLOSC_BLOSCLZ: u8 = 0;
pub const BLOSC_LZ4: u8 = 1;
pub const BLOSC_LZ4HC: u8 = 2;
pub const BLOSC_SNAPPY: u8 = 3;
pub const BLOSC_ZLIB: u8 = 4;
pub const BLOSC_ZSTD: u8 = 5;

/* Names for the compressors, as accepted by compressor selection. */
pub const BLOSC_BLOSCLZ_COMPNAME: &str = "blosclz";
pub const BLOSC_LZ4_COMPNAME: &str = "lz4";
pub const BLOSC_LZ4HC_COMPNAME: &str = "lz4hc";
pub const BLOSC_SNAPPY_COMPNAME: &str = "snappy";
pub const BLOSC_ZLIB_COMPNAME: &str = "zlib";
pub const BLOSC_ZSTD_COMPNAME: &str = "zstd";

/* On-wire codes stored in flags bits 5..7 (codes must be < 8).
   LZ4 and LZ4HC share a format because they share a decoder. */
pub const BLOSC_BLOSCLZ_FORMAT: u8 = 0;
pub const BLOSC_LZ4_FORMAT: u8 = 1;
pub const BLOSC_LZ4HC_FORMAT: u8 = BLOSC_LZ4_FORMAT;
pub const BLOSC_SNAPPY_FORMAT: u8 = 2;
pub const BLOSC_ZLIB_FORMAT: u8 = 3;
pub const BLOSC_ZSTD_FORMAT: u8 = 4;

/* Display names for the underlying compression libraries. */
pub const BLOSC_BLOSCLZ_LIBNAME: &str = "BloscLZ";
pub const BLOSC_LZ4_LIBNAME: &str = "LZ4";
pub const BLOSC_SNAPPY_LIBNAME: &str = "Snappy";
pub const BLOSC_ZLIB_LIBNAME: &str = "Zlib";
pub const BLOSC_ZSTD_LIBNAME: &str = "Zstd";

/* Version tags for each compressor's own framing, written into byte 1
   of the header. All start at 1. */
pub const BLOSC_BLOSCLZ_VERSION_FORMAT: u8 = 1;
pub const BLOSC_LZ4_VERSION_FORMAT: u8 = 1;
pub const BLOSC_LZ4HC_VERSION_FORMAT: u8 = 1; // shares the LZ4 framing
pub const BLOSC_SNAPPY_VERSION_FORMAT: u8 = 1;
pub const BLOSC_ZLIB_VERSION_FORMAT: u8 = 1;
pub const BLOSC_ZSTD_VERSION_FORMAT: u8 = 1;
