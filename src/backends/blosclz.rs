//! BloscLZ, the built-in LZ77 codec.
//!
//! A fast byte-oriented compressor in the FastLZ family, tuned for the
//! repetitive streams the shuffle filter produces. The format alternates
//! literal runs (control byte < 32, count biased by one) with matches
//! (three length bits, 13-bit near or 16-bit far offsets, 255-saturated
//! length extension bytes). Bit 5 of the first byte is a format marker.

// Longest literal run a single control byte can describe.
const MAX_COPY: usize = 32;
// Matches up to this offset use the short 13-bit encoding.
const MAX_DISTANCE: usize = 8191;
// Far matches add an explicit 16-bit offset on top of MAX_DISTANCE.
const MAX_FARDISTANCE: usize = 65535 + MAX_DISTANCE - 1;
// log2 of the match table at the higher compression levels.
const HASH_LOG: usize = 14;
// Matches shorter than this never pay for their encoding.
const MIN_MATCH: usize = 4;
// How far a freshly extended match is backed off; the released tail is
// re-anchored so the table keeps entropy around match boundaries.
const MATCH_SHIFT: usize = 4;

// Multiplicative hash over a 4-byte window (Knuth's 2^32/phi constant).
fn hash4(seq: u32, bits: usize) -> usize {
    (seq.wrapping_mul(2_654_435_761) >> (32 - bits)) as usize
}

fn read4(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(buf[at..at + 4].try_into().unwrap())
}

// Append one literal, opening a fresh run when the current one fills up.
// Returns false when the output window is exhausted.
fn push_literal(out: &mut [u8], op: &mut usize, run: &mut usize, byte: u8) -> bool {
    if *op + 2 > out.len() {
        return false;
    }
    out[*op] = byte;
    *op += 1;
    *run += 1;
    if *run == MAX_COPY {
        *run = 0;
        out[*op] = (MAX_COPY - 1) as u8;
        *op += 1;
    }
    true
}

/// Compress `input` into `output`, returning the number of bytes written
/// or `0` when the data does not compress into the window.
pub(crate) fn compress(clevel: i32, input: &[u8], output: &mut [u8]) -> usize {
    let len = input.len();
    // Too little input to be worth encoding, or no room to try.
    if len < 16 || output.len() < 66 {
        return 0;
    }

    // Lower levels trade table size for speed.
    let hash_bits = match clevel.clamp(0, 9) {
        0 | 1 => HASH_LOG - 2,
        2 => HASH_LOG - 1,
        _ => HASH_LOG,
    };
    let mut htab = vec![0u32; 1 << hash_bits];

    let ip_bound = len - 1;
    let ip_limit = len.saturating_sub(12);

    let mut ip = 0;
    let mut op = 0;

    // The stream opens with a four-literal run; its control byte is
    // patched once the run closes.
    let mut run = 4;
    output[op] = (MAX_COPY - 1) as u8;
    op += 1;
    for _ in 0..4 {
        output[op] = input[ip];
        op += 1;
        ip += 1;
    }

    while ip < ip_limit {
        let anchor = ip;
        let seq = read4(input, anchor);
        let slot = hash4(seq, hash_bits);
        let candidate = htab[slot] as usize;
        let distance = anchor - candidate;
        htab[slot] = anchor as u32;

        let matched = distance != 0
            && distance < MAX_FARDISTANCE
            && read4(input, candidate) == seq;
        if !matched {
            if !push_literal(output, &mut op, &mut run, input[anchor]) {
                return 0;
            }
            ip = anchor + 1;
            continue;
        }

        // Extend, then back off so the tail re-anchors the table.
        ip = anchor + 4;
        let mut follow = candidate + 4;
        while ip < ip_bound && input[ip] == input[follow] {
            ip += 1;
            follow += 1;
        }
        ip -= MATCH_SHIFT;
        let match_len = ip - anchor;

        // Short far matches cost more to encode than they save.
        if match_len < MIN_MATCH || (match_len <= 5 && distance >= MAX_DISTANCE) {
            if !push_literal(output, &mut op, &mut run, input[anchor]) {
                return 0;
            }
            ip = anchor + 1;
            continue;
        }

        // Close the pending literal run.
        if run > 0 {
            output[op - run - 1] = (run - 1) as u8;
            run = 0;
        } else {
            op -= 1; // reclaim the unused control byte
        }

        let biased = distance - 1;
        if biased < MAX_DISTANCE {
            if match_len < 7 {
                if op + 2 > output.len() {
                    return 0;
                }
                output[op] = ((match_len as u8) << 5) + (biased >> 8) as u8;
                output[op + 1] = (biased & 255) as u8;
                op += 2;
            } else {
                if op + 1 > output.len() {
                    return 0;
                }
                output[op] = (7 << 5) + (biased >> 8) as u8;
                op += 1;
                let mut extra = match_len - 7;
                while extra >= 255 {
                    if op + 1 > output.len() {
                        return 0;
                    }
                    output[op] = 255;
                    op += 1;
                    extra -= 255;
                }
                if op + 2 > output.len() {
                    return 0;
                }
                output[op] = extra as u8;
                output[op + 1] = (biased & 255) as u8;
                op += 2;
            }
        } else {
            let far = biased - MAX_DISTANCE;
            if match_len < 7 {
                if op + 4 > output.len() {
                    return 0;
                }
                output[op] = ((match_len as u8) << 5) + 31;
                output[op + 1] = 255;
                output[op + 2] = (far >> 8) as u8;
                output[op + 3] = (far & 255) as u8;
                op += 4;
            } else {
                if op + 1 > output.len() {
                    return 0;
                }
                output[op] = (7 << 5) + 31;
                op += 1;
                let mut extra = match_len - 7;
                while extra >= 255 {
                    if op + 1 > output.len() {
                        return 0;
                    }
                    output[op] = 255;
                    op += 1;
                    extra -= 255;
                }
                if op + 4 > output.len() {
                    return 0;
                }
                output[op] = extra as u8;
                output[op + 1] = 255;
                output[op + 2] = (far >> 8) as u8;
                output[op + 3] = (far & 255) as u8;
                op += 4;
            }
        }

        // Seed the table across the match boundary before moving on.
        if ip < len - 3 {
            htab[hash4(read4(input, ip), hash_bits)] = ip as u32;
            ip += 1;
            if clevel == 9 && ip < len - 3 {
                htab[hash4(read4(input, ip), hash_bits)] = ip as u32;
            }
            ip += 1;
        } else {
            ip += 2;
        }

        // Open the control byte for the next literal run.
        if op + 1 > output.len() {
            return 0;
        }
        output[op] = (MAX_COPY - 1) as u8;
        op += 1;
    }

    // Trailing bytes go out as literals.
    while ip <= ip_bound {
        if !push_literal(output, &mut op, &mut run, input[ip]) {
            return 0;
        }
        ip += 1;
    }
    if run > 0 {
        output[op - run - 1] = (run - 1) as u8;
    } else {
        op -= 1;
    }

    // Stamp the format marker.
    output[0] |= 1 << 5;
    op
}

/// Decompress a BloscLZ stream, returning the number of bytes produced
/// or `0` on a malformed stream or an undersized output.
pub(crate) fn decompress(input: &[u8], output: &mut [u8]) -> usize {
    if input.is_empty() {
        return 0;
    }
    let mut ip = 0;
    let mut op = 0;
    // Low five bits only; bit 5 is the format marker.
    let mut ctrl = (input[ip] & 31) as usize;
    ip += 1;

    loop {
        if ctrl >= 32 {
            let mut match_len = (ctrl >> 5) - 1;
            let mut offset = (ctrl & 31) << 8;

            if match_len == 6 {
                // Lengths of 7+ continue in 255-saturated extension bytes.
                loop {
                    if ip >= input.len() {
                        return 0;
                    }
                    let ext = input[ip] as usize;
                    ip += 1;
                    match_len += ext;
                    if ext != 255 {
                        break;
                    }
                }
            }
            if ip >= input.len() {
                return 0;
            }
            let low = input[ip] as usize;
            ip += 1;
            match_len += 3;

            if low == 255 && offset == 31 << 8 {
                // Far match: explicit 16-bit offset follows.
                if ip + 1 >= input.len() {
                    return 0;
                }
                offset = (input[ip] as usize) << 8;
                offset += input[ip + 1] as usize;
                ip += 2;
                offset += MAX_DISTANCE;
            } else {
                offset += low;
            }
            offset += 1;

            if op + match_len > output.len() || offset > op {
                return 0;
            }
            let from = op - offset;
            // Byte-at-a-time: the window may overlap the bytes being
            // written (short periodic patterns).
            for i in 0..match_len {
                output[op + i] = output[from + i];
            }
            op += match_len;
        } else {
            let count = ctrl + 1;
            if op + count > output.len() || ip + count > input.len() {
                return 0;
            }
            output[op..op + count].copy_from_slice(&input[ip..ip + count]);
            op += count;
            ip += count;
        }

        if ip >= input.len() {
            break;
        }
        ctrl = input[ip] as usize;
        ip += 1;
    }

    op
}
