//! FastLZ (level 1) block compression, byte-compatible with Solady's `LibZip.flzCompress`
//! and `LibZip.flzDecompress`.
//!
//! Enable-mode signatures are compressed with this codec before being handed to
//! the account; the smart-sessions module decompresses them on-chain.
//!
//! Stream format, one token at a time, `t = token >> 5`:
//!
//! | `t`   | meaning                                                             | bytes |
//! |-------|---------------------------------------------------------------------|-------|
//! | 0     | literal run of `(token & 31) + 1` bytes follows                     | 1 + n |
//! | 1..=6 | match of `t + 2` bytes, distance `((token & 31) << 8 \| next) + 1`  | 2     |
//! | 7     | match of `next + 9` bytes, distance `((token & 31) << 8 \| third) + 1` | 3  |

const HASH_LOG: u32 = 13;
const HASH_SIZE: usize = 1 << HASH_LOG;
const MAX_DISTANCE: usize = 8192;
const MAX_LONG_MATCH: usize = 262;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlzError {
    #[error("Compressed stream truncated at offset {0}")]
    Truncated(usize),
    #[error("Back-reference distance {distance} exceeds decoded length {available}")]
    InvalidDistance { distance: usize, available: usize },
}

/// Compresses `input`.
pub fn compress(input: &[u8]) -> Vec<u8> {
    let len = input.len();
    let mut out = Vec::with_capacity(len + len / 32 + 1);
    // Matching stops 13 bytes before the end; the tail is always emitted as literals.
    let limit = len as isize - 13;
    let end = len.saturating_sub(4);

    let mut table = vec![0usize; HASH_SIZE];
    let mut anchor = 0usize;
    let mut i = 2usize;

    while (i as isize) < limit {
        let mut reference;
        let mut distance;
        loop {
            let seq = u24(input, i);
            let h = hash(seq);
            reference = table[h];
            table[h] = i;
            distance = i - reference;
            let candidate = if distance < MAX_DISTANCE {
                u24(input, reference)
            } else {
                0x100_0000
            };
            if (i as isize) >= limit {
                break;
            }
            i += 1;
            if seq == candidate {
                break;
            }
        }
        if (i as isize) >= limit {
            break;
        }
        i -= 1;
        if i > anchor {
            literals(&mut out, &input[anchor..i]);
        }

        let p = reference + 3;
        let q = i + 3;
        let max = end - q;
        let mut length = 0usize;
        while length < max {
            let same = input[p + length] == input[q + length];
            length += 1;
            if !same {
                break;
            }
        }
        i += length;

        let distance = distance - 1;
        while length > MAX_LONG_MATCH {
            out.push(224 + (distance >> 8) as u8);
            out.push(253);
            out.push((distance & 255) as u8);
            length -= MAX_LONG_MATCH;
        }
        if length < 7 {
            out.push(((length << 5) + (distance >> 8)) as u8);
            out.push((distance & 255) as u8);
        } else {
            out.push(224 + (distance >> 8) as u8);
            out.push((length - 7) as u8);
            out.push((distance & 255) as u8);
        }

        table[hash(u24(input, i))] = i;
        i += 1;
        table[hash(u24(input, i))] = i;
        i += 1;
        anchor = i;
    }

    if anchor < len {
        literals(&mut out, &input[anchor..]);
    }
    out
}

/// Decompresses a stream produced by [`compress`] (or by Solady's `flzCompress`).
///
/// Malformed input is rejected with an error; this function never panics on input.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, FlzError> {
    let mut out: Vec<u8> = Vec::with_capacity(input.len() * 2);
    let mut i = 0usize;

    while i < input.len() {
        let token = input[i];
        let kind = token >> 5;
        if kind == 0 {
            let run = token as usize + 1;
            let start = i + 1;
            let literal = input
                .get(start..start + run)
                .ok_or(FlzError::Truncated(i))?;
            out.extend_from_slice(literal);
            i = start + run;
            continue;
        }

        let (length, low, consumed) = if kind < 7 {
            let low = *input.get(i + 1).ok_or(FlzError::Truncated(i))?;
            (kind as usize + 2, low, 2)
        } else {
            let extra = *input.get(i + 1).ok_or(FlzError::Truncated(i))?;
            let low = *input.get(i + 2).ok_or(FlzError::Truncated(i))?;
            (extra as usize + 9, low, 3)
        };
        let distance = (((token & 31) as usize) << 8) + low as usize + 1;
        if distance > out.len() {
            return Err(FlzError::InvalidDistance {
                distance,
                available: out.len(),
            });
        }
        // Byte-wise copy: the source may overlap the bytes being produced.
        let mut from = out.len() - distance;
        for _ in 0..length {
            let byte = out[from];
            out.push(byte);
            from += 1;
        }
        i += consumed;
    }

    Ok(out)
}

fn u24(input: &[u8], at: usize) -> u32 {
    let byte = |k: usize| input.get(at + k).copied().unwrap_or(0) as u32;
    byte(0) | (byte(1) << 8) | (byte(2) << 16)
}

fn hash(seq: u32) -> usize {
    ((seq.wrapping_mul(2_654_435_769) >> (32 - HASH_LOG)) as usize) & (HASH_SIZE - 1)
}

fn literals(out: &mut Vec<u8>, mut run: &[u8]) {
    while run.len() >= 32 {
        out.push(31);
        out.extend_from_slice(&run[..32]);
        run = &run[32..];
    }
    if !run.is_empty() {
        out.push((run.len() - 1) as u8);
        out.extend_from_slice(run);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::hex;

    #[test]
    fn test_decompress_literal_run() {
        assert_eq!(decompress(&[0x02, b'a', b'b', b'c']).unwrap(), b"abc");
    }

    #[test]
    fn test_decompress_overlapping_match() {
        // literal "a", then a 3-byte match at distance 1
        assert_eq!(decompress(&[0x00, b'a', 0x20, 0x00]).unwrap(), b"aaaa");
    }

    #[test]
    fn test_decompress_long_match_token() {
        // literal "ab", then a (9 + 1)-byte match at distance 2
        let out = decompress(&[0x01, b'a', b'b', 0xe0, 0x01, 0x01]).unwrap();
        assert_eq!(out, b"abababababab");
    }

    #[test]
    fn test_decompress_rejects_truncated_literal() {
        assert_eq!(decompress(&[0x05, 1, 2]), Err(FlzError::Truncated(0)));
    }

    #[test]
    fn test_decompress_rejects_truncated_match() {
        assert_eq!(decompress(&[0x00, 1, 0xe0, 0x01]), Err(FlzError::Truncated(2)));
    }

    #[test]
    fn test_decompress_rejects_distance_past_start() {
        assert!(matches!(
            decompress(&[0x00, 1, 0x20, 0x05]),
            Err(FlzError::InvalidDistance { distance: 6, available: 1 })
        ));
    }

    #[test]
    fn test_compress_short_inputs_are_literals() {
        assert!(compress(&[]).is_empty());
        assert_eq!(compress(&[7]), vec![0, 7]);
        assert_eq!(compress(b"abcd"), vec![3, b'a', b'b', b'c', b'd']);
    }

    #[test]
    fn test_compress_shrinks_repetitive_abi_data() {
        let mut input = vec![0u8; 32 * 12];
        input[31] = 0x20;
        input[63] = 0x01;
        input.extend_from_slice(&[0x11; 20]);
        let compressed = compress(&input);
        assert!(compressed.len() < input.len() / 4);
        assert_eq!(decompress(&compressed).unwrap(), input);
    }

    // Outputs of Solady `LibZip.flzCompress` for the same inputs.
    fn assert_solady_vector(input: &[u8], expected: &[u8]) {
        assert_eq!(compress(input), expected);
        assert_eq!(decompress(expected).unwrap(), input);
    }

    #[test]
    fn test_solady_vector_repeated_phrase() {
        assert_solady_vector(
            b"hello world hello world hello world",
            &hex!("0b68656c6c6f20776f726c6420e0090b04776f726c64"),
        );
    }

    #[test]
    fn test_solady_vector_zero_words() {
        assert_solady_vector(&[0u8; 100], &hex!("010000e05401040000000000"));

        let mut words = vec![0u8; 31];
        words.push(0x20);
        words.extend_from_slice(&[0u8; 31]);
        words.push(0x01);
        words.extend_from_slice(&[0u8; 12]);
        words.extend_from_slice(&[0x11; 20]);
        assert_solady_vector(
            &words,
            &hex!("010000e014010020e0141d020000012003e000000011e00500041111111111"),
        );
    }

    #[test]
    fn test_solady_vector_long_match_split() {
        assert_solady_vector(
            &[0xab; 2000],
            &hex!("01ababe0fd01e0fd01e0fd01e0fd01e0fd01e0fd01e0fd01e0960104ababababab"),
        );
    }

    #[test]
    fn test_solady_vector_mixed_literals_and_matches() {
        let input: Vec<u8> = (0..300u32).map(|k| (k * k % 251) as u8).collect();
        let expected = hex!(
            "1f00010409101924314051647990a9c4e10526496e95bee91b4a7baee31f5893d01f145598dd2972bd0f5e"
            "af075cb3116cc92d8ef15bc2309b0d7ced65da56cf4fcc1f50d159de6af38315a43acd67039c3cd97d23c6"
            "701cc57527d68c44f9b57333f01fb47a420cd3a1714317e8c09a76543416f5dbc3ad998777695d534b4541"
            "3f3f411f454b535d69778799adc3dbf5163454769ac0e8174371a1d30c427ab4f03373b51ff9448cd62775"
            "c51c70c6237dd93c9c0367cd3aa41583f36ade59d150cc4fcf561fda65ed7c0d9b30c25bf18e2dc96c11b3"
            "5c07af5e0fbd7229dd985514d093581f1ae3ae7b4a1be9be956e492605e1c4a9907964514031241910090401"
            "e023fa04b3116cc92d"
        );
        assert_solady_vector(&input, &expected);
    }

    #[test]
    fn test_roundtrip_long_run_beyond_single_token() {
        let input = vec![0xabu8; 2000];
        let compressed = compress(&input);
        assert_eq!(decompress(&compressed).unwrap(), input);
    }

    #[test]
    fn test_roundtrip_incompressible_data() {
        let input: Vec<u8> = (0..500u32)
            .map(|k| (k.wrapping_mul(2_654_435_761) >> 13) as u8)
            .collect();
        let compressed = compress(&input);
        assert_eq!(decompress(&compressed).unwrap(), input);
    }
}
