//! Base64 VLQ codec used by the `mappings` field of source maps.

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const CONTINUATION: i64 = 0b10_0000;
const MASK: i64 = 0b1_1111;

fn digit_value(byte: u8) -> Option<i64> {
    let value = match byte {
        b'A'..=b'Z' => byte - b'A',
        b'a'..=b'z' => byte - b'a' + 26,
        b'0'..=b'9' => byte - b'0' + 52,
        b'+' => 62,
        b'/' => 63,
        _ => return None,
    };
    Some(i64::from(value))
}

/// Appends the VLQ encoding of `value` to `out`.
pub fn encode_into(value: i64, out: &mut String) {
    // Sign lives in the least significant bit.
    let mut remaining = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };

    loop {
        let mut digit = remaining & MASK;
        remaining >>= 5;
        if remaining > 0 {
            digit |= CONTINUATION;
        }
        out.push(ALPHABET[digit as usize] as char);
        if remaining == 0 {
            break;
        }
    }
}

/// Returns the VLQ encoding of `value`.
pub fn encode(value: i64) -> String {
    let mut out = String::new();
    encode_into(value, &mut out);
    out
}

/// Decodes one VLQ value from the start of `input`.
///
/// Returns the value and the number of bytes consumed, or `None` when the
/// input is empty, truncated or contains a byte outside the alphabet.
pub fn decode(input: &[u8]) -> Option<(i64, usize)> {
    let mut result = 0i64;
    let mut shift = 0u32;

    for (consumed, &byte) in input.iter().enumerate() {
        let digit = digit_value(byte)?;
        if shift > 60 {
            return None;
        }
        result += (digit & MASK) << shift;
        shift += 5;

        if digit & CONTINUATION == 0 {
            let value = if result & 1 == 1 {
                -(result >> 1)
            } else {
                result >> 1
            };
            return Some((value, consumed + 1));
        }
    }

    None
}
