//! Base62 codec for sequence-derived tokens.
//!
//! The alphabet is `a-z`, `A-Z`, `0-9` in that order, and digits are written
//! most-significant first, so `encode(0) == "a"` and `encode(62) == "ba"`.

use crate::error::{CoreError, Result};

/// The 62 symbols in digit order.
pub const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const BASE: u64 = ALPHABET.len() as u64;

/// Encodes `n` as a base62 string.
///
/// Zero encodes to the first alphabet symbol rather than an empty string.
pub fn encode(mut n: u64) -> String {
    if n == 0 {
        return char::from(ALPHABET[0]).to_string();
    }

    // u64::MAX needs 11 base62 digits
    let mut digits = Vec::with_capacity(11);
    while n > 0 {
        digits.push(ALPHABET[(n % BASE) as usize]);
        n /= BASE;
    }
    digits.reverse();

    digits.into_iter().map(char::from).collect()
}

/// Decodes a base62 string produced by [`encode`].
///
/// # Errors
///
/// Returns [`CoreError::InvalidToken`] if the input is empty, contains a
/// symbol outside [`ALPHABET`], or does not fit in a `u64`.
pub fn decode(token: &str) -> Result<u64> {
    if token.is_empty() {
        return Err(CoreError::InvalidToken("token is empty".to_string()));
    }

    token.bytes().try_fold(0_u64, |acc, byte| {
        let digit = digit_value(byte).ok_or_else(|| {
            CoreError::InvalidToken(format!(
                "'{}' is not a base62 symbol in '{token}'",
                char::from(byte).escape_default()
            ))
        })?;

        acc.checked_mul(BASE)
            .and_then(|acc| acc.checked_add(digit))
            .ok_or_else(|| CoreError::InvalidToken(format!("'{token}' overflows u64")))
    })
}

fn digit_value(byte: u8) -> Option<u64> {
    let value = match byte {
        b'a'..=b'z' => byte - b'a',
        b'A'..=b'Z' => byte - b'A' + 26,
        b'0'..=b'9' => byte - b'0' + 52,
        _ => return None,
    };
    Some(u64::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_known_values() {
        let cases = [(0, "a"), (1, "b"), (25, "z"), (26, "A"), (61, "9"), (62, "ba")];

        for (input, expected) in cases {
            assert_eq!(encode(input), expected, "encode({input})");
        }
    }

    #[test]
    fn zero_is_first_symbol_and_base_minus_one_is_last() {
        assert_eq!(encode(0), "a");
        assert_eq!(encode(BASE - 1), "9");
        assert_eq!(encode(BASE).len(), 2);
    }

    #[test]
    fn decode_known_values() {
        assert_eq!(decode("a").unwrap(), 0);
        assert_eq!(decode("ba").unwrap(), 62);
        assert_eq!(decode("9").unwrap(), 61);
    }

    #[test]
    fn decode_inverts_encode() {
        let samples = [
            0,
            1,
            61,
            62,
            3_843,
            3_844,
            1_000_000,
            1_000_001,
            u64::from(u32::MAX),
            u64::MAX - 1,
            u64::MAX,
        ];

        for n in samples {
            assert_eq!(decode(&encode(n)).unwrap(), n, "round trip of {n}");
        }
    }

    #[test]
    fn decode_rejects_symbols_outside_alphabet() {
        for bad in ["ab-c", "abc def", "abc/", "é", "short:abc"] {
            let err = decode(bad).unwrap_err();
            assert!(matches!(err, CoreError::InvalidToken(_)), "{bad}");
        }
    }

    #[test]
    fn decode_rejects_empty() {
        assert!(matches!(decode(""), Err(CoreError::InvalidToken(_))));
    }

    #[test]
    fn decode_rejects_overflow() {
        let too_big = format!("{}a", encode(u64::MAX));
        assert!(matches!(decode(&too_big), Err(CoreError::InvalidToken(_))));
    }

    #[test]
    fn encode_is_ordered_by_length() {
        // the offset guarantees a floor on token length
        assert_eq!(encode(1_000_000).len(), 4);
        assert_eq!(encode(BASE.pow(4) - 1).len(), 4);
        assert_eq!(encode(BASE.pow(4)).len(), 5);
    }
}
