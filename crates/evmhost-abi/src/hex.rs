//! Minimal hex encoding for bytecode, outputs and addresses.

/// Error returned by [`decode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    #[error("odd number of hex digits ({0})")]
    OddLength(usize),
    #[error("invalid hex digit '{ch}' at position {index}")]
    InvalidDigit { ch: char, index: usize },
}

/// Encodes bytes as lowercase hex without prefix.
pub fn encode(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(DIGITS[(b >> 4) as usize] as char);
        out.push(DIGITS[(b & 0x0f) as usize] as char);
    }
    out
}

/// Decodes hex digits (an optional `0x` prefix and surrounding whitespace are accepted).
pub fn decode(text: &str) -> Result<Vec<u8>, HexError> {
    let text = text.trim();
    let digits = text.strip_prefix("0x").unwrap_or(text);
    let chars: Vec<char> = digits.chars().collect();
    if chars.len() % 2 != 0 {
        return Err(HexError::OddLength(chars.len()));
    }

    let nibble = |index: usize, ch: char| {
        ch.to_digit(16)
            .map(|d| d as u8)
            .ok_or(HexError::InvalidDigit { ch, index })
    };

    chars
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| Ok((nibble(2 * i, pair[0])? << 4) | nibble(2 * i + 1, pair[1])?))
        .collect()
}
