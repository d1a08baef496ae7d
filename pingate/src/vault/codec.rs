//! Text encoding for binary vault fields.
//!
//! The store only holds text, so key, IV and ciphertext are kept as standard
//! base64. Decoding ignores ASCII whitespace: older records were written with
//! line-wrapped base64 and a trailing newline.

use base64::{engine::general_purpose::STANDARD, Engine as _};

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_tolerates_line_wrapping() {
        let bytes: Vec<u8> = (0u8..64).collect();
        let encoded = encode(&bytes);
        let wrapped = format!("{}\n{}\n", &encoded[..40], &encoded[40..]);

        assert_eq!(decode(&wrapped).unwrap(), bytes);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("not*base64!").is_err());
    }
}
