//! Helpers for converting values to and from hex strings

/// Convert a byte array to a hex string
pub fn bytes_to_hex_string(bytes: &[u8]) -> String {
    let encoded = hex::encode(bytes);
    format!("0x{encoded}")
}

/// Convert a hex string to a byte array
pub fn bytes_from_hex_string(hex: &str) -> Result<Vec<u8>, String> {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    hex::decode(hex).map_err(|e| format!("error deserializing bytes from hex string: {e}"))
}

#[cfg(test)]
mod test {
    use super::{bytes_from_hex_string, bytes_to_hex_string};

    /// Tests a round trip from bytes to hex string and back
    #[test]
    fn test_hex_round_trip() {
        let bytes = vec![0xde, 0xad, 0xbe, 0xef];
        let hex_str = bytes_to_hex_string(&bytes);
        assert_eq!(hex_str, "0xdeadbeef");

        let recovered = bytes_from_hex_string(&hex_str).unwrap();
        assert_eq!(recovered, bytes);
    }

    /// Tests parsing a hex string without a 0x prefix
    #[test]
    fn test_hex_no_prefix() {
        let recovered = bytes_from_hex_string("deadbeef").unwrap();
        assert_eq!(recovered, vec![0xde, 0xad, 0xbe, 0xef]);
    }
}
