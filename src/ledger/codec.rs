//! Length-prefixed string-vector codec for ledger read results.

use reelvault_common::LedgerError;

/// Decode a dev-inspect return value into its string entries.
///
/// Wire format: first byte is the entry count, then each entry is one
/// length byte followed by that many ASCII characters.
pub fn decode_string_vector(bytes: &[u8]) -> Result<Vec<String>, LedgerError> {
    let mut position = 0usize;
    let count = *bytes
        .get(position)
        .ok_or_else(|| LedgerError::Decode("empty return value".into()))? as usize;
    position += 1;

    let mut strings = Vec::with_capacity(count);
    for entry in 0..count {
        let len = *bytes
            .get(position)
            .ok_or_else(|| LedgerError::Decode(format!("truncated length at entry {}", entry)))?
            as usize;
        position += 1;

        let slice = bytes
            .get(position..position + len)
            .ok_or_else(|| LedgerError::Decode(format!("truncated data at entry {}", entry)))?;
        let value = std::str::from_utf8(slice)
            .map_err(|e| LedgerError::Decode(format!("entry {} is not valid UTF-8: {}", entry, e)))?;
        strings.push(value.to_string());
        position += len;
    }

    Ok(strings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(entries: &[&str]) -> Vec<u8> {
        let mut bytes = vec![entries.len() as u8];
        for entry in entries {
            bytes.push(entry.len() as u8);
            bytes.extend_from_slice(entry.as_bytes());
        }
        bytes
    }

    #[test]
    fn test_decode_empty_vector() {
        assert_eq!(decode_string_vector(&[0]).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_decode_two_entries() {
        let bytes = encode(&["abc", "de"]);
        assert_eq!(decode_string_vector(&bytes).unwrap(), vec!["abc", "de"]);
    }

    #[test]
    fn test_decode_uuid_style_ids() {
        let bytes = encode(&[
            "4a6438a8-8684-457b-ab82-d37b766716d5",
            "8a807a4e-0c4e-4f70-b427-e5147cb80596",
        ]);
        let decoded = decode_string_vector(&bytes).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0], "4a6438a8-8684-457b-ab82-d37b766716d5");
    }

    #[test]
    fn test_decode_rejects_empty_input() {
        assert!(decode_string_vector(&[]).is_err());
    }

    #[test]
    fn test_decode_rejects_truncated_length() {
        // claims two entries but only carries one
        let bytes = vec![2, 1, b'a'];
        let err = decode_string_vector(&bytes).unwrap_err();
        assert!(err.to_string().contains("entry 1"));
    }

    #[test]
    fn test_decode_rejects_truncated_data() {
        let bytes = vec![1, 5, b'a', b'b'];
        assert!(decode_string_vector(&bytes).is_err());
    }
}
