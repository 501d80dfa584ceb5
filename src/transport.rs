//! Transport-level decoding of the migration URL: strips the `data=`
//! envelope, reverses percent-encoding and reverses URL-safe base64.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::FormatError;

/// URL-safe alphabet, tolerant of both padded and unpadded input. Exports
/// omit the trailing `=` padding, but a payload that went through another
/// tool may have it back.
const URL_SAFE_ANY_PAD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Extracts the raw payload bytes from a migration URL.
///
/// Everything after the first `data=` is taken to the end of the string,
/// percent-decoded, then base64-decoded with the URL-safe alphabet.
/// Percent-decoding operates on bytes and cannot fail; stray `%` sequences
/// pass through and surface as a base64 error instead.
///
/// # Errors
///
/// [FormatError::MissingDataParameter](enum.FormatError.html) when the URL
/// has no `data=`, [FormatError::Base64DecodeFailed](enum.FormatError.html)
/// when the remainder is not decodable base64.
pub fn extract_raw_payload(migration_url: &str) -> Result<Vec<u8>, FormatError> {
    let encoded = migration_url
        .split_once("data=")
        .map(|(_, rest)| rest)
        .ok_or(FormatError::MissingDataParameter)?;
    let unquoted = urlencoding::decode_binary(encoded.as_bytes());
    URL_SAFE_ANY_PAD
        .decode(&unquoted)
        .map_err(FormatError::Base64DecodeFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_unpadded_base64() {
        // "hi!" encodes to "aGkh" but exports drop padding freely; "aGk"
        // would be "hi" unpadded.
        let raw = extract_raw_payload("otpauth-migration://offline?data=aGk").unwrap();
        assert_eq!(raw, b"hi");
    }

    #[test]
    fn decodes_padded_base64() {
        let raw = extract_raw_payload("otpauth-migration://offline?data=aGk=").unwrap();
        assert_eq!(raw, b"hi");
    }

    #[test]
    fn decodes_percent_encoded_padding() {
        let raw = extract_raw_payload("otpauth-migration://offline?data=aGk%3D").unwrap();
        assert_eq!(raw, b"hi");
    }

    #[test]
    fn uses_url_safe_alphabet() {
        // 0xfb 0xef encodes to "--8" in the URL-safe alphabet.
        let raw = extract_raw_payload("data=--8").unwrap();
        assert_eq!(raw, vec![0xfb, 0xef]);
    }

    #[test]
    fn takes_everything_after_first_data() {
        // The remainder after the first "data=" is "aGk&data=bm8"; '&' is not
        // base64, so this fails rather than silently consulting the second
        // occurrence.
        let err = extract_raw_payload("x?data=aGk&data=bm8").unwrap_err();
        assert!(matches!(err, FormatError::Base64DecodeFailed(_)));
    }

    #[test]
    fn missing_data_is_reported() {
        let err = extract_raw_payload("otpauth-migration://offline").unwrap_err();
        assert_eq!(err, FormatError::MissingDataParameter);
    }

    #[test]
    fn truncated_base64_is_reported() {
        // A single base64 character can never form a full byte.
        let err = extract_raw_payload("otpauth-migration://offline?data=A").unwrap_err();
        assert!(matches!(err, FormatError::Base64DecodeFailed(_)));
    }

    #[test]
    fn invalid_base64_byte_is_reported() {
        let err = extract_raw_payload("otpauth-migration://offline?data=aG!k").unwrap_err();
        assert!(matches!(err, FormatError::Base64DecodeFailed(_)));
    }

    #[test]
    fn empty_data_decodes_to_empty_payload() {
        let raw = extract_raw_payload("otpauth-migration://offline?data=").unwrap();
        assert!(raw.is_empty());
    }
}
