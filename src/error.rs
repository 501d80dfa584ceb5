use base64::DecodeError;

/// Ways decoding a migration export can fail.
///
/// Every failure is reported to the caller of the decode entry points; a
/// payload either decodes completely or not at all.
#[derive(Debug, Eq, PartialEq)]
pub enum FormatError {
    /// The migration URL carries no `data=` parameter.
    MissingDataParameter,
    /// The `data=` value is not valid URL-safe base64. Carries the underlying
    /// decode error for diagnostics.
    Base64DecodeFailed(DecodeError),
    /// Structural violation in the embedded byte stream: truncated field,
    /// invalid tag, or a declared length past the end of the buffer.
    MalformedPayload(&'static str),
    /// An account name or issuer field was not valid UTF-8. Text fields are
    /// rejected rather than lossily decoded.
    InvalidText(std::str::Utf8Error),
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormatError::Base64DecodeFailed(e) => Some(e),
            FormatError::InvalidText(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::MissingDataParameter => write!(
                f,
                "Migration URL carries no \"data=\" parameter"
            ),
            FormatError::Base64DecodeFailed(e) => write!(
                f,
                "Failed to decode base64 data: {}",
                e
            ),
            FormatError::MalformedPayload(detail) => write!(
                f,
                "Malformed migration payload: {}",
                detail
            ),
            FormatError::InvalidText(e) => write!(
                f,
                "Text field is not valid UTF-8: {}",
                e
            ),
        }
    }
}
