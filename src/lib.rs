//! This library decodes the `otpauth-migration://offline?data=...` account
//! export format used by authenticator apps to transfer several OTP
//! enrollments inside a single QR code, and renders every recovered account
//! as a standard `otpauth://` provisioning URI that any compliant
//! authenticator can import.
//!
//! Decoding is pure and stateless: one migration URL in, an ordered list of
//! URIs (or a single typed error) out. Acquiring the URL itself, usually by
//! scanning an image for a QR code, is deliberately left to the caller.
//!
//! # Examples
//!
//! ```rust
//! use otpauth_migration::decode_otpauth_migration_url;
//!
//! // A payload carrying a single account.
//! let url = "otpauth-migration://offline?data=CikKBWhlbGxvEhFhbGljZUBleGFtcGxlLmNvbRoHRXhhbXBsZSABKAEwAhAB";
//! for uri in decode_otpauth_migration_url(url).unwrap() {
//!     println!("{}", uri);
//! }
//! ```
//!
//! ```rust
//! use otpauth_migration::{decode_migration_payload, extract_raw_payload};
//!
//! // The two pipeline stages can also be driven separately.
//! let raw = extract_raw_payload(
//!     "otpauth-migration://offline?data=CikKBWhlbGxvEhFhbGljZUBleGFtcGxlLmNvbRoHRXhhbXBsZSABKAEwAhAB",
//! ).unwrap();
//! let payload = decode_migration_payload(&raw).unwrap();
//! assert_eq!(payload.otp_parameters.len(), 1);
//! assert_eq!(payload.otp_parameters[0].issuer, "Example");
//! ```

mod error;
mod transport;
mod wire;

pub use error::FormatError;
pub use transport::extract_raw_payload;
pub use wire::decode_migration_payload;

use constant_time_eq::constant_time_eq;

#[cfg(feature = "serde_support")]
use serde::{Deserialize, Serialize};

use core::fmt;

/// Hash algorithm an exported account was enrolled with.
///
/// The wire format carries an integer code; zero ("unspecified") and any
/// unknown code fall back to `SHA1`, the default the `otpauth` URI scheme
/// assumes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub enum Algorithm {
    SHA1,
    SHA256,
    SHA512,
}

impl std::default::Default for Algorithm {
    fn default() -> Self {
        Algorithm::SHA1
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::SHA1 => f.write_str("SHA1"),
            Algorithm::SHA256 => f.write_str("SHA256"),
            Algorithm::SHA512 => f.write_str("SHA512"),
        }
    }
}

impl Algorithm {
    pub(crate) fn from_wire(code: u64) -> Self {
        match code {
            2 => Algorithm::SHA256,
            3 => Algorithm::SHA512,
            _ => Algorithm::SHA1,
        }
    }
}

/// Kind of OTP an exported account generates.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub enum OtpType {
    Unspecified,
    HOTP,
    TOTP,
}

impl std::default::Default for OtpType {
    fn default() -> Self {
        OtpType::Unspecified
    }
}

impl OtpType {
    pub(crate) fn from_wire(code: u64) -> Self {
        match code {
            1 => OtpType::HOTP,
            2 => OtpType::TOTP,
            _ => OtpType::Unspecified,
        }
    }
}

/// Maps the wire digit-count enum code to a literal digit count.
/// Code 1 means six digits, 2 means eight; zero ("unspecified") and any
/// unknown code default to six.
pub(crate) fn digits_from_wire(code: u64) -> usize {
    match code {
        2 => 8,
        _ => 6,
    }
}

/// One OTP account recovered from a migration payload. Its
/// [secret](struct.OtpParameters.html#structfield.secret) field is sensitive
/// data, treat it accordingly.
#[derive(Debug, Clone, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct OtpParameters {
    /// Raw, non-encoded shared secret. Never empty in a well-formed export,
    /// but an empty secret decodes fine and renders an empty `secret=` value.
    pub secret: Vec<u8>,
    /// The "alice@example.com" part of "Example:alice@example.com". May be
    /// empty.
    pub name: String,
    /// The "Example" part of "Example:alice@example.com". May be empty.
    pub issuer: String,
    /// Hash algorithm, `SHA1` when the export left it unspecified.
    pub algorithm: Algorithm,
    /// Literal number of code digits (6 or 8), 6 when unspecified.
    pub digits: usize,
    /// TOTP or HOTP. Surfaced for callers; URI rendering does not branch on
    /// it (see [get_url](struct.OtpParameters.html#method.get_url)).
    pub otp_type: OtpType,
    /// Moving-factor counter, meaningful only for HOTP accounts. Zero
    /// otherwise.
    pub counter: u64,
}

impl std::default::Default for OtpParameters {
    /// An empty record with the documented wire defaults: SHA1, 6 digits,
    /// unspecified type, zero counter.
    fn default() -> Self {
        OtpParameters {
            secret: Vec::new(),
            name: String::new(),
            issuer: String::new(),
            algorithm: Algorithm::SHA1,
            digits: 6,
            otp_type: OtpType::Unspecified,
            counter: 0,
        }
    }
}

impl PartialEq for OtpParameters {
    /// Secrets are compared in constant time.
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name {
            return false;
        }
        if self.issuer != other.issuer {
            return false;
        }
        if self.algorithm != other.algorithm {
            return false;
        }
        if self.digits != other.digits {
            return false;
        }
        if self.otp_type != other.otp_type {
            return false;
        }
        if self.counter != other.counter {
            return false;
        }
        constant_time_eq(&self.secret, &other.secret)
    }
}

impl fmt::Display for OtpParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "digits: {}; alg: {}; issuer: <{}>({})",
            self.digits, self.algorithm, self.issuer, self.name
        )
    }
}

impl OtpParameters {
    /// Will return the base32 representation of the secret, without padding,
    /// which is the form authenticator apps expect in a provisioning URI.
    pub fn get_secret_base32(&self) -> String {
        base32::encode(base32::Alphabet::Rfc4648 { padding: false }, &self.secret)
    }

    /// Will generate a standard URL used to automatically add OTP auths.
    ///
    /// Label and issuer are URL-encoded; the secret is base 32'd without
    /// padding, as per RFC. Field order is fixed so the output stays
    /// bit-compatible with what consuming authenticator apps parse.
    ///
    /// HOTP accounts render through the same `totp` template: the type and
    /// counter fields are not reflected in the URI. Known limitation carried
    /// over from the export tooling this decoder interoperates with.
    pub fn get_url(&self) -> String {
        let issuer = urlencoding::encode(&self.issuer);
        let name = urlencoding::encode(&self.name);
        format!(
            "otpauth://totp/{}:{}?secret={}&issuer={}&algorithm={}&digits={}",
            issuer,
            name,
            self.get_secret_base32(),
            issuer,
            self.algorithm,
            self.digits,
        )
    }
}

/// A decoded migration export: the ordered account list plus envelope
/// metadata. The metadata is surfaced for batch-aware callers but plays no
/// part in URI construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct MigrationPayload {
    /// Accounts in the order they appeared on the wire. That order determines
    /// output order.
    pub otp_parameters: Vec<OtpParameters>,
    pub version: Option<u64>,
    pub batch_size: Option<u64>,
    pub batch_index: Option<u64>,
    pub batch_id: Option<u64>,
}

/// Decodes a full `otpauth-migration://offline?data=...` URL into the list of
/// `otpauth://` provisioning URIs it carries, in wire order.
///
/// Decoding is atomic: a malformed payload yields an error, never a partial
/// list. A payload with zero accounts yields an empty list.
///
/// # Errors
///
/// Returns a [FormatError](enum.FormatError.html) when the `data=` parameter
/// is missing, the transport encoding does not decode, or the embedded byte
/// stream is structurally invalid.
pub fn decode_otpauth_migration_url(migration_url: &str) -> Result<Vec<String>, FormatError> {
    let raw = extract_raw_payload(migration_url)?;
    let payload = decode_migration_payload(&raw)?;
    Ok(payload
        .otp_parameters
        .iter()
        .map(OtpParameters::get_url)
        .collect())
}
