//! Hand-written reader for the tag-length-value byte stream embedded in a
//! migration export (the protobuf wire format, without a protobuf runtime).
//!
//! Field numbers are fixed by the vendor schema:
//!
//! MigrationPayload: 1 otp_parameters (repeated message), 2 version,
//! 3 batch_size, 4 batch_index, 5 batch_id.
//!
//! OtpParameters: 1 secret (bytes), 2 name, 3 issuer, 4 algorithm,
//! 5 digits, 6 type, 7 counter.
//!
//! Unknown field numbers and unexpected wire types are skipped by their own
//! width so newer exports keep decoding; structural damage (truncation, a
//! length past the end of the buffer, a zero field number) fails the whole
//! decode.

use crate::{digits_from_wire, Algorithm, FormatError, MigrationPayload, OtpParameters, OtpType};

const WIRE_VARINT: u8 = 0;
const WIRE_FIXED64: u8 = 1;
const WIRE_LEN: u8 = 2;
const WIRE_FIXED32: u8 = 5;

struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        WireReader { buf, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn next_byte(&mut self) -> Option<u8> {
        let b = self.buf.get(self.pos).copied();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        if n > self.buf.len() - self.pos {
            return Err(FormatError::MalformedPayload(
                "declared length past end of buffer",
            ));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn read_varint(&mut self) -> Result<u64, FormatError> {
        let mut value: u64 = 0;
        let mut shift = 0u32;
        loop {
            let b = self
                .next_byte()
                .ok_or(FormatError::MalformedPayload("truncated varint"))?;
            if shift == 63 && b > 1 {
                return Err(FormatError::MalformedPayload("varint overflows 64 bits"));
            }
            value |= u64::from(b & 0x7f) << shift;
            if b & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift > 63 {
                return Err(FormatError::MalformedPayload("varint overflows 64 bits"));
            }
        }
    }

    /// Reads a field key, returning the field number and wire type.
    fn read_key(&mut self) -> Result<(u64, u8), FormatError> {
        let key = self.read_varint()?;
        let field = key >> 3;
        if field == 0 {
            return Err(FormatError::MalformedPayload("field number zero"));
        }
        Ok((field, (key & 0x7) as u8))
    }

    fn read_len_delimited(&mut self) -> Result<&'a [u8], FormatError> {
        let len = self.read_varint()?;
        if len > (self.buf.len() - self.pos) as u64 {
            return Err(FormatError::MalformedPayload(
                "declared length past end of buffer",
            ));
        }
        self.take(len as usize)
    }

    /// Skips one field of the given wire type by its own width.
    fn skip(&mut self, wire_type: u8) -> Result<(), FormatError> {
        match wire_type {
            WIRE_VARINT => self.read_varint().map(|_| ()),
            WIRE_FIXED64 => self.take(8).map(|_| ()),
            WIRE_LEN => self.read_len_delimited().map(|_| ()),
            WIRE_FIXED32 => self.take(4).map(|_| ()),
            // Deprecated group wire types and reserved values.
            _ => Err(FormatError::MalformedPayload("unsupported wire type")),
        }
    }
}

/// Decodes a raw migration payload into its account records and envelope
/// metadata.
///
/// The decode is atomic: any structural error discards the whole payload so
/// a corrupted export can never yield a misleadingly incomplete account list.
/// An empty buffer is a valid payload with zero accounts.
///
/// # Errors
///
/// [FormatError::MalformedPayload](enum.FormatError.html) on structural
/// damage, [FormatError::InvalidText](enum.FormatError.html) when a name or
/// issuer field is not valid UTF-8.
pub fn decode_migration_payload(raw: &[u8]) -> Result<MigrationPayload, FormatError> {
    let mut reader = WireReader::new(raw);
    let mut payload = MigrationPayload::default();

    while !reader.at_end() {
        let (field, wire_type) = reader.read_key()?;
        match (field, wire_type) {
            (1, WIRE_LEN) => {
                let msg = reader.read_len_delimited()?;
                payload.otp_parameters.push(decode_otp_parameters(msg)?);
            }
            (2, WIRE_VARINT) => payload.version = Some(reader.read_varint()?),
            (3, WIRE_VARINT) => payload.batch_size = Some(reader.read_varint()?),
            (4, WIRE_VARINT) => payload.batch_index = Some(reader.read_varint()?),
            (5, WIRE_VARINT) => payload.batch_id = Some(reader.read_varint()?),
            _ => reader.skip(wire_type)?,
        }
    }
    Ok(payload)
}

fn decode_text(bytes: &[u8]) -> Result<String, FormatError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(FormatError::InvalidText)
}

fn decode_otp_parameters(msg: &[u8]) -> Result<OtpParameters, FormatError> {
    let mut reader = WireReader::new(msg);
    let mut record = OtpParameters::default();

    while !reader.at_end() {
        let (field, wire_type) = reader.read_key()?;
        match (field, wire_type) {
            (1, WIRE_LEN) => record.secret = reader.read_len_delimited()?.to_vec(),
            (2, WIRE_LEN) => record.name = decode_text(reader.read_len_delimited()?)?,
            (3, WIRE_LEN) => record.issuer = decode_text(reader.read_len_delimited()?)?,
            (4, WIRE_VARINT) => record.algorithm = Algorithm::from_wire(reader.read_varint()?),
            (5, WIRE_VARINT) => record.digits = digits_from_wire(reader.read_varint()?),
            (6, WIRE_VARINT) => record.otp_type = OtpType::from_wire(reader.read_varint()?),
            (7, WIRE_VARINT) => record.counter = reader.read_varint()?,
            _ => reader.skip(wire_type)?,
        }
    }
    Ok(record)
}

#[cfg(test)]
pub(crate) mod testutil {
    //! Minimal wire-format writer used by tests to build synthetic payloads.

    pub(crate) fn varint(mut v: u64) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let b = (v & 0x7f) as u8;
            v >>= 7;
            if v == 0 {
                out.push(b);
                return out;
            }
            out.push(b | 0x80);
        }
    }

    pub(crate) fn key(field: u64, wire_type: u8) -> Vec<u8> {
        varint(field << 3 | u64::from(wire_type))
    }

    pub(crate) fn varint_field(field: u64, v: u64) -> Vec<u8> {
        let mut out = key(field, super::WIRE_VARINT);
        out.extend(varint(v));
        out
    }

    pub(crate) fn len_field(field: u64, bytes: &[u8]) -> Vec<u8> {
        let mut out = key(field, super::WIRE_LEN);
        out.extend(varint(bytes.len() as u64));
        out.extend_from_slice(bytes);
        out
    }
}
