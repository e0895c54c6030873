//! Envelope value and its NUL-separated byte layout.
//!
//! ```text
//! plain:   nonce_b64 \0 tag_hex \0 obfuscated_ciphertext
//! routed:  route \0 nonce_b64 \0 tag_hex \0 obfuscated_ciphertext
//! ```
//!
//! The routed form is the payload of a message frame. The sealing side leaves
//! `route` empty or names a recipient; the relay rewrites it to a sender label
//! before delivery. Parsing errors here are format errors, never
//! authentication failures: the envelope contents are not checked until
//! [`crate::open`].

use crate::CryptoError;

/// Number of fields in a plain envelope
pub const ENVELOPE_FIELDS: usize = 3;

/// Byte separating envelope fields
pub const FIELD_SEPARATOR: u8 = 0;

const FIELD_NAMES: [&str; ENVELOPE_FIELDS + 1] = ["route", "nonce", "tag", "ciphertext"];

/// A sealed message: nonce, tag and obfuscated ciphertext, all as text.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Envelope {
    nonce: String,
    tag: String,
    ciphertext: String,
}

impl Envelope {
    /// Build an envelope from its three transport-encoded fields.
    ///
    /// # Errors
    ///
    /// - `FieldContainsSeparator` if any field contains a NUL byte
    pub fn new(
        nonce: impl Into<String>,
        tag: impl Into<String>,
        ciphertext: impl Into<String>,
    ) -> Result<Self, CryptoError> {
        let envelope = Self { nonce: nonce.into(), tag: tag.into(), ciphertext: ciphertext.into() };

        for (field, value) in FIELD_NAMES[1..].iter().zip(envelope.fields()) {
            reject_separator(field, value)?;
        }

        Ok(envelope)
    }

    /// Base64 nonce.
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Lowercase hex tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Obfuscated base64 ciphertext.
    pub fn ciphertext(&self) -> &str {
        &self.ciphertext
    }

    /// Serialize as `nonce \0 tag \0 ciphertext`.
    pub fn encode(&self) -> Vec<u8> {
        join(self.fields())
    }

    /// Parse the plain three-field layout.
    ///
    /// # Errors
    ///
    /// - `MissingField` if fewer than three fields are present
    /// - `TooManyFields` if more than three are present
    /// - `InvalidField` if a field is not UTF-8
    pub fn decode(bytes: &[u8]) -> Result<Self, CryptoError> {
        let [nonce, tag, ciphertext] = split_fields::<ENVELOPE_FIELDS>(bytes)?;

        Ok(Self {
            nonce: field_text("nonce", nonce)?,
            tag: field_text("tag", tag)?,
            ciphertext: field_text("ciphertext", ciphertext)?,
        })
    }

    /// Serialize as `route \0 nonce \0 tag \0 ciphertext`.
    ///
    /// # Errors
    ///
    /// - `FieldContainsSeparator` if `route` contains a NUL byte
    pub fn encode_routed(&self, route: &str) -> Result<Vec<u8>, CryptoError> {
        reject_separator("route", route)?;

        let [nonce, tag, ciphertext] = self.fields();
        Ok(join([route, nonce, tag, ciphertext]))
    }

    /// Parse the routed four-field layout into `(route, envelope)`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Envelope::decode`], with four fields expected.
    pub fn decode_routed(bytes: &[u8]) -> Result<(String, Self), CryptoError> {
        let [route, nonce, tag, ciphertext] = split_fields::<{ ENVELOPE_FIELDS + 1 }>(bytes)?;

        let envelope = Self {
            nonce: field_text("nonce", nonce)?,
            tag: field_text("tag", tag)?,
            ciphertext: field_text("ciphertext", ciphertext)?,
        };

        Ok((field_text("route", route)?, envelope))
    }

    fn fields(&self) -> [&str; ENVELOPE_FIELDS] {
        [&self.nonce, &self.tag, &self.ciphertext]
    }
}

fn reject_separator(field: &'static str, value: &str) -> Result<(), CryptoError> {
    if value.as_bytes().contains(&FIELD_SEPARATOR) {
        return Err(CryptoError::FieldContainsSeparator { field });
    }
    Ok(())
}

fn join<const N: usize>(fields: [&str; N]) -> Vec<u8> {
    let len = fields.iter().map(|f| f.len()).sum::<usize>() + N.saturating_sub(1);
    let mut out = Vec::with_capacity(len);

    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(FIELD_SEPARATOR);
        }
        out.extend_from_slice(field.as_bytes());
    }

    out
}

fn split_fields<const N: usize>(bytes: &[u8]) -> Result<[&[u8]; N], CryptoError> {
    let parts: Vec<&[u8]> = bytes.split(|&b| b == FIELD_SEPARATOR).collect();

    match parts.len() {
        found if found < N => Err(CryptoError::MissingField { expected: N, found }),
        found if found > N => Err(CryptoError::TooManyFields { expected: N }),
        _ => Ok(std::array::from_fn(|i| parts[i])),
    }
}

fn field_text(field: &'static str, bytes: &[u8]) -> Result<String, CryptoError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| CryptoError::InvalidField { field })
}
