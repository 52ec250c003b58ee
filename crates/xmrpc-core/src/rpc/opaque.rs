//! JSON documents that the node ships as JSON *strings*.
//!
//! `get_block` returns the block body in a `json` field, and the transaction
//! endpoints do the same with `tx_json` / `as_json`. The primary decode keeps
//! that text untouched; [`ExpandOpaque`] is the explicit second pass that
//! parses it into a structured record on request.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Whether a call should run the secondary decode over opaque JSON fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Leave opaque fields as raw text.
    #[default]
    Raw,
    /// Parse every opaque field into its structured type before returning.
    Expand,
}

/// A string field whose content is itself a JSON document of type `T`.
///
/// Serializes back to the raw string, so re-emitting a result is lossless
/// whether or not it was expanded.
#[derive(Clone, PartialEq)]
pub struct OpaqueJson<T> {
    raw: String,
    decoded: Option<T>,
}

impl<T> OpaqueJson<T> {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            decoded: None,
        }
    }

    /// The text exactly as the node sent it.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The structured document, present only after [`OpaqueJson::expand`].
    pub fn decoded(&self) -> Option<&T> {
        self.decoded.as_ref()
    }

    pub fn is_expanded(&self) -> bool {
        self.decoded.is_some()
    }
}

impl<T: DeserializeOwned> OpaqueJson<T> {
    /// Parse the raw text into `T`. A second call is a no-op.
    ///
    /// `field` only labels the error message.
    pub fn expand(&mut self, field: &str) -> Result<(), CoreError> {
        if self.decoded.is_some() {
            return Ok(());
        }
        let parsed = serde_json::from_str(&self.raw)
            .map_err(|e| CoreError::Decode(format!("invalid JSON in `{field}`: {e}")))?;
        self.decoded = Some(parsed);
        Ok(())
    }
}

impl<T> Default for OpaqueJson<T> {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl<T: fmt::Debug> fmt::Debug for OpaqueJson<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.decoded {
            Some(decoded) => f.debug_tuple("OpaqueJson").field(decoded).finish(),
            None => f
                .debug_tuple("OpaqueJson")
                .field(&format_args!("{} bytes raw", self.raw.len()))
                .finish(),
        }
    }
}

impl<T> Serialize for OpaqueJson<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de, T> Deserialize<'de> for OpaqueJson<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Records carrying one or more [`OpaqueJson`] fields.
pub trait ExpandOpaque {
    /// Run the secondary decode over every opaque field. Any failure fails
    /// the whole record.
    fn expand_opaque(&mut self) -> Result<(), CoreError>;

    /// Apply `mode`: expand for [`DecodeMode::Expand`], nothing for `Raw`.
    fn apply_decode_mode(&mut self, mode: DecodeMode) -> Result<(), CoreError> {
        match mode {
            DecodeMode::Raw => Ok(()),
            DecodeMode::Expand => self.expand_opaque(),
        }
    }
}
