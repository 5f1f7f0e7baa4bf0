//! Credential values and their byte layouts

use serde::{Deserialize, Serialize};

/// Marks a tagged entry. Never the first byte of valid UTF-8, and never a
/// single-byte boolean, so untagged entries cannot be mistaken for tagged ones.
const TAG_MARKER: u8 = 0xFF;
const TAG_TEXT: u8 = b't';
const TAG_BOOL: u8 = b'b';
const TAG_BLOB: u8 = b'd';

/// Text probe results that mean "no text here". `\0` and `\u{1}` are what a
/// stored boolean looks like when read as text.
const TEXT_SENTINELS: [&str; 3] = ["", "\u{0}", "\u{1}"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
    Text(String),
    Bool(bool),
    Blob(Vec<u8>),
}

impl StoredValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StoredValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StoredValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            StoredValue::Blob(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl From<String> for StoredValue {
    fn from(value: String) -> Self {
        StoredValue::Text(value)
    }
}

impl From<&str> for StoredValue {
    fn from(value: &str) -> Self {
        StoredValue::Text(value.to_string())
    }
}

impl From<bool> for StoredValue {
    fn from(value: bool) -> Self {
        StoredValue::Bool(value)
    }
}

impl From<Vec<u8>> for StoredValue {
    fn from(value: Vec<u8>) -> Self {
        StoredValue::Blob(value)
    }
}

impl From<&[u8]> for StoredValue {
    fn from(value: &[u8]) -> Self {
        StoredValue::Blob(value.to_vec())
    }
}

/// How values are laid out in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueEncoding {
    /// Kind recorded in a two-byte header; reads need no guessing.
    #[default]
    Tagged,
    /// Raw bytes, kind recovered by probing text, then bool, then blob.
    Probe,
}

impl ValueEncoding {
    pub(crate) fn encode(&self, value: &StoredValue) -> Vec<u8> {
        match self {
            ValueEncoding::Probe => raw_bytes(value),
            ValueEncoding::Tagged => {
                let tag = match value {
                    StoredValue::Text(_) => TAG_TEXT,
                    StoredValue::Bool(_) => TAG_BOOL,
                    StoredValue::Blob(_) => TAG_BLOB,
                };
                let payload = raw_bytes(value);
                let mut bytes = Vec::with_capacity(payload.len() + 2);
                bytes.push(TAG_MARKER);
                bytes.push(tag);
                bytes.extend_from_slice(&payload);
                bytes
            }
        }
    }

    /// Tagged reads fall back to probing for entries written untagged.
    pub(crate) fn decode(&self, bytes: Vec<u8>) -> Option<StoredValue> {
        if *self == ValueEncoding::Tagged {
            if let Some(value) = decode_tagged(&bytes) {
                return Some(value);
            }
        }
        probe(bytes)
    }
}

fn raw_bytes(value: &StoredValue) -> Vec<u8> {
    match value {
        StoredValue::Text(text) => text.as_bytes().to_vec(),
        StoredValue::Bool(flag) => vec![u8::from(*flag)],
        StoredValue::Blob(bytes) => bytes.clone(),
    }
}

fn decode_tagged(bytes: &[u8]) -> Option<StoredValue> {
    match bytes {
        [TAG_MARKER, TAG_TEXT, payload @ ..] => std::str::from_utf8(payload)
            .ok()
            .map(|text| StoredValue::Text(text.to_string())),
        [TAG_MARKER, TAG_BOOL, flag] => Some(StoredValue::Bool(*flag == 1)),
        [TAG_MARKER, TAG_BLOB, payload @ ..] => Some(StoredValue::Blob(payload.to_vec())),
        _ => None,
    }
}

/// Text first, then bool, then blob. The order is arbitrary but fixed.
fn probe(bytes: Vec<u8>) -> Option<StoredValue> {
    if let Ok(text) = std::str::from_utf8(&bytes) {
        if !TEXT_SENTINELS.contains(&text) {
            return Some(StoredValue::Text(text.to_string()));
        }
    }
    if let Some(first) = bytes.first() {
        return Some(StoredValue::Bool(*first == 1));
    }
    Some(StoredValue::Blob(bytes))
}
