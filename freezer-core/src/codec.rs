//! CBOR encoding of persisted records.
//!
//! Item records hold a CBOR map of the `Item` fields; the index record holds
//! a CBOR array of ids in insertion order.

use indexmap::IndexSet;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::FreezerError;
use crate::item::{Item, ItemId};
use crate::key::RecordKey;

/// Ordered set of all known item ids. A set, so an id can never appear twice.
pub type ItemIndex = IndexSet<ItemId>;

fn encode<T: Serialize>(key: &RecordKey, value: &T) -> Result<Vec<u8>, FreezerError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| FreezerError::Encode {
        key: key.clone(),
        message: e.to_string(),
    })?;
    Ok(buf)
}

fn decode<T: DeserializeOwned>(key: &RecordKey, bytes: &[u8]) -> Result<T, FreezerError> {
    ciborium::from_reader(bytes).map_err(|e| FreezerError::Decode {
        key: key.clone(),
        message: e.to_string(),
    })
}

pub fn encode_item(item: &Item) -> Result<Vec<u8>, FreezerError> {
    encode(&RecordKey::item(&item.id), item)
}

pub fn decode_item(key: &RecordKey, bytes: &[u8]) -> Result<Item, FreezerError> {
    decode(key, bytes)
}

pub fn encode_index(index: &ItemIndex) -> Result<Vec<u8>, FreezerError> {
    encode(&RecordKey::index(), index)
}

pub fn decode_index(bytes: &[u8]) -> Result<ItemIndex, FreezerError> {
    decode(&RecordKey::index(), bytes)
}
