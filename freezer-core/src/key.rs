use std::fmt;

const ITEM_PREFIX: &str = "item:";
const INDEX_KEY: &str = "index:item-ids";

/// A namespaced record key in the backing store.
///
/// Item records live under `item:<id>`; the set of all known ids lives under
/// a single fixed index key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RecordKey(String);

impl RecordKey {
    /// Key of the record holding the item with the given id.
    pub fn item(id: &str) -> Self {
        RecordKey(format!("{ITEM_PREFIX}{id}"))
    }

    /// Key of the index record.
    pub fn index() -> Self {
        RecordKey(INDEX_KEY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the key as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordKey({})", self.0)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_key_is_namespaced() {
        let key = RecordKey::item("abc");
        assert_eq!(key.as_str(), "item:abc");
        assert_eq!(key.as_bytes(), b"item:abc");
    }

    #[test]
    fn index_key_is_not_an_item() {
        let key = RecordKey::index();
        assert!(!key.as_str().starts_with(ITEM_PREFIX));
        assert_ne!(key, RecordKey::item("index"));
        assert_ne!(key, RecordKey::item("item-ids"));
    }

    #[test]
    fn key_display() {
        let key = RecordKey::item("peas");
        assert_eq!(format!("{}", key), "item:peas");
    }
}
