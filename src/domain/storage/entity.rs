//! Storage entity traits and types

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be used as document keys
pub trait StorageKey: Clone + Debug + Send + Sync + Eq + std::hash::Hash {
    /// Returns the key as a string for backends that require string keys
    fn as_str(&self) -> &str;
}

/// Trait for documents that live in a named collection
pub trait StorageEntity: Clone + Debug + Send + Sync + Serialize + DeserializeOwned {
    /// The key type for this entity
    type Key: StorageKey;

    /// Name of the collection (table) holding this entity
    const COLLECTION: &'static str;

    /// Returns the entity's key
    fn key(&self) -> &Self::Key;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    struct BadgeKey(String);

    impl StorageKey for BadgeKey {
        fn as_str(&self) -> &str {
            &self.0
        }
    }

    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    struct Badge {
        id: BadgeKey,
        label: String,
    }

    impl StorageEntity for Badge {
        type Key = BadgeKey;
        const COLLECTION: &'static str = "badges";

        fn key(&self) -> &Self::Key {
            &self.id
        }
    }

    #[test]
    fn test_entity_key_and_collection() {
        let badge = Badge {
            id: BadgeKey("badge-1".to_string()),
            label: "Volunteer".to_string(),
        };

        assert_eq!(badge.key().as_str(), "badge-1");
        assert_eq!(Badge::COLLECTION, "badges");
    }
}
