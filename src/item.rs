use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// One gallery entry. Its position in the item list decides its atlas cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Item {
    pub image_source: String,
    pub label: String,
}

impl Item {
    pub fn new(image_source: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            image_source: image_source.into(),
            label: label.into(),
        }
    }
}

/// Structural hash of an ordered item list; reordering changes it.
pub fn items_hash(items: &[Item]) -> u64 {
    let mut hasher = DefaultHasher::new();
    items.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_order_sensitive() {
        let a = Item::new("a.png", "A");
        let b = Item::new("b.png", "B");
        assert_eq!(items_hash(&[a.clone(), b.clone()]), items_hash(&[a.clone(), b.clone()]));
        assert_ne!(items_hash(&[a.clone(), b.clone()]), items_hash(&[b, a]));
    }
}
