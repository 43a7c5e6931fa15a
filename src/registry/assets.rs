//! Read-only table of ledger assets keyed by token contract address

use crate::ledger::AssetDescriptor;

use std::collections::HashMap;

/// Injected asset lookup, populated once at startup
///
/// Never mutated after construction, so concurrent readers need no locking.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    assets: HashMap<String, AssetDescriptor>,
}

impl AssetRegistry {
    pub fn new(entries: impl IntoIterator<Item = (String, AssetDescriptor)>) -> Self {
        Self {
            assets: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, contract_address: &str) -> Option<&AssetDescriptor> {
        self.assets.get(contract_address)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_exact() {
        let registry = AssetRegistry::new([("native".to_string(), AssetDescriptor::Native)]);
        assert_eq!(registry.get("native"), Some(&AssetDescriptor::Native));
        assert_eq!(registry.get("NATIVE"), None);
        assert_eq!(registry.len(), 1);
    }
}
