//! Pluggable custom keyword and mock factory registry
//!
//! Providers are collected once through [`MockRegistryBuilder`]; the built
//! [`MockRegistry`] is immutable and handed to the engine at construction.

use seedgraph_schema::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Supplies named datasets for custom keywords
pub trait CustomKeywordProvider: Send + Sync {
    /// Keyword name to candidate values
    fn custom_keywords(&self) -> HashMap<String, Vec<Value>>;
}

/// Zero-argument value producer referenced by field directives
pub trait MockFactory: Send + Sync + Debug {
    /// Registry key
    fn key(&self) -> &str;

    /// Produce a value
    fn value(&self) -> Value;
}

/// Immutable keyword and factory registry
#[derive(Debug, Clone, Default)]
pub struct MockRegistry {
    keywords: HashMap<String, Arc<[Value]>>,
    factories: HashMap<String, Arc<dyn MockFactory>>,
}

impl MockRegistry {
    /// Registry with nothing registered
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn builder() -> MockRegistryBuilder {
        MockRegistryBuilder::default()
    }

    /// Dataset of a custom keyword, matched case-insensitively
    #[must_use]
    pub fn custom_keyword(&self, name: &str) -> Option<&[Value]> {
        self.keywords
            .get(&name.to_uppercase())
            .map(AsRef::as_ref)
    }

    /// Factory by key
    #[must_use]
    pub fn factory(&self, key: &str) -> Option<&Arc<dyn MockFactory>> {
        self.factories.get(key)
    }

    /// Registered custom keyword names
    pub fn keyword_names(&self) -> impl Iterator<Item = &str> {
        self.keywords.keys().map(String::as_str)
    }
}

/// Collects providers and factories
#[derive(Debug, Default)]
pub struct MockRegistryBuilder {
    keywords: HashMap<String, Arc<[Value]>>,
    factories: HashMap<String, Arc<dyn MockFactory>>,
}

impl MockRegistryBuilder {
    /// Register every keyword of a provider
    ///
    /// Keys are uppercased; the first registration of a key wins.
    #[must_use]
    pub fn with_keywords(mut self, provider: &dyn CustomKeywordProvider) -> Self {
        for (name, values) in provider.custom_keywords() {
            let key = name.to_uppercase();
            if self.keywords.contains_key(&key) {
                tracing::debug!("Custom keyword {} already registered, keeping first", key);
                continue;
            }
            self.keywords.insert(key, values.into());
        }
        self
    }

    /// Register a single keyword dataset
    #[must_use]
    pub fn with_keyword(mut self, name: &str, values: Vec<Value>) -> Self {
        self.keywords
            .entry(name.to_uppercase())
            .or_insert_with(|| values.into());
        self
    }

    /// Register a factory under its key, replacing any previous one
    #[must_use]
    pub fn with_factory(mut self, factory: Arc<dyn MockFactory>) -> Self {
        self.factories.insert(factory.key().to_string(), factory);
        self
    }

    #[must_use]
    pub fn build(self) -> MockRegistry {
        tracing::debug!(
            "Mock registry built: {} keywords, {} factories",
            self.keywords.len(),
            self.factories.len()
        );
        MockRegistry {
            keywords: self.keywords,
            factories: self.factories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Colors(&'static [&'static str]);

    impl CustomKeywordProvider for Colors {
        fn custom_keywords(&self) -> HashMap<String, Vec<Value>> {
            HashMap::from([(
                "color".to_string(),
                self.0.iter().map(|c| Value::from(*c)).collect(),
            )])
        }
    }

    #[derive(Debug)]
    struct Constant(&'static str, i64);

    impl MockFactory for Constant {
        fn key(&self) -> &str {
            self.0
        }

        fn value(&self) -> Value {
            Value::Long(self.1)
        }
    }

    #[test]
    fn keywords_are_case_insensitive_and_first_wins() {
        let registry = MockRegistry::builder()
            .with_keywords(&Colors(&["red", "blue"]))
            .with_keywords(&Colors(&["green"]))
            .build();
        let values = registry.custom_keyword("Color").unwrap();
        assert_eq!(values.len(), 2);
        assert!(registry.custom_keyword("SIZE").is_none());
    }

    #[test]
    fn factories_replace_by_key() {
        let registry = MockRegistry::builder()
            .with_factory(Arc::new(Constant("answer", 1)))
            .with_factory(Arc::new(Constant("answer", 42)))
            .build();
        assert_eq!(registry.factory("answer").unwrap().value(), Value::Long(42));
        assert!(registry.factory("missing").is_none());
    }
}
