//! Seedgraph Reference Data
//!
//! Realistic scalar sources for the mocking engine.
//!
//! # Core Concepts
//!
//! - [`ReferenceData`]: keyword values, dates, paragraphs and passwords
//! - [`Corpus`]: embedded or file-loaded word lists by [`Category`]
//! - [`MockRegistry`]: custom keyword datasets and mock factories, built once
//!
//! # Example
//!
//! ```rust,ignore
//! use seedgraph_data::prelude::*;
//!
//! let corpus = Corpus::builtin();
//! let city = corpus.keyword(Keyword::City, &mut rand::rng());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod corpus;
pub mod error;
pub mod generators;
pub mod registry;

pub use corpus::{Category, Corpus, ReferenceData};
pub use error::{DataError, Result};
pub use registry::{CustomKeywordProvider, MockFactory, MockRegistry, MockRegistryBuilder};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    pub use crate::corpus::{Category, Corpus, ReferenceData};
    pub use crate::error::DataError;
    pub use crate::registry::{CustomKeywordProvider, MockFactory, MockRegistry};
    pub use seedgraph_schema::Keyword;
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn corpus_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        std::fs::write(&path, r#"{"companies": ["Acme"]}"#).unwrap();
        let corpus = Corpus::load(&path).unwrap();
        assert_eq!(corpus.list(Category::Company), ["Acme".to_string()]);

        let bad = dir.path().join("corpus.csv");
        std::fs::write(&bad, "").unwrap();
        assert!(matches!(
            Corpus::load(&bad),
            Err(DataError::UnsupportedFormat(_))
        ));
    }
}
