//! Reference data provider
//!
//! A [`Corpus`] holds the word lists realistic scalars are drawn from. The
//! built-in corpus is small and embedded; larger corpora load from TOML or JSON
//! files with one list per [`Category`].

use crate::error::{DataError, Result};
use crate::generators;
use rand::seq::IndexedRandom;
use rand::RngCore;
use seedgraph_schema::{Keyword, Value};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;

/// Corpus list category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    FirstName,
    LastName,
    Address,
    City,
    State,
    Country,
    Zip,
    Phone,
    Email,
    Website,
    Company,
}

impl Category {
    /// Category backing a list-driven keyword
    #[must_use]
    pub fn for_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::Name => Some(Self::FirstName),
            Keyword::Address => Some(Self::Address),
            Keyword::City => Some(Self::City),
            Keyword::State => Some(Self::State),
            Keyword::Country => Some(Self::Country),
            Keyword::Zip => Some(Self::Zip),
            Keyword::Phone => Some(Self::Phone),
            Keyword::Email => Some(Self::Email),
            Keyword::Company => Some(Self::Company),
            Keyword::Url => Some(Self::Website),
            Keyword::Password | Keyword::PastDate | Keyword::FutureDate | Keyword::Paragraph => {
                None
            }
        }
    }
}

/// Source of realistic scalar values
pub trait ReferenceData: Send + Sync + Debug {
    /// Random entry of a category, `None` when the category is empty
    fn pick(&self, category: Category, rng: &mut dyn RngCore) -> Option<String>;

    fn past_date(&self, rng: &mut dyn RngCore) -> chrono::NaiveDate {
        generators::past_date(rng, generators::today())
    }

    fn future_date(&self, rng: &mut dyn RngCore) -> chrono::NaiveDate {
        generators::future_date(rng, generators::today())
    }

    fn paragraph(&self, rng: &mut dyn RngCore) -> String {
        generators::paragraph(rng)
    }

    fn sentence(&self, rng: &mut dyn RngCore) -> String {
        generators::sentence(rng)
    }

    fn password(&self, rng: &mut dyn RngCore) -> String {
        generators::password(rng)
    }

    fn secure_password(&self, rng: &mut dyn RngCore) -> String {
        generators::secure_password(rng)
    }

    /// Value for a fixed keyword
    ///
    /// Returns `None` only when the keyword's category is empty.
    fn keyword(&self, keyword: Keyword, rng: &mut dyn RngCore) -> Option<Value> {
        if let Some(category) = Category::for_keyword(keyword) {
            return self.pick(category, rng).map(Value::Text);
        }
        Some(match keyword {
            Keyword::Password => Value::Text(self.password(rng)),
            Keyword::PastDate => Value::Date(self.past_date(rng)),
            Keyword::FutureDate => Value::Date(self.future_date(rng)),
            _ => Value::Text(self.paragraph(rng)),
        })
    }
}

/// Word lists by category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Corpus {
    pub first_names: Vec<String>,
    pub last_names: Vec<String>,
    pub addresses: Vec<String>,
    pub cities: Vec<String>,
    pub states: Vec<String>,
    pub countries: Vec<String>,
    pub zip_codes: Vec<String>,
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    pub websites: Vec<String>,
    pub companies: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Corpus {
    /// Embedded corpus
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            first_names: owned(&[
                "James", "Josephine", "Art", "Lenna", "Donette", "Simona", "Mitsue", "Leota",
                "Sage", "Kris", "Minna", "Abel", "Kiley", "Graciela", "Cammy", "Mattie",
            ]),
            last_names: owned(&[
                "Butt", "Darakjy", "Venere", "Paprocki", "Foller", "Morasca", "Tollner",
                "Dilliard", "Wieser", "Marrier", "Amigon", "Maclead", "Caldarera", "Ruta",
            ]),
            addresses: owned(&[
                "6649 N Blue Gum St",
                "4 B Blue Ridge Blvd",
                "8 W Cerritos Ave #54",
                "639 Main St",
                "34 Center St",
                "3 Mcauley Dr",
                "7 Eads St",
                "7 W Jackson Blvd",
                "5 Boston Ave #88",
                "228 Runamuck Pl #2808",
            ]),
            cities: owned(&[
                "New Orleans", "Brighton", "Bridgeport", "Anchorage", "Hamilton", "Ashland",
                "Chicago", "San Jose", "Sioux Falls", "Baltimore",
            ]),
            states: owned(&["LA", "MI", "NJ", "AK", "OH", "MD", "IL", "CA", "SD", "NY"]),
            countries: owned(&[
                "Argentina", "Australia", "Canada", "Denmark", "Estonia", "France", "Ghana",
                "Iceland", "Japan", "Kenya", "Mexico", "Norway", "Portugal", "Uruguay",
            ]),
            zip_codes: owned(&[
                "70116", "48116", "08014", "99501", "45011", "44805", "60632", "95111", "57105",
                "21224",
            ]),
            phones: owned(&[
                "504-621-8927",
                "810-292-9388",
                "856-636-8749",
                "907-385-4412",
                "513-570-1893",
                "419-503-2484",
                "773-573-6914",
                "408-752-3500",
            ]),
            emails: owned(&[
                "jbutt@gmail.com",
                "josephine_darakjy@darakjy.org",
                "art@venere.org",
                "lpaprocki@hotmail.com",
                "donette.foller@cox.net",
                "simona@morasca.com",
                "mitsue_tollner@yahoo.com",
                "leota@hotmail.com",
            ]),
            websites: owned(&[
                "http://www.bentonjohnbjr.com",
                "http://www.chanayjeffreyaesq.com",
                "http://www.chemeljameslcpa.com",
                "http://www.feltzprintingservice.com",
                "http://www.printingdimensions.com",
                "http://www.chapmanrosseesq.com",
                "http://www.morlongassociates.com",
                "http://www.commercialpress.com",
            ]),
            companies: owned(&[
                "Benton, John B Jr",
                "Chanay, Jeffrey A Esq",
                "Chemel, James L Cpa",
                "Feltz Printing Service",
                "Printing Dimensions",
                "Chapman, Ross E Esq",
                "Morlong Associates",
                "Commercial Press",
            ]),
        }
    }

    /// Parse a TOML corpus
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Parse`] on malformed input.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| DataError::Parse(e.to_string()))
    }

    /// Parse a JSON corpus
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Parse`] on malformed input.
    pub fn from_json_str(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| DataError::Parse(e.to_string()))
    }

    /// Load a corpus file by extension
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] when the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|e| DataError::io_error(path, e))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&input),
            Some("json") => Self::from_json_str(&input),
            other => Err(DataError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    /// List backing a category
    #[must_use]
    pub fn list(&self, category: Category) -> &[String] {
        match category {
            Category::FirstName => &self.first_names,
            Category::LastName => &self.last_names,
            Category::Address => &self.addresses,
            Category::City => &self.cities,
            Category::State => &self.states,
            Category::Country => &self.countries,
            Category::Zip => &self.zip_codes,
            Category::Phone => &self.phones,
            Category::Email => &self.emails,
            Category::Website => &self.websites,
            Category::Company => &self.companies,
        }
    }
}

impl ReferenceData for Corpus {
    fn pick(&self, category: Category, rng: &mut dyn RngCore) -> Option<String> {
        self.list(category).choose(rng).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn builtin_covers_every_category() {
        let corpus = Corpus::builtin();
        let mut rng = StdRng::seed_from_u64(1);
        for keyword in Keyword::ALL {
            assert!(corpus.keyword(keyword, &mut rng).is_some(), "{keyword:?}");
        }
    }

    #[test]
    fn empty_category_yields_none() {
        let corpus = Corpus::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(corpus.keyword(Keyword::City, &mut rng), None);
        assert!(matches!(
            corpus.keyword(Keyword::PastDate, &mut rng),
            Some(Value::Date(_))
        ));
    }

    #[test]
    fn name_keyword_draws_first_names() {
        let corpus = Corpus::builtin();
        let mut rng = StdRng::seed_from_u64(3);
        let Some(Value::Text(name)) = corpus.keyword(Keyword::Name, &mut rng) else {
            panic!("name should be text");
        };
        assert!(corpus.first_names.contains(&name));
    }

    #[test]
    fn loads_partial_toml() {
        let corpus = Corpus::from_toml_str(r#"cities = ["Lisbon", "Porto"]"#).unwrap();
        assert_eq!(corpus.list(Category::City).len(), 2);
        assert!(corpus.list(Category::Email).is_empty());
    }
}
