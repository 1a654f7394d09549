//! Bulk population
//!
//! Instantiates every persistable entity type a planned number of times.
//! The first failure aborts the whole run.

use crate::builder::GraphBuilder;
use crate::config::PopulationConfig;
use crate::error::Result;
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use seedgraph_schema::TypeName;
use serde::Serialize;
use std::sync::Arc;

/// Instances created per entity type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PopulationReport {
    pub counts: IndexMap<TypeName, usize>,
}

impl PopulationReport {
    /// Instances created across all types
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Bulk population driver
#[derive(Debug, Clone)]
pub struct Populator {
    builder: Arc<GraphBuilder>,
    config: PopulationConfig,
}

impl Populator {
    #[must_use]
    pub fn new(builder: Arc<GraphBuilder>, config: PopulationConfig) -> Self {
        Self { builder, config }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    /// Persistable types with their quantity, in declaration order
    ///
    /// A declared `mock_quantity` wins; otherwise the quantity is drawn from
    /// `[min_quantity, max_quantity)`.
    #[must_use]
    pub fn plan(&self) -> Vec<(TypeName, usize)> {
        let mut rng = match self.builder.config().seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let (min, max) = (self.config.min_quantity, self.config.max_quantity);
        let schema = self.builder.schema();
        schema
            .entity_names()
            .into_iter()
            .filter_map(|name| {
                let descriptor = schema.entity(name.as_str())?;
                if !descriptor.is_persistable() {
                    return None;
                }
                let quantity = descriptor.mock_quantity.unwrap_or_else(|| {
                    if min < max {
                        rng.random_range(min..max)
                    } else {
                        min
                    }
                });
                Some((name, quantity))
            })
            .collect()
    }

    /// Populate every persistable type
    ///
    /// # Errors
    ///
    /// Returns the first [`MockError`](crate::MockError) raised; instances
    /// committed before it are kept.
    pub fn populate(&self) -> Result<PopulationReport> {
        let plan = self.plan();
        let run = |(entity, quantity): &(TypeName, usize)| -> Result<(TypeName, usize)> {
            tracing::info!("populating {} with {} instances", entity, quantity);
            for _ in 0..*quantity {
                self.builder.instantiate(entity.as_str())?;
            }
            Ok((entity.clone(), *quantity))
        };

        let counts = if self.config.parallel {
            plan.par_iter().map(&run).collect::<Result<Vec<_>>>()
        } else {
            plan.iter().map(&run).collect::<Result<Vec<_>>>()
        };
        match counts {
            Ok(counts) => Ok(PopulationReport {
                counts: counts.into_iter().collect(),
            }),
            Err(e) => {
                tracing::warn!("population aborted: {}", e);
                Err(e)
            }
        }
    }

    /// Populate only when the policy is enabled
    ///
    /// # Errors
    ///
    /// See [`Populator::populate`].
    pub fn populate_if_enabled(&self) -> Result<Option<PopulationReport>> {
        if !self.config.enabled {
            tracing::debug!("population disabled");
            return Ok(None);
        }
        self.populate().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::store::MemoryStore;
    use seedgraph_schema::{
        EntityTypeDescriptor, FieldDescriptor, IdentifierKind, ScalarKind, Schema,
    };

    fn populator(config: PopulationConfig) -> (Populator, Arc<MemoryStore>) {
        let id = || {
            FieldDescriptor::scalar("id", ScalarKind::Long).identifier(IdentifierKind::Generated)
        };
        let schema = Schema::new([
            EntityTypeDescriptor::new("Fixed").with_field(id()).with_mock_quantity(3),
            EntityTypeDescriptor::new("Drawn").with_field(id()),
            EntityTypeDescriptor::new("Weak").with_field(id()).with_composite(true),
            EntityTypeDescriptor::new("Hidden").with_field(id()).with_exposed(false),
        ])
        .unwrap();
        let store = Arc::new(MemoryStore::new());
        let builder = GraphBuilder::new(Arc::new(schema), store.clone())
            .with_config(EngineConfig::default().with_seed(3));
        (Populator::new(Arc::new(builder), config), store)
    }

    #[test]
    fn plan_covers_persistable_types_only() {
        let (populator, _) = populator(PopulationConfig::default().with_quantity(4, 6));
        let plan = populator.plan();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0], (TypeName::new("Fixed"), 3));
        assert_eq!(plan[1].0, TypeName::new("Drawn"));
        assert!((4..6).contains(&plan[1].1));
    }

    #[test]
    fn degenerate_bounds_use_minimum() {
        let (populator, _) = populator(PopulationConfig::default().with_quantity(2, 2));
        assert_eq!(populator.plan()[1].1, 2);
    }

    #[test]
    fn populate_reports_counts() {
        for parallel in [false, true] {
            let (populator, store) = populator(
                PopulationConfig::default()
                    .with_quantity(1, 2)
                    .with_parallel(parallel),
            );
            let report = populator.populate().unwrap();
            assert_eq!(report.counts.get("Fixed"), Some(&3));
            assert_eq!(report.counts.get("Drawn"), Some(&1));
            assert_eq!(report.total(), 4);
            assert_eq!(store.total(), 4);
        }
    }

    #[test]
    fn disabled_policy_is_a_no_op() {
        let (populator, store) = populator(PopulationConfig::default());
        assert_eq!(populator.populate_if_enabled().unwrap(), None);
        assert_eq!(store.total(), 0);
    }
}
