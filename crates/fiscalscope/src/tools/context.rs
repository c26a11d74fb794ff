//! Current dataset of a tool session and the validation cache keyed on it.

use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, ScopeError};
use crate::input::Dataset;
use crate::validation::{FiscalRuleEngine, ValidationResult};

/// Holds the dataset the tools operate on.
///
/// Every replacement bumps the generation, which invalidates anything
/// computed from the previous dataset.
#[derive(Debug, Clone, Default)]
pub struct DataContext {
    dataset: Option<Arc<Dataset>>,
    generation: u64,
}

impl DataContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(dataset: Dataset) -> Self {
        let mut ctx = Self::new();
        ctx.set_dataset(dataset);
        ctx
    }

    /// Replace the dataset and return the new generation.
    pub fn set_dataset(&mut self, dataset: Dataset) -> u64 {
        self.dataset = Some(Arc::new(dataset));
        self.generation += 1;
        debug!(generation = self.generation, "dataset replaced");
        self.generation
    }

    /// Drop the dataset. Also bumps the generation.
    pub fn clear(&mut self) {
        self.dataset = None;
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn dataset(&self) -> Option<&Arc<Dataset>> {
        self.dataset.as_ref()
    }

    /// The loaded dataset, failing when there is none or it has no rows.
    pub fn require_dataset(&self) -> Result<Arc<Dataset>> {
        match &self.dataset {
            None => Err(ScopeError::EmptyData(
                "Nenhum conjunto de dados carregado.".to_string(),
            )),
            Some(dataset) if dataset.row_count() == 0 => Err(ScopeError::EmptyData(
                "O conjunto de dados carregado está vazio.".to_string(),
            )),
            Some(dataset) => Ok(Arc::clone(dataset)),
        }
    }
}

/// Validation results memoized per dataset generation.
#[derive(Debug, Default)]
pub struct ValidationCache {
    engine: FiscalRuleEngine,
    entry: Option<(u64, Arc<Vec<ValidationResult>>)>,
}

impl ValidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom rule engine.
    pub fn with_engine(engine: FiscalRuleEngine) -> Self {
        Self { engine, entry: None }
    }

    /// True when results for the context's current generation are cached.
    pub fn is_fresh(&self, ctx: &DataContext) -> bool {
        matches!(&self.entry, Some((generation, _)) if *generation == ctx.generation())
    }

    /// Cached results, recomputed only when the generation changed.
    ///
    /// Failures are not cached.
    pub fn results(&mut self, ctx: &DataContext) -> Result<Arc<Vec<ValidationResult>>> {
        if let Some((generation, results)) = &self.entry {
            if *generation == ctx.generation() {
                return Ok(Arc::clone(results));
            }
        }

        let dataset = ctx.require_dataset()?;
        let results = Arc::new(self.engine.run(&dataset)?);
        debug!(generation = ctx.generation(), findings = results.len(), "validation cache filled");
        self.entry = Some((ctx.generation(), Arc::clone(&results)));
        Ok(results)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Cell;

    #[test]
    fn test_require_dataset_errors() {
        let mut ctx = DataContext::new();
        assert!(matches!(ctx.require_dataset(), Err(ScopeError::EmptyData(_))));

        ctx.set_dataset(Dataset::new());
        let err = ctx.require_dataset().unwrap_err();
        assert!(err.to_string().contains("vazio"));
    }

    #[test]
    fn test_generation_bumps() {
        let mut ctx = DataContext::new();
        assert_eq!(ctx.generation(), 0);
        let ds = Dataset::from_columns(vec![("a", vec![Cell::Number(1.0)])]).unwrap();
        assert_eq!(ctx.set_dataset(ds.clone()), 1);
        assert_eq!(ctx.set_dataset(ds), 2);
        ctx.clear();
        assert_eq!(ctx.generation(), 3);
        assert!(ctx.dataset().is_none());
    }

    #[test]
    fn test_cache_does_not_store_failures() {
        let ds = Dataset::from_columns(vec![("a", vec![Cell::Number(1.0)])]).unwrap();
        let ctx = DataContext::with_dataset(ds);
        let mut cache = ValidationCache::new();
        assert!(cache.results(&ctx).is_err());
        assert!(!cache.is_fresh(&ctx));
    }
}
