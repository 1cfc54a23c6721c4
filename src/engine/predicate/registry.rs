use std::collections::BTreeMap;

use serde_json::Value;

use super::{Predicate, PredicateKind, builtins};
use crate::domain::error::{DefinitionError, PredicateError};

/// Lookup table from predicate name to predicate, resolved at schema build time.
#[derive(Debug, Clone, Default)]
pub struct PredicateRegistry {
    predicates: BTreeMap<String, Predicate>,
}

impl PredicateRegistry {
    /// Registry with no predicates at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry preloaded with every built-in predicate.
    pub fn builtin() -> Self {
        let predicates = builtins::all()
            .into_iter()
            .map(|predicate| (predicate.name().to_string(), predicate))
            .collect();
        Self { predicates }
    }

    /// Adds a custom predicate. Names are unique; built-ins cannot be shadowed.
    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        kind: PredicateKind,
        arity: usize,
        check: F,
    ) -> Result<&Predicate, DefinitionError>
    where
        F: Fn(&Value, &[Value]) -> Result<bool, PredicateError> + Send + Sync + 'static,
    {
        self.insert(Predicate::new(name, kind, arity, check))
    }

    pub fn insert(&mut self, predicate: Predicate) -> Result<&Predicate, DefinitionError> {
        let name = predicate.name().to_string();
        if self.predicates.contains_key(&name) {
            return Err(DefinitionError::DuplicatePredicate { name });
        }
        let inserted: &Predicate = self.predicates.entry(name).or_insert(predicate);
        Ok(inserted)
    }

    pub fn get(&self, name: &str) -> Result<&Predicate, DefinitionError> {
        self.predicates
            .get(name)
            .ok_or_else(|| DefinitionError::UnknownPredicate {
                name: name.to_string(),
            })
    }

    /// Predicates sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates.values()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}
