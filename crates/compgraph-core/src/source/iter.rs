//! Named, in-memory sources bound at `run` time.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{ConfigError, Result};
use crate::row::Row;
use crate::RowStream;

/// A factory that produces a fresh row iterator each time it is called.
/// Stored behind an `Rc` so the same binding can be cloned into every
/// `run` call without re-wrapping the caller's data.
pub type SourceFactory = Rc<dyn Fn() -> Box<dyn Iterator<Item = Row>>>;

/// The bindings passed to [`crate::graph::Graph::run`], mapping the names
/// used by [`crate::graph::Graph::from_iter`] to concrete data.
#[derive(Clone, Default)]
pub struct Sources(HashMap<String, SourceFactory>);

impl Sources {
    #[must_use]
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Bind `name` to a factory. Overwrites any previous binding for the
    /// same name.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, factory: SourceFactory) -> Self {
        self.0.insert(name.into(), factory);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SourceFactory> {
        self.0.get(name)
    }
}

pub fn run_iter_source(name: &str, sources: &Sources) -> Result<RowStream> {
    let factory = sources
        .get(name)
        .ok_or_else(|| ConfigError::MissingSource {
            name: name.to_string(),
        })?
        .clone();
    let iter = factory();
    Ok(Box::new(iter.map(Ok)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn missing_binding_is_a_config_error() {
        let sources = Sources::new();
        let err = run_iter_source("docs", &sources).unwrap_err();
        assert!(err.to_string().contains("docs"));
    }

    #[test]
    fn bound_source_yields_its_rows() {
        let sources = Sources::new().with(
            "docs",
            Rc::new(|| {
                let mut row = Row::new();
                row.insert("n", Value::Int(1));
                Box::new(std::iter::once(row)) as Box<dyn Iterator<Item = Row>>
            }),
        );
        let rows: Vec<_> = run_iter_source("docs", &sources)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
