//! The graph builder: an immutable, persistent plan that `run` materializes
//! into a fresh [`RowStream`] on demand.
//!
//! A [`Graph`] never touches a row while it is being built - `.map`,
//! `.reduce`, `.sort` and `.join` each wrap the receiver's plan in one more
//! [`Plan`] node and hand back a brand new `Graph`, leaving the receiver
//! untouched. The plan is shared behind an `Rc` rather than owned, so the
//! same sub-graph can be handed to more than one `.join` call (the plan is
//! a DAG once that happens, not a tree) without cloning it.

use std::path::PathBuf;
use std::rc::Rc;

use crate::error::{ConfigError, Result};
use crate::json::LineParser;
use crate::ops::{join, map, reduce, sort};
use crate::source::{run_file_source, run_iter_source, Sources};
use crate::{Joiner, JoinConfig, Mapper, Reducer, RowStream, SortConfig};

/// One node of a graph's plan. Never constructed directly by callers - use
/// [`Graph`]'s builder methods.
enum Plan {
    IterSource { name: String },
    FileSource { path: PathBuf, parser: LineParser },
    Map { upstream: Rc<Plan>, mapper: Rc<dyn Mapper> },
    Reduce {
        upstream: Rc<Plan>,
        reducer: Rc<dyn Reducer>,
        keys: Vec<String>,
    },
    Sort {
        upstream: Rc<Plan>,
        keys: Vec<String>,
        config: SortConfig,
    },
    Join {
        left: Rc<Plan>,
        right: Rc<Plan>,
        joiner: Rc<dyn Joiner>,
        keys: Vec<String>,
        config: JoinConfig,
    },
}

impl Plan {
    fn run(&self, sources: &Sources) -> Result<RowStream> {
        match self {
            Self::IterSource { name } => run_iter_source(name, sources),
            Self::FileSource { path, parser } => run_file_source(path, Rc::clone(parser)),
            Self::Map { upstream, mapper } => {
                Ok(map::run_map(upstream.run(sources)?, Rc::clone(mapper)))
            }
            Self::Reduce {
                upstream,
                reducer,
                keys,
            } => Ok(reduce::run_reduce(
                upstream.run(sources)?,
                Rc::clone(reducer),
                keys.clone(),
            )),
            Self::Sort {
                upstream,
                keys,
                config,
            } => Ok(sort::run_sort(upstream.run(sources)?, keys.clone(), *config)),
            Self::Join {
                left,
                right,
                joiner,
                keys,
                config,
            } => {
                // Both parents see the same bindings; a source name used by
                // only one side is just never looked up by the other.
                let left_stream = left.run(sources)?;
                let right_stream = right.run(sources)?;
                Ok(join::run_join(
                    left_stream,
                    right_stream,
                    Rc::clone(joiner),
                    keys.clone(),
                    *config,
                ))
            }
        }
    }
}

/// An immutable plan of row operators with one sink: the graph itself.
///
/// Cloning a `Graph` is cheap (it clones an `Rc`) and yields a value that
/// shares the same plan - `run` is the only thing that does real work, and
/// every call to it starts from scratch.
#[derive(Clone)]
pub struct Graph {
    plan: Rc<Plan>,
}

impl Graph {
    /// A source bound at run time: the caller's [`Sources`] passed to
    /// [`Graph::run`] must carry a factory under `name`, invoked fresh on
    /// every run.
    #[must_use]
    pub fn from_iter(name: impl Into<String>) -> Self {
        Self {
            plan: Rc::new(Plan::IterSource { name: name.into() }),
        }
    }

    /// A line-oriented file source: `parser` is applied to each line of
    /// `path`, once per line, and may return either a single row or several.
    #[must_use]
    pub fn from_file(path: impl Into<PathBuf>, parser: LineParser) -> Self {
        Self {
            plan: Rc::new(Plan::FileSource {
                path: path.into(),
                parser,
            }),
        }
    }

    /// Applies `mapper` to every row, forwarding whatever it emits.
    #[must_use]
    pub fn map(&self, mapper: impl Mapper + 'static) -> Self {
        Self {
            plan: Rc::new(Plan::Map {
                upstream: Rc::clone(&self.plan),
                mapper: Rc::new(mapper),
            }),
        }
    }

    /// Partitions the (assumed key-sorted) stream into maximal equal-key
    /// runs and invokes `reducer` once per run. `keys` may be empty (a
    /// single group spanning the whole stream), matching the original
    /// `compgraph` algorithms that reduce a global count with no keys.
    #[must_use]
    pub fn reduce(&self, reducer: impl Reducer + 'static, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            plan: Rc::new(Plan::Reduce {
                upstream: Rc::clone(&self.plan),
                reducer: Rc::new(reducer),
                keys: keys.into_iter().map(Into::into).collect(),
            }),
        }
    }

    /// Stably sorts the stream by `keys`, spilling to disk with the
    /// default [`SortConfig`] if it doesn't fit in one in-memory buffer.
    /// Unlike `reduce`/`join`, an empty key list is rejected: sorting by no
    /// keys can't change anything and is almost certainly a mistake at the
    /// call site, so it's caught here rather than silently passed through
    /// as a no-op.
    pub fn sort(&self, keys: impl IntoIterator<Item = impl Into<String>>) -> Result<Self> {
        self.sort_with_config(keys, SortConfig::default())
    }

    /// Same as [`Graph::sort`] but with an explicit [`SortConfig`], e.g. to
    /// tune the in-memory run budget.
    pub fn sort_with_config(
        &self,
        keys: impl IntoIterator<Item = impl Into<String>>,
        config: SortConfig,
    ) -> Result<Self> {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        if keys.is_empty() {
            return Err(ConfigError::EmptyKeys { op: "sort" }.into());
        }
        Ok(Self {
            plan: Rc::new(Plan::Sort {
                upstream: Rc::clone(&self.plan),
                keys,
                config,
            }),
        })
    }

    /// Merge-joins this graph (the left side) against `other` on `keys`
    /// under `joiner`'s strategy, with the default [`JoinConfig`]. Both
    /// sides are assumed already sorted by `keys`. `other` is held by
    /// shared reference, not consumed: the same sub-graph can be joined
    /// into more than one downstream graph, and each `run` re-executes both
    /// parents independently.
    #[must_use]
    pub fn join(
        &self,
        joiner: impl Joiner + 'static,
        other: &Self,
        keys: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.join_with_config(joiner, other, keys, JoinConfig::default())
    }

    /// Same as [`Graph::join`] but with an explicit [`JoinConfig`], e.g. to
    /// tune the group-size warning threshold.
    #[must_use]
    pub fn join_with_config(
        &self,
        joiner: impl Joiner + 'static,
        other: &Self,
        keys: impl IntoIterator<Item = impl Into<String>>,
        config: JoinConfig,
    ) -> Self {
        Self {
            plan: Rc::new(Plan::Join {
                left: Rc::clone(&self.plan),
                right: Rc::clone(&other.plan),
                joiner: Rc::new(joiner),
                keys: keys.into_iter().map(Into::into).collect(),
                config,
            }),
        }
    }

    /// Materializes a fresh, independent [`RowStream`] for this plan,
    /// threading `sources` to every leaf (including both sides of any join
    /// node). Building the graph did no work; this is where it happens,
    /// lazily, as the returned iterator is pulled.
    pub fn run(&self, sources: &Sources) -> Result<RowStream> {
        self.plan.run(sources)
    }
}

/// Convenience for reading rows straight from a path with the crate's
/// default JSON line parser; used by the `compgraph-cli` binaries and handy
/// in tests.
#[must_use]
pub fn from_json_file(path: impl Into<PathBuf>) -> Graph {
    Graph::from_file(path, crate::json::json_line_parser())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducers::Count;
    use crate::value::Value;
    use std::rc::Rc as StdRc;

    fn row(fields: &[(&str, Value)]) -> crate::Row {
        fields.iter().cloned().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn iter_sources(name: &str, rows: Vec<crate::Row>) -> Sources {
        let rows = StdRc::new(rows);
        Sources::new().with(
            name,
            StdRc::new(move || {
                let rows = StdRc::clone(&rows);
                Box::new((0..rows.len()).map(move |i| rows[i].clone()))
            }),
        )
    }

    #[test]
    fn running_the_same_graph_twice_yields_identical_results() {
        let g = Graph::from_iter("docs").map(crate::mappers::LowerCase::new("text"));
        let sources = iter_sources("docs", vec![row(&[("text", Value::Str("AB".into()))])]);
        let once: Vec<_> = g.run(&sources).unwrap().collect::<Result<_>>().unwrap();
        let twice: Vec<_> = g.run(&sources).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn builder_methods_do_not_mutate_the_receiver() {
        let base = Graph::from_iter("docs");
        let _derived = base.map(crate::mappers::LowerCase::new("text"));
        // `base` must still materialize as the bare source, unaffected by
        // `_derived` having been built from it.
        let sources = iter_sources("docs", vec![row(&[("text", Value::Str("AB".into()))])]);
        let out: Vec<_> = base.run(&sources).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(out[0].get("text"), Some(&Value::Str("AB".into())));
    }

    #[test]
    fn sort_rejects_empty_keys() {
        let g = Graph::from_iter("docs");
        assert!(matches!(
            g.sort(Vec::<String>::new()).unwrap_err(),
            crate::Error::Config(ConfigError::EmptyKeys { .. })
        ));
    }

    #[test]
    fn reduce_accepts_empty_keys_as_a_single_global_group() {
        let g = Graph::from_iter("docs").reduce(Count::new("n"), Vec::<String>::new());
        let sources = iter_sources(
            "docs",
            vec![row(&[("x", Value::Int(1))]), row(&[("x", Value::Int(2))])],
        );
        let out: Vec<_> = g.run(&sources).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("n"), Some(&Value::Int(2)));
    }

    #[test]
    fn join_holds_the_other_side_by_shared_reference() {
        let left = Graph::from_iter("a");
        let right = Graph::from_iter("b");
        let joined = left.join(crate::joiners::InnerJoiner::default(), &right, ["k"]);
        // `right` is still usable standalone after being joined in.
        let sources = Sources::new()
            .with(
                "a",
                StdRc::new(|| Box::new(std::iter::empty()) as Box<dyn Iterator<Item = crate::Row>>),
            )
            .with(
                "b",
                StdRc::new(|| Box::new(std::iter::empty()) as Box<dyn Iterator<Item = crate::Row>>),
            );
        assert!(right.run(&sources).unwrap().next().is_none());
        assert!(joined.run(&sources).unwrap().next().is_none());
    }

    #[test]
    fn missing_source_binding_is_a_config_error() {
        let g = Graph::from_iter("docs");
        let err = g.run(&Sources::new()).unwrap_err();
        assert!(matches!(err, crate::Error::Config(ConfigError::MissingSource { .. })));
    }
}
