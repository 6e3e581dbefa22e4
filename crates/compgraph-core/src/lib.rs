//! Core row model, lazy operators and graph runtime behind `compgraph`.
//!
//! A graph is a recipe, not a computation: building one with
//! [`graph::Graph`]'s fluent methods never touches a row. Calling
//! [`graph::Graph::run`] materializes one fresh [`RowStream`] for that
//! call, pulled lazily to its end by the caller.

pub mod error;
pub mod graph;
pub mod joiners;
pub mod json;
pub mod mappers;
mod ops;
pub mod reducers;
pub mod row;
mod source;
pub mod value;

pub use error::{ConfigError, Error, IoError, ParseError, Result, TypeError};
pub use graph::Graph;
pub use row::Row;
pub use source::{SourceFactory, Sources};
pub use value::Value;

/// The lazy stream every operator consumes and produces: a row at a time,
/// fallible, single-pass.
pub type RowStream = Box<dyn Iterator<Item = Result<Row>>>;

/// Knobs for the external sort. See [`ops::sort`] for the run-generation
/// and k-way merge algorithm this configures.
#[derive(Clone, Copy, Debug)]
pub struct SortConfig {
    /// Rows buffered in memory before a run is sorted and spilled to disk.
    pub run_row_budget: usize,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            run_row_budget: 100_000,
        }
    }
}

/// Knobs for the join operator. Join materializes one matched group from
/// each side at a time (see [`ops::join`]); callers are responsible for
/// keeping groups small, but an unexpectedly large one is an operational
/// signal worth surfacing rather than silently eating memory.
#[derive(Clone, Copy, Debug)]
pub struct JoinConfig {
    /// A matched group larger than this many rows logs a `tracing::warn!`
    /// naming the side and size, once per offending group.
    pub warn_group_size: usize,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            warn_group_size: 100_000,
        }
    }
}

/// Common interface implemented by the built-in mappers in
/// [`mappers`](mod@mappers) and by ad hoc closures via the blanket impl
/// below.
pub trait Mapper {
    /// Transform one row into zero, one or several output rows.
    fn call(&self, row: Row) -> Result<Vec<Row>>;
}

impl<F> Mapper for F
where
    F: Fn(Row) -> Result<Vec<Row>>,
{
    fn call(&self, row: Row) -> Result<Vec<Row>> {
        self(row)
    }
}

/// Reduces one maximal run of equal-key rows to zero or more output rows.
/// Invoked once per group by the `Reduce` operator; `keys` are the field
/// names the group shares, `group` yields the group's rows in their
/// original (already-sorted) order.
pub trait Reducer {
    fn reduce(
        &self,
        keys: &[String],
        group: &mut dyn Iterator<Item = Row>,
        emit: &mut dyn FnMut(Row),
    ) -> Result<()>;
}

/// Combines two groups of rows sharing the same join key. See
/// [`joiners`](mod@joiners) for the four shipped strategies.
pub trait Joiner {
    /// Suffixes appended to colliding non-key column names from the left
    /// and right side, respectively, when both groups are non-empty.
    fn suffixes(&self) -> (&str, &str) {
        ("_1", "_2")
    }

    /// Whether an unmatched left group (no row on the right shares its key)
    /// should still be emitted, unsuffixed, rather than dropped.
    fn admits_unmatched_left(&self) -> bool;

    /// Same as [`Joiner::admits_unmatched_left`] but for the right side.
    fn admits_unmatched_right(&self) -> bool;
}
