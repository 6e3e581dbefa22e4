//! The `Join` operator: a classic sorted merge-join over two key-sorted
//! streams, driven by a [`Joiner`] strategy.

use std::rc::Rc;

use tracing::warn;

use crate::ops::grouping::{pull_group, Lookahead, PendingRows};
use crate::row::Row;
use crate::value::Value;
use crate::{Joiner, JoinConfig, Result, RowStream};

const OP: &str = "join";

pub fn run_join(
    left: RowStream,
    right: RowStream,
    joiner: Rc<dyn Joiner>,
    keys: Vec<String>,
    config: JoinConfig,
) -> RowStream {
    Box::new(JoinIter {
        left: Lookahead::new(left),
        right: Lookahead::new(right),
        left_stashed: None,
        right_stashed: None,
        left_current: None,
        right_current: None,
        joiner,
        keys,
        config,
        pending: PendingRows::new(),
        done: false,
    })
}

type Group = (Vec<Value>, Vec<Row>);

struct JoinIter {
    left: Lookahead,
    right: Lookahead,
    left_stashed: Option<crate::error::Error>,
    right_stashed: Option<crate::error::Error>,
    /// The current unconsumed group on each side; `None` means "pull a
    /// fresh one", distinct from a pulled-but-exhausted side which is
    /// tracked via `done` once both are `None` *and* their streams are
    /// spent.
    left_current: Option<Group>,
    right_current: Option<Group>,
    joiner: Rc<dyn Joiner>,
    keys: Vec<String>,
    config: JoinConfig,
    pending: PendingRows,
    done: bool,
}

impl Iterator for JoinIter {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(Ok(row));
            }
            if self.done {
                return None;
            }
            match self.step() {
                Ok(true) => {} // produced into self.pending, loop to drain it
                Ok(false) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl JoinIter {
    /// Advance the merge by exactly one group comparison, queuing any rows
    /// it emits into `self.pending`. Returns `Ok(false)` once both sides
    /// are exhausted.
    fn step(&mut self) -> Result<bool> {
        if self.left_current.is_none() {
            self.left_current = pull_group(&mut self.left, &self.keys, OP, &mut self.left_stashed)?;
        }
        if self.right_current.is_none() {
            self.right_current = pull_group(&mut self.right, &self.keys, OP, &mut self.right_stashed)?;
        }

        match (self.left_current.take(), self.right_current.take()) {
            (None, None) => Ok(false),
            (Some((_, a)), None) => {
                self.emit_unmatched_left(a)?;
                Ok(true)
            }
            (None, Some((_, b))) => {
                self.emit_unmatched_right(b)?;
                Ok(true)
            }
            (Some((ka, a)), Some((kb, b))) => {
                match ka.cmp(&kb) {
                    std::cmp::Ordering::Equal => {
                        self.emit_matched(a, b)?;
                    }
                    std::cmp::Ordering::Less => {
                        self.emit_unmatched_left(a)?;
                        self.right_current = Some((kb, b));
                    }
                    std::cmp::Ordering::Greater => {
                        self.emit_unmatched_right(b)?;
                        self.left_current = Some((ka, a));
                    }
                }
                Ok(true)
            }
        }
    }

    fn emit_matched(&mut self, a: Vec<Row>, b: Vec<Row>) -> Result<()> {
        if a.len() > self.config.warn_group_size {
            warn!(side = "left", size = a.len(), "join group exceeds warn_group_size");
        }
        if b.len() > self.config.warn_group_size {
            warn!(side = "right", size = b.len(), "join group exceeds warn_group_size");
        }
        let (suffix_a, suffix_b) = self.joiner.suffixes();
        for row_a in &a {
            for row_b in &b {
                self.pending
                    .push_back(merge_rows(row_a, row_b, &self.keys, suffix_a, suffix_b));
            }
        }
        Ok(())
    }

    fn emit_unmatched_left(&mut self, a: Vec<Row>) -> Result<()> {
        if self.joiner.admits_unmatched_left() {
            self.pending.extend(a);
        }
        Ok(())
    }

    fn emit_unmatched_right(&mut self, b: Vec<Row>) -> Result<()> {
        if self.joiner.admits_unmatched_right() {
            self.pending.extend(b);
        }
        Ok(())
    }
}

/// Merge one matched row pair per the column collision rule: key fields
/// once, non-key fields present on only one side unchanged, non-key fields
/// present on both sides suffixed `_1`/`_2` (or the joiner's configured
/// suffixes).
fn merge_rows(a: &Row, b: &Row, keys: &[String], suffix_a: &str, suffix_b: &str) -> Row {
    let mut out = Row::new();
    for key in keys {
        if let Some(v) = a.get(key) {
            out.insert(key.clone(), v.clone());
        }
    }
    for (field, value) in a.iter() {
        if keys.iter().any(|k| k == field) {
            continue;
        }
        let name = if b.contains(field) {
            format!("{field}{suffix_a}")
        } else {
            field.clone()
        };
        out.insert(name, value.clone());
    }
    for (field, value) in b.iter() {
        if keys.iter().any(|k| k == field) {
            continue;
        }
        let name = if a.contains(field) {
            format!("{field}{suffix_b}")
        } else {
            field.clone()
        };
        out.insert(name, value.clone());
    }
    out
}
