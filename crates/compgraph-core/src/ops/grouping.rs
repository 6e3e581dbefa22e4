//! Shared machinery for pulling maximal equal-key runs out of a stream.
//!
//! `Reduce` and the merge-join side of `Join` both assume their input is
//! already sorted by the grouping key and both need to peek one row ahead
//! of the group they're currently building, so the lookahead buffer and the
//! group-pulling loop live here once instead of twice.

use std::collections::VecDeque;

use crate::error::Result;
use crate::row::Row;
use crate::value::Value;
use crate::RowStream;

/// A row stream with one row of lookahead.
pub struct Lookahead {
    inner: RowStream,
    buffered: Option<Result<Row>>,
}

impl Lookahead {
    pub fn new(inner: RowStream) -> Self {
        Self {
            inner,
            buffered: None,
        }
    }

    pub fn peek(&mut self) -> Option<&Result<Row>> {
        if self.buffered.is_none() {
            self.buffered = self.inner.next();
        }
        self.buffered.as_ref()
    }

    pub fn next(&mut self) -> Option<Result<Row>> {
        self.buffered.take().or_else(|| self.inner.next())
    }
}

/// Pull the next maximal run of rows sharing one key out of `lookahead`.
///
/// `stashed` carries an error discovered while only *peeking* ahead (a key
/// mismatch can't be computed without erroring) so it surfaces on the next
/// call instead of aborting the group already collected this call - the
/// group up to the bad row is still valid output.
pub fn pull_group(
    lookahead: &mut Lookahead,
    keys: &[String],
    op: &'static str,
    stashed: &mut Option<crate::error::Error>,
) -> Result<Option<(Vec<Value>, Vec<Row>)>> {
    if let Some(err) = stashed.take() {
        return Err(err);
    }
    let first = match lookahead.next() {
        None => return Ok(None),
        Some(Err(e)) => return Err(e),
        Some(Ok(row)) => row,
    };
    let key = first.key(keys, op)?;
    let mut group = vec![first];
    loop {
        let belongs = match lookahead.peek() {
            None => false,
            Some(Err(_)) => false,
            Some(Ok(row)) => match row.key(keys, op) {
                Ok(candidate) => candidate == key,
                Err(e) => {
                    *stashed = Some(e);
                    false
                }
            },
        };
        if !belongs {
            break;
        }
        group.push(
            lookahead
                .next()
                .expect("just peeked Some")
                .expect("just peeked Ok"),
        );
    }
    Ok(Some((key, group)))
}

/// A `VecDeque`-backed output buffer shared by the group-driven iterators
/// below: one call to the underlying state machine can produce many rows
/// at once (a whole cartesian join batch, a whole unmatched group), which
/// then drain one at a time through `Iterator::next`.
pub type PendingRows = VecDeque<Row>;
