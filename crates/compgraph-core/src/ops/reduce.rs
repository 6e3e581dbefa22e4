//! The `Reduce` operator: partitions a sorted stream into maximal
//! equal-key runs and invokes a [`Reducer`](crate::Reducer) once per run.

use std::rc::Rc;

use crate::error::Result;
use crate::ops::grouping::{pull_group, Lookahead, PendingRows};
use crate::row::Row;
use crate::{Reducer, RowStream};

const OP: &str = "reduce";

pub fn run_reduce(upstream: RowStream, reducer: Rc<dyn Reducer>, keys: Vec<String>) -> RowStream {
    Box::new(ReduceIter {
        lookahead: Lookahead::new(upstream),
        reducer,
        keys,
        stashed: None,
        pending: PendingRows::new(),
        done: false,
    })
}

struct ReduceIter {
    lookahead: Lookahead,
    reducer: Rc<dyn Reducer>,
    keys: Vec<String>,
    stashed: Option<crate::error::Error>,
    pending: PendingRows,
    done: bool,
}

impl Iterator for ReduceIter {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(Ok(row));
            }
            if self.done {
                return None;
            }
            let group = match pull_group(&mut self.lookahead, &self.keys, OP, &mut self.stashed) {
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Ok(Some((_key, group))) => group,
            };
            let mut iter = group.into_iter();
            let mut emitted = PendingRows::new();
            let result = self
                .reducer
                .reduce(&self.keys, &mut iter, &mut |row| emitted.push_back(row));
            self.pending = emitted;
            if let Err(e) = result {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}
