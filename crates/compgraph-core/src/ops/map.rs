//! The `Map` operator: 1 row in, 0..N rows out, no buffering.

use std::rc::Rc;

use crate::error::Result;
use crate::row::Row;
use crate::{Mapper, RowStream};

pub fn run_map(upstream: RowStream, mapper: Rc<dyn Mapper>) -> RowStream {
    Box::new(MapIter {
        upstream,
        mapper,
        pending: std::collections::VecDeque::new(),
    })
}

struct MapIter {
    upstream: RowStream,
    mapper: Rc<dyn Mapper>,
    pending: std::collections::VecDeque<Row>,
}

impl Iterator for MapIter {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(Ok(row));
            }
            match self.upstream.next()? {
                Err(e) => return Some(Err(e)),
                Ok(row) => match self.mapper.call(row) {
                    Err(e) => return Some(Err(e)),
                    Ok(rows) => self.pending.extend(rows),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    struct Double;

    impl Mapper for Double {
        fn call(&self, row: Row) -> Result<Vec<Row>> {
            Ok(vec![row.clone(), row])
        }
    }

    #[test]
    fn forwards_every_emitted_row_in_order() {
        let mut a = Row::new();
        a.insert("n", Value::Int(1));
        let mut b = Row::new();
        b.insert("n", Value::Int(2));
        let upstream: RowStream = Box::new(vec![Ok(a), Ok(b)].into_iter());
        let out: Vec<_> = run_map(upstream, Rc::new(Double))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn empty_fan_out_drops_the_row() {
        struct DropAll;
        impl Mapper for DropAll {
            fn call(&self, _row: Row) -> Result<Vec<Row>> {
                Ok(vec![])
            }
        }
        let upstream: RowStream = Box::new(vec![Ok(Row::new())].into_iter());
        let out: Vec<_> = run_map(upstream, Rc::new(DropAll))
            .collect::<Result<_>>()
            .unwrap();
        assert!(out.is_empty());
    }
}
