//! The shipped [`Reducer`] library.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::error::Result;
use crate::row::Row;
use crate::value::Value;
use crate::Reducer;

/// Emits only the first row of each group.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstReducer;

impl Reducer for FirstReducer {
    fn reduce(&self, _keys: &[String], group: &mut dyn Iterator<Item = Row>, emit: &mut dyn FnMut(Row)) -> Result<()> {
        if let Some(row) = group.next() {
            emit(row);
        }
        Ok(())
    }
}

/// Emits one row carrying the key fields plus `out = |group|`.
#[derive(Clone, Debug)]
pub struct Count {
    out: String,
}

impl Count {
    #[must_use]
    pub fn new(out: impl Into<String>) -> Self {
        Self { out: out.into() }
    }
}

impl Reducer for Count {
    fn reduce(&self, keys: &[String], group: &mut dyn Iterator<Item = Row>, emit: &mut dyn FnMut(Row)) -> Result<()> {
        let mut out_row: Option<Row> = None;
        let mut count: i64 = 0;
        for row in group {
            if out_row.is_none() {
                out_row = Some(row.project(keys));
            }
            count += 1;
        }
        let mut out_row = out_row.unwrap_or_default();
        out_row.insert(self.out.clone(), Value::Int(count));
        emit(out_row);
        Ok(())
    }
}

/// Emits one row carrying the key fields plus `col = Σ row[col]`.
#[derive(Clone, Debug)]
pub struct Sum {
    col: String,
}

impl Sum {
    #[must_use]
    pub fn new(col: impl Into<String>) -> Self {
        Self { col: col.into() }
    }
}

impl Reducer for Sum {
    fn reduce(&self, keys: &[String], group: &mut dyn Iterator<Item = Row>, emit: &mut dyn FnMut(Row)) -> Result<()> {
        let mut out_row: Option<Row> = None;
        let mut sum = 0.0_f64;
        for row in group {
            if out_row.is_none() {
                out_row = Some(row.project(keys));
            }
            sum += row.require(&self.col, "Sum")?.as_f64("Sum")?;
        }
        let mut out_row = out_row.unwrap_or_default();
        out_row.insert(self.col.clone(), Value::numeric_result(sum));
        emit(out_row);
        Ok(())
    }
}

/// For each distinct value of `word_col` in the group, emits one row with
/// the key fields, `word_col = v`, `out = count(v) / |group|`.
#[derive(Clone, Debug)]
pub struct TermFrequency {
    word_col: String,
    out: String,
}

impl TermFrequency {
    #[must_use]
    pub fn new(word_col: impl Into<String>) -> Self {
        Self::with_out(word_col, "tf")
    }

    #[must_use]
    pub fn with_out(word_col: impl Into<String>, out: impl Into<String>) -> Self {
        Self {
            word_col: word_col.into(),
            out: out.into(),
        }
    }
}

impl Reducer for TermFrequency {
    fn reduce(&self, keys: &[String], group: &mut dyn Iterator<Item = Row>, emit: &mut dyn FnMut(Row)) -> Result<()> {
        let mut key_row: Option<Row> = None;
        let mut counts: HashMap<Value, i64> = HashMap::new();
        let mut total: i64 = 0;
        for row in group {
            if key_row.is_none() {
                key_row = Some(row.project(keys));
            }
            let value = row.require(&self.word_col, "TermFrequency")?.clone();
            *counts.entry(value).or_insert(0) += 1;
            total += 1;
        }
        if total == 0 {
            return Ok(());
        }
        let key_row = key_row.unwrap_or_default();
        for (value, count) in counts {
            let mut out_row = key_row.clone();
            out_row.insert(self.word_col.clone(), value);
            out_row.insert(self.out.clone(), Value::Float(count as f64 / total as f64));
            emit(out_row);
        }
        Ok(())
    }
}

/// Emits the `n` rows with the largest values of `col`. Ties are broken by
/// comparing each row's canonical (field-sorted) representation - `Row`'s
/// own `Ord` impl, since it is backed by a `BTreeMap` - so the choice among
/// tied rows is deterministic rather than dependent on input order. Order
/// of emission is otherwise unspecified.
#[derive(Clone, Debug)]
pub struct TopN {
    col: String,
    n: usize,
}

impl TopN {
    #[must_use]
    pub fn new(col: impl Into<String>, n: usize) -> Self {
        Self { col: col.into(), n }
    }
}

/// Largest-`n` by `(value, row)`; wrapped in `Reverse` so `BinaryHeap::pop`
/// (which removes the greatest `Reverse`, i.e. smallest entry) evicts the
/// weakest candidate once the heap overflows `n`.
struct Entry(Value, Row);

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 == other.1
    }
}
impl Eq for Entry {}
impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0).then_with(|| self.1.cmp(&other.1))
    }
}

impl Reducer for TopN {
    fn reduce(&self, _keys: &[String], group: &mut dyn Iterator<Item = Row>, emit: &mut dyn FnMut(Row)) -> Result<()> {
        if self.n == 0 {
            return Ok(());
        }
        let mut heap: BinaryHeap<Reverse<Entry>> = BinaryHeap::with_capacity(self.n + 1);
        for row in group {
            let value = row.require(&self.col, "TopN")?.clone();
            heap.push(Reverse(Entry(value, row)));
            if heap.len() > self.n {
                heap.pop();
            }
        }
        for Reverse(Entry(_, row)) in heap {
            emit(row);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[(&str, Value)]) -> Row {
        fields.iter().cloned().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn run<R: Reducer>(reducer: &R, keys: &[String], rows: Vec<Row>) -> Vec<Row> {
        let mut out = Vec::new();
        let mut iter = rows.into_iter();
        reducer.reduce(keys, &mut iter, &mut |r| out.push(r)).unwrap();
        out
    }

    #[test]
    fn first_reducer_emits_only_first_row() {
        let rows = vec![row(&[("a", Value::Int(1))]), row(&[("a", Value::Int(2))])];
        let out = run(&FirstReducer, &[], rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn count_carries_key_fields() {
        let rows = vec![
            row(&[("k", Value::Int(1)), ("d", Value::Int(5))]),
            row(&[("k", Value::Int(1)), ("d", Value::Int(6))]),
        ];
        let out = run(&Count::new("d"), &["k".to_string()], rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("k"), Some(&Value::Int(1)));
        assert_eq!(out[0].get("d"), Some(&Value::Int(2)));
    }

    #[test]
    fn sum_accumulates_numeric_column() {
        let rows = vec![
            row(&[("a", Value::Int(1)), ("b", Value::Int(2))]),
            row(&[("a", Value::Int(1)), ("b", Value::Int(3))]),
        ];
        let out = run(&Sum::new("b"), &["a".to_string()], rows);
        assert_eq!(out[0].get("b"), Some(&Value::Int(5)));
    }

    #[test]
    fn term_frequency_divides_by_group_size() {
        let rows = vec![
            row(&[("w", Value::Str("a".into()))]),
            row(&[("w", Value::Str("a".into()))]),
            row(&[("w", Value::Str("b".into()))]),
        ];
        let out = run(&TermFrequency::new("w"), &[], rows);
        let tf_of = |w: &str| {
            out.iter()
                .find(|r| r.get("w") == Some(&Value::Str(w.to_string())))
                .and_then(|r| r.get("tf"))
                .cloned()
        };
        assert_eq!(tf_of("a"), Some(Value::Float(2.0 / 3.0)));
        assert_eq!(tf_of("b"), Some(Value::Float(1.0 / 3.0)));
    }

    #[test]
    fn top_n_keeps_largest_values() {
        let rows = (0..10)
            .map(|n| row(&[("v", Value::Int(n))]))
            .collect::<Vec<_>>();
        let out = run(&TopN::new("v", 3), &[], rows);
        let mut vs: Vec<i64> = out
            .iter()
            .map(|r| match r.get("v") {
                Some(Value::Int(n)) => *n,
                _ => panic!(),
            })
            .collect();
        vs.sort_unstable();
        assert_eq!(vs, vec![7, 8, 9]);
    }

    #[test]
    fn top_n_zero_emits_nothing() {
        let rows = vec![row(&[("v", Value::Int(1))])];
        let out = run(&TopN::new("v", 0), &[], rows);
        assert!(out.is_empty());
    }
}
