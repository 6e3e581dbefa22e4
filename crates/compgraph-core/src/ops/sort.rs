//! The external (disk-backed) sort: the only operator that may spill.
//!
//! Run generation buffers up to [`SortConfig::run_row_budget`] rows,
//! stably sorts them by the key tuple and, if more input remains, spills
//! the run to a temp file as one JSON row per line. A k-way merge then
//! drives all runs in lockstep through a min-heap keyed by
//! `(key value, run index)` - the run-index tiebreak is what keeps the
//! merge stable, since runs are spilled in generation (i.e. input) order.
//! If everything fit in the first buffer, the merge is skipped entirely
//! and the sorted buffer is yielded directly (the "small-input fast
//! path" of the design).

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};

use tempfile::TempDir;
use tracing::{debug, trace};

use crate::error::{Error, InternalError, IoError, Result};
use crate::row::Row;
use crate::value::Value;
use crate::{RowStream, SortConfig};

const OP: &str = "sort";

pub fn run_sort(upstream: RowStream, keys: Vec<String>, config: SortConfig) -> RowStream {
    Box::new(SortIter {
        upstream: Some(upstream),
        keys,
        budget: config.run_row_budget.max(1),
        state: State::Buffering {
            buffer: Vec::new(),
            tmp_dir: None,
            run_paths: Vec::new(),
        },
    })
}

enum State {
    /// Pulling rows from upstream, spilling a run whenever the buffer fills.
    Buffering {
        buffer: Vec<Row>,
        tmp_dir: Option<TempDir>,
        run_paths: Vec<std::path::PathBuf>,
    },
    /// Fast path: everything fit in one buffer, already sorted, draining it.
    InMemory(std::vec::IntoIter<Row>),
    /// Draining the k-way merge of one or more spilled runs.
    Merging(Merge),
    Done,
}

struct SortIter {
    upstream: Option<RowStream>,
    keys: Vec<String>,
    budget: usize,
    state: State,
}

impl Iterator for SortIter {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.state {
                State::Done => return None,
                State::InMemory(iter) => {
                    return match iter.next() {
                        Some(row) => Some(Ok(row)),
                        None => {
                            self.state = State::Done;
                            None
                        }
                    }
                }
                State::Merging(merge) => {
                    return match merge.next(&self.keys) {
                        Ok(Some(row)) => Some(Ok(row)),
                        Ok(None) => {
                            self.state = State::Done;
                            None
                        }
                        Err(e) => {
                            self.state = State::Done;
                            Some(Err(e))
                        }
                    }
                }
                State::Buffering { .. } => {
                    if let Err(e) = self.fill_or_finish() {
                        self.state = State::Done;
                        return Some(Err(e));
                    }
                }
            }
        }
    }
}

impl SortIter {
    /// Pull rows into the current buffer until the upstream is exhausted or
    /// the budget is hit; on budget-hit, spill and keep buffering; on
    /// exhaustion, transition into `InMemory` or `Merging`.
    fn fill_or_finish(&mut self) -> Result<()> {
        let State::Buffering {
            buffer,
            tmp_dir,
            run_paths,
        } = &mut self.state
        else {
            unreachable!("caller checked state is Buffering")
        };
        let Some(upstream) = self.upstream.as_mut() else {
            unreachable!("upstream is only taken once, alongside the state transition below")
        };

        loop {
            match upstream.next() {
                None => {
                    // Input exhausted. If we never spilled, take the fast path.
                    if run_paths.is_empty() {
                        let mut owned = std::mem::take(buffer);
                        stable_sort_by_key(&mut owned, &self.keys)?;
                        self.state = State::InMemory(owned.into_iter());
                    } else {
                        if !buffer.is_empty() {
                            spill_run(buffer, &self.keys, tmp_dir, run_paths)?;
                        }
                        let merge = Merge::open(run_paths, &self.keys, tmp_dir.take())?;
                        self.state = State::Merging(merge);
                    }
                    self.upstream = None;
                    return Ok(());
                }
                Some(Err(e)) => return Err(e),
                Some(Ok(row)) => {
                    buffer.push(row);
                    if buffer.len() >= self.budget {
                        spill_run(buffer, &self.keys, tmp_dir, run_paths)?;
                    }
                    return Ok(());
                }
            }
        }
    }
}

fn stable_sort_by_key(rows: &mut [Row], keys: &[String]) -> Result<()> {
    let mut keyed = Vec::with_capacity(rows.len());
    for row in rows.iter() {
        keyed.push(row.key(keys, OP)?);
    }
    let mut indices: Vec<usize> = (0..rows.len()).collect();
    indices.sort_by(|&a, &b| keyed[a].cmp(&keyed[b]));
    let reordered: Vec<Row> = indices.into_iter().map(|i| rows[i].clone()).collect();
    rows.clone_from_slice(&reordered);
    Ok(())
}

fn spill_run(
    buffer: &mut Vec<Row>,
    keys: &[String],
    tmp_dir: &mut Option<TempDir>,
    run_paths: &mut Vec<std::path::PathBuf>,
) -> Result<()> {
    let mut rows = std::mem::take(buffer);
    stable_sort_by_key(&mut rows, keys)?;

    let dir = match tmp_dir {
        Some(dir) => dir,
        None => {
            let dir = tempfile::Builder::new()
                .prefix("compgraph-sort-")
                .tempdir()
                .map_err(|source| IoError::Path {
                    path: std::env::temp_dir(),
                    source,
                })?;
            tmp_dir.get_or_insert(dir)
        }
    };
    let path = dir.path().join(format!("run-{:08}.jsonl", run_paths.len()));
    let file = File::create(&path).map_err(|source| IoError::Path {
        path: path.clone(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    for row in &rows {
        serde_json::to_writer(&mut writer, row).map_err(|e| {
            InternalError(format!("failed to serialize spilled row: {e}"))
        })?;
        writer
            .write_all(b"\n")
            .map_err(|source| IoError::Path { path: path.clone(), source })?;
    }
    writer
        .flush()
        .map_err(|source| IoError::Path { path: path.clone(), source })?;
    debug!(run = run_paths.len(), rows = rows.len(), path = %path.display(), "spilled sort run");
    run_paths.push(path);
    Ok(())
}

/// One spilled run's read side: lines are read and parsed lazily, one row
/// ahead of what the merge has consumed.
struct RunReader {
    lines: std::io::Lines<BufReader<File>>,
}

impl RunReader {
    fn open(path: &std::path::Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| IoError::Path {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
        })
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        match self.lines.next() {
            None => Ok(None),
            Some(Err(e)) => Err(Error::Io(IoError::Other(e))),
            Some(Ok(line)) => serde_json::from_str(&line)
                .map(Some)
                .map_err(|e| InternalError(format!("corrupt sort run: {e}")).into()),
        }
    }
}

struct HeapEntry {
    key: Vec<Value>,
    run_idx: usize,
    row: Row,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.run_idx == other.run_idx
    }
}
impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed so a max-heap (`BinaryHeap`'s only mode) pops the row with the
// smallest key first, and among equal keys the earliest-generated run
// first - preserving the stability the spec requires of the merge.
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.run_idx.cmp(&self.run_idx))
    }
}

struct Merge {
    readers: Vec<RunReader>,
    heap: BinaryHeap<HeapEntry>,
    // Kept alive for the merge's duration and dropped (deleting the spill
    // directory) once the merge itself is dropped or exhausted.
    _tmp_dir: Option<TempDir>,
}

impl Merge {
    fn open(run_paths: &[std::path::PathBuf], keys: &[String], tmp_dir: Option<TempDir>) -> Result<Self> {
        let mut readers = Vec::with_capacity(run_paths.len());
        for path in run_paths {
            readers.push(RunReader::open(path)?);
        }
        trace!(runs = readers.len(), "starting k-way merge");
        let mut merge = Self {
            readers,
            heap: BinaryHeap::new(),
            _tmp_dir: tmp_dir,
        };
        for run_idx in 0..merge.readers.len() {
            merge.refill(run_idx, keys)?;
        }
        Ok(merge)
    }

    fn refill(&mut self, run_idx: usize, keys: &[String]) -> Result<()> {
        if let Some(row) = self.readers[run_idx].next_row()? {
            let key = row.key(keys, OP)?;
            self.heap.push(HeapEntry { key, run_idx, row });
        }
        Ok(())
    }

    fn next(&mut self, keys: &[String]) -> Result<Option<Row>> {
        let Some(HeapEntry { run_idx, row, .. }) = self.heap.pop() else {
            return Ok(None);
        };
        self.refill(run_idx, keys)?;
        Ok(Some(row))
    }
}
