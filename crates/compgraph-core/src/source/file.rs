//! Reading rows from a line-delimited file.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use crate::error::{Error, IoError, Result};
use crate::json::{annotate, LineParser, ParsedLine};
use crate::row::Row;
use crate::RowStream;

pub fn run_file_source(path: &Path, parser: LineParser) -> Result<RowStream> {
    let file = File::open(path).map_err(|source| IoError::Path {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(FileSourceIter {
        source_name: path.display().to_string(),
        lines: BufReader::new(file).lines(),
        line_no: 0,
        parser,
        pending: std::collections::VecDeque::new(),
        done: false,
    }))
}

struct FileSourceIter {
    source_name: String,
    lines: Lines<BufReader<File>>,
    line_no: usize,
    parser: LineParser,
    pending: std::collections::VecDeque<Row>,
    done: bool,
}

impl Iterator for FileSourceIter {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(Ok(row));
            }
            if self.done {
                return None;
            }
            match self.lines.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(Error::Io(IoError::Path {
                        path: PathBuf::from(&self.source_name),
                        source: e,
                    })));
                }
                Some(Ok(line)) => {
                    self.line_no += 1;
                    match (self.parser)(&line) {
                        Err(message) => {
                            self.done = true;
                            return Some(Err(
                                annotate(&self.source_name, self.line_no, message).into()
                            ));
                        }
                        Ok(ParsedLine::Row(row)) => return Some(Ok(row)),
                        Ok(ParsedLine::Rows(rows)) => {
                            self.pending.extend(rows);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::json_line_parser;
    use std::io::Write;

    #[test]
    fn missing_file_is_an_io_error() {
        let err = run_file_source(Path::new("/no/such/file.jsonl"), json_line_parser()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn reads_rows_across_single_and_array_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"a": 1}}"#).unwrap();
        writeln!(file, r#"[{{"a": 2}}, {{"a": 3}}]"#).unwrap();
        let rows: Vec<_> = run_file_source(file.path(), json_line_parser())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn bad_line_is_a_positioned_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"a": 1}}"#).unwrap();
        writeln!(file, "not json").unwrap();
        let err = run_file_source(file.path(), json_line_parser())
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
