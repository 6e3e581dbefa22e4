//! The shipped [`Mapper`] library: row-level transforms used by the four
//! ready-made pipelines (`compgraph::word_count_graph` and friends) and
//! available standalone to any caller.

use std::rc::Rc;

use time::macros::format_description;
use time::PrimitiveDateTime;

use crate::error::{Result, TypeError};
use crate::row::Row;
use crate::value::Value;
use crate::Mapper;

const TIMESTAMP_FORMAT: &[time::format_description::FormatItem<'_>] =
    format_description!("[year][month][day]T[hour][minute][second].[subsecond digits:1+]");

const EARTH_RADIUS_KM: f64 = 6373.0;

fn one(row: Row) -> Result<Vec<Row>> {
    Ok(vec![row])
}

/// Strips ASCII punctuation from a string field.
#[derive(Clone, Debug)]
pub struct FilterPunctuation {
    col: String,
}

impl FilterPunctuation {
    #[must_use]
    pub fn new(col: impl Into<String>) -> Self {
        Self { col: col.into() }
    }
}

impl Mapper for FilterPunctuation {
    fn call(&self, mut row: Row) -> Result<Vec<Row>> {
        let text = as_str(row.require(&self.col, "FilterPunctuation")?, "FilterPunctuation")?;
        let cleaned: String = text.chars().filter(|c| !c.is_ascii_punctuation()).collect();
        row.insert(self.col.clone(), Value::Str(cleaned));
        one(row)
    }
}

/// Lowercases a string field in place.
#[derive(Clone, Debug)]
pub struct LowerCase {
    col: String,
}

impl LowerCase {
    #[must_use]
    pub fn new(col: impl Into<String>) -> Self {
        Self { col: col.into() }
    }
}

impl Mapper for LowerCase {
    fn call(&self, mut row: Row) -> Result<Vec<Row>> {
        let text = as_str(row.require(&self.col, "LowerCase")?, "LowerCase")?;
        row.insert(self.col.clone(), Value::Str(text.to_lowercase()));
        one(row)
    }
}

/// Splits a string field on whitespace (or a configured separator),
/// emitting one row per token with the token replacing the field.
#[derive(Clone, Debug)]
pub struct Split {
    col: String,
    sep: Option<String>,
}

impl Split {
    #[must_use]
    pub fn new(col: impl Into<String>) -> Self {
        Self {
            col: col.into(),
            sep: None,
        }
    }

    #[must_use]
    pub fn with_separator(col: impl Into<String>, sep: impl Into<String>) -> Self {
        Self {
            col: col.into(),
            sep: Some(sep.into()),
        }
    }
}

impl Mapper for Split {
    fn call(&self, row: Row) -> Result<Vec<Row>> {
        let text = as_str(row.require(&self.col, "Split")?, "Split")?;
        let tokens: Vec<&str> = match &self.sep {
            Some(sep) => text.split(sep.as_str()).filter(|s| !s.is_empty()).collect(),
            None => text.split_whitespace().collect(),
        };
        Ok(tokens
            .into_iter()
            .map(|token| {
                let mut out = row.clone();
                out.insert(self.col.clone(), Value::Str(token.to_string()));
                out
            })
            .collect())
    }
}

/// Writes the product of the listed numeric fields.
#[derive(Clone, Debug)]
pub struct Product {
    cols: Vec<String>,
    out: String,
}

impl Product {
    #[must_use]
    pub fn new(cols: impl IntoIterator<Item = impl Into<String>>, out: impl Into<String>) -> Self {
        Self {
            cols: cols.into_iter().map(Into::into).collect(),
            out: out.into(),
        }
    }
}

impl Mapper for Product {
    fn call(&self, mut row: Row) -> Result<Vec<Row>> {
        let mut product = 1.0_f64;
        for col in &self.cols {
            product *= row.require(col, "Product")?.as_f64("Product")?;
        }
        row.insert(self.out.clone(), Value::numeric_result(product));
        one(row)
    }
}

/// Keeps only rows satisfying `predicate`.
pub struct Filter {
    predicate: Rc<dyn Fn(&Row) -> Result<bool>>,
}

impl Filter {
    #[must_use]
    pub fn new(predicate: Rc<dyn Fn(&Row) -> Result<bool>>) -> Self {
        Self { predicate }
    }
}

impl Mapper for Filter {
    fn call(&self, row: Row) -> Result<Vec<Row>> {
        if (self.predicate)(&row)? {
            one(row)
        } else {
            Ok(vec![])
        }
    }
}

/// Retains only the listed fields. Idempotent: re-applying `Project(cols)`
/// to its own output is a no-op.
#[derive(Clone, Debug)]
pub struct Project {
    cols: Vec<String>,
}

impl Project {
    #[must_use]
    pub fn new(cols: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            cols: cols.into_iter().map(Into::into).collect(),
        }
    }
}

impl Mapper for Project {
    fn call(&self, row: Row) -> Result<Vec<Row>> {
        one(row.project(&self.cols))
    }
}

/// Writes `ln(row[cols[0]] / row[cols[1]])`, e.g. `ln(N / N_w)` for IDF.
#[derive(Clone, Debug)]
pub struct IDF {
    numerator: String,
    denominator: String,
    out: String,
}

impl IDF {
    #[must_use]
    pub fn new(numerator: impl Into<String>, denominator: impl Into<String>, out: impl Into<String>) -> Self {
        Self {
            numerator: numerator.into(),
            denominator: denominator.into(),
            out: out.into(),
        }
    }
}

impl Mapper for IDF {
    fn call(&self, mut row: Row) -> Result<Vec<Row>> {
        let n = row.require(&self.numerator, "IDF")?.as_f64("IDF")?;
        let nw = row.require(&self.denominator, "IDF")?.as_f64("IDF")?;
        row.insert(self.out.clone(), Value::Float((n / nw).ln()));
        one(row)
    }
}

/// Writes `ln(row[cols[0]] / row[cols[1]])`, e.g. `ln(p_x / p_all)` for PMI.
#[derive(Clone, Debug)]
pub struct PMI {
    numerator: String,
    denominator: String,
    out: String,
}

impl PMI {
    #[must_use]
    pub fn new(cols: [impl Into<String>; 2], out: impl Into<String>) -> Self {
        let [numerator, denominator] = cols;
        Self {
            numerator: numerator.into(),
            denominator: denominator.into(),
            out: out.into(),
        }
    }
}

impl Mapper for PMI {
    fn call(&self, mut row: Row) -> Result<Vec<Row>> {
        let px = row.require(&self.numerator, "PMI")?.as_f64("PMI")?;
        let p_all = row.require(&self.denominator, "PMI")?.as_f64("PMI")?;
        row.insert(self.out.clone(), Value::Float((px / p_all).ln()));
        one(row)
    }
}

/// Emits the row `row[col]` times with `col` removed, undoing a prior
/// aggregation. `col` must hold a non-negative integer; anything else is a
/// `TypeError` (an unspecified input per the source's design notes, so we
/// surface it rather than guess).
#[derive(Clone, Debug)]
pub struct Reveal {
    col: String,
}

impl Reveal {
    #[must_use]
    pub fn new(col: impl Into<String>) -> Self {
        Self { col: col.into() }
    }
}

impl Mapper for Reveal {
    fn call(&self, mut row: Row) -> Result<Vec<Row>> {
        let times = match row.require(&self.col, "Reveal")? {
            Value::Int(n) if *n >= 0 => *n as usize,
            other => {
                return Err(TypeError {
                    op: "Reveal",
                    message: format!(
                        "expected a non-negative integer count, found {}",
                        other.kind()
                    ),
                }
                .into())
            }
        };
        row.remove(&self.col);
        Ok(std::iter::repeat(row).take(times).collect())
    }
}

/// Negates a numeric field, preserving its `Int`/`Float` variant.
#[derive(Clone, Debug)]
pub struct Inverse {
    col: String,
}

impl Inverse {
    #[must_use]
    pub fn new(col: impl Into<String>) -> Self {
        Self { col: col.into() }
    }
}

impl Mapper for Inverse {
    fn call(&self, mut row: Row) -> Result<Vec<Row>> {
        let negated = match row.require(&self.col, "Inverse")? {
            Value::Int(n) => Value::Int(-n),
            Value::Float(f) => Value::Float(-f),
            other => {
                return Err(TypeError {
                    op: "Inverse",
                    message: format!("expected a numeric field, found {}", other.kind()),
                }
                .into())
            }
        };
        row.insert(self.col.clone(), negated);
        one(row)
    }
}

/// Computes hours between two `%Y%m%dT%H%M%S.%f`-formatted timestamp
/// fields.
#[derive(Clone, Debug)]
pub struct GetDuration {
    start: String,
    leave: String,
    out: String,
}

impl GetDuration {
    #[must_use]
    pub fn new(start: impl Into<String>, leave: impl Into<String>, out: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            leave: leave.into(),
            out: out.into(),
        }
    }
}

impl Mapper for GetDuration {
    fn call(&self, mut row: Row) -> Result<Vec<Row>> {
        let start = parse_timestamp(as_str(row.require(&self.start, "GetDuration")?, "GetDuration")?)?;
        let leave = parse_timestamp(as_str(row.require(&self.leave, "GetDuration")?, "GetDuration")?)?;
        let hours = (leave - start).as_seconds_f64() / 3600.0;
        row.insert(self.out.clone(), Value::Float(hours));
        one(row)
    }
}

/// Writes a three-letter English weekday and an integer hour, both read
/// off a `%Y%m%dT%H%M%S.%f`-formatted timestamp field.
#[derive(Clone, Debug)]
pub struct GetWeekdayAndHour {
    t: String,
    weekday_out: String,
    hour_out: String,
}

impl GetWeekdayAndHour {
    #[must_use]
    pub fn new(t: impl Into<String>, weekday_out: impl Into<String>, hour_out: impl Into<String>) -> Self {
        Self {
            t: t.into(),
            weekday_out: weekday_out.into(),
            hour_out: hour_out.into(),
        }
    }
}

impl Mapper for GetWeekdayAndHour {
    fn call(&self, mut row: Row) -> Result<Vec<Row>> {
        let dt = parse_timestamp(as_str(row.require(&self.t, "GetWeekdayAndHour")?, "GetWeekdayAndHour")?)?;
        row.insert(self.weekday_out.clone(), Value::Str(weekday_abbrev(dt.weekday())));
        row.insert(self.hour_out.clone(), Value::Int(i64::from(dt.hour())));
        one(row)
    }
}

/// Computes great-circle distance in kilometres between two coordinate
/// fields, each `[longitude, latitude]` in degrees (a `Coord` or a
/// two-element numeric `List`).
#[derive(Clone, Debug)]
pub struct GetHaversineDist {
    start: String,
    end: String,
    out: String,
}

impl GetHaversineDist {
    #[must_use]
    pub fn new(start: impl Into<String>, end: impl Into<String>, out: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            out: out.into(),
        }
    }
}

impl Mapper for GetHaversineDist {
    fn call(&self, mut row: Row) -> Result<Vec<Row>> {
        let (lng1, lat1) = as_coord(row.require(&self.start, "GetHaversineDist")?, "GetHaversineDist")?;
        let (lng2, lat2) = as_coord(row.require(&self.end, "GetHaversineDist")?, "GetHaversineDist")?;
        let dist = haversine_km(lng1, lat1, lng2, lat2);
        row.insert(self.out.clone(), Value::Float(dist));
        one(row)
    }
}

/// Writes `dist / dur`.
#[derive(Clone, Debug)]
pub struct GetAverageSpeed {
    dist: String,
    dur: String,
    out: String,
}

impl GetAverageSpeed {
    #[must_use]
    pub fn new(dist: impl Into<String>, dur: impl Into<String>, out: impl Into<String>) -> Self {
        Self {
            dist: dist.into(),
            dur: dur.into(),
            out: out.into(),
        }
    }
}

impl Mapper for GetAverageSpeed {
    fn call(&self, mut row: Row) -> Result<Vec<Row>> {
        let dist = row.require(&self.dist, "GetAverageSpeed")?.as_f64("GetAverageSpeed")?;
        let dur = row.require(&self.dur, "GetAverageSpeed")?.as_f64("GetAverageSpeed")?;
        row.insert(self.out.clone(), Value::numeric_result(dist / dur));
        one(row)
    }
}

fn as_str<'a>(value: &'a Value, op: &'static str) -> Result<&'a str> {
    match value {
        Value::Str(s) => Ok(s.as_str()),
        other => Err(TypeError {
            op,
            message: format!("expected a string, found {}", other.kind()),
        }
        .into()),
    }
}

fn as_coord(value: &Value, op: &'static str) -> Result<(f64, f64)> {
    match value {
        Value::Coord(a, b) => Ok((*a, *b)),
        Value::List(items) if items.len() == 2 => {
            let a = items[0].as_f64(op)?;
            let b = items[1].as_f64(op)?;
            Ok((a, b))
        }
        other => Err(TypeError {
            op,
            message: format!("expected a coordinate pair, found {}", other.kind()),
        }
        .into()),
    }
}

fn parse_timestamp(s: &str) -> Result<PrimitiveDateTime> {
    PrimitiveDateTime::parse(s, TIMESTAMP_FORMAT).map_err(|e| {
        TypeError {
            op: "timestamp parse",
            message: format!("{s:?} does not match %Y%m%dT%H%M%S.%f: {e}"),
        }
        .into()
    })
}

fn weekday_abbrev(weekday: time::Weekday) -> String {
    use time::Weekday::{Friday, Monday, Saturday, Sunday, Thursday, Tuesday, Wednesday};
    match weekday {
        Monday => "Mon",
        Tuesday => "Tue",
        Wednesday => "Wed",
        Thursday => "Thu",
        Friday => "Fri",
        Saturday => "Sat",
        Sunday => "Sun",
    }
    .to_string()
}

fn haversine_km(lng1: f64, lat1: f64, lng2: f64, lat2: f64) -> f64 {
    let (lat1, lng1, lat2, lng2) = (
        lat1.to_radians(),
        lng1.to_radians(),
        lat2.to_radians(),
        lng2.to_radians(),
    );
    let dlat = lat2 - lat1;
    let dlng = lng2 - lng1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[(&str, Value)]) -> Row {
        fields.iter().cloned().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn filter_punctuation_strips_ascii_punctuation() {
        let r = row(&[("text", Value::Str("Hello, world!".into()))]);
        let out = FilterPunctuation::new("text").call(r).unwrap();
        assert_eq!(out[0].get("text"), Some(&Value::Str("Hello world".into())));
    }

    #[test]
    fn split_emits_one_row_per_token() {
        let r = row(&[("text", Value::Str("hello hello world".into()))]);
        let out = Split::new("text").call(r).unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn project_is_idempotent() {
        let r = row(&[("a", Value::Int(1)), ("b", Value::Int(2))]);
        let once = Project::new(["a"]).call(r).unwrap().remove(0);
        let twice = Project::new(["a"]).call(once.clone()).unwrap().remove(0);
        assert_eq!(once, twice);
    }

    #[test]
    fn inverse_is_its_own_inverse() {
        let r = row(&[("x", Value::Int(5))]);
        let once = Inverse::new("x").call(r).unwrap().remove(0);
        assert_eq!(once.get("x"), Some(&Value::Int(-5)));
        let twice = Inverse::new("x").call(once).unwrap().remove(0);
        assert_eq!(twice.get("x"), Some(&Value::Int(5)));
    }

    #[test]
    fn reveal_repeats_row_and_drops_the_count_column() {
        let r = row(&[("count", Value::Int(3)), ("w", Value::Str("a".into()))]);
        let out = Reveal::new("count").call(r).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].get("count"), None);
    }

    #[test]
    fn reveal_rejects_negative_count() {
        let r = row(&[("count", Value::Int(-1))]);
        let err = Reveal::new("count").call(r).unwrap_err();
        assert!(matches!(err, crate::Error::Type(_)));
    }

    #[test]
    fn reveal_rejects_non_integer_count() {
        let r = row(&[("count", Value::Float(1.5))]);
        let err = Reveal::new("count").call(r).unwrap_err();
        assert!(matches!(err, crate::Error::Type(_)));
    }

    #[test]
    fn haversine_matches_expected_distance() {
        let r = row(&[
            ("start", Value::Coord(37.5, 55.75)),
            ("end", Value::Coord(37.6, 55.75)),
        ]);
        let out = GetHaversineDist::new("start", "end", "distance")
            .call(r)
            .unwrap();
        let Some(Value::Float(dist)) = out[0].get("distance").cloned() else {
            panic!("expected Float")
        };
        assert!((dist - 6.28).abs() / 6.28 < 0.01, "distance was {dist}");
    }

    #[test]
    fn get_duration_computes_hours() {
        let r = row(&[
            ("start", Value::Str("20171020T112238.723000".into())),
            ("leave", Value::Str("20171020T122238.723000".into())),
        ]);
        let out = GetDuration::new("start", "leave", "duration").call(r).unwrap();
        assert_eq!(out[0].get("duration"), Some(&Value::Float(1.0)));
    }

    #[test]
    fn get_weekday_and_hour_reads_the_fields_out() {
        let r = row(&[("t", Value::Str("20171020T112238.723000".into()))]);
        let out = GetWeekdayAndHour::new("t", "weekday", "hour").call(r).unwrap();
        assert_eq!(out[0].get("hour"), Some(&Value::Int(11)));
        assert!(matches!(out[0].get("weekday"), Some(Value::Str(_))));
    }

    #[test]
    fn filter_keeps_only_matching_rows() {
        let mapper = Filter::new(Rc::new(|row: &Row| {
            Ok(matches!(row.get("v"), Some(Value::Int(n)) if *n > 1))
        }));
        assert!(mapper.call(row(&[("v", Value::Int(1))])).unwrap().is_empty());
        assert_eq!(mapper.call(row(&[("v", Value::Int(2))])).unwrap().len(), 1);
    }
}
