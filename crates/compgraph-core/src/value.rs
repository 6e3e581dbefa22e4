//! The tagged value type every row field holds.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TypeError};

/// A single field's value.
///
/// Variants are deliberately few and deliberately dynamic: a graph never
/// declares a schema, so a `Value` has to be able to hold anything a mapper
/// or a parsed input line might produce. `Coord` exists separately from
/// `List` only because the traffic-speed pipeline treats two-element
/// coordinate pairs specially on the wire (see [`crate::json`]); internally
/// the two variants behave like any other.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Coord(f64, f64),
    List(Vec<Value>),
}

impl Value {
    /// Rank used to order values across variants. Arbitrary but fixed, so
    /// that sort and join keys mixing variants still get a total order.
    const fn rank(&self) -> u8 {
        match self {
            Self::Str(_) => 0,
            Self::Int(_) => 1,
            Self::Float(_) => 2,
            Self::Bool(_) => 3,
            Self::Coord(..) => 4,
            Self::List(_) => 5,
        }
    }

    /// Read this value as `f64`, for the arithmetic mappers. Both `Int` and
    /// `Float` are accepted and promoted; anything else is a `TypeError`.
    pub fn as_f64(&self, op: &'static str) -> Result<f64> {
        match self {
            Self::Int(n) => Ok(*n as f64),
            Self::Float(f) => Ok(*f),
            other => Err(TypeError {
                op,
                message: format!("expected a number, found {}", other.kind()),
            }
            .into()),
        }
    }

    /// Whole `f64`s round-trip as `Int`, matching the shape JSON input of
    /// this kind arrives in; anything with a fractional part stays `Float`.
    /// Shared by the arithmetic mappers and reducers so `Sum`/`Product`/etc.
    /// agree on when a result "is" an integer.
    pub(crate) fn numeric_result(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Self::Int(value as i64)
        } else {
            Self::Float(value)
        }
    }

    /// Short name of the variant, for error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Str(_) => "Str",
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::Bool(_) => "Bool",
            Self::Coord(..) => "Coord",
            Self::List(_) => "List",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_rank = self.rank().cmp(&other.rank());
        if by_rank != Ordering::Equal {
            return by_rank;
        }
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Coord(a1, a2), Self::Coord(b1, b2)) => {
                a1.total_cmp(b1).then_with(|| a2.total_cmp(b2))
            }
            (Self::List(a), Self::List(b)) => a.cmp(b),
            _ => unreachable!("rank comparison already separated the variants"),
        }
    }
}
