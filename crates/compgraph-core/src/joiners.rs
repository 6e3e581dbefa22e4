//! The four shipped [`Joiner`] strategies.
//!
//! None of these types do any row merging themselves - [`crate::ops::join`]
//! owns the column-collision and cartesian-product logic common to all
//! four. A `Joiner` only answers two questions: what suffixes to use, and
//! whether an unmatched group on a given side should still be emitted.

use crate::Joiner;

macro_rules! joiner_with_suffixes {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Debug)]
        pub struct $name {
            suffix_a: String,
            suffix_b: String,
        }

        impl $name {
            #[must_use]
            pub fn new(suffix_a: impl Into<String>, suffix_b: impl Into<String>) -> Self {
                Self {
                    suffix_a: suffix_a.into(),
                    suffix_b: suffix_b.into(),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new("_1", "_2")
            }
        }
    };
}

joiner_with_suffixes!(InnerJoiner, "Emits only matched key pairs.");
joiner_with_suffixes!(
    LeftJoiner,
    "Matched pairs, plus unmatched left rows emitted unsuffixed."
);
joiner_with_suffixes!(
    RightJoiner,
    "Matched pairs, plus unmatched right rows emitted unsuffixed."
);
joiner_with_suffixes!(
    OuterJoiner,
    "Matched pairs, plus unmatched rows from both sides emitted unsuffixed."
);

impl Joiner for InnerJoiner {
    fn suffixes(&self) -> (&str, &str) {
        (&self.suffix_a, &self.suffix_b)
    }
    fn admits_unmatched_left(&self) -> bool {
        false
    }
    fn admits_unmatched_right(&self) -> bool {
        false
    }
}

impl Joiner for LeftJoiner {
    fn suffixes(&self) -> (&str, &str) {
        (&self.suffix_a, &self.suffix_b)
    }
    fn admits_unmatched_left(&self) -> bool {
        true
    }
    fn admits_unmatched_right(&self) -> bool {
        false
    }
}

impl Joiner for RightJoiner {
    fn suffixes(&self) -> (&str, &str) {
        (&self.suffix_a, &self.suffix_b)
    }
    fn admits_unmatched_left(&self) -> bool {
        false
    }
    fn admits_unmatched_right(&self) -> bool {
        true
    }
}

impl Joiner for OuterJoiner {
    fn suffixes(&self) -> (&str, &str) {
        (&self.suffix_a, &self.suffix_b)
    }
    fn admits_unmatched_left(&self) -> bool {
        true
    }
    fn admits_unmatched_right(&self) -> bool {
        true
    }
}
