pub mod grouping;
pub mod join;
pub mod map;
pub mod reduce;
pub mod sort;
