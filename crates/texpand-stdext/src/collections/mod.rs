pub mod groupingmap;
pub mod interner;
