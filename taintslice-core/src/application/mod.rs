//! Application layer: the slice analysis use case.

pub mod use_cases;
