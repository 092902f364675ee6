//! Domain types: analysis entities and pattern configuration.

pub mod entities;
pub mod patterns;
