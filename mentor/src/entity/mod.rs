//! SeaORM entities for the SQLite store

pub mod criterion_scores;
pub mod evaluations;
