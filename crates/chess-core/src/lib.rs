//! Board rules capability and move-notation parsing shared by the puzzle crates.

pub mod notation;
pub mod rules;

pub use notation::{parse_coordinate, parse_move, parse_san, CanonicalMove, NotationError};
pub use rules::{BoardError, Rules};
