#![forbid(unsafe_code)]

pub mod catalog;
pub mod evaluator;
pub mod model;
pub mod sequencer;
pub mod time;

pub use catalog::Catalog;
pub use time::Clock;
