//! Domain types: bars and per-instrument histories.

pub mod bar;
pub mod history;

pub use bar::Bar;
pub use history::InstrumentHistory;
