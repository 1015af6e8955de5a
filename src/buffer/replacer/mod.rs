//! Replacement policy implementations (replacers).
//!
//! - [`ClockReplacer`] - CLOCK (second chance) over the descriptor table

mod clock;

pub use clock::ClockReplacer;
