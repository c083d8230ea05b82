pub mod calculator;

pub use calculator::{Calculator, MathOutcome};
