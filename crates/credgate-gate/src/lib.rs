//! Policy gate: turns scan results and gate failures into a single decision.

pub mod decision;
pub mod exit_codes;

pub use decision::{Decision, GateOutcome, PolicyGate, summarize_matches};
pub use exit_codes::{BLOCKED, SUCCESS};
