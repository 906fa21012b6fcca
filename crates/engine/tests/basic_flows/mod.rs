//! Basic flow tests for the engine crate.
//! These tests exercise the public facade end to end.

mod assessment_flows;
mod validation_flows;

pub use assessment_flows::*;
pub use validation_flows::*;
