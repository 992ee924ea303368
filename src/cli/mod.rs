//! Command implementations for the nudge binary

mod context;
mod decide;
mod next;
mod state;
mod style;

pub use decide::{run_decide, DecideOptions};
pub use next::{run_next, NextOptions};
pub use state::{run_state_policy, run_state_reset, run_state_show};
