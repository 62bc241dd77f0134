//! Full form reset.

use crate::models::{today, FormState};

/// Return a form to its initial state, dated today.
///
/// Unconditional: earlier merges and user input are all discarded.
pub fn reset_all() -> FormState {
    reset_all_on(&today())
}

/// [`reset_all`] with an explicit date for the default rows.
pub fn reset_all_on(today: &str) -> FormState {
    FormState::new(today)
}
