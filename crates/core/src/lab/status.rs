//! Lab order status workflow.
//!
//! | from | to |
//! |---|---|
//! | (new) | RECEIVED, DECLINED |
//! | RECEIVED | IN_PROGRESS, ON_HOLD, DECLINED, EXCEPTION |
//! | IN_PROGRESS | COMPLETED, ON_HOLD, EXCEPTION |
//! | ON_HOLD | IN_PROGRESS, DECLINED |
//! | EXCEPTION | RECEIVED, DECLINED |
//!
//! `COMPLETED` and `DECLINED` are terminal.

use crate::{ClinicError, ClinicResult};
use openmrs::FulfillerStatus;

use FulfillerStatus::{Completed, Declined, Exception, InProgress, OnHold, Received};

/// Statuses an order may move to from `current` (`None` for an order the lab has not touched).
pub fn allowed_transitions(current: Option<FulfillerStatus>) -> &'static [FulfillerStatus] {
    match current {
        None => &[Received, Declined],
        Some(Received) => &[InProgress, OnHold, Declined, Exception],
        Some(InProgress) => &[Completed, OnHold, Exception],
        Some(OnHold) => &[InProgress, Declined],
        Some(Exception) => &[Received, Declined],
        Some(Completed) | Some(Declined) => &[],
    }
}

pub fn is_terminal(status: Option<FulfillerStatus>) -> bool {
    allowed_transitions(status).is_empty()
}

/// # Errors
///
/// Returns [`ClinicError::InvalidInput`] if the move is not allowed, naming both statuses or
/// saying the order is closed.
pub fn check_transition(current: Option<FulfillerStatus>, next: FulfillerStatus) -> ClinicResult<()> {
    if allowed_transitions(current).contains(&next) {
        return Ok(());
    }
    let from = current.map(FulfillerStatus::as_wire).unwrap_or("NEW");
    if is_terminal(current) {
        return Err(ClinicError::InvalidInput(format!(
            "order is {from} and can no longer change"
        )));
    }
    Err(ClinicError::InvalidInput(format!(
        "cannot move order from {from} to {next}"
    )))
}
