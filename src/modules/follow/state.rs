//! Per-pair follow state machine.
//!
//! Every ordered pair `(follower, followed)` is in exactly one of three
//! states: no edge, a pending request, or a confirmed follow. The storage
//! layer reads the current state under a lock, asks [`transition`] for the
//! next one and writes the [`EdgeChanges`] that connect them.

use serde::Serialize;

use crate::api::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PairState {
    None,
    Pending,
    Confirmed,
}

impl PairState {
    pub fn from_edges(confirmed: bool, pending: bool) -> Result<Self, error::SystemError> {
        match (confirmed, pending) {
            (false, false) => Ok(PairState::None),
            (false, true) => Ok(PairState::Pending),
            (true, false) => Ok(PairState::Confirmed),
            (true, true) => Err(error::SystemError::DatabaseError(
                "follow and follow request coexist for one pair".into(),
            )),
        }
    }

    /// State as displayed from an edge snapshot. A confirmed edge wins over a
    /// pending one.
    pub fn observed(confirmed: bool, pending: bool) -> Self {
        match (confirmed, pending) {
            (true, _) => PairState::Confirmed,
            (false, true) => PairState::Pending,
            (false, false) => PairState::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowAction {
    Request,
    Respond { accept: bool },
    CancelRequest,
    Unfollow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: PairState,
    pub to: PairState,
}

/// Rows to write so that storage moves from `from` to `to`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EdgeChanges {
    pub delete_follow: bool,
    pub delete_request: bool,
    pub insert_follow: bool,
    pub insert_request: bool,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }

    pub fn edge_changes(&self) -> EdgeChanges {
        if !self.changed() {
            return EdgeChanges::default();
        }
        EdgeChanges {
            delete_follow: self.from == PairState::Confirmed,
            delete_request: self.from == PairState::Pending,
            insert_follow: self.to == PairState::Confirmed,
            insert_request: self.to == PairState::Pending,
        }
    }
}

/// `target_private` is the privacy flag of the followed side of the pair.
pub fn transition(
    from: PairState,
    action: FollowAction,
    target_private: bool,
) -> Result<Transition, error::SystemError> {
    use PairState::*;

    let to = match (action, from) {
        (FollowAction::Request, Confirmed) => Confirmed,
        (FollowAction::Request, None | Pending) => {
            if target_private {
                Pending
            } else {
                Confirmed
            }
        }
        (FollowAction::Respond { accept }, Pending) => {
            if accept {
                Confirmed
            } else {
                None
            }
        }
        (FollowAction::Respond { .. }, None | Confirmed) => {
            return Err(error::SystemError::not_found("Follow request not found"));
        }
        (FollowAction::CancelRequest, Pending) => None,
        (FollowAction::Unfollow, Confirmed) => None,
        (FollowAction::CancelRequest | FollowAction::Unfollow, state) => state,
    };

    Ok(Transition { from, to })
}
