use std::collections::{BTreeMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::{Participant, ParticipantId};

/// Fewest participants that can exchange gifts without anyone drawing themselves.
pub const MIN_PARTICIPANTS: usize = 2;

/// The "gives-to" relation, keyed by giver.
pub type Assignment = BTreeMap<ParticipantId, ParticipantId>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("at least 2 participants required, found {found}")]
    InsufficientParticipants { found: usize },
}

/// Draws a single gift-giving cycle through every id in `ids`.
///
/// The roster is shuffled (Fisher-Yates, every order equally likely) and each
/// participant gives to whoever follows them in the shuffled order, wrapping
/// around at the end. The result is one cycle of length `ids.len()`: every id
/// appears once as a giver and once as a receiver, and nobody gives to
/// themselves. Two participants always produce the mutual pair.
///
/// Ids must be distinct. Fewer than [`MIN_PARTICIPANTS`] ids is rejected before
/// any randomness is consumed.
pub fn generate_assignment<R: Rng + ?Sized>(
    ids: &[ParticipantId],
    rng: &mut R,
) -> Result<Assignment, AssignmentError> {
    if ids.len() < MIN_PARTICIPANTS {
        return Err(AssignmentError::InsufficientParticipants { found: ids.len() });
    }
    debug_assert!(
        ids.iter().collect::<HashSet<_>>().len() == ids.len(),
        "participant ids must be distinct"
    );

    let mut order = ids.to_vec();
    order.shuffle(rng);

    let n = order.len();
    Ok((0..n)
        .map(|i| (order[i].clone(), order[(i + 1) % n].clone()))
        .collect())
}

/// Overwrites every participant's receiver with the one in `assignment`.
/// Participants missing from the map end up unassigned.
pub fn apply_assignment(participants: &mut [Participant], assignment: &Assignment) {
    for participant in participants.iter_mut() {
        participant.receiver_id = assignment.get(&participant.id).cloned();
    }
}
