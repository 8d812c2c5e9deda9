mod assignment;
mod game;

pub use assignment::{
    apply_assignment, generate_assignment, Assignment, AssignmentError, MIN_PARTICIPANTS,
};
pub use game::{
    normalize_names, parse_roster, Game, GameError, GameSummary, Participant, ParticipantLink,
    DEFAULT_EMOJI,
};

pub type GameId = String;
pub type ParticipantId = String;
