use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assignment::{apply_assignment, generate_assignment, Assignment, AssignmentError};
use crate::{GameId, ParticipantId};

pub const DEFAULT_EMOJI: &str = "🎁";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    #[serde(default)]
    pub receiver_id: Option<ParticipantId>,
}

impl Participant {
    pub fn new(id: impl Into<ParticipantId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            receiver_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    pub name: String,
    #[serde(default)]
    pub rules: String,
    #[serde(default = "default_emoji")]
    pub emoji: String,
    pub created_at: DateTime<Utc>,
    /// Insertion order; links are listed in this order.
    pub participants: Vec<Participant>,
}

/// A game without its roster, safe to show to a single participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub id: GameId,
    pub name: String,
    pub rules: String,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantLink {
    pub participant_id: ParticipantId,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("participant not found")]
    ParticipantNotFound,
    #[error("participant already exists")]
    DuplicateParticipant,
    #[error("name required")]
    EmptyName,
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
}

fn default_emoji() -> String {
    DEFAULT_EMOJI.to_string()
}

impl Game {
    /// Creates a game with nobody assigned yet. A blank or missing emoji falls
    /// back to [`DEFAULT_EMOJI`].
    pub fn new(
        id: impl Into<GameId>,
        name: impl Into<String>,
        rules: impl Into<String>,
        emoji: Option<&str>,
        participants: Vec<Participant>,
    ) -> Self {
        let participants = participants
            .into_iter()
            .map(|p| Participant {
                receiver_id: None,
                ..p
            })
            .collect();
        let emoji = emoji
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .unwrap_or_else(default_emoji);

        Self {
            id: id.into(),
            name: name.into(),
            rules: rules.into(),
            emoji,
            created_at: Utc::now(),
            participants,
        }
    }

    /// Creates a game and draws its first assignment.
    pub fn new_assigned<R: Rng + ?Sized>(
        id: impl Into<GameId>,
        name: impl Into<String>,
        rules: impl Into<String>,
        emoji: Option<&str>,
        participants: Vec<Participant>,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        let mut game = Self::new(id, name, rules, emoji, participants);
        game.reshuffle(rng)?;
        Ok(game)
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            rules: self.rules.clone(),
            emoji: self.emoji.clone(),
            created_at: self.created_at,
        }
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Appends a participant. Existing receivers are left alone and the new
    /// participant stays unassigned until the next [`Game::reshuffle`].
    pub fn add_participant(&mut self, participant: Participant) -> Result<&Participant, GameError> {
        let name = participant.name.trim();
        if name.is_empty() {
            return Err(GameError::EmptyName);
        }
        if self.participant(&participant.id).is_some() {
            return Err(GameError::DuplicateParticipant);
        }

        self.participants.push(Participant {
            id: participant.id,
            name: name.to_string(),
            receiver_id: None,
        });
        Ok(&self.participants[self.participants.len() - 1])
    }

    /// Removes a participant. Whoever was giving to them becomes unassigned.
    pub fn remove_participant(&mut self, id: &str) -> Result<Participant, GameError> {
        let index = self
            .participants
            .iter()
            .position(|p| p.id == id)
            .ok_or(GameError::ParticipantNotFound)?;
        let removed = self.participants.remove(index);

        for participant in self.participants.iter_mut() {
            if participant.receiver_id.as_deref() == Some(id) {
                participant.receiver_id = None;
            }
        }
        Ok(removed)
    }

    /// Draws a fresh assignment over the current roster, replacing every
    /// receiver. Nothing from the previous draw is kept.
    pub fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        let ids: Vec<ParticipantId> = self.participants.iter().map(|p| p.id.clone()).collect();
        let assignment = generate_assignment(&ids, rng)?;
        apply_assignment(&mut self.participants, &assignment);
        Ok(())
    }

    /// Who `id` gives to. `None` for unknown or unassigned participants and
    /// for references to someone no longer in the game.
    pub fn receiver_of(&self, id: &str) -> Option<&Participant> {
        let receiver_id = self.participant(id)?.receiver_id.as_deref()?;
        self.participant(receiver_id).filter(|r| r.id != id)
    }

    /// The resolvable part of the current gives-to relation.
    pub fn assignment(&self) -> Assignment {
        self.participants
            .iter()
            .filter_map(|p| self.receiver_of(&p.id).map(|r| (p.id.clone(), r.id.clone())))
            .collect()
    }

    /// True when every participant gives to someone else and receives exactly once.
    pub fn is_fully_assigned(&self) -> bool {
        let assignment = self.assignment();
        if self.participants.len() < crate::MIN_PARTICIPANTS
            || assignment.len() != self.participants.len()
        {
            return false;
        }
        let receivers: HashSet<&ParticipantId> = assignment.values().collect();
        receivers.len() == self.participants.len()
    }

    pub fn participant_links(&self, base_url: &str) -> Vec<ParticipantLink> {
        let base = base_url.trim_end_matches('/');
        self.participants
            .iter()
            .map(|p| ParticipantLink {
                participant_id: p.id.clone(),
                name: p.name.clone(),
                url: format!("{base}/participant/{}/{}", self.id, p.id),
            })
            .collect()
    }
}

/// Trims each name and drops the blank ones, keeping order.
pub fn normalize_names<I>(names: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| n.as_ref().trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

/// One participant per line.
pub fn parse_roster(text: &str) -> Vec<String> {
    normalize_names(text.lines())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn roster(names: &[&str]) -> Vec<Participant> {
        names
            .iter()
            .map(|n| Participant::new(format!("id-{n}"), *n))
            .collect()
    }

    fn assigned_game(names: &[&str], seed: u64) -> Game {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Game::new_assigned("g1", "Office party", "Budget 20", None, roster(names), &mut rng)
            .unwrap()
    }

    #[test]
    fn new_game_is_unassigned_with_default_emoji() {
        let game = Game::new("g1", "Office party", "", Some("  "), roster(&["ann", "bob"]));
        assert_eq!(game.emoji, DEFAULT_EMOJI);
        assert!(game.participants.iter().all(|p| p.receiver_id.is_none()));
        assert!(!game.is_fully_assigned());

        let game = Game::new("g2", "Family", "", Some("🎄"), vec![]);
        assert_eq!(game.emoji, "🎄");
    }

    #[test]
    fn new_game_drops_receivers_passed_in() {
        let mut participants = roster(&["ann", "bob"]);
        participants[0].receiver_id = Some("id-bob".into());
        participants[1].receiver_id = Some("id-ann".into());

        let game = Game::new("g1", "Party", "", None, participants);
        assert!(game.participants.iter().all(|p| p.receiver_id.is_none()));
        assert!(game.receiver_of("id-ann").is_none());
    }

    #[test]
    fn new_assigned_gives_everyone_a_receiver() {
        let game = assigned_game(&["ann", "bob", "cat", "dan"], 3);
        assert!(game.is_fully_assigned());
        for p in &game.participants {
            let receiver = game.receiver_of(&p.id).unwrap();
            assert_ne!(receiver.id, p.id);
        }
    }

    #[test]
    fn new_assigned_rejects_single_participant() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = Game::new_assigned("g1", "Solo", "", None, roster(&["ann"]), &mut rng)
            .unwrap_err();
        assert_eq!(
            err,
            GameError::Assignment(AssignmentError::InsufficientParticipants { found: 1 })
        );
    }

    #[test]
    fn adding_keeps_existing_receivers() {
        let mut game = assigned_game(&["ann", "bob", "cat"], 5);
        let before = game.assignment();

        let added = game
            .add_participant(Participant::new("id-dan", "  dan "))
            .unwrap();
        assert_eq!(added.name, "dan");
        assert!(added.receiver_id.is_none());

        assert_eq!(game.assignment(), before);
        assert!(game.receiver_of("id-dan").is_none());
        assert!(!game.is_fully_assigned());
    }

    #[test]
    fn adding_rejects_blank_and_duplicate() {
        let mut game = Game::new("g1", "Party", "", None, roster(&["ann"]));
        assert_eq!(
            game.add_participant(Participant::new("x", "   ")).unwrap_err(),
            GameError::EmptyName
        );
        assert_eq!(
            game.add_participant(Participant::new("id-ann", "Ann again")).unwrap_err(),
            GameError::DuplicateParticipant
        );
        assert_eq!(game.participants.len(), 1);
    }

    #[test]
    fn removing_leaves_the_giver_unassigned() {
        let mut game = assigned_game(&["ann", "bob", "cat"], 9);
        let giver = game
            .participants
            .iter()
            .find(|p| p.receiver_id.as_deref() == Some("id-bob"))
            .map(|p| p.id.clone())
            .unwrap();

        let removed = game.remove_participant("id-bob").unwrap();
        assert_eq!(removed.name, "bob");
        assert_eq!(game.participants.len(), 2);
        assert!(game.receiver_of(&giver).is_none());
        assert!(!game.is_fully_assigned());

        assert_eq!(
            game.remove_participant("id-bob").unwrap_err(),
            GameError::ParticipantNotFound
        );
    }

    #[test]
    fn dangling_reference_reads_as_unassigned() {
        // Records loaded from storage may still point at someone who left.
        let mut game = Game::new("g1", "Party", "", None, roster(&["ann", "bob"]));
        game.participants[0].receiver_id = Some("id-gone".into());
        game.participants[1].receiver_id = Some("id-ann".into());

        assert!(game.receiver_of("id-ann").is_none());
        assert_eq!(game.receiver_of("id-bob").unwrap().name, "ann");
        assert_eq!(game.assignment().len(), 1);
        assert!(!game.is_fully_assigned());
    }

    #[test]
    fn reshuffle_replaces_the_whole_assignment() {
        let mut game = assigned_game(&["ann", "bob", "cat"], 1);
        game.remove_participant("id-cat").unwrap();
        game.add_participant(Participant::new("id-dan", "dan")).unwrap();
        game.add_participant(Participant::new("id-eve", "eve")).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(2);
        game.reshuffle(&mut rng).unwrap();
        assert!(game.is_fully_assigned());
        assert_eq!(game.assignment().len(), 4);
    }

    #[test]
    fn reshuffle_is_not_idempotent() {
        let names: Vec<String> = (0..10).map(|i| format!("p{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut game = assigned_game(&refs, 11);
        let mut rng = ChaCha8Rng::seed_from_u64(12);

        let mut draws = HashSet::new();
        draws.insert(game.assignment());
        for _ in 0..10 {
            game.reshuffle(&mut rng).unwrap();
            assert!(game.is_fully_assigned());
            draws.insert(game.assignment());
        }
        assert!(draws.len() > 1, "reshuffle kept returning the same assignment");
    }

    #[test]
    fn reshuffle_fails_below_two_and_keeps_state() {
        let mut game = assigned_game(&["ann", "bob"], 4);
        game.remove_participant("id-bob").unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = game.reshuffle(&mut rng).unwrap_err();
        assert_eq!(
            err,
            GameError::Assignment(AssignmentError::InsufficientParticipants { found: 1 })
        );
        assert_eq!(game.participants.len(), 1);
    }

    #[test]
    fn links_follow_roster_order() {
        let game = Game::new("g1", "Party", "", None, roster(&["ann", "bob"]));
        let links = game.participant_links("https://santa.example/");
        assert_eq!(
            links,
            vec![
                ParticipantLink {
                    participant_id: "id-ann".into(),
                    name: "ann".into(),
                    url: "https://santa.example/participant/g1/id-ann".into(),
                },
                ParticipantLink {
                    participant_id: "id-bob".into(),
                    name: "bob".into(),
                    url: "https://santa.example/participant/g1/id-bob".into(),
                },
            ]
        );
    }

    #[test]
    fn roster_text_drops_blank_lines() {
        assert_eq!(
            parse_roster("  ann \n\nbob\r\n   \ncat"),
            vec!["ann", "bob", "cat"]
        );
        assert_eq!(normalize_names(["", " x "]), vec!["x"]);
    }

    #[test]
    fn serializes_camel_case_and_defaults_emoji() {
        let game = assigned_game(&["ann", "bob"], 0);
        let json = serde_json::to_value(&game).unwrap();
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["participants"][0]["receiverId"], "id-bob");

        let stored = serde_json::json!({
            "id": "g9",
            "name": "Old",
            "createdAt": "2024-12-01T10:00:00Z",
            "participants": [{ "id": "a", "name": "Ann" }]
        });
        let game: Game = serde_json::from_value(stored).unwrap();
        assert_eq!(game.emoji, DEFAULT_EMOJI);
        assert_eq!(game.rules, "");
        assert!(game.participants[0].receiver_id.is_none());
    }
}
