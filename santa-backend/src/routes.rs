use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use santa_core::{normalize_names, parse_roster, Game, GameSummary, Participant, ParticipantLink};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/games", get(list_games).post(create_game))
        .route("/games/:id", get(get_game).delete(delete_game))
        .route("/games/:id/participants", post(add_participant))
        .route(
            "/games/:id/participants/:participant_id",
            delete(remove_participant),
        )
        .route("/games/:id/shuffle", post(shuffle_game))
        .route("/games/:id/links", get(list_links))
        .route("/participant/:game_id/:participant_id", get(participant_view))
}

#[derive(Deserialize)]
struct CreateGameRequest {
    name: String,
    #[serde(default)]
    rules: String,
    emoji: Option<String>,
    #[serde(default)]
    participants: Vec<String>,
    /// Free text, one name per line. Appended after `participants`.
    roster: Option<String>,
    seed: Option<u64>,
}

#[derive(Serialize)]
struct CreateGameResponse {
    id: String,
    message: &'static str,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Deserialize)]
struct AddParticipantRequest {
    name: String,
}

#[derive(Deserialize)]
struct ShuffleParams {
    seed: Option<u64>,
}

#[derive(Serialize)]
struct ParticipantView {
    game: GameSummary,
    participant: Option<Participant>,
    receiver: Option<Recipient>,
}

/// Who a participant gives to, without that person's own draw.
#[derive(Serialize)]
struct Recipient {
    id: String,
    name: String,
}

fn rng_for(seed: Option<u64>) -> ChaCha8Rng {
    seed.map(ChaCha8Rng::seed_from_u64)
        .unwrap_or_else(ChaCha8Rng::from_entropy)
}

async fn health_check() -> (StatusCode, String) {
    (StatusCode::OK, "Healthy!".to_string())
}

async fn list_games(_admin: AdminAuth, State(state): State<AppState>) -> Json<Vec<Game>> {
    let games = state.games.read().await;
    let mut listed: Vec<Game> = games.values().cloned().collect();
    listed.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    debug!("listing {} games", listed.len());
    Json(listed)
}

async fn create_game(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Json(payload): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<CreateGameResponse>), ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("name required".into()));
    }

    let mut names = normalize_names(&payload.participants);
    if let Some(roster) = &payload.roster {
        names.extend(parse_roster(roster));
    }
    let participants = names
        .into_iter()
        .map(|name| Participant::new(Uuid::new_v4().to_string(), name))
        .collect();

    let mut rng = rng_for(payload.seed);
    let game = Game::new_assigned(
        Uuid::new_v4().to_string(),
        name,
        payload.rules.trim(),
        payload.emoji.as_deref(),
        participants,
        &mut rng,
    )?;

    let id = game.id.clone();
    info!(
        "created game {id} '{}' with {} participants",
        game.name,
        game.participants.len()
    );
    state.games.write().await.insert(id.clone(), game);
    state.persist().await;

    Ok((
        StatusCode::CREATED,
        Json(CreateGameResponse {
            id,
            message: "Game created",
        }),
    ))
}

async fn get_game(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<Game>, ApiError> {
    let games = state.games.read().await;
    let game = games.get(&game_id).ok_or(ApiError::GameNotFound)?;
    Ok(Json(game.clone()))
}

async fn delete_game(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = state.games.write().await.remove(&game_id);
    if removed.is_none() {
        return Err(ApiError::GameNotFound);
    }
    info!("deleted game {game_id}");
    state.persist().await;

    Ok(Json(MessageResponse {
        message: "Game deleted",
    }))
}

async fn add_participant(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(payload): Json<AddParticipantRequest>,
) -> Result<(StatusCode, Json<Participant>), ApiError> {
    let mut games = state.games.write().await;
    let game = games.get_mut(&game_id).ok_or(ApiError::GameNotFound)?;

    let added = game
        .add_participant(Participant::new(Uuid::new_v4().to_string(), payload.name))?
        .clone();
    info!("added participant {} to game {game_id}", added.id);

    drop(games);
    state.persist().await;

    Ok((StatusCode::CREATED, Json(added)))
}

async fn remove_participant(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path((game_id, participant_id)): Path<(String, String)>,
) -> Result<Json<Participant>, ApiError> {
    let mut games = state.games.write().await;
    let game = games.get_mut(&game_id).ok_or(ApiError::GameNotFound)?;

    let removed = game.remove_participant(&participant_id)?;
    info!("removed participant {participant_id} from game {game_id}");

    drop(games);
    state.persist().await;

    Ok(Json(removed))
}

async fn shuffle_game(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Query(params): Query<ShuffleParams>,
) -> Result<Json<Game>, ApiError> {
    let mut games = state.games.write().await;
    let game = games.get_mut(&game_id).ok_or(ApiError::GameNotFound)?;

    let mut rng = rng_for(params.seed);
    game.reshuffle(&mut rng)?;
    info!(
        "reshuffled game {game_id} across {} participants",
        game.participants.len()
    );

    let response = Json(game.clone());
    drop(games);
    state.persist().await;

    Ok(response)
}

async fn list_links(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<Vec<ParticipantLink>>, ApiError> {
    let games = state.games.read().await;
    let game = games.get(&game_id).ok_or(ApiError::GameNotFound)?;
    Ok(Json(game.participant_links(&state.public_base_url)))
}

/// Public view for one participant: the game without its roster, their own
/// record and whoever they give to.
async fn participant_view(
    State(state): State<AppState>,
    Path((game_id, participant_id)): Path<(String, String)>,
) -> Result<Json<ParticipantView>, ApiError> {
    let games = state.games.read().await;
    let game = games.get(&game_id).ok_or(ApiError::GameNotFound)?;

    let receiver = game.receiver_of(&participant_id).map(|r| Recipient {
        id: r.id.clone(),
        name: r.name.clone(),
    });
    let participant = game.participant(&participant_id).map(|p| Participant {
        receiver_id: receiver.as_ref().map(|r| r.id.clone()),
        ..p.clone()
    });
    debug!("participant view for {participant_id} in game {game_id}");

    Ok(Json(ParticipantView {
        game: game.summary(),
        participant,
        receiver,
    }))
}
