use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::services::ServeDir;

use crate::game::{GameState, Player, Position, Win, WinReason};
use crate::store::{GameId, GameStore, StoreError};

#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<GameStore>>,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            store: Arc::new(Mutex::new(GameStore::new())),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Deserialize)]
pub struct MoveRequest {
    player: String,
    x: i32,
    y: i32,
}

/// Game state as sent to clients: the store id plus the full record
#[derive(Serialize)]
struct GamePayload {
    id: GameId,
    #[serde(flatten)]
    state: GameState,
}

fn parse_player(s: &str) -> Option<Player> {
    match s.to_lowercase().as_str() {
        "red" => Some(Player::Red),
        "blue" => Some(Player::Blue),
        _ => None,
    }
}

fn game_json(id: GameId, state: GameState, message: Option<String>) -> serde_json::Value {
    let mut value = serde_json::json!({
        "game": GamePayload { id, state },
    });
    if let Some(message) = message {
        value["message"] = serde_json::Value::String(message);
    }
    value
}

fn win_json(id: GameId, state: GameState, win: Win, message: String) -> serde_json::Value {
    serde_json::json!({
        "game": GamePayload { id, state },
        "winner": win.winner,
        "reason": win.reason,
        "message": message,
    })
}

#[axum::debug_handler]
async fn get_current_game(State(app_state): State<AppState>) -> Response {
    let mut store = app_state.store.lock().unwrap();

    match store.current() {
        None => Json(serde_json::json!({
            "game": null,
            "message": "No active game"
        }))
        .into_response(),
        Some((id, game, Some(win))) => {
            // The lazy blocked check fired on this read
            let loser = win.winner.opponent();
            let message = format!(
                "{} wins! {} has no valid moves.",
                win.winner.to_string().to_uppercase(),
                loser.to_string().to_uppercase()
            );
            Json(win_json(id, game, win, message)).into_response()
        }
        Some((id, game, None)) => Json(game_json(id, game, None)).into_response(),
    }
}

#[axum::debug_handler]
async fn new_game(State(app_state): State<AppState>) -> Response {
    let mut store = app_state.store.lock().unwrap();
    let (id, game) = store.new_game();
    Json(game_json(id, game, Some("New game created".to_string()))).into_response()
}

#[axum::debug_handler]
async fn make_move(State(app_state): State<AppState>, Json(req): Json<MoveRequest>) -> Response {
    let Some(player) = parse_player(&req.player) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Player must be \"red\" or \"blue\""
            })),
        )
            .into_response();
    };

    let mut store = app_state.store.lock().unwrap();

    match store.apply_move(player, Position::new(req.x, req.y)) {
        Err(StoreError::NoActiveGame) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "No active game found"
            })),
        )
            .into_response(),
        Err(StoreError::Move(e)) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": e.to_string()
            })),
        )
            .into_response(),
        Ok(outcome) => match outcome.win {
            Some(win) => {
                let message = match win.reason {
                    WinReason::Capture => format!("{} wins by capture!", win.winner),
                    WinReason::Blocked => format!("{} wins by blocked!", win.winner),
                };
                Json(win_json(outcome.id, outcome.game, win, message)).into_response()
            }
            None => Json(game_json(
                outcome.id,
                outcome.game,
                Some("Move successful".to_string()),
            ))
            .into_response(),
        },
    }
}

#[axum::debug_handler]
async fn get_scores(State(app_state): State<AppState>) -> Response {
    let store = app_state.store.lock().unwrap();
    Json(serde_json::json!({ "scores": store.scores() })).into_response()
}

#[axum::debug_handler]
async fn get_history(State(app_state): State<AppState>) -> Response {
    let store = app_state.store.lock().unwrap();
    Json(serde_json::json!({ "history": store.history() })).into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "message": "Knight Chase API is running"
    }))
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/game/current", get(get_current_game))
        .route("/api/game/new", post(new_game))
        .route("/api/game/move", post(make_move))
        .route("/api/game/scores", get(get_scores))
        .route("/api/game/history", get(get_history))
        .route("/health", get(health))
        .nest_service("/", ServeDir::new("static"))
        .with_state(app_state)
}

pub async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    let app = router(AppState::new());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:5001").await?;
    println!("🌐 Web server running at http://127.0.0.1:5001");
    println!("   Open your browser and start playing!");

    axum::serve(listener, app).await?;
    Ok(())
}
