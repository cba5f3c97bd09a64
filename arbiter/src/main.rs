use std::net::SocketAddr;
use std::sync::Arc;

use arbiter::{
    serve_socket, DisconnectChoice, MatchRuleChoice, RecordStore, Rooms, ScorePolicyChoice,
    ServerConfig,
};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:9090")]
    listen: SocketAddr,

    /// Maximum number of participants per room
    #[arg(long, default_value_t = 4)]
    capacity: usize,

    /// Number of joined participants that starts a game
    #[arg(long, default_value_t = 2)]
    start_players: usize,

    /// Cards dealt to each participant
    #[arg(long, default_value_t = 5)]
    hand_size: usize,

    /// Deal the mover a replacement card after each accepted placement
    #[arg(long, default_value_t = false)]
    draw_on_play: bool,

    /// RNG seed for deck shuffling
    #[arg(long)]
    seed: Option<u64>,

    /// Edge-compatibility rule
    #[arg(long, value_enum, default_value = "same-shape")]
    match_rule: MatchRuleChoice,

    /// Scoring formula applied when a game ends
    #[arg(long, value_enum, default_value = "placed-dots")]
    score_policy: ScorePolicyChoice,

    /// What happens to a participant who drops mid-game
    #[arg(long, value_enum, default_value = "forfeit")]
    disconnect_policy: DisconnectChoice,

    /// Base URL of the leaderboard record service
    #[arg(long)]
    records_url: Option<String>,

    /// A log level among "off", "error", "warn", "info", "debug", "trace"
    #[arg(short, long, default_value = "info")]
    log_level: LevelFilter,
}

#[derive(Deserialize)]
struct RoomQuery {
    id: String,
}

async fn room_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<RoomQuery>,
    State(rooms): State<Arc<Rooms>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let handle = rooms.get_or_spawn(&query.id);
        serve_socket(socket, handle).await;
    })
}

async fn scores_handler(State(rooms): State<Arc<Rooms>>) -> impl IntoResponse {
    match rooms.records().list().await {
        Ok(records) => Json(records).into_response(),
        Err(err) => {
            warn!(?err, "failed to list score records");
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    initialize_logging(args.log_level);

    let records = match &args.records_url {
        Some(url) => RecordStore::http(url.clone()),
        None => RecordStore::Noop,
    };
    let config = ServerConfig {
        capacity: args.capacity,
        start_players: args.start_players,
        hand_size: args.hand_size,
        draw_on_play: args.draw_on_play,
        seed: args.seed,
        match_rule: args.match_rule,
        score_policy: args.score_policy,
        disconnect_policy: args.disconnect_policy,
    };
    let rooms = Rooms::new(config, records);

    let app = Router::new()
        .route("/room", get(room_handler))
        .route("/scores", get(scores_handler))
        .route("/healthz", get(healthz))
        .with_state(rooms);

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!(addr = %args.listen, "arbiter listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn initialize_logging(level: LevelFilter) {
    let format = tracing_subscriber::fmt::format()
        .with_target(false)
        .compact();

    let filter = Targets::new().with_default(level);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().event_format(format))
        .with(filter)
        .init();
}
