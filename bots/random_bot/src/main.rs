use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tacta::{legal_placements, AnyShape, MatchRule, ParticipantId, SameShape, ScoreEntry};
use tacta_client_utils::{run, Client, Mirror, PlayIntent};

#[derive(Parser)]
struct Args {
    /// WebSocket endpoint of the arbiter
    #[arg(long, default_value = "ws://127.0.0.1:9090/room")]
    url: String,

    /// Room to join
    #[arg(long, default_value = "lobby")]
    room: String,

    /// Assume the room plays under the permissive any-shape rule
    #[arg(long, default_value_t = false)]
    any_shape: bool,

    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    let rule: Box<dyn MatchRule> = if args.any_shape {
        Box::new(AnyShape)
    } else {
        Box::new(SameShape)
    };

    let mut bot = RandomBot {
        rng: StdRng::seed_from_u64(seed),
        rule,
        fallbacks: Vec::new(),
    };
    let url = format!("{}?id={}", args.url, args.room);
    run(&mut bot, &url).await
}

struct RandomBot {
    rng: StdRng,
    rule: Box<dyn MatchRule>,
    /// Remaining candidate moves for the current snapshot, tried one by one
    /// when the server rejects a proposal (e.g. when it was not our turn).
    fallbacks: Vec<PlayIntent>,
}

impl RandomBot {
    fn plan(&mut self, mirror: &Mirror) -> Option<PlayIntent> {
        let board = mirror.board().ok()?;
        let mut moves: Vec<PlayIntent> = Vec::new();
        for card in mirror.visible_hand() {
            for (coord, orientation) in legal_placements(&board, card, &*self.rule) {
                moves.push(PlayIntent {
                    card_id: card.id,
                    coord,
                    orientation: orientation.as_u8(),
                });
            }
        }
        moves.shuffle(&mut self.rng);
        let next = moves.pop();
        self.fallbacks = moves;
        next
    }
}

impl Client for RandomBot {
    fn welcomed(&mut self, player_id: ParticipantId, color: &str) {
        eprintln!("joined as {} (id {})", color, player_id.0);
    }

    fn state(&mut self, mirror: &Mirror) -> Option<PlayIntent> {
        self.plan(mirror)
    }

    fn rejected(&mut self, _reason: &str, _mirror: &Mirror) -> Option<PlayIntent> {
        self.fallbacks.pop()
    }

    fn ended(&mut self, scores: &[ScoreEntry]) {
        for entry in scores {
            eprintln!("{}: {}", entry.color, entry.score);
        }
    }
}
