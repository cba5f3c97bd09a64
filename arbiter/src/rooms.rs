use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use clap::ValueEnum;
use tacta::{
    AnyShape, DisconnectPolicy, MatchRule, PlacedDots, RemainingDotsPenalty, SameShape,
    ScorePolicy, SessionConfig,
};

use crate::{spawn_room, RecordStore, RoomHandle};

/// Which edge-compatibility rule the rooms play under.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum MatchRuleChoice {
    SameShape,
    AnyShape,
}

impl MatchRuleChoice {
    fn to_rule(self) -> Box<dyn MatchRule> {
        match self {
            MatchRuleChoice::SameShape => Box::new(SameShape),
            MatchRuleChoice::AnyShape => Box::new(AnyShape),
        }
    }
}

/// Which scoring formula applies when a game ends.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScorePolicyChoice {
    PlacedDots,
    RemainingDotsPenalty,
}

impl ScorePolicyChoice {
    fn to_policy(self) -> Box<dyn ScorePolicy> {
        match self {
            ScorePolicyChoice::PlacedDots => Box::new(PlacedDots),
            ScorePolicyChoice::RemainingDotsPenalty => Box::new(RemainingDotsPenalty),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DisconnectChoice {
    Forfeit,
    SkipTurns,
}

impl DisconnectChoice {
    fn to_policy(self) -> DisconnectPolicy {
        match self {
            DisconnectChoice::Forfeit => DisconnectPolicy::Forfeit,
            DisconnectChoice::SkipTurns => DisconnectPolicy::SkipTurns,
        }
    }
}

/// Settings shared by every room this process serves.
#[derive(Clone)]
pub struct ServerConfig {
    pub capacity: usize,
    pub start_players: usize,
    pub hand_size: usize,
    pub draw_on_play: bool,
    pub seed: Option<u64>,
    pub match_rule: MatchRuleChoice,
    pub score_policy: ScorePolicyChoice,
    pub disconnect_policy: DisconnectChoice,
}

impl ServerConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            capacity: self.capacity,
            hand_size: self.hand_size,
            draw_on_play: self.draw_on_play,
            disconnect_policy: self.disconnect_policy.to_policy(),
            match_rule: self.match_rule.to_rule(),
            score_policy: self.score_policy.to_policy(),
        }
    }
}

/// Registry of live rooms. Rooms are created on first use and remove
/// themselves once their last connection is gone; different rooms share no
/// mutable state and run fully in parallel.
pub struct Rooms {
    config: ServerConfig,
    records: RecordStore,
    inner: Mutex<HashMap<String, RoomHandle>>,
}

impl Rooms {
    pub fn new(config: ServerConfig, records: RecordStore) -> Arc<Self> {
        Arc::new(Self {
            config,
            records,
            inner: Mutex::new(HashMap::new()),
        })
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn get_or_spawn(self: &Arc<Self>, room_id: &str) -> RoomHandle {
        let mut rooms = self.inner.lock().unwrap();
        if let Some(handle) = rooms.get(room_id) {
            return handle.clone();
        }
        let registry = Arc::clone(self);
        let id = room_id.to_string();
        let handle = spawn_room(
            id.clone(),
            self.config.clone(),
            self.records.clone(),
            move || registry.remove(&id),
        );
        rooms.insert(room_id.to_string(), handle.clone());
        handle
    }

    fn remove(&self, room_id: &str) {
        self.inner.lock().unwrap().remove(room_id);
    }
}
