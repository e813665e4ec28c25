//! Round-advancement coordinator.
//!
//! Every operation is one optimistic read-modify-write unit against the store:
//! read the game and its latest round record, mutate the game in memory, then
//! commit with a version check. A lost race re-runs the whole unit. A round is
//! calculated inside the same unit that records the last missing submission,
//! so "everyone submitted" and "round calculated" commit together or not at all.
//!
//! Game lifecycle: `Waiting` until every human seat is taken, then
//! `InProgress` collecting decisions for `current_round_number + 1`, and
//! `Finished` once the round limit is calculated.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use furrow_core::{
    adjust_prices, aggregate_harvest, ai_seed, calculate_round, event_seed, expected_yields,
    initial_round, roll_events, AiDecisionMaker, EngineError,
};
use furrow_protocol::{
    wire::hash_bytes_fnv1a64, AiLevel, GameId, GameState, GameStatus, GameSummary, MarketPrices,
    Parcel, PlayerState, PlayerUid, Round, RoundDecision, RoundRecord,
};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::CoordinatorConfig;
use crate::error::{CoordinatorError, CoordinatorResult, StoreError};
use crate::store::{TransactionalStore, Versioned};

const AI_UID_PREFIX: &str = "ai-";
const HOST_SECRET_LEN: usize = 32;

/// Settings chosen by the host when creating a game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Human seats, including the host.
    pub num_players: u32,
    pub num_ai: u32,
    pub num_rounds: u32,
    #[serde(default)]
    pub ai_level_default: AiLevel,
    /// Level per AI seat; seats beyond this list use `ai_level_default`.
    #[serde(default)]
    pub ai_levels: Vec<AiLevel>,
    #[serde(default)]
    pub dynamic_pricing: bool,
    /// Fixed game seed; drawn at random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            num_players: 1,
            num_ai: 3,
            num_rounds: 10,
            ai_level_default: AiLevel::default(),
            ai_levels: Vec::new(),
            dynamic_pricing: false,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedGame {
    pub game_id: GameId,
    /// Shown to the host once; only its hash is stored.
    pub host_secret: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    Submitted,
    /// This submission completed the round; carries the caller's new round.
    Calculated { next_round: Round },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForceOutcome {
    NotDue,
    Forced { round: u32 },
}

/// What a player sees of a game.
#[derive(Clone, Debug, PartialEq)]
pub struct GameView {
    pub summary: GameSummary,
    pub player: PlayerState,
    pub last_round: Round,
}

/// How a transaction step wants to finish.
enum Commit {
    /// Nothing changed.
    Skip,
    Game,
    /// Game plus the newly calculated round record.
    Round(RoundRecord),
}

pub struct RoundCoordinator {
    store: Arc<dyn TransactionalStore>,
    config: CoordinatorConfig,
    clock: Arc<dyn Clock>,
}

impl RoundCoordinator {
    pub fn new(
        store: Arc<dyn TransactionalStore>,
        config: CoordinatorConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn TransactionalStore> {
        &self.store
    }

    pub async fn create_game(
        &self,
        host_uid: PlayerUid,
        config: GameConfig,
    ) -> CoordinatorResult<CreatedGame> {
        self.validate_game_config(&host_uid, &config)?;

        let now = self.clock.now();
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let host_secret = generate_secret();
        let capital = self.config.starting_capital;

        let mut players = BTreeMap::new();
        players.insert(host_uid.clone(), PlayerState::human(host_uid.clone(), capital));
        for seat in 1..=config.num_ai as usize {
            let level = config
                .ai_levels
                .get(seat - 1)
                .copied()
                .unwrap_or(config.ai_level_default);
            let uid = PlayerUid::ai(seat);
            players.insert(uid.clone(), PlayerState::ai(uid, level, capital));
        }

        let status = if config.num_players == 1 {
            GameStatus::InProgress
        } else {
            GameStatus::Waiting
        };
        let mut game = GameState {
            id: GameId::new_random(),
            host_uid: host_uid.clone(),
            host_secret_hash: hash_bytes_fnv1a64(host_secret.as_bytes()),
            status,
            created_at: now,
            seed,
            current_round_number: 0,
            round_limit: config.num_rounds,
            human_slots: config.num_players,
            ai_level_default: config.ai_level_default,
            dynamic_pricing: config.dynamic_pricing,
            players,
            pending_events: roll_events(event_seed(seed, 1)),
            last_market_prices: None,
            round_deadlines: BTreeMap::new(),
        };
        if status == GameStatus::InProgress {
            self.open_deadline(&mut game, now);
        }

        let round_zero = RoundRecord {
            game_id: game.id,
            number: 0,
            events: Default::default(),
            market_prices: None,
            rounds: game
                .players
                .keys()
                .map(|uid| (uid.clone(), initial_round()))
                .collect(),
        };

        let game_id = game.id;
        self.store.insert_game(game, round_zero).await?;
        info!(
            %game_id,
            host = %host_uid,
            humans = config.num_players,
            ai = config.num_ai,
            rounds = config.num_rounds,
            ?status,
            "game created"
        );
        Ok(CreatedGame {
            game_id,
            host_secret,
        })
    }

    fn validate_game_config(
        &self,
        host_uid: &PlayerUid,
        config: &GameConfig,
    ) -> CoordinatorResult<()> {
        check_human_uid(host_uid)?;
        if !(self.config.min_rounds..=self.config.max_rounds).contains(&config.num_rounds) {
            return Err(CoordinatorError::InvalidArgument(format!(
                "num_rounds {} outside {}..={}",
                config.num_rounds, self.config.min_rounds, self.config.max_rounds
            )));
        }
        if config.num_players == 0 {
            return Err(CoordinatorError::InvalidArgument(
                "a game needs at least the host seat".into(),
            ));
        }
        let seats = config.num_players.saturating_add(config.num_ai);
        if seats > self.config.max_players {
            return Err(CoordinatorError::InvalidArgument(format!(
                "{seats} seats exceed the maximum of {}",
                self.config.max_players
            )));
        }
        if config.ai_levels.len() > config.num_ai as usize {
            return Err(CoordinatorError::InvalidArgument(format!(
                "{} AI levels given for {} AI seats",
                config.ai_levels.len(),
                config.num_ai
            )));
        }
        Ok(())
    }

    /// Take a free human seat in a waiting game; the last seat starts it.
    pub async fn join_game(
        &self,
        game_id: GameId,
        uid: PlayerUid,
    ) -> CoordinatorResult<GameSummary> {
        check_human_uid(&uid)?;
        let capital = self.config.starting_capital;
        self.transact(game_id, "join_game", |game, _, now| {
            if game.status != GameStatus::Waiting {
                return Err(CoordinatorError::WrongStatus(game.status));
            }
            if game.players.contains_key(&uid) {
                return Err(CoordinatorError::AlreadyJoined(uid.clone()));
            }
            if game.free_human_slots() == 0 {
                return Err(CoordinatorError::GameFull);
            }
            game.players
                .insert(uid.clone(), PlayerState::human(uid.clone(), capital));
            if game.free_human_slots() == 0 {
                game.status = GameStatus::InProgress;
                self.open_deadline(game, now);
                info!(%game_id, "all seats taken, game started");
            }
            Ok((game.summary(), Commit::Game))
        })
        .await
    }

    pub async fn submit_decision(
        &self,
        game_id: GameId,
        uid: PlayerUid,
        decision: RoundDecision,
    ) -> CoordinatorResult<SubmitOutcome> {
        decision.validate().map_err(EngineError::from)?;

        self.transact(game_id, "submit_decision", |game, latest, now| {
            let round = game.open_round();
            {
                let player = game
                    .players
                    .get(&uid)
                    .ok_or_else(|| CoordinatorError::PlayerNotFound {
                        game_id,
                        uid: uid.clone(),
                    })?;
                if player.is_ai {
                    return Err(CoordinatorError::AiSeat(uid.clone()));
                }
            }
            if game.status != GameStatus::InProgress {
                return Err(CoordinatorError::WrongStatus(game.status));
            }
            if let Some(player) = game.players.get_mut(&uid) {
                if player.has_submitted(round) {
                    return Err(CoordinatorError::AlreadySubmitted {
                        uid: uid.clone(),
                        round,
                    });
                }
                player.submitted_round = Some(round);
                player.pending_decision = Some(decision.clone());
            }

            decide_for_missing(game, latest, false)?;
            if !game.all_submitted() {
                debug!(%game_id, %uid, round, "decision recorded");
                return Ok((SubmitOutcome::Submitted, Commit::Game));
            }

            let record = self.advance_round(game, latest, now)?;
            let next_round = record
                .rounds
                .get(&uid)
                .cloned()
                .ok_or_else(|| CoordinatorError::Internal(format!("no round for {uid}")))?;
            Ok((SubmitOutcome::Calculated { next_round }, Commit::Round(record)))
        })
        .await
    }

    /// Calculate the open round if its deadline has passed, deciding for
    /// everyone who has not submitted.
    pub async fn force_round_on_deadline(
        &self,
        game_id: GameId,
    ) -> CoordinatorResult<ForceOutcome> {
        self.transact(game_id, "force_round_on_deadline", |game, latest, now| {
            if game.status != GameStatus::InProgress {
                return Ok((ForceOutcome::NotDue, Commit::Skip));
            }
            match game.deadline_for_open_round() {
                Some(deadline) if deadline <= now => {}
                _ => return Ok((ForceOutcome::NotDue, Commit::Skip)),
            }

            let round = game.open_round();
            decide_for_missing(game, latest, true)?;
            let record = self.advance_round(game, latest, now)?;
            info!(%game_id, round, "round forced on deadline");
            Ok((ForceOutcome::Forced { round }, Commit::Round(record)))
        })
        .await
    }

    pub async fn get_game_state(
        &self,
        game_id: GameId,
        uid: &PlayerUid,
    ) -> CoordinatorResult<GameView> {
        let game = self.store.read_game(game_id).await?.value;
        let player = game
            .players
            .get(uid)
            .cloned()
            .ok_or_else(|| CoordinatorError::PlayerNotFound {
                game_id,
                uid: uid.clone(),
            })?;
        let last_round = self.player_round(game_id, player.current_round, uid).await?;
        Ok(GameView {
            summary: game.summary(),
            player,
            last_round,
        })
    }

    pub async fn get_round_data(
        &self,
        game_id: GameId,
        round_number: u32,
        uid: &PlayerUid,
    ) -> CoordinatorResult<Round> {
        let game = self.store.read_game(game_id).await?.value;
        if !game.players.contains_key(uid) {
            return Err(CoordinatorError::PlayerNotFound {
                game_id,
                uid: uid.clone(),
            });
        }
        if round_number > game.current_round_number {
            return Err(CoordinatorError::RoundNotFound {
                game_id,
                round: round_number,
            });
        }
        self.player_round(game_id, round_number, uid).await
    }

    async fn player_round(
        &self,
        game_id: GameId,
        number: u32,
        uid: &PlayerUid,
    ) -> CoordinatorResult<Round> {
        let record = self.store.read_round(game_id, number).await?;
        match record.and_then(|mut r| r.rounds.remove(uid)) {
            Some(round) => Ok(round),
            // Players who joined after creation start from the fresh field.
            None if number == 0 => Ok(initial_round()),
            None => Err(CoordinatorError::RoundNotFound {
                game_id,
                round: number,
            }),
        }
    }

    /// Host-only; the game stays readable but accepts no further changes.
    /// Games already in a terminal state cannot be deleted.
    pub async fn delete_game(&self, game_id: GameId, host_secret: &str) -> CoordinatorResult<()> {
        let hash = hash_bytes_fnv1a64(host_secret.as_bytes());
        self.transact(game_id, "delete_game", |game, _, _| {
            if game.host_secret_hash != hash {
                return Err(CoordinatorError::WrongSecret);
            }
            if game.status.is_read_only() {
                return Err(CoordinatorError::WrongStatus(game.status));
            }
            game.status = GameStatus::Deleted;
            info!(%game_id, "game deleted");
            Ok(((), Commit::Game))
        })
        .await
    }

    /// Expire a waiting game whose lobby outlived its TTL. Returns whether it expired.
    pub async fn expire_stale_lobby(&self, game_id: GameId) -> CoordinatorResult<bool> {
        let ttl = chrono::Duration::from_std(self.config.lobby_ttl())
            .map_err(|e| CoordinatorError::Internal(e.to_string()))?;
        self.transact(game_id, "expire_stale_lobby", |game, _, now| {
            if game.status != GameStatus::Waiting || now - game.created_at < ttl {
                return Ok((false, Commit::Skip));
            }
            game.status = GameStatus::Expired;
            info!(%game_id, "lobby expired");
            Ok((true, Commit::Game))
        })
        .await
    }

    /// Run `step` as one optimistic transaction, retrying on version conflicts.
    async fn transact<T, F>(
        &self,
        game_id: GameId,
        op: &'static str,
        mut step: F,
    ) -> CoordinatorResult<T>
    where
        F: FnMut(&mut GameState, &RoundRecord, DateTime<Utc>) -> CoordinatorResult<(T, Commit)>,
    {
        let attempts = self.config.max_transaction_attempts.max(1);
        for attempt in 1..=attempts {
            let Versioned { mut value, version } = self.store.read_game(game_id).await?;
            let latest = self
                .store
                .read_round(game_id, value.current_round_number)
                .await?
                .ok_or_else(|| {
                    CoordinatorError::Internal(format!(
                        "game {game_id} has no record for round {}",
                        value.current_round_number
                    ))
                })?;

            let (result, commit) = step(&mut value, &latest, self.clock.now())?;
            let append = match commit {
                Commit::Skip => return Ok(result),
                Commit::Game => None,
                Commit::Round(record) => Some(record),
            };

            match self.store.write_game_if_unchanged(value, version, append).await {
                Ok(_) => return Ok(result),
                Err(StoreError::Conflict { expected, found }) => {
                    debug!(
                        %game_id,
                        op, attempt, expected, found, "transaction conflict, retrying"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
        warn!(%game_id, op, attempts, "transaction retries exhausted");
        Err(CoordinatorError::RetriesExhausted { attempts })
    }

    /// Calculate the open round for every player and advance the game.
    ///
    /// Every player must already hold a pending decision for the open round.
    fn advance_round(
        &self,
        game: &mut GameState,
        latest: &RoundRecord,
        now: DateTime<Utc>,
    ) -> CoordinatorResult<RoundRecord> {
        let number = game.open_round();
        let inputs = round_inputs(game, latest)?;
        let events = &game.pending_events;
        let limit = game.round_limit;

        let run_pass = |prices: Option<&MarketPrices>| -> Result<Vec<Round>, EngineError> {
            inputs
                .par_iter()
                .map(|input| {
                    calculate_round(
                        number,
                        input.previous,
                        input.decision,
                        events,
                        input.capital,
                        limit,
                        prices,
                    )
                })
                .collect()
        };

        let mut rounds = run_pass(None)?;
        let mut market_prices = None;
        if game.dynamic_pricing {
            let actual = aggregate_harvest(rounds.iter().filter_map(|r| r.result.as_ref()));
            let expected = expected_yields(inputs.iter().map(|input| input.decision));
            let prices = adjust_prices(&actual, &expected);
            rounds = run_pass(Some(&prices))?;
            market_prices = Some(prices);
        }

        let uids: Vec<PlayerUid> = inputs.iter().map(|input| input.uid.clone()).collect();
        drop(inputs);

        let record = RoundRecord {
            game_id: game.id,
            number,
            events: game.pending_events.clone(),
            market_prices: market_prices.clone(),
            rounds: uids.into_iter().zip(rounds).collect(),
        };

        for (uid, round) in &record.rounds {
            let player = game
                .players
                .get_mut(uid)
                .ok_or_else(|| CoordinatorError::Internal(format!("player {uid} vanished")))?;
            if let Some(result) = &round.result {
                player.capital = result.capital;
            }
            player.current_round = number;
            player.history.push(round.lightweight());
            player.submitted_round = None;
            player.pending_decision = None;
        }

        if market_prices.is_some() {
            game.last_market_prices = market_prices;
        }
        game.current_round_number = number;
        if number >= game.round_limit {
            game.status = GameStatus::Finished;
            info!(game_id = %game.id, round = number, "final round calculated, game finished");
        } else {
            game.pending_events = roll_events(event_seed(game.seed, number + 1));
            self.open_deadline(game, now);
            info!(
                game_id = %game.id,
                round = number,
                players = record.rounds.len(),
                "round calculated"
            );
        }
        Ok(record)
    }

    fn open_deadline(&self, game: &mut GameState, now: DateTime<Utc>) {
        let timeout = chrono::Duration::from_std(self.config.round_timeout())
            .unwrap_or_else(|_| chrono::Duration::days(365));
        let deadline = now.checked_add_signed(timeout).unwrap_or(DateTime::<Utc>::MAX_UTC);
        game.round_deadlines.insert(game.open_round(), deadline);
    }
}

struct RoundInput<'a> {
    uid: PlayerUid,
    previous: Option<&'a [Parcel]>,
    decision: &'a RoundDecision,
    capital: f64,
}

fn round_inputs<'a>(
    game: &'a GameState,
    latest: &'a RoundRecord,
) -> CoordinatorResult<Vec<RoundInput<'a>>> {
    let round = game.open_round();
    game.players
        .values()
        .map(|player| {
            let decision = player
                .pending_decision
                .as_ref()
                .filter(|_| player.submitted_round == Some(round))
                .ok_or_else(|| {
                    CoordinatorError::Internal(format!(
                        "{} has no decision for round {round}",
                        player.uid
                    ))
                })?;
            Ok(RoundInput {
                uid: player.uid.clone(),
                previous: previous_field(latest, &player.uid)?,
                decision,
                capital: player.capital,
            })
        })
        .collect()
}

/// The player's field after the latest round; `None` means the fresh field.
fn previous_field<'a>(
    latest: &'a RoundRecord,
    uid: &PlayerUid,
) -> CoordinatorResult<Option<&'a [Parcel]>> {
    match latest.rounds.get(uid) {
        Some(round) => Ok(Some(round.parcels.as_slice())),
        None if latest.number == 0 => Ok(None),
        None => Err(CoordinatorError::Internal(format!(
            "round {} has no entry for {uid}",
            latest.number
        ))),
    }
}

/// Fill in a decision for every player without one: AI seats always, humans
/// only when `include_humans` (deadline default).
fn decide_for_missing(
    game: &mut GameState,
    latest: &RoundRecord,
    include_humans: bool,
) -> CoordinatorResult<()> {
    let game_id = game.id;
    let round = game.open_round();
    let missing: Vec<(usize, PlayerUid, AiLevel)> = game
        .players
        .values()
        .filter(|p| !p.has_submitted(round) && (p.is_ai || include_humans))
        .filter_map(|p| {
            let index = game.player_index(&p.uid)?;
            Some((index, p.uid.clone(), p.ai_level.unwrap_or(game.ai_level_default)))
        })
        .collect();

    for (index, uid, level) in missing {
        let previous = previous_field(latest, &uid)?;
        let decision = AiDecisionMaker::new(ai_seed(game.seed, round, index)).decide(
            level,
            previous,
            game.last_market_prices.as_ref(),
        );
        if let Some(player) = game.players.get_mut(&uid) {
            if !player.is_ai {
                warn!(%game_id, %uid, round, %level, "deadline passed, deciding for player");
                player.defaulted_rounds.push(round);
            }
            player.submitted_round = Some(round);
            player.pending_decision = Some(decision);
        }
    }
    Ok(())
}

fn check_human_uid(uid: &PlayerUid) -> CoordinatorResult<()> {
    if uid.as_str().is_empty() {
        return Err(CoordinatorError::InvalidArgument("empty player uid".into()));
    }
    if uid.as_str().starts_with(AI_UID_PREFIX) {
        return Err(CoordinatorError::InvalidArgument(format!(
            "uid {uid} uses the reserved `{AI_UID_PREFIX}` prefix"
        )));
    }
    Ok(())
}

/// Generate a random host secret.
fn generate_secret() -> String {
    let mut rng = rand::thread_rng();
    (0..HOST_SECRET_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..36);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + idx - 10) as char
            }
        })
        .collect()
}
