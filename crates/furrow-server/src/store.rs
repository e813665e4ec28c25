//! Transactional game storage.
//!
//! One mutable [`GameState`] per game, guarded by a version number, plus an
//! append-only [`RoundRecord`] per calculated round. A write only lands when
//! the caller's version is still current, and the round record it carries is
//! appended in the same step.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use furrow_protocol::{wire, GameId, GameState, GameStatus, RoundRecord};
use tracing::debug;

use crate::error::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

/// A value together with the version it was read at.
#[derive(Clone, Debug, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

#[async_trait]
pub trait TransactionalStore: Send + Sync {
    /// Create a game together with its round-0 record.
    async fn insert_game(&self, game: GameState, round_zero: RoundRecord) -> StoreResult<u64>;

    async fn read_game(&self, id: GameId) -> StoreResult<Versioned<GameState>>;

    /// Replace the game if its version is still `expected_version`, appending
    /// `append` atomically. Returns the new version.
    async fn write_game_if_unchanged(
        &self,
        game: GameState,
        expected_version: u64,
        append: Option<RoundRecord>,
    ) -> StoreResult<u64>;

    async fn read_round(&self, id: GameId, number: u32) -> StoreResult<Option<RoundRecord>>;

    async fn list_games(&self) -> StoreResult<Vec<(GameId, GameStatus)>>;
}

/// Records are kept MessagePack-encoded, the way a persistent backend holds them.
#[derive(Default)]
struct Tables {
    games: BTreeMap<GameId, (u64, GameStatus, Vec<u8>)>,
    rounds: BTreeMap<(GameId, u32), Vec<u8>>,
}

/// Process-local store behind a single mutex.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("store mutex poisoned".into()))
    }
}

fn encode_game(game: &GameState) -> StoreResult<Vec<u8>> {
    wire::serialize_game(game).map_err(|e| StoreError::Backend(e.to_string()))
}

fn encode_round(record: &RoundRecord) -> StoreResult<Vec<u8>> {
    wire::serialize_round_record(record).map_err(|e| StoreError::Backend(e.to_string()))
}

#[async_trait]
impl TransactionalStore for InMemoryStore {
    async fn insert_game(&self, game: GameState, round_zero: RoundRecord) -> StoreResult<u64> {
        let game_bytes = encode_game(&game)?;
        let round_bytes = encode_round(&round_zero)?;
        let mut tables = self.lock()?;
        if tables.games.contains_key(&game.id) {
            return Err(StoreError::AlreadyExists(format!("game {}", game.id)));
        }
        tables
            .games
            .insert(game.id, (1, game.status, game_bytes));
        tables
            .rounds
            .insert((game.id, round_zero.number), round_bytes);
        Ok(1)
    }

    async fn read_game(&self, id: GameId) -> StoreResult<Versioned<GameState>> {
        let tables = self.lock()?;
        let (version, _, bytes) = tables.games.get(&id).ok_or(StoreError::NotFound(id))?;
        let value =
            wire::deserialize_game(bytes).map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Versioned {
            value,
            version: *version,
        })
    }

    async fn write_game_if_unchanged(
        &self,
        game: GameState,
        expected_version: u64,
        append: Option<RoundRecord>,
    ) -> StoreResult<u64> {
        let game_bytes = encode_game(&game)?;
        let round = append
            .as_ref()
            .map(|record| encode_round(record).map(|bytes| (record.number, bytes)))
            .transpose()?;

        let mut tables = self.lock()?;
        let found = tables
            .games
            .get(&game.id)
            .map(|(version, _, _)| *version)
            .ok_or(StoreError::NotFound(game.id))?;
        if found != expected_version {
            debug!(game_id = %game.id, expected_version, found, "stale write rejected");
            return Err(StoreError::Conflict {
                expected: expected_version,
                found,
            });
        }
        if let Some((number, _)) = &round {
            if tables.rounds.contains_key(&(game.id, *number)) {
                // Another writer already calculated this round.
                return Err(StoreError::Conflict {
                    expected: expected_version,
                    found,
                });
            }
        }

        let version = found + 1;
        if let Some((number, bytes)) = round {
            tables.rounds.insert((game.id, number), bytes);
        }
        tables
            .games
            .insert(game.id, (version, game.status, game_bytes));
        Ok(version)
    }

    async fn read_round(&self, id: GameId, number: u32) -> StoreResult<Option<RoundRecord>> {
        let tables = self.lock()?;
        if !tables.games.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        tables
            .rounds
            .get(&(id, number))
            .map(|bytes| {
                wire::deserialize_round_record(bytes)
                    .map_err(|e| StoreError::Backend(e.to_string()))
            })
            .transpose()
    }

    async fn list_games(&self) -> StoreResult<Vec<(GameId, GameStatus)>> {
        let tables = self.lock()?;
        Ok(tables
            .games
            .iter()
            .map(|(id, (_, status, _))| (*id, *status))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use furrow_protocol::{AiLevel, PlayerUid, RoundEvents};

    use super::*;

    fn game() -> GameState {
        GameState {
            id: GameId::new_random(),
            host_uid: PlayerUid::new("host"),
            host_secret_hash: 0,
            status: GameStatus::InProgress,
            created_at: Utc::now(),
            seed: 1,
            current_round_number: 0,
            round_limit: 10,
            human_slots: 1,
            ai_level_default: AiLevel::Middle,
            dynamic_pricing: false,
            players: BTreeMap::new(),
            pending_events: RoundEvents::calm(),
            last_market_prices: None,
            round_deadlines: BTreeMap::new(),
        }
    }

    fn record(game: &GameState, number: u32) -> RoundRecord {
        RoundRecord {
            game_id: game.id,
            number,
            events: RoundEvents::calm(),
            market_prices: None,
            rounds: BTreeMap::new(),
        }
    }

    #[test]
    fn stale_version_is_a_conflict() {
        tokio_test::block_on(async {
            let store = InMemoryStore::new();
            let g = game();
            let v1 = store.insert_game(g.clone(), record(&g, 0)).await.unwrap();

            let v2 = store
                .write_game_if_unchanged(g.clone(), v1, Some(record(&g, 1)))
                .await
                .unwrap();
            assert_eq!(v2, v1 + 1);

            let err = store
                .write_game_if_unchanged(g.clone(), v1, None)
                .await
                .unwrap_err();
            assert_eq!(err, StoreError::Conflict { expected: v1, found: v2 });
            assert!(store.read_round(g.id, 1).await.unwrap().is_some());
        });
    }

    #[test]
    fn round_records_are_append_only() {
        tokio_test::block_on(async {
            let store = InMemoryStore::new();
            let g = game();
            let v1 = store.insert_game(g.clone(), record(&g, 0)).await.unwrap();
            let err = store
                .write_game_if_unchanged(g.clone(), v1, Some(record(&g, 0)))
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::Conflict { .. }));
            assert_eq!(store.read_game(g.id).await.unwrap().version, v1);
        });
    }

    #[test]
    fn duplicate_insert_and_missing_game() {
        tokio_test::block_on(async {
            let store = InMemoryStore::new();
            let g = game();
            store.insert_game(g.clone(), record(&g, 0)).await.unwrap();
            assert!(matches!(
                store.insert_game(g.clone(), record(&g, 0)).await,
                Err(StoreError::AlreadyExists(_))
            ));
            let missing = GameId::new_random();
            assert_eq!(
                store.read_game(missing).await.unwrap_err(),
                StoreError::NotFound(missing)
            );
            assert_eq!(store.list_games().await.unwrap(), vec![(g.id, GameStatus::InProgress)]);
        });
    }
}
