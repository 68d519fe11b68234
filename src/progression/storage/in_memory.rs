use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::progression::error::SyncError;
use crate::progression::types::{
    PlayerId, ProgressionStats, RoundFinalization, RoundId, ServerId, UNKNOWN_ROUND_ID,
};
use crate::progression::validation::normalize_guid;

use super::{
    NewPlayer, NewRound, NewSaveLogEntry, PlayerProfile, RoundHistoryEntry, StoredPlayer,
    StoredProgression, StoredRound, StoredServer, SyncStorage, SyncStorageTxn,
};

#[derive(Clone)]
struct ServerRow {
    id: ServerId,
    owner_name: String,
    server_guid: String,
    token: String,
    authorized: bool,
    last_ip: Option<String>,
    last_auth_check: Option<DateTime<Utc>>,
}

impl ServerRow {
    fn stored(&self) -> StoredServer {
        StoredServer {
            id: self.id,
            owner_name: self.owner_name.clone(),
            server_guid: self.server_guid.clone(),
            authorized: self.authorized,
            last_ip: self.last_ip.clone(),
        }
    }
}

#[derive(Clone)]
struct SaveLogRow {
    id: i64,
    saved_at: DateTime<Utc>,
    entry: NewSaveLogEntry,
}

#[derive(Clone)]
struct State {
    servers: Vec<ServerRow>,
    players: Vec<StoredPlayer>,
    progression: HashMap<PlayerId, StoredProgression>,
    rounds: HashMap<RoundId, StoredRound>,
    save_log: Vec<SaveLogRow>,
    next_server_id: ServerId,
    next_player_id: PlayerId,
    next_round_id: RoundId,
    next_save_id: i64,
}

impl Default for State {
    fn default() -> Self {
        let mut rounds = HashMap::new();
        // Mirror the schema bootstrap's unknown-round sentinel.
        rounds.insert(
            UNKNOWN_ROUND_ID,
            StoredRound {
                id: UNKNOWN_ROUND_ID,
                server_id: None,
                saved_at: None,
                server_name: Some("Unknown".to_owned()),
                gamemode: Some("Unknown".to_owned()),
                map: Some("Unknown".to_owned()),
                num_players: None,
                winning_team_id: None,
                duration: None,
            },
        );
        Self {
            servers: Vec::new(),
            players: Vec::new(),
            progression: HashMap::new(),
            rounds,
            save_log: Vec::new(),
            next_server_id: 1,
            next_player_id: 1,
            next_round_id: 1,
            next_save_id: 1,
        }
    }
}

/// In-process store for tests and local experiments. Transactions take an
/// exclusive lock over the whole state and restore a snapshot on rollback,
/// which models the per-row serialization the Postgres backend gets from
/// `SELECT ... FOR UPDATE`.
pub struct InMemorySyncStorage {
    state: Arc<Mutex<State>>,
}

impl InMemorySyncStorage {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Provisioning hook mirroring the `add_server` CLI.
    pub async fn register_server(
        &self,
        owner_name: &str,
        server_guid: &str,
        token: &str,
        authorized: bool,
    ) -> ServerId {
        let mut state = self.state.lock().await;
        let id = state.next_server_id;
        state.next_server_id += 1;
        state.servers.push(ServerRow {
            id,
            owner_name: owner_name.to_owned(),
            server_guid: normalize_guid(server_guid),
            token: token.to_owned(),
            authorized,
            last_ip: None,
            last_auth_check: None,
        });
        id
    }

    /// Direct round lookup for test assertions.
    pub async fn round(&self, round_id: RoundId) -> Option<StoredRound> {
        self.state.lock().await.rounds.get(&round_id).cloned()
    }

    /// Last recorded auth-check timestamp for test assertions.
    pub async fn last_auth_check(&self, server_id: ServerId) -> Option<DateTime<Utc>> {
        self.state
            .lock()
            .await
            .servers
            .iter()
            .find(|row| row.id == server_id)
            .and_then(|row| row.last_auth_check)
    }
}

impl Default for InMemorySyncStorage {
    fn default() -> Self {
        Self::new()
    }
}

pub struct InMemorySyncTxn {
    guard: OwnedMutexGuard<State>,
    backup: State,
}

#[async_trait]
impl SyncStorage for InMemorySyncStorage {
    async fn begin(&self) -> Result<Box<dyn SyncStorageTxn + Send>, SyncError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let backup = guard.clone();
        Ok(Box::new(InMemorySyncTxn { guard, backup }))
    }

    async fn find_server_by_token(
        &self,
        token: &str,
    ) -> Result<Option<StoredServer>, SyncError> {
        let state = self.state.lock().await;
        Ok(state
            .servers
            .iter()
            .find(|row| row.token == token)
            .map(ServerRow::stored))
    }

    async fn record_server_ip(&self, server_id: ServerId, ip: &str) -> Result<(), SyncError> {
        let mut state = self.state.lock().await;
        if let Some(row) = state.servers.iter_mut().find(|row| row.id == server_id) {
            row.last_ip = Some(ip.to_owned());
        }
        Ok(())
    }

    async fn record_auth_check(&self, server_id: ServerId) -> Result<(), SyncError> {
        let mut state = self.state.lock().await;
        if let Some(row) = state.servers.iter_mut().find(|row| row.id == server_id) {
            row.last_auth_check = Some(Utc::now());
        }
        Ok(())
    }

    async fn count_servers(&self) -> Result<u64, SyncError> {
        Ok(self.state.lock().await.servers.len() as u64)
    }

    async fn count_players(&self) -> Result<u64, SyncError> {
        Ok(self.state.lock().await.players.len() as u64)
    }

    async fn find_player_by_guid(
        &self,
        guid: &str,
    ) -> Result<Option<PlayerProfile>, SyncError> {
        let state = self.state.lock().await;
        let Some(player) = state.players.iter().find(|p| p.guid == guid).cloned() else {
            return Ok(None);
        };
        let Some(progression) = state.progression.get(&player.id).cloned() else {
            return Ok(None);
        };
        Ok(Some(PlayerProfile {
            player,
            progression,
        }))
    }

    async fn list_round_history(
        &self,
        player_id: PlayerId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<RoundHistoryEntry>, SyncError> {
        let state = self.state.lock().await;
        let mut rows: Vec<&SaveLogRow> = state
            .save_log
            .iter()
            .filter(|row| row.entry.player_id == player_id)
            .collect();
        rows.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then(b.id.cmp(&a.id)));
        Ok(rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|row| {
                let round = state.rounds.get(&row.entry.round_id);
                RoundHistoryEntry {
                    round_id: row.entry.round_id,
                    server_name: round.and_then(|r| r.server_name.clone()),
                    gamemode: round.and_then(|r| r.gamemode.clone()),
                    map: round.and_then(|r| r.map.clone()),
                    team_id: row.entry.team_id,
                    squad_id: row.entry.squad_id,
                    saved_at: row.saved_at,
                    delta: row.entry.delta,
                    weapon_progression: row.entry.weapon_progression.clone(),
                    vehicle_progression: row.entry.vehicle_progression.clone(),
                }
            })
            .collect())
    }
}

#[async_trait]
impl SyncStorageTxn for InMemorySyncTxn {
    async fn load_player_for_update(
        &mut self,
        guid: &str,
    ) -> Result<Option<StoredPlayer>, SyncError> {
        Ok(self.guard.players.iter().find(|p| p.guid == guid).cloned())
    }

    async fn insert_player(&mut self, player: NewPlayer) -> Result<PlayerId, SyncError> {
        let id = self.guard.next_player_id;
        self.guard.next_player_id += 1;
        self.guard.players.push(StoredPlayer {
            id,
            name: player.name,
            guid: player.guid,
            created_at: Utc::now(),
            last_server_id: Some(player.last_server_id),
        });
        Ok(id)
    }

    async fn set_player_last_server(
        &mut self,
        player_id: PlayerId,
        server_id: ServerId,
    ) -> Result<(), SyncError> {
        if let Some(player) = self.guard.players.iter_mut().find(|p| p.id == player_id) {
            player.last_server_id = Some(server_id);
        }
        Ok(())
    }

    async fn load_progression_for_update(
        &mut self,
        player_id: PlayerId,
    ) -> Result<Option<StoredProgression>, SyncError> {
        Ok(self.guard.progression.get(&player_id).cloned())
    }

    async fn insert_progression(
        &mut self,
        player_id: PlayerId,
        stats: ProgressionStats,
    ) -> Result<(), SyncError> {
        self.guard.progression.insert(
            player_id,
            StoredProgression {
                player_id,
                last_updated: Utc::now(),
                stats,
            },
        );
        Ok(())
    }

    async fn update_progression(
        &mut self,
        player_id: PlayerId,
        stats: ProgressionStats,
    ) -> Result<(), SyncError> {
        self.insert_progression(player_id, stats).await
    }

    async fn append_save_log(&mut self, entry: NewSaveLogEntry) -> Result<(), SyncError> {
        let id = self.guard.next_save_id;
        self.guard.next_save_id += 1;
        self.guard.save_log.push(SaveLogRow {
            id,
            saved_at: Utc::now(),
            entry,
        });
        Ok(())
    }

    async fn insert_round(&mut self, round: NewRound) -> Result<RoundId, SyncError> {
        let id = self.guard.next_round_id;
        self.guard.next_round_id += 1;
        self.guard.rounds.insert(
            id,
            StoredRound {
                id,
                server_id: Some(round.server_id),
                saved_at: None,
                server_name: Some(round.server_name),
                gamemode: Some(round.gamemode),
                map: Some(round.map),
                num_players: None,
                winning_team_id: None,
                duration: None,
            },
        );
        Ok(id)
    }

    async fn load_round_for_update(
        &mut self,
        round_id: RoundId,
    ) -> Result<Option<StoredRound>, SyncError> {
        Ok(self.guard.rounds.get(&round_id).cloned())
    }

    async fn finalize_round(
        &mut self,
        round_id: RoundId,
        finalization: RoundFinalization,
    ) -> Result<(), SyncError> {
        let round = self
            .guard
            .rounds
            .get_mut(&round_id)
            .ok_or(SyncError::NotFound("round"))?;
        round.num_players = Some(finalization.num_players);
        round.winning_team_id = Some(finalization.winning_team_id);
        round.duration = Some(finalization.duration);
        round.saved_at = Some(Utc::now());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), SyncError> {
        // Mutations were applied in place; dropping the guard publishes them.
        Ok(())
    }

    async fn rollback(self: Box<Self>) {
        let Self { mut guard, backup } = *self;
        *guard = backup;
    }
}
