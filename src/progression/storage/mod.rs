use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::SyncError;
use super::types::{
    PlayerId, ProgressionDelta, ProgressionStats, RoundFinalization, RoundId, ServerId,
};

/// Persistence gateway. All durable state lives behind this seam; request
/// handlers hold no state of their own.
///
/// Single-shot methods run outside any transaction and are used by the auth
/// gate and the read-only query surface. The write paths with invariants
/// (progression sync, round lifecycle) go through [`SyncStorageTxn`].
#[async_trait]
pub trait SyncStorage: Send + Sync {
    /// Open a transaction for one of the core write paths.
    async fn begin(&self) -> Result<Box<dyn SyncStorageTxn + Send>, SyncError>;

    /// Registration lookup by secret token. The token is the sole key; the
    /// caller-claimed GUID is cross-checked by the auth gate, not here.
    async fn find_server_by_token(&self, token: &str)
        -> Result<Option<StoredServer>, SyncError>;

    /// Best-effort bookkeeping; failures are logged by the caller, never
    /// surfaced to the requester.
    async fn record_server_ip(&self, server_id: ServerId, ip: &str) -> Result<(), SyncError>;
    async fn record_auth_check(&self, server_id: ServerId) -> Result<(), SyncError>;

    async fn count_servers(&self) -> Result<u64, SyncError>;
    async fn count_players(&self) -> Result<u64, SyncError>;

    /// Player record joined with its progression snapshot, by normalized GUID.
    async fn find_player_by_guid(&self, guid: &str)
        -> Result<Option<PlayerProfile>, SyncError>;

    /// Save-log page for one player joined with round descriptors, newest
    /// first. `limit`/`offset` are pre-clamped by the caller.
    async fn list_round_history(
        &self,
        player_id: PlayerId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<RoundHistoryEntry>, SyncError>;
}

/// One transaction over the store. The `for_update` loads take row locks so
/// that concurrent submissions for the same player (or finalizations of the
/// same round) serialize inside the store rather than in process memory.
#[async_trait]
pub trait SyncStorageTxn: Send {
    async fn load_player_for_update(
        &mut self,
        guid: &str,
    ) -> Result<Option<StoredPlayer>, SyncError>;

    async fn insert_player(&mut self, player: NewPlayer) -> Result<PlayerId, SyncError>;

    async fn set_player_last_server(
        &mut self,
        player_id: PlayerId,
        server_id: ServerId,
    ) -> Result<(), SyncError>;

    async fn load_progression_for_update(
        &mut self,
        player_id: PlayerId,
    ) -> Result<Option<StoredProgression>, SyncError>;

    async fn insert_progression(
        &mut self,
        player_id: PlayerId,
        stats: ProgressionStats,
    ) -> Result<(), SyncError>;

    async fn update_progression(
        &mut self,
        player_id: PlayerId,
        stats: ProgressionStats,
    ) -> Result<(), SyncError>;

    async fn append_save_log(&mut self, entry: NewSaveLogEntry) -> Result<(), SyncError>;

    async fn insert_round(&mut self, round: NewRound) -> Result<RoundId, SyncError>;

    async fn load_round_for_update(
        &mut self,
        round_id: RoundId,
    ) -> Result<Option<StoredRound>, SyncError>;

    /// Write the final fields and stamp `saved_at` in one update. The caller
    /// has already re-checked ownership and the open state under the lock.
    async fn finalize_round(
        &mut self,
        round_id: RoundId,
        finalization: RoundFinalization,
    ) -> Result<(), SyncError>;

    async fn commit(self: Box<Self>) -> Result<(), SyncError>;
    async fn rollback(self: Box<Self>);
}

#[derive(Clone, Debug)]
pub struct StoredServer {
    pub id: ServerId,
    pub owner_name: String,
    pub server_guid: String,
    pub authorized: bool,
    pub last_ip: Option<String>,
}

#[derive(Clone, Debug)]
pub struct StoredPlayer {
    pub id: PlayerId,
    pub name: String,
    pub guid: String,
    pub created_at: DateTime<Utc>,
    pub last_server_id: Option<ServerId>,
}

#[derive(Clone, Debug)]
pub struct NewPlayer {
    pub guid: String,
    pub name: String,
    pub last_server_id: ServerId,
}

#[derive(Clone, Debug)]
pub struct StoredProgression {
    pub player_id: PlayerId,
    pub last_updated: DateTime<Utc>,
    pub stats: ProgressionStats,
}

#[derive(Clone, Debug)]
pub struct NewSaveLogEntry {
    pub player_id: PlayerId,
    pub round_id: RoundId,
    pub team_id: i32,
    pub squad_id: i32,
    pub delta: ProgressionDelta,
    /// Absolute (non-delta) unlock encodings at submission time.
    pub weapon_progression: String,
    pub vehicle_progression: String,
}

#[derive(Clone, Debug)]
pub struct NewRound {
    pub server_id: ServerId,
    pub server_name: String,
    pub gamemode: String,
    pub map: String,
}

#[derive(Clone, Debug)]
pub struct StoredRound {
    pub id: RoundId,
    pub server_id: Option<ServerId>,
    pub saved_at: Option<DateTime<Utc>>,
    pub server_name: Option<String>,
    pub gamemode: Option<String>,
    pub map: Option<String>,
    pub num_players: Option<i32>,
    pub winning_team_id: Option<i32>,
    pub duration: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct PlayerProfile {
    pub player: StoredPlayer,
    pub progression: StoredProgression,
}

/// One save-log row joined with its round's descriptive fields.
#[derive(Clone, Debug)]
pub struct RoundHistoryEntry {
    pub round_id: RoundId,
    pub server_name: Option<String>,
    pub gamemode: Option<String>,
    pub map: Option<String>,
    pub team_id: i32,
    pub squad_id: i32,
    pub saved_at: DateTime<Utc>,
    pub delta: ProgressionDelta,
    pub weapon_progression: String,
    pub vehicle_progression: String,
}

pub mod in_memory;
pub mod sea_orm;

pub use in_memory::InMemorySyncStorage;
pub use sea_orm::SeaOrmSyncStorage;
