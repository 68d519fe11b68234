use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::db::entity::{player_progression, player_save_log, players, server_round_log, servers};
use crate::progression::error::SyncError;
use crate::progression::types::{
    ClassProgress, PlayerId, ProgressionDelta, ProgressionStats, RoundFinalization, RoundId,
    ServerId,
};

use super::{
    NewPlayer, NewRound, NewSaveLogEntry, PlayerProfile, RoundHistoryEntry, StoredPlayer,
    StoredProgression, StoredRound, StoredServer, SyncStorage, SyncStorageTxn,
};

pub struct SeaOrmSyncStorage {
    connection: DatabaseConnection,
}

impl SeaOrmSyncStorage {
    pub fn new(connection: DatabaseConnection) -> Self {
        Self { connection }
    }
}

pub struct SeaOrmSyncTxn {
    txn: DatabaseTransaction,
}

#[async_trait]
impl SyncStorage for SeaOrmSyncStorage {
    async fn begin(&self) -> Result<Box<dyn SyncStorageTxn + Send>, SyncError> {
        let txn = self.connection.begin().await?;
        Ok(Box::new(SeaOrmSyncTxn { txn }))
    }

    async fn find_server_by_token(
        &self,
        token: &str,
    ) -> Result<Option<StoredServer>, SyncError> {
        let record = servers::Entity::find()
            .filter(servers::Column::Token.eq(token))
            .one(&self.connection)
            .await?;
        Ok(record.map(stored_server))
    }

    async fn record_server_ip(&self, server_id: ServerId, ip: &str) -> Result<(), SyncError> {
        let model = servers::ActiveModel {
            id: Set(server_id),
            last_ip: Set(Some(ip.to_owned())),
            ..Default::default()
        };
        model.update(&self.connection).await?;
        Ok(())
    }

    async fn record_auth_check(&self, server_id: ServerId) -> Result<(), SyncError> {
        let model = servers::ActiveModel {
            id: Set(server_id),
            last_auth_check: Set(Some(Utc::now())),
            ..Default::default()
        };
        model.update(&self.connection).await?;
        Ok(())
    }

    async fn count_servers(&self) -> Result<u64, SyncError> {
        Ok(servers::Entity::find().count(&self.connection).await?)
    }

    async fn count_players(&self) -> Result<u64, SyncError> {
        Ok(players::Entity::find().count(&self.connection).await?)
    }

    async fn find_player_by_guid(
        &self,
        guid: &str,
    ) -> Result<Option<PlayerProfile>, SyncError> {
        let record = players::Entity::find()
            .filter(players::Column::Guid.eq(guid))
            .find_also_related(player_progression::Entity)
            .one(&self.connection)
            .await?;
        let Some((player, progression)) = record else {
            return Ok(None);
        };
        // Progression rows are created together with the player, so a bare
        // player row without one is treated as unseen.
        let Some(progression) = progression else {
            return Ok(None);
        };
        Ok(Some(PlayerProfile {
            player: stored_player(player),
            progression: stored_progression(progression),
        }))
    }

    async fn list_round_history(
        &self,
        player_id: PlayerId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<RoundHistoryEntry>, SyncError> {
        let rows = player_save_log::Entity::find()
            .filter(player_save_log::Column::PlayerId.eq(player_id))
            .find_also_related(server_round_log::Entity)
            .order_by_desc(player_save_log::Column::SavedAt)
            .order_by_desc(player_save_log::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.connection)
            .await?;
        Ok(rows.into_iter().map(history_entry).collect())
    }
}

#[async_trait]
impl SyncStorageTxn for SeaOrmSyncTxn {
    async fn load_player_for_update(
        &mut self,
        guid: &str,
    ) -> Result<Option<StoredPlayer>, SyncError> {
        let record = players::Entity::find()
            .filter(players::Column::Guid.eq(guid))
            .lock_exclusive()
            .one(&self.txn)
            .await?;
        Ok(record.map(stored_player))
    }

    async fn insert_player(&mut self, player: NewPlayer) -> Result<PlayerId, SyncError> {
        let model = players::ActiveModel {
            name: Set(player.name),
            guid: Set(player.guid),
            last_server_id: Set(Some(player.last_server_id)),
            ..Default::default()
        };
        let inserted = model.insert(&self.txn).await?;
        Ok(inserted.id)
    }

    async fn set_player_last_server(
        &mut self,
        player_id: PlayerId,
        server_id: ServerId,
    ) -> Result<(), SyncError> {
        let model = players::ActiveModel {
            id: Set(player_id),
            last_server_id: Set(Some(server_id)),
            ..Default::default()
        };
        model.update(&self.txn).await?;
        Ok(())
    }

    async fn load_progression_for_update(
        &mut self,
        player_id: PlayerId,
    ) -> Result<Option<StoredProgression>, SyncError> {
        let record = player_progression::Entity::find()
            .filter(player_progression::Column::PlayerId.eq(player_id))
            .lock_exclusive()
            .one(&self.txn)
            .await?;
        Ok(record.map(stored_progression))
    }

    async fn insert_progression(
        &mut self,
        player_id: PlayerId,
        stats: ProgressionStats,
    ) -> Result<(), SyncError> {
        let model = progression_active_model(player_id, stats);
        model.insert(&self.txn).await?;
        Ok(())
    }

    async fn update_progression(
        &mut self,
        player_id: PlayerId,
        stats: ProgressionStats,
    ) -> Result<(), SyncError> {
        let model = progression_active_model(player_id, stats);
        model.update(&self.txn).await?;
        Ok(())
    }

    async fn append_save_log(&mut self, entry: NewSaveLogEntry) -> Result<(), SyncError> {
        let delta = entry.delta;
        let model = player_save_log::ActiveModel {
            player_id: Set(entry.player_id),
            server_round_id: Set(entry.round_id),
            team_id: Set(entry.team_id),
            squad_id: Set(entry.squad_id),
            kills: Set(delta.kills),
            deaths: Set(delta.deaths),
            total_level: Set(delta.total_level),
            total_xp: Set(delta.total_xp),
            assault_level: Set(delta.assault.level),
            assault_xp: Set(delta.assault.xp),
            engineer_level: Set(delta.engineer.level),
            engineer_xp: Set(delta.engineer.xp),
            support_level: Set(delta.support.level),
            support_xp: Set(delta.support.xp),
            recon_level: Set(delta.recon.level),
            recon_xp: Set(delta.recon.xp),
            weapon_progression: Set(entry.weapon_progression),
            vehicle_progression: Set(entry.vehicle_progression),
            ..Default::default()
        };
        model.insert(&self.txn).await?;
        Ok(())
    }

    async fn insert_round(&mut self, round: NewRound) -> Result<RoundId, SyncError> {
        let model = server_round_log::ActiveModel {
            server_id: Set(Some(round.server_id)),
            server_name: Set(Some(round.server_name)),
            gamemode: Set(Some(round.gamemode)),
            map: Set(Some(round.map)),
            ..Default::default()
        };
        let inserted = model.insert(&self.txn).await?;
        Ok(inserted.id)
    }

    async fn load_round_for_update(
        &mut self,
        round_id: RoundId,
    ) -> Result<Option<StoredRound>, SyncError> {
        let record = server_round_log::Entity::find()
            .filter(server_round_log::Column::Id.eq(round_id))
            .lock_exclusive()
            .one(&self.txn)
            .await?;
        Ok(record.map(stored_round))
    }

    async fn finalize_round(
        &mut self,
        round_id: RoundId,
        finalization: RoundFinalization,
    ) -> Result<(), SyncError> {
        let model = server_round_log::ActiveModel {
            id: Set(round_id),
            num_players: Set(Some(finalization.num_players)),
            winning_team_id: Set(Some(finalization.winning_team_id)),
            duration: Set(Some(finalization.duration)),
            saved_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        model.update(&self.txn).await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), SyncError> {
        self.txn.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) {
        let _ = self.txn.rollback().await;
    }
}

fn progression_active_model(
    player_id: PlayerId,
    stats: ProgressionStats,
) -> player_progression::ActiveModel {
    player_progression::ActiveModel {
        player_id: Set(player_id),
        last_updated: Set(Utc::now()),
        kills: Set(stats.kills),
        deaths: Set(stats.deaths),
        total_level: Set(stats.total_level),
        total_xp: Set(stats.total_xp),
        assault_level: Set(stats.assault.level),
        assault_xp: Set(stats.assault.xp),
        engineer_level: Set(stats.engineer.level),
        engineer_xp: Set(stats.engineer.xp),
        support_level: Set(stats.support.level),
        support_xp: Set(stats.support.xp),
        recon_level: Set(stats.recon.level),
        recon_xp: Set(stats.recon.xp),
        weapon_progression: Set(stats.weapon_progression),
        vehicle_progression: Set(stats.vehicle_progression),
    }
}

fn stored_server(model: servers::Model) -> StoredServer {
    StoredServer {
        id: model.id,
        owner_name: model.owner_name,
        // CHAR columns come back space-padded on some deployments.
        server_guid: model.server_guid.trim_end().to_owned(),
        authorized: model.authorized,
        last_ip: model.last_ip,
    }
}

fn stored_player(model: players::Model) -> StoredPlayer {
    StoredPlayer {
        id: model.id,
        name: model.name,
        guid: model.guid,
        created_at: model.created_at,
        last_server_id: model.last_server_id,
    }
}

fn stored_progression(model: player_progression::Model) -> StoredProgression {
    StoredProgression {
        player_id: model.player_id,
        last_updated: model.last_updated,
        stats: ProgressionStats {
            kills: model.kills,
            deaths: model.deaths,
            total_level: model.total_level,
            total_xp: model.total_xp,
            assault: ClassProgress {
                level: model.assault_level,
                xp: model.assault_xp,
            },
            engineer: ClassProgress {
                level: model.engineer_level,
                xp: model.engineer_xp,
            },
            support: ClassProgress {
                level: model.support_level,
                xp: model.support_xp,
            },
            recon: ClassProgress {
                level: model.recon_level,
                xp: model.recon_xp,
            },
            weapon_progression: model.weapon_progression,
            vehicle_progression: model.vehicle_progression,
        },
    }
}

fn stored_round(model: server_round_log::Model) -> StoredRound {
    StoredRound {
        id: model.id,
        server_id: model.server_id,
        saved_at: model.saved_at,
        server_name: model.server_name,
        gamemode: model.gamemode,
        map: model.map,
        num_players: model.num_players,
        winning_team_id: model.winning_team_id,
        duration: model.duration,
    }
}

fn history_entry(
    (save, round): (player_save_log::Model, Option<server_round_log::Model>),
) -> RoundHistoryEntry {
    let (server_name, gamemode, map) = match round {
        Some(round) => (round.server_name, round.gamemode, round.map),
        None => (None, None, None),
    };
    RoundHistoryEntry {
        round_id: save.server_round_id,
        server_name,
        gamemode,
        map,
        team_id: save.team_id,
        squad_id: save.squad_id,
        saved_at: save.saved_at,
        delta: ProgressionDelta {
            kills: save.kills,
            deaths: save.deaths,
            total_level: save.total_level,
            total_xp: save.total_xp,
            assault: ClassProgress {
                level: save.assault_level,
                xp: save.assault_xp,
            },
            engineer: ClassProgress {
                level: save.engineer_level,
                xp: save.engineer_xp,
            },
            support: ClassProgress {
                level: save.support_level,
                xp: save.support_xp,
            },
            recon: ClassProgress {
                level: save.recon_level,
                xp: save.recon_xp,
            },
        },
        weapon_progression: save.weapon_progression,
        vehicle_progression: save.vehicle_progression,
    }
}
