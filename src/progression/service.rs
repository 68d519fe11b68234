use std::sync::Arc;

use tracing::{info, warn};

use super::auth::AuthedServer;
use super::error::SyncError;
use super::storage::{NewPlayer, NewRound, NewSaveLogEntry, SyncStorage, SyncStorageTxn};
use super::types::{
    NewRoundParams, ProgressionSubmission, RoundFinalization, RoundId, SubmitOutcome,
};

const LOG_TARGET: &str = "progression::service";

/// Applies progression submissions: resolves the target player, enforces
/// total-XP monotonicity, computes per-field deltas and appends the save-log
/// row — all inside one storage transaction per submission.
pub struct ProgressionService {
    storage: Arc<dyn SyncStorage>,
    xp_anomaly_threshold: Option<i64>,
}

impl ProgressionService {
    pub fn new(storage: Arc<dyn SyncStorage>, xp_anomaly_threshold: Option<i64>) -> Self {
        Self {
            storage,
            xp_anomaly_threshold,
        }
    }

    pub async fn submit(
        &self,
        identity: &AuthedServer,
        guid: &str,
        submission: ProgressionSubmission,
    ) -> Result<SubmitOutcome, SyncError> {
        let mut txn = self.storage.begin().await?;
        let result = self.apply(txn.as_mut(), identity, guid, &submission).await;
        match result {
            Ok(outcome) => {
                txn.commit().await?;
                Ok(outcome)
            }
            Err(err) => {
                txn.rollback().await;
                Err(err)
            }
        }
    }

    async fn apply(
        &self,
        txn: &mut dyn SyncStorageTxn,
        identity: &AuthedServer,
        guid: &str,
        submission: &ProgressionSubmission,
    ) -> Result<SubmitOutcome, SyncError> {
        match txn.load_player_for_update(guid).await? {
            Some(player) => {
                let stored = txn
                    .load_progression_for_update(player.id)
                    .await?
                    .ok_or(SyncError::NotFound("progression"))?;

                // The monotonicity gate: lagging or replayed game-server
                // ticks must never regress a player's record.
                if submission.stats.total_xp < stored.stats.total_xp {
                    warn!(
                        target: LOG_TARGET,
                        owner = %identity.owner_name,
                        player = %player.name,
                        submitted = submission.stats.total_xp,
                        stored = stored.stats.total_xp,
                        "rejected progression update carrying stale data"
                    );
                    return Err(SyncError::OutdatedData { field: "total_xp" });
                }

                let delta = submission.stats.delta_from(&stored.stats);
                if let Some(threshold) = self.xp_anomaly_threshold {
                    if delta.total_xp > threshold {
                        warn!(
                            target: LOG_TARGET,
                            owner = %identity.owner_name,
                            player = %player.name,
                            xp_gain = delta.total_xp,
                            threshold,
                            "unusually large XP gain flagged for review"
                        );
                    }
                }

                txn.set_player_last_server(player.id, identity.server_id).await?;
                txn.update_progression(player.id, submission.stats.clone()).await?;
                txn.append_save_log(NewSaveLogEntry {
                    player_id: player.id,
                    round_id: submission.round_id,
                    team_id: submission.team_id,
                    squad_id: submission.squad_id,
                    delta,
                    weapon_progression: submission.stats.weapon_progression.clone(),
                    vehicle_progression: submission.stats.vehicle_progression.clone(),
                })
                .await?;

                info!(
                    target: LOG_TARGET,
                    owner = %identity.owner_name,
                    player = %player.name,
                    "updated player progression"
                );
                Ok(SubmitOutcome { new_player: false })
            }
            None => {
                let Some(name) = submission.name.as_deref().filter(|n| !n.is_empty()) else {
                    return Err(SyncError::MissingFields(vec!["name"]));
                };

                let player_id = txn
                    .insert_player(NewPlayer {
                        guid: guid.to_owned(),
                        name: name.to_owned(),
                        last_server_id: identity.server_id,
                    })
                    .await?;
                txn.insert_progression(player_id, submission.stats.clone()).await?;
                // First submission: the implicit prior state is all-zero, so
                // the logged delta equals the absolute values.
                txn.append_save_log(NewSaveLogEntry {
                    player_id,
                    round_id: submission.round_id,
                    team_id: submission.team_id,
                    squad_id: submission.squad_id,
                    delta: submission.stats.as_delta(),
                    weapon_progression: submission.stats.weapon_progression.clone(),
                    vehicle_progression: submission.stats.vehicle_progression.clone(),
                })
                .await?;

                info!(
                    target: LOG_TARGET,
                    owner = %identity.owner_name,
                    player = %name,
                    "added player progression"
                );
                Ok(SubmitOutcome { new_player: true })
            }
        }
    }
}

/// Creates and finalizes round records. A round transitions Open →
/// Finalized exactly once, and only by the server that created it.
pub struct RoundService {
    storage: Arc<dyn SyncStorage>,
}

impl RoundService {
    pub fn new(storage: Arc<dyn SyncStorage>) -> Self {
        Self { storage }
    }

    pub async fn create(
        &self,
        identity: &AuthedServer,
        params: NewRoundParams,
    ) -> Result<RoundId, SyncError> {
        let mut txn = self.storage.begin().await?;
        let result = txn
            .insert_round(NewRound {
                server_id: identity.server_id,
                server_name: params.server_name,
                gamemode: params.gamemode,
                map: params.map,
            })
            .await;
        match result {
            Ok(round_id) => {
                txn.commit().await?;
                info!(
                    target: LOG_TARGET,
                    owner = %identity.owner_name,
                    round_id,
                    "created round"
                );
                Ok(round_id)
            }
            Err(err) => {
                txn.rollback().await;
                Err(err)
            }
        }
    }

    pub async fn finalize(
        &self,
        identity: &AuthedServer,
        round_id: RoundId,
        finalization: RoundFinalization,
    ) -> Result<(), SyncError> {
        let mut txn = self.storage.begin().await?;
        let result = async {
            // Re-check ownership and the open state under the row lock so two
            // concurrent finalize calls cannot both succeed.
            let round = txn
                .load_round_for_update(round_id)
                .await?
                .ok_or(SyncError::NotFound("round"))?;
            if round.server_id != Some(identity.server_id) {
                return Err(SyncError::NotRoundOwner);
            }
            if round.saved_at.is_some() {
                return Err(SyncError::AlreadyFinalized);
            }
            txn.finalize_round(round_id, finalization).await
        }
        .await;
        match result {
            Ok(()) => {
                txn.commit().await?;
                info!(
                    target: LOG_TARGET,
                    owner = %identity.owner_name,
                    round_id,
                    "finalized round"
                );
                Ok(())
            }
            Err(err) => {
                txn.rollback().await;
                Err(err)
            }
        }
    }
}
