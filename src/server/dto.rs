use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::progression::error::SyncError;
use crate::progression::storage::{PlayerProfile, RoundHistoryEntry};
use crate::progression::types::{
    ClassProgress, NewRoundParams, PlayerId, ProgressionStats, ProgressionSubmission,
    RoundFinalization, RoundId, ServerId, UNKNOWN_ROUND_ID,
};
use crate::progression::validation::required;

/// Basic API info served at the root, consumed by connecting game servers
/// to verify compatibility before syncing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInfoResponse {
    pub name: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub github: &'static str,
    pub min_mod_ver_supported: ModVersion,
    pub xp_multiplier: f64,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct ModVersion {
    #[serde(rename = "Major")]
    pub major: u32,
    #[serde(rename = "Minor")]
    pub minor: u32,
    #[serde(rename = "Patch")]
    pub patch: u32,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub new_player: bool,
}

#[derive(Debug, Serialize)]
pub struct CreatedRoundResponse {
    pub id: RoundId,
}

/// Full progression payload for `POST /players/:guid`. Every stat field is
/// required; `name` only matters for unseen players and the round/team/squad
/// association defaults to the unknown-round sentinel.
#[derive(Debug, Default, Deserialize)]
pub struct ProgressionBody {
    pub name: Option<String>,
    pub round_id: Option<RoundId>,
    pub team_id: Option<i32>,
    pub squad_id: Option<i32>,
    pub kills: Option<i64>,
    pub deaths: Option<i64>,
    pub total_level: Option<i64>,
    pub total_xp: Option<i64>,
    pub assault_level: Option<i64>,
    pub assault_xp: Option<i64>,
    pub engineer_level: Option<i64>,
    pub engineer_xp: Option<i64>,
    pub support_level: Option<i64>,
    pub support_xp: Option<i64>,
    pub recon_level: Option<i64>,
    pub recon_xp: Option<i64>,
    pub weapon_progression: Option<String>,
    pub vehicle_progression: Option<String>,
}

impl ProgressionBody {
    /// Single validation step turning the loose body into a typed
    /// submission, naming every absent key at once.
    pub fn into_submission(self) -> Result<ProgressionSubmission, SyncError> {
        let mut missing = Vec::new();
        let team_id = required(self.team_id, "team_id", &mut missing);
        let squad_id = required(self.squad_id, "squad_id", &mut missing);
        let kills = required(self.kills, "kills", &mut missing);
        let deaths = required(self.deaths, "deaths", &mut missing);
        let total_level = required(self.total_level, "total_level", &mut missing);
        let total_xp = required(self.total_xp, "total_xp", &mut missing);
        let assault_level = required(self.assault_level, "assault_level", &mut missing);
        let assault_xp = required(self.assault_xp, "assault_xp", &mut missing);
        let engineer_level = required(self.engineer_level, "engineer_level", &mut missing);
        let engineer_xp = required(self.engineer_xp, "engineer_xp", &mut missing);
        let support_level = required(self.support_level, "support_level", &mut missing);
        let support_xp = required(self.support_xp, "support_xp", &mut missing);
        let recon_level = required(self.recon_level, "recon_level", &mut missing);
        let recon_xp = required(self.recon_xp, "recon_xp", &mut missing);
        let weapon_progression =
            required(self.weapon_progression, "weapon_progression", &mut missing);
        let vehicle_progression =
            required(self.vehicle_progression, "vehicle_progression", &mut missing);
        if !missing.is_empty() {
            return Err(SyncError::MissingFields(missing));
        }
        Ok(ProgressionSubmission {
            name: self.name,
            round_id: self.round_id.unwrap_or(UNKNOWN_ROUND_ID),
            team_id,
            squad_id,
            stats: ProgressionStats {
                kills,
                deaths,
                total_level,
                total_xp,
                assault: ClassProgress {
                    level: assault_level,
                    xp: assault_xp,
                },
                engineer: ClassProgress {
                    level: engineer_level,
                    xp: engineer_xp,
                },
                support: ClassProgress {
                    level: support_level,
                    xp: support_xp,
                },
                recon: ClassProgress {
                    level: recon_level,
                    xp: recon_xp,
                },
                weapon_progression,
                vehicle_progression,
            },
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateRoundBody {
    pub server_name: Option<String>,
    pub gamemode: Option<String>,
    pub map: Option<String>,
}

impl CreateRoundBody {
    pub fn into_params(self) -> Result<NewRoundParams, SyncError> {
        let mut missing = Vec::new();
        let server_name = required(self.server_name, "server_name", &mut missing);
        let gamemode = required(self.gamemode, "gamemode", &mut missing);
        let map = required(self.map, "map", &mut missing);
        if !missing.is_empty() {
            return Err(SyncError::MissingFields(missing));
        }
        Ok(NewRoundParams {
            server_name,
            gamemode,
            map,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FinalizeRoundBody {
    pub num_players: Option<i32>,
    pub winning_team_id: Option<i32>,
    pub duration: Option<f64>,
}

impl FinalizeRoundBody {
    pub fn into_finalization(self) -> Result<RoundFinalization, SyncError> {
        let mut missing = Vec::new();
        let num_players = required(self.num_players, "num_players", &mut missing);
        let winning_team_id = required(self.winning_team_id, "winning_team_id", &mut missing);
        let duration = required(self.duration, "duration", &mut missing);
        if !missing.is_empty() {
            return Err(SyncError::MissingFields(missing));
        }
        Ok(RoundFinalization {
            num_players,
            winning_team_id,
            duration,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Joined player + progression snapshot returned by `GET /players/:guid`.
#[derive(Debug, Serialize)]
pub struct PlayerProfileResponse {
    pub id: PlayerId,
    pub name: String,
    pub guid: String,
    pub created_at: DateTime<Utc>,
    pub last_server_id: Option<ServerId>,
    pub last_updated: DateTime<Utc>,
    pub kills: i64,
    pub deaths: i64,
    pub total_level: i64,
    pub total_xp: i64,
    pub assault_level: i64,
    pub assault_xp: i64,
    pub engineer_level: i64,
    pub engineer_xp: i64,
    pub support_level: i64,
    pub support_xp: i64,
    pub recon_level: i64,
    pub recon_xp: i64,
    pub weapon_progression: String,
    pub vehicle_progression: String,
}

impl From<PlayerProfile> for PlayerProfileResponse {
    fn from(profile: PlayerProfile) -> Self {
        let stats = profile.progression.stats;
        Self {
            id: profile.player.id,
            name: profile.player.name,
            guid: profile.player.guid,
            created_at: profile.player.created_at,
            last_server_id: profile.player.last_server_id,
            last_updated: profile.progression.last_updated,
            kills: stats.kills,
            deaths: stats.deaths,
            total_level: stats.total_level,
            total_xp: stats.total_xp,
            assault_level: stats.assault.level,
            assault_xp: stats.assault.xp,
            engineer_level: stats.engineer.level,
            engineer_xp: stats.engineer.xp,
            support_level: stats.support.level,
            support_xp: stats.support.xp,
            recon_level: stats.recon.level,
            recon_xp: stats.recon.xp,
            weapon_progression: stats.weapon_progression,
            vehicle_progression: stats.vehicle_progression,
        }
    }
}

/// One save-log row joined with its round, as served by
/// `GET /players/:guid/rounds`. Numeric fields are the per-submission
/// deltas; the progression strings are absolute.
#[derive(Debug, Serialize)]
pub struct RoundHistoryItem {
    pub round_id: RoundId,
    pub server_name: Option<String>,
    pub gamemode: Option<String>,
    pub map: Option<String>,
    pub team_id: i32,
    pub squad_id: i32,
    pub saved_at: DateTime<Utc>,
    pub kills: i64,
    pub deaths: i64,
    pub total_level: i64,
    pub total_xp: i64,
    pub assault_level: i64,
    pub assault_xp: i64,
    pub engineer_level: i64,
    pub engineer_xp: i64,
    pub support_level: i64,
    pub support_xp: i64,
    pub recon_level: i64,
    pub recon_xp: i64,
    pub weapon_progression: String,
    pub vehicle_progression: String,
}

impl From<RoundHistoryEntry> for RoundHistoryItem {
    fn from(entry: RoundHistoryEntry) -> Self {
        let delta = entry.delta;
        Self {
            round_id: entry.round_id,
            server_name: entry.server_name,
            gamemode: entry.gamemode,
            map: entry.map,
            team_id: entry.team_id,
            squad_id: entry.squad_id,
            saved_at: entry.saved_at,
            kills: delta.kills,
            deaths: delta.deaths,
            total_level: delta.total_level,
            total_xp: delta.total_xp,
            assault_level: delta.assault.level,
            assault_xp: delta.assault.xp,
            engineer_level: delta.engineer.level,
            engineer_xp: delta.engineer.xp,
            support_level: delta.support.level,
            support_xp: delta.support.xp,
            recon_level: delta.recon.level,
            recon_xp: delta.recon.xp,
            weapon_progression: entry.weapon_progression,
            vehicle_progression: entry.vehicle_progression,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progression_body_names_every_missing_field() {
        let body = ProgressionBody {
            name: Some("Recruit".into()),
            total_xp: Some(100),
            ..Default::default()
        };
        let err = body.into_submission().unwrap_err();
        match err {
            SyncError::MissingFields(keys) => {
                assert!(keys.contains(&"kills"));
                assert!(keys.contains(&"team_id"));
                assert!(keys.contains(&"weapon_progression"));
                assert!(!keys.contains(&"total_xp"));
                assert!(!keys.contains(&"name"));
                assert!(!keys.contains(&"round_id"));
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn round_association_defaults_to_sentinel() {
        let body = ProgressionBody {
            name: Some("Recruit".into()),
            team_id: Some(1),
            squad_id: Some(1),
            kills: Some(0),
            deaths: Some(0),
            total_level: Some(0),
            total_xp: Some(0),
            assault_level: Some(0),
            assault_xp: Some(0),
            engineer_level: Some(0),
            engineer_xp: Some(0),
            support_level: Some(0),
            support_xp: Some(0),
            recon_level: Some(0),
            recon_xp: Some(0),
            weapon_progression: Some(String::new()),
            vehicle_progression: Some(String::new()),
            ..Default::default()
        };
        let submission = body.into_submission().expect("complete body");
        assert_eq!(submission.round_id, UNKNOWN_ROUND_ID);
    }

    #[test]
    fn finalize_body_requires_all_fields() {
        let err = FinalizeRoundBody::default().into_finalization().unwrap_err();
        assert!(matches!(
            err,
            SyncError::MissingFields(ref keys)
                if keys == &vec!["num_players", "winning_team_id", "duration"]
        ));
    }
}
