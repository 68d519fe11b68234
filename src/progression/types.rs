pub type ServerId = i32;
pub type PlayerId = i32;
pub type RoundId = i32;

/// Round id recorded for history rows that never had a live round
/// association; seeded into the round log at bootstrap.
pub const UNKNOWN_ROUND_ID: RoundId = -1;

/// Level/XP pair for one soldier class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassProgress {
    pub level: i64,
    pub xp: i64,
}

/// Absolute progression counters as reported by a game server.
///
/// The progress-list strings are opaque unlock encodings owned by the game
/// mod; the API stores and echoes them without interpretation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgressionStats {
    pub kills: i64,
    pub deaths: i64,
    pub total_level: i64,
    pub total_xp: i64,
    pub assault: ClassProgress,
    pub engineer: ClassProgress,
    pub support: ClassProgress,
    pub recon: ClassProgress,
    pub weapon_progression: String,
    pub vehicle_progression: String,
}

/// Field-wise difference between two progression snapshots.
///
/// Only `total_xp` is guarded against regression at submission time; every
/// other field may legitimately go negative when a server reports a
/// decrease.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgressionDelta {
    pub kills: i64,
    pub deaths: i64,
    pub total_level: i64,
    pub total_xp: i64,
    pub assault: ClassProgress,
    pub engineer: ClassProgress,
    pub support: ClassProgress,
    pub recon: ClassProgress,
}

impl ProgressionStats {
    /// Difference against the previously stored snapshot.
    pub fn delta_from(&self, prior: &Self) -> ProgressionDelta {
        ProgressionDelta {
            kills: self.kills - prior.kills,
            deaths: self.deaths - prior.deaths,
            total_level: self.total_level - prior.total_level,
            total_xp: self.total_xp - prior.total_xp,
            assault: ClassProgress {
                level: self.assault.level - prior.assault.level,
                xp: self.assault.xp - prior.assault.xp,
            },
            engineer: ClassProgress {
                level: self.engineer.level - prior.engineer.level,
                xp: self.engineer.xp - prior.engineer.xp,
            },
            support: ClassProgress {
                level: self.support.level - prior.support.level,
                xp: self.support.xp - prior.support.xp,
            },
            recon: ClassProgress {
                level: self.recon.level - prior.recon.level,
                xp: self.recon.xp - prior.recon.xp,
            },
        }
    }

    /// Difference against the implicit all-zero baseline of a new player.
    pub fn as_delta(&self) -> ProgressionDelta {
        self.delta_from(&Self::default())
    }
}

/// One validated progression submission for a target player GUID.
#[derive(Clone, Debug)]
pub struct ProgressionSubmission {
    /// Display name; required only when the target player is unseen.
    pub name: Option<String>,
    pub round_id: RoundId,
    pub team_id: i32,
    pub squad_id: i32,
    pub stats: ProgressionStats,
}

#[derive(Clone, Copy, Debug)]
pub struct SubmitOutcome {
    pub new_player: bool,
}

/// Validated body for round creation.
#[derive(Clone, Debug)]
pub struct NewRoundParams {
    pub server_name: String,
    pub gamemode: String,
    pub map: String,
}

/// Validated body for round finalization; written exactly once per round.
#[derive(Clone, Copy, Debug)]
pub struct RoundFinalization {
    pub num_players: i32,
    pub winning_team_id: i32,
    pub duration: f64,
}
