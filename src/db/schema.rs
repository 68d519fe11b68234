use anyhow::{Context, Result};
use sea_orm::{ConnectionTrait, DatabaseConnection};
use tracing::debug;

const LOG_TARGET: &str = "db::schema";

const CREATE_SERVERS: &str = r#"
CREATE TABLE IF NOT EXISTS servers (
    id SERIAL PRIMARY KEY,
    owner_name TEXT NOT NULL,
    owner_contact TEXT,
    created_on DATE NOT NULL DEFAULT CURRENT_DATE,
    last_auth_check TIMESTAMPTZ,
    last_ip VARCHAR(45),
    server_guid CHAR(32) NOT NULL UNIQUE,
    token CHAR(64) NOT NULL UNIQUE,
    authorized BOOLEAN NOT NULL DEFAULT TRUE
)"#;

const CREATE_ROUND_LOG: &str = r#"
CREATE TABLE IF NOT EXISTS server_round_log (
    id SERIAL PRIMARY KEY,
    server_id INT REFERENCES servers(id) ON DELETE SET NULL,
    saved_at TIMESTAMPTZ,
    server_name TEXT,
    gamemode TEXT,
    map TEXT,
    num_players INT,
    winning_team_id INT,
    duration DOUBLE PRECISION
)"#;

// Legacy/unassociated history rows attach to this well-known round.
const INSERT_UNKNOWN_ROUND: &str = r#"
INSERT INTO server_round_log (id, server_id, server_name, gamemode, map)
VALUES (-1, NULL, 'Unknown', 'Unknown', 'Unknown')
ON CONFLICT (id) DO NOTHING"#;

const CREATE_PLAYERS: &str = r#"
CREATE TABLE IF NOT EXISTS players (
    id SERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    guid VARCHAR(32) NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    last_server_id INT REFERENCES servers(id) ON DELETE SET NULL
)"#;

const CREATE_PROGRESSION: &str = r#"
CREATE TABLE IF NOT EXISTS player_progression (
    player_id INT PRIMARY KEY REFERENCES players(id) ON DELETE CASCADE,
    last_updated TIMESTAMPTZ NOT NULL DEFAULT now(),
    kills BIGINT NOT NULL DEFAULT 0,
    deaths BIGINT NOT NULL DEFAULT 0,
    total_level BIGINT NOT NULL DEFAULT 0,
    total_xp BIGINT NOT NULL DEFAULT 0,
    assault_level BIGINT NOT NULL DEFAULT 0,
    assault_xp BIGINT NOT NULL DEFAULT 0,
    engineer_level BIGINT NOT NULL DEFAULT 0,
    engineer_xp BIGINT NOT NULL DEFAULT 0,
    support_level BIGINT NOT NULL DEFAULT 0,
    support_xp BIGINT NOT NULL DEFAULT 0,
    recon_level BIGINT NOT NULL DEFAULT 0,
    recon_xp BIGINT NOT NULL DEFAULT 0,
    weapon_progression TEXT NOT NULL DEFAULT '',
    vehicle_progression TEXT NOT NULL DEFAULT ''
)"#;

const CREATE_SAVE_LOG: &str = r#"
CREATE TABLE IF NOT EXISTS player_save_log (
    id BIGSERIAL PRIMARY KEY,
    player_id INT NOT NULL REFERENCES players(id) ON DELETE CASCADE,
    server_round_id INT NOT NULL REFERENCES server_round_log(id) ON DELETE CASCADE,
    team_id INT NOT NULL,
    squad_id INT NOT NULL,
    saved_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    kills BIGINT NOT NULL DEFAULT 0,
    deaths BIGINT NOT NULL DEFAULT 0,
    total_level BIGINT NOT NULL DEFAULT 0,
    total_xp BIGINT NOT NULL DEFAULT 0,
    assault_level BIGINT NOT NULL DEFAULT 0,
    assault_xp BIGINT NOT NULL DEFAULT 0,
    engineer_level BIGINT NOT NULL DEFAULT 0,
    engineer_xp BIGINT NOT NULL DEFAULT 0,
    support_level BIGINT NOT NULL DEFAULT 0,
    support_xp BIGINT NOT NULL DEFAULT 0,
    recon_level BIGINT NOT NULL DEFAULT 0,
    recon_xp BIGINT NOT NULL DEFAULT 0,
    weapon_progression TEXT NOT NULL DEFAULT '',
    vehicle_progression TEXT NOT NULL DEFAULT ''
)"#;

// Backs the reverse-chronological history listing.
const CREATE_SAVE_LOG_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_player_save_log_player_saved
    ON player_save_log (player_id, saved_at DESC)"#;

/// Ensure all tables, the unknown-round sentinel and indexes exist.
///
/// Idempotent; run once at startup before serving traffic.
pub async fn init(conn: &DatabaseConnection) -> Result<()> {
    debug!(target = LOG_TARGET, "ensuring database schema");
    let statements = [
        CREATE_SERVERS,
        CREATE_ROUND_LOG,
        INSERT_UNKNOWN_ROUND,
        CREATE_PLAYERS,
        CREATE_PROGRESSION,
        CREATE_SAVE_LOG,
        CREATE_SAVE_LOG_INDEX,
    ];
    for statement in statements {
        conn.execute_unprepared(statement)
            .await
            .context("failed to apply schema statement")?;
    }
    Ok(())
}
