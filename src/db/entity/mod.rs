pub mod player_progression;
pub mod player_save_log;
pub mod players;
pub mod server_round_log;
pub mod servers;
