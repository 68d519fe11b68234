use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "player_save_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub player_id: i32,
    pub server_round_id: i32,
    pub team_id: i32,
    pub squad_id: i32,
    pub saved_at: DateTimeUtc,
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
    #[sea_orm(column_type = "Text")]
    pub weapon_progression: String,
    #[sea_orm(column_type = "Text")]
    pub vehicle_progression: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::players::Entity",
        from = "Column::PlayerId",
        to = "super::players::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Players,
    #[sea_orm(
        belongs_to = "super::server_round_log::Entity",
        from = "Column::ServerRoundId",
        to = "super::server_round_log::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    ServerRoundLog,
}

impl Related<super::players::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Players.def()
    }
}

impl Related<super::server_round_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServerRoundLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
