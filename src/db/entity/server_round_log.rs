use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "server_round_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub server_id: Option<i32>,
    pub saved_at: Option<DateTimeUtc>,
    pub server_name: Option<String>,
    pub gamemode: Option<String>,
    pub map: Option<String>,
    pub num_players: Option<i32>,
    pub winning_team_id: Option<i32>,
    #[sea_orm(column_type = "Double", nullable)]
    pub duration: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::servers::Entity",
        from = "Column::ServerId",
        to = "super::servers::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Servers,
    #[sea_orm(has_many = "super::player_save_log::Entity")]
    PlayerSaveLog,
}

impl Related<super::servers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Servers.def()
    }
}

impl Related<super::player_save_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlayerSaveLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
