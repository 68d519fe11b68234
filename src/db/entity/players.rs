use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "players")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub guid: String,
    pub created_at: DateTimeUtc,
    pub last_server_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::servers::Entity",
        from = "Column::LastServerId",
        to = "super::servers::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Servers,
    #[sea_orm(has_one = "super::player_progression::Entity")]
    PlayerProgression,
    #[sea_orm(has_many = "super::player_save_log::Entity")]
    PlayerSaveLog,
}

impl Related<super::servers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Servers.def()
    }
}

impl Related<super::player_progression::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlayerProgression.def()
    }
}

impl Related<super::player_save_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlayerSaveLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
