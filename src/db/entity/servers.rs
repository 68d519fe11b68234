use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "servers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub owner_name: String,
    pub owner_contact: Option<String>,
    pub created_on: Date,
    pub last_auth_check: Option<DateTimeUtc>,
    pub last_ip: Option<String>,
    #[sea_orm(unique)]
    pub server_guid: String,
    #[sea_orm(unique)]
    pub token: String,
    pub authorized: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::players::Entity")]
    Players,
    #[sea_orm(has_many = "super::server_round_log::Entity")]
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
