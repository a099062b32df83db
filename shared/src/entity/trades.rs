//! `SeaORM` Entity, @generated manually

use sea_orm::entity::prelude::*;

pub const STATUS_OPEN: &str = "open";
pub const STATUS_CLOSED: &str = "closed";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "trades")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: u64,
    pub robot_id: u64,
    pub account_id: String,
    /// Broker position ID
    pub position_id: String,
    pub symbol: String,
    pub direction: String,
    pub volume: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub strategy: String,
    /// Canonical names of every strategy that agreed
    #[sea_orm(column_type = "Json")]
    pub agreeing: Json,
    pub confidence: f64,
    pub lot_multiplier: f64,
    #[sea_orm(column_type = "Text")]
    pub rationale: String,
    pub status: String,
    pub opened_at: DateTimeUtc,
    pub closed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::robots::Entity",
        from = "Column::RobotId",
        to = "super::robots::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Robots,
}

impl Related<super::robots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Robots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
