use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "alert_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub name: String,
    pub rule_type: String,
    pub metric_name: String,
    pub host_id: Option<String>,
    pub condition: String,
    pub threshold: f64,
    pub severity: String,
    pub enabled: bool,
    /// JSON array of channel IDs.
    pub notification_channel_ids: String,
    pub cooldown_minutes: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
