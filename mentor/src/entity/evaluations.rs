//! `evaluations` table: one row per group

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "evaluations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub group_number: i32,
    pub repo_url: String,
    pub group_size: i32,
    pub run_id: Uuid,
    pub overall_score: i32,
    pub confidence: i32,
    #[sea_orm(column_type = "Text")]
    pub summary: String,
    pub stats: Option<Json>,
    pub evaluated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::criterion_scores::Entity")]
    CriterionScores,
}

impl Related<super::criterion_scores::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CriterionScores.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
