use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Distinguishes the super-admin role from ordinary roles.
///
/// Bypass is keyed on this flag, never on the role's display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    #[sea_orm(string_value = "standard")]
    Standard,
    #[sea_orm(string_value = "super_admin")]
    SuperAdmin,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
    pub kind: RoleKind,
    /// Built-in roles cannot be renamed or deleted
    pub is_system_role: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::role_permission::Entity")]
    RolePermission,
}

impl Related<super::role_permission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RolePermission.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_super_admin(&self) -> bool {
        self.kind == RoleKind::SuperAdmin
    }
}
