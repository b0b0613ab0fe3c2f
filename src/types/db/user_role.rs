use sea_orm::entity::prelude::*;

use crate::types::internal::access::AssignmentReach;

/// A user holding a role, optionally scoped to one facility and/or department
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "user_roles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub role_id: String,
    /// `None` means the assignment applies in every facility
    pub facility_id: Option<String>,
    pub department_id: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::role::Entity",
        from = "Column::RoleId",
        to = "super::role::Column::Id"
    )]
    Role,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this assignment counts toward a check with the given reach
    pub fn applies_to(&self, reach: AssignmentReach<'_>) -> bool {
        match (reach, self.facility_id.as_deref()) {
            (AssignmentReach::Any, _) => true,
            (_, None) => true,
            (AssignmentReach::Facility(target), Some(scope)) => target == scope,
            (AssignmentReach::Global, Some(_)) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(facility_id: Option<&str>) -> Model {
        Model {
            id: "ur-1".to_string(),
            user_id: "u-1".to_string(),
            role_id: "r-1".to_string(),
            facility_id: facility_id.map(str::to_owned),
            department_id: None,
            created_at: 0,
        }
    }

    #[test]
    fn test_scoped_assignment_reach() {
        let scoped = assignment(Some("north"));

        assert!(scoped.applies_to(AssignmentReach::Any));
        assert!(scoped.applies_to(AssignmentReach::Facility("north")));
        assert!(!scoped.applies_to(AssignmentReach::Facility("south")));
        assert!(!scoped.applies_to(AssignmentReach::Global));
    }

    #[test]
    fn test_unscoped_assignment_reaches_everywhere() {
        let global = assignment(None);

        assert!(global.applies_to(AssignmentReach::Facility("south")));
        assert!(global.applies_to(AssignmentReach::Global));
    }
}
