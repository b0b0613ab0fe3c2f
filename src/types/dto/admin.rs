use poem_openapi::Object;

#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    pub role_id: String,
    pub facility_id: Option<String>,
    pub department_id: Option<String>,
}

#[derive(Object, Debug, Clone)]
#[oai(rename_all = "camelCase")]
pub struct RoleAssignmentResponse {
    pub id: String,
    pub user_id: String,
    pub role_id: String,
    pub facility_id: Option<String>,
    pub department_id: Option<String>,
    pub created_at: i64,
}

#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct GrantPermissionRequest {
    pub permission_id: String,
}

#[derive(Object, Debug, Clone)]
#[oai(rename_all = "camelCase")]
pub struct UserPermissionResponse {
    pub id: String,
    pub user_id: String,
    pub permission_id: String,
    pub granted_by: Option<String>,
    pub granted_at: i64,
}

#[derive(Object, Debug, Clone)]
#[oai(rename_all = "camelCase")]
pub struct RolePermissionResponse {
    pub id: String,
    pub role_id: String,
    pub permission_id: String,
}

#[derive(Object, Debug, Clone)]
#[oai(rename_all = "camelCase")]
pub struct UserStatusResponse {
    pub id: String,
    pub username: String,
    pub status: String,
    pub failed_login_attempts: i32,
    pub locked_until: Option<i64>,
}

#[derive(Object, Debug)]
pub struct RenameRoleRequest {
    pub name: String,
}

#[derive(Object, Debug, Clone)]
#[oai(rename_all = "camelCase")]
pub struct RoleResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_system_role: bool,
}
