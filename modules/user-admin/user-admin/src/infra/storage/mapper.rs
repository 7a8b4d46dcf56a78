use user_admin_sdk::{Role, User};

use crate::infra::storage::entity::{Model as UserEntity, role};

/// Convert a database entity to a contract model. The password hash stays behind.
impl From<UserEntity> for User {
    fn from(e: UserEntity) -> Self {
        Self {
            id: e.id,
            email: e.email,
            first_name: e.first_name,
            last_name: e.last_name,
            is_active: e.is_active,
            role_id: e.role_id,
            avatar: e.avatar,
            locale: e.locale,
            birthday: e.birthday,
            sex: e.sex,
            address: e.address,
            group_id: e.group_id,
            slack_webhook_url: e.slack_webhook_url,
            coin: e.coin,
            last_login: e.last_login,
            last_logout: e.last_logout,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

impl From<role::Model> for Role {
    fn from(e: role::Model) -> Self {
        Self {
            id: e.id,
            name: e.name,
            description: e.description,
        }
    }
}
