use crate::{
    auth::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH},
    db::{ListQuery, ListResult},
    entities::user::{self, Entity as UserEntity, UserRole},
    errors::{ServiceError, ServiceResult},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn password_length(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        let mut err = ValidationError::new("length");
        err.message = Some(format!("must be at least {MIN_PASSWORD_LENGTH} characters").into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 3, max = 50))]
    #[schema(example = "staff")]
    pub username: String,
    #[validate(custom = "password_length")]
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 3, max = 50))]
    pub username: Option<String>,
    #[validate(custom = "password_length")]
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    #[validate(custom = "password_length")]
    pub new_password: String,
}

fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Service for user accounts
#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DatabaseConnection>,
}

impl UserService {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn create(&self, request: CreateUserRequest) -> ServiceResult<user::Model> {
        request.validate()?;
        let username = normalize_username(&request.username);
        if self.get_by_username(&username).await?.is_some() {
            return Err(username_taken(&username));
        }

        let password_hash = request
            .password
            .as_deref()
            .map(hash_password)
            .transpose()?;

        let created = user::ActiveModel {
            name: Set(request.name.trim().to_string()),
            username: Set(username.clone()),
            can_login: Set(password_hash.is_some()),
            password_hash: Set(password_hash),
            role: Set(request.role.unwrap_or_default()),
            is_active: Set(request.is_active.unwrap_or(true)),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| ServiceError::from_unique_violation(e, "username", &username))?;

        info!(user_id = %created.id, role = %created.role, "user created");
        Ok(created)
    }

    pub async fn list(&self, query: ListQuery) -> ServiceResult<ListResult<Value>> {
        query
            .with_default_sort("name", false)
            .fetch::<UserEntity, _>(&*self.db_pool)
            .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> ServiceResult<user::Model> {
        UserEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))
    }

    pub async fn get_by_username(&self, username: &str) -> ServiceResult<Option<user::Model>> {
        Ok(UserEntity::find()
            .filter(user::Column::Username.eq(normalize_username(username)))
            .one(&*self.db_pool)
            .await?)
    }

    pub async fn get_by_role(&self, role: UserRole) -> ServiceResult<Vec<user::Model>> {
        Ok(UserEntity::find()
            .filter(user::Column::Role.eq(role))
            .order_by_asc(user::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    /// Partial update. A new password is hashed and enables login.
    #[instrument(skip(self, request), fields(user_id = %id))]
    pub async fn update(&self, id: Uuid, request: UpdateUserRequest) -> ServiceResult<user::Model> {
        request.validate()?;
        let mut active = self.get_by_id(id).await?.into_active_model();

        let mut username_for_conflict = None;
        if let Some(username) = request.username {
            let username = normalize_username(&username);
            if let Some(other) = self.get_by_username(&username).await? {
                if other.id != id {
                    return Err(username_taken(&username));
                }
            }
            active.username = Set(username.clone());
            username_for_conflict = Some(username);
        }
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(password) = request.password {
            active.password_hash = Set(Some(hash_password(&password)?));
            active.can_login = Set(true);
        }
        if let Some(role) = request.role {
            active.role = Set(role);
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }

        active.update(&*self.db_pool).await.map_err(|e| match username_for_conflict {
            Some(username) => ServiceError::from_unique_violation(e, "username", &username),
            None => ServiceError::from(e),
        })
    }

    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let result = UserEntity::delete_by_id(id).exec(&*self.db_pool).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("User", id));
        }
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    /// Resolves sign-in credentials to a user allowed to log in.
    #[instrument(skip(self, password))]
    pub async fn verify_credentials(&self, username: &str, password: &str) -> ServiceResult<user::Model> {
        let user = self
            .get_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::NotFound("The user does not exist".into()))?;

        let Some(hash) = user.password_hash.as_deref().filter(|_| user.can_login && user.is_active)
        else {
            warn!(user_id = %user.id, "login attempt for a user that cannot log in");
            return Err(ServiceError::Forbidden(
                "The user is not allowed to log in".into(),
            ));
        };

        if !verify_password(password, hash) {
            warn!(user_id = %user.id, "incorrect password");
            return Err(ServiceError::BadRequest(
                "Username or Password is incorrect".into(),
            ));
        }
        Ok(user)
    }

    #[instrument(skip(self, request), fields(user_id = %id))]
    pub async fn change_password(&self, id: Uuid, request: ChangePasswordRequest) -> ServiceResult<()> {
        request.validate()?;
        let user = self.get_by_id(id).await?;
        let matches = user
            .password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(&request.old_password, hash));
        if !matches {
            return Err(ServiceError::Unauthorized(
                "The old password is incorrect".into(),
            ));
        }

        let mut active = user.into_active_model();
        active.password_hash = Set(Some(hash_password(&request.new_password)?));
        active.can_login = Set(true);
        active.update(&*self.db_pool).await?;
        info!(user_id = %id, "password changed");
        Ok(())
    }
}

fn username_taken(username: &str) -> ServiceError {
    ServiceError::Conflict(format!(
        "The username \"{username}\" is already registered. Please use a different username."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_are_trimmed_and_lowercased() {
        assert_eq!(normalize_username("  Admin "), "admin");
    }

    #[test]
    fn short_passwords_fail_validation() {
        let request = CreateUserRequest {
            name: "Staff".into(),
            username: "staff".into(),
            password: Some("12345".into()),
            role: None,
            is_active: None,
        };
        let err = ServiceError::from(request.validate().unwrap_err());
        match err {
            ServiceError::InvalidFields(fields) => assert_eq!(fields[0].field, "password"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
