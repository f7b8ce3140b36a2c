use crate::database::Repositories;
use crate::database::entities::UserEntity;
use crate::error::{AppError, AppResult};

use super::types::CreateUserRequest;

/// 用户注册与查询，不涉及密码与登录
pub struct UserService {
    repos: Repositories,
}

/// 本地部分只允许字母、数字与 `+_.-`，@ 之后非空
fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && local
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "+_.-".contains(c))
        }
        None => false,
    }
}

impl UserService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn create(&self, req: CreateUserRequest) -> AppResult<UserEntity> {
        let email = req
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
            .ok_or_else(|| AppError::invalid("Email is required"))?;
        let username = req
            .username
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::invalid("Username is required"))?;
        if !is_valid_email(&email) {
            return Err(AppError::invalid("Invalid email format"));
        }

        if self.repos.users.exists_by_email(&email).await? {
            return Err(AppError::Conflict(format!("Email already in use: {}", email)));
        }
        if self.repos.users.exists_by_username(&username).await? {
            return Err(AppError::Conflict(format!(
                "Username already in use: {}",
                username
            )));
        }

        let saved = self
            .repos
            .users
            .save(UserEntity {
                id: 0,
                username,
                email,
            })
            .await?;
        tracing::info!("User {} registered", saved.id);
        Ok(saved)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<UserEntity> {
        self.repos
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }
}
