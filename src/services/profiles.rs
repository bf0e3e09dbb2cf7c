/// Profile service - single-document profile reads and field updates
use std::sync::Arc;
use std::time::Duration;

use crate::config::OpsConfig;
use crate::db::UserRecords;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::stores::{with_deadline, IdentityField, IdentityProvider};
use crate::validators;

pub struct ProfileService {
    users: Arc<UserRecords>,
    identity: Arc<dyn IdentityProvider>,
    op_timeout: Duration,
}

impl ProfileService {
    pub fn new(
        users: Arc<UserRecords>,
        identity: Arc<dyn IdentityProvider>,
        ops: &OpsConfig,
    ) -> Self {
        Self {
            users,
            identity,
            op_timeout: ops.operation_timeout,
        }
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        with_deadline("profile read", self.op_timeout, self.users.get(user_id)).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        with_deadline(
            "profile lookup by email",
            self.op_timeout,
            self.users.find_by_email(email),
        )
        .await
    }

    /// Resolve the profile behind a session's account id.
    pub async fn find_by_account(&self, account_id: &str) -> Result<Option<User>> {
        with_deadline(
            "profile lookup by account",
            self.op_timeout,
            self.users.find_by_account(account_id),
        )
        .await
    }

    pub async fn update_username(&self, user_id: &str, username: &str) -> Result<User> {
        if !validators::validate_username(username) {
            return Err(AppError::Validation(format!(
                "invalid username: {username}"
            )));
        }
        with_deadline(
            "username update",
            self.op_timeout,
            self.users.update_username(user_id, username),
        )
        .await
    }

    /// Change the profile email and mirror it onto the identity record.
    ///
    /// The profile document is authoritative; the identity copy catches up
    /// best-effort, with a failed mirror logged as drift.
    pub async fn update_email(&self, user_id: &str, email: &str) -> Result<User> {
        if !validators::validate_email(email) {
            return Err(AppError::Validation(format!("invalid email: {email}")));
        }
        with_deadline("email update", self.op_timeout, async {
            let updated = self.users.update_email(user_id, email).await?;
            if let Err(err) = self
                .identity
                .update_field(&updated.account_id, IdentityField::Email, email)
                .await
            {
                tracing::warn!(user_id, error = %err, "identity email mirror failed");
            }
            Ok(updated)
        })
        .await
    }

    pub async fn set_privacy(&self, user_id: &str, private: bool) -> Result<User> {
        with_deadline(
            "privacy update",
            self.op_timeout,
            self.users.set_privacy(user_id, private),
        )
        .await
    }
}
