/// Auth service - registration and session flows
///
/// The identity provider owns accounts and sessions; the document store
/// holds the profile. Registration pairs the two: the verification code
/// allocates (or resolves) the account, and the profile document is created
/// only when the email is new. Code delivery transport and cookie handling
/// live outside this crate.
use std::sync::Arc;
use std::time::Duration;

use crate::config::OpsConfig;
use crate::db::{NewUser, UserRecords};
use crate::error::{AppError, Result};
use crate::stores::{with_deadline, IdentityProvider, SessionToken};
use crate::validators;

/// A pending email verification: which account it belongs to and which
/// challenge the emailed code answers.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthChallenge {
    pub account_id: String,
    pub challenge_id: String,
}

pub struct AuthService {
    users: Arc<UserRecords>,
    identity: Arc<dyn IdentityProvider>,
    op_timeout: Duration,
}

impl AuthService {
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

    /// Start a sign-up: send a verification code and make sure a profile
    /// document exists for the email. Registering an already-known email
    /// just re-sends the code; no duplicate profile is created.
    pub async fn register(&self, username: &str, email: &str) -> Result<AuthChallenge> {
        if !validators::validate_username(username) {
            return Err(AppError::Validation(format!(
                "invalid username: {username}"
            )));
        }
        if !validators::validate_email(email) {
            return Err(AppError::Validation(format!("invalid email: {email}")));
        }

        with_deadline("registration", self.op_timeout, async {
            let existing = self.users.find_by_email(email).await?;
            let challenge = self.identity.send_verification_code(email).await?;

            if existing.is_none() {
                self.users
                    .create(NewUser {
                        username: username.to_string(),
                        email: email.to_string(),
                        account_id: challenge.account_id.clone(),
                    })
                    .await?;
                tracing::info!(email, "profile created for new registration");
            }

            Ok(AuthChallenge {
                account_id: challenge.account_id,
                challenge_id: challenge.id,
            })
        })
        .await
    }

    /// Start a sign-in for a known email.
    pub async fn start_login(&self, email: &str) -> Result<AuthChallenge> {
        with_deadline("login", self.op_timeout, async {
            let user = self
                .users
                .find_by_email(email)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("no account registered for {email}")))?;

            let challenge = self.identity.send_verification_code(email).await?;
            Ok(AuthChallenge {
                account_id: user.account_id,
                challenge_id: challenge.id,
            })
        })
        .await
    }

    /// Exchange a delivered verification code for a session.
    pub async fn verify_code(&self, account_id: &str, secret: &str) -> Result<SessionToken> {
        with_deadline(
            "session mint",
            self.op_timeout,
            self.identity.create_session(account_id, secret),
        )
        .await
    }

    pub async fn logout(&self, session_ref: &str) -> Result<()> {
        with_deadline(
            "logout",
            self.op_timeout,
            self.identity.delete_session(session_ref),
        )
        .await
    }
}
