//! Account service
//!
//! Registration, email confirmation and sign-in through the identity
//! directory's registered web client.

use std::sync::Arc;

use crate::domain::identity::EmailAddress;
use crate::domain::ports::{AuthRequest, AuthSession, IdentityDirectory, SignUpOutcome};
use crate::error::{AppError, DirectoryError};

/// Service for user accounts
pub struct AccountService<D>
where
    D: IdentityDirectory,
{
    directory: Arc<D>,
}

impl<D> AccountService<D>
where
    D: IdentityDirectory,
{
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Register a new account; the user must confirm their email before signing in
    pub async fn register(&self, email: &str, password: &str) -> Result<SignUpOutcome, AppError> {
        let email = EmailAddress::parse(email)?;
        let client_id = self.directory.client_id();

        let outcome = self
            .directory
            .sign_up(&client_id, &email, password)
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "Sign-up rejected");
                e
            })?;

        tracing::info!(user_sub = %outcome.user_sub, destination = %outcome.code_destination, "Account registered");
        Ok(outcome)
    }

    /// Confirm an account with the code sent to its email
    pub async fn confirm(&self, email: &str, code: &str) -> Result<(), AppError> {
        let email = EmailAddress::parse(email)?;
        let code = code.trim();
        if code.is_empty() {
            return Err(DirectoryError::CodeMismatch.into());
        }

        let client_id = self.directory.client_id();
        self.directory
            .confirm_sign_up(&client_id, &email, code)
            .await?;
        Ok(())
    }

    /// Sign in with email and password
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let request = AuthRequest::UserPassword {
            email: EmailAddress::parse(email)?,
            password: password.to_string(),
        };

        let client_id = self.directory.client_id();
        let session = self.directory.initiate_auth(&client_id, &request).await?;

        tracing::debug!(email = %request.email(), "Signed in");
        Ok(session)
    }
}
