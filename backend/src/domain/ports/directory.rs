//! Identity directory port
//!
//! The directory is an external managed service. This trait is the slice of
//! its API the application consumes: self sign-up, email confirmation, and
//! sign-in through the registered app client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::identity::{AuthFlow, EmailAddress};
use crate::error::DirectoryError;

/// Result of a self sign-up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpOutcome {
    /// Stable subject identifier of the new user
    pub user_sub: String,
    /// False until the email has been verified
    pub confirmed: bool,
    /// Where the verification code was sent
    pub code_destination: String,
}

/// Credentials for one sign-in attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRequest {
    UserPassword {
        email: EmailAddress,
        password: String,
    },
    /// First leg of the SRP exchange: the client's public ephemeral `A`
    UserSrp { email: EmailAddress, srp_a: String },
}

impl AuthRequest {
    pub fn flow(&self) -> AuthFlow {
        match self {
            AuthRequest::UserPassword { .. } => AuthFlow::UserPassword,
            AuthRequest::UserSrp { .. } => AuthFlow::UserSrp,
        }
    }

    pub fn email(&self) -> &EmailAddress {
        match self {
            AuthRequest::UserPassword { email, .. } | AuthRequest::UserSrp { email, .. } => email,
        }
    }
}

/// Tokens returned on successful sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token in seconds
    pub expires_in: u64,
}

/// User directory with email sign-in
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Identifier of the directory (user pool id)
    fn directory_id(&self) -> String;

    /// Identifier of the registered app client
    fn client_id(&self) -> String;

    async fn sign_up(
        &self,
        client_id: &str,
        email: &EmailAddress,
        password: &str,
    ) -> Result<SignUpOutcome, DirectoryError>;

    async fn confirm_sign_up(
        &self,
        client_id: &str,
        email: &EmailAddress,
        code: &str,
    ) -> Result<(), DirectoryError>;

    async fn initiate_auth(
        &self,
        client_id: &str,
        request: &AuthRequest,
    ) -> Result<AuthSession, DirectoryError>;
}
