//! In-process identity directory
//!
//! Stand-in for the managed user directory in local runs and tests. It honours
//! the declared directory settings: password policy, email confirmation before
//! sign-in, and the auth flows allowed for the app client. The SRP challenge
//! exchange is left to the managed provider.

use std::collections::HashMap;

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::identity::{AuthFlow, DirectoryDefinition, EmailAddress};
use crate::domain::ports::{AuthRequest, AuthSession, IdentityDirectory, SignUpOutcome};
use crate::error::DirectoryError;

/// Access token lifetime in seconds
const TOKEN_TTL_SECS: u64 = 3600;

struct UserRecord {
    sub: String,
    salt: String,
    password_hash: String,
    confirmed: bool,
    pending_code: Option<String>,
}

pub struct InMemoryIdentityDirectory {
    definition: DirectoryDefinition,
    directory_id: String,
    client_id: String,
    users: RwLock<HashMap<EmailAddress, UserRecord>>,
}

impl InMemoryIdentityDirectory {
    /// Create a directory with freshly generated identifiers
    pub fn new(definition: DirectoryDefinition, region: &str) -> Self {
        let directory_id = format!("{}_{}", region, random_alphanumeric(9));
        let client_id = random_alphanumeric(26).to_lowercase();
        Self::with_ids(definition, directory_id, client_id)
    }

    /// Create a directory with known identifiers
    pub fn with_ids(definition: DirectoryDefinition, directory_id: String, client_id: String) -> Self {
        Self {
            definition,
            directory_id,
            client_id,
            users: RwLock::new(HashMap::new()),
        }
    }

    pub fn definition(&self) -> &DirectoryDefinition {
        &self.definition
    }

    /// The verification code last sent to `email`, if still pending
    pub async fn pending_code(&self, email: &EmailAddress) -> Option<String> {
        let users = self.users.read().await;
        users.get(email).and_then(|u| u.pending_code.clone())
    }

    fn check_client(&self, client_id: &str) -> Result<(), DirectoryError> {
        if client_id == self.client_id {
            Ok(())
        } else {
            Err(DirectoryError::UnknownClient(client_id.to_string()))
        }
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryIdentityDirectory {
    fn directory_id(&self) -> String {
        self.directory_id.clone()
    }

    fn client_id(&self) -> String {
        self.client_id.clone()
    }

    async fn sign_up(
        &self,
        client_id: &str,
        email: &EmailAddress,
        password: &str,
    ) -> Result<SignUpOutcome, DirectoryError> {
        self.check_client(client_id)?;
        if !self.definition.self_sign_up_enabled {
            return Err(DirectoryError::NotAuthorized);
        }
        self.definition.password_policy.check(password)?;

        let mut users = self.users.write().await;
        if users.contains_key(email) {
            return Err(DirectoryError::UsernameExists);
        }

        let salt = hex::encode(rand::thread_rng().gen::<[u8; 16]>());
        let code = self
            .definition
            .auto_verify_email
            .then(|| format!("{:06}", rand::thread_rng().gen_range(0..1_000_000)));
        let sub = Uuid::new_v4().to_string();

        if code.is_some() {
            tracing::debug!(email = %email, "Verification code sent");
        }

        users.insert(
            email.clone(),
            UserRecord {
                sub: sub.clone(),
                password_hash: hash_password(&salt, password),
                salt,
                confirmed: false,
                pending_code: code,
            },
        );

        tracing::info!(user_sub = %sub, "User signed up");

        Ok(SignUpOutcome {
            user_sub: sub,
            confirmed: false,
            code_destination: mask_email(email),
        })
    }

    async fn confirm_sign_up(
        &self,
        client_id: &str,
        email: &EmailAddress,
        code: &str,
    ) -> Result<(), DirectoryError> {
        self.check_client(client_id)?;

        let mut users = self.users.write().await;
        let user = users.get_mut(email).ok_or(DirectoryError::UserNotFound)?;

        if user.confirmed {
            return Ok(());
        }
        if user.pending_code.as_deref() != Some(code) {
            return Err(DirectoryError::CodeMismatch);
        }

        user.confirmed = true;
        user.pending_code = None;
        tracing::info!(user_sub = %user.sub, "User confirmed");
        Ok(())
    }

    async fn initiate_auth(
        &self,
        client_id: &str,
        request: &AuthRequest,
    ) -> Result<AuthSession, DirectoryError> {
        self.check_client(client_id)?;

        let flow = request.flow();
        if !self.definition.client.allows(flow) {
            return Err(DirectoryError::UnsupportedAuthFlow(flow.to_string()));
        }

        let (email, password) = match request {
            AuthRequest::UserPassword { email, password } => (email, password),
            AuthRequest::UserSrp { .. } => {
                return Err(DirectoryError::UnsupportedAuthFlow(format!(
                    "{} is served by the managed directory",
                    AuthFlow::UserSrp
                )))
            }
        };

        let users = self.users.read().await;
        let user = users.get(email).ok_or(DirectoryError::NotAuthorized)?;

        if hash_password(&user.salt, password) != user.password_hash {
            return Err(DirectoryError::NotAuthorized);
        }
        if !user.confirmed {
            return Err(DirectoryError::UserNotConfirmed);
        }

        tracing::debug!(user_sub = %user.sub, "User signed in");

        Ok(AuthSession {
            id_token: random_token(),
            access_token: random_token(),
            refresh_token: random_token(),
            expires_in: TOKEN_TTL_SECS,
        })
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn random_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn random_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// `ana@example.com` -> `a***@example.com`
fn mask_email(email: &EmailAddress) -> String {
    match email.as_str().split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().unwrap_or('*');
            format!("{}***@{}", first, domain)
        }
        None => "***".to_string(),
    }
}
