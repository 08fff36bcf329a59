//! Identity directory declaration
//!
//! The directory itself is a managed external service. This module captures
//! what we declare about it: sign-in by email, self sign-up with automatic
//! email verification, the password policy, and the registered app client.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DirectoryError;

/// Pool name prefix; the stage is appended
pub const USER_POOL_NAME_PREFIX: &str = "ticketpro-users";

/// Name of the web application client
pub const WEB_CLIENT_NAME: &str = "WebClient";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid")
    })
}

/// A normalised (trimmed, lowercased) email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> Result<Self, DirectoryError> {
        let normalised = raw.trim().to_lowercase();
        if normalised.len() > 254 || !email_regex().is_match(&normalised) {
            return Err(DirectoryError::InvalidEmail(raw.to_string()));
        }
        Ok(Self(normalised))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Password complexity rules enforced by the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_digits: bool,
    pub require_symbols: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_lowercase: true,
            require_uppercase: true,
            require_digits: true,
            require_symbols: false,
        }
    }
}

impl PasswordPolicy {
    /// Every rule the password violates; empty when it conforms
    pub fn violations(&self, password: &str) -> Vec<String> {
        let mut violations = Vec::new();

        if password.chars().count() < self.min_length {
            violations.push(format!("must be at least {} characters", self.min_length));
        }
        if self.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            violations.push("must contain a lowercase letter".to_string());
        }
        if self.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            violations.push("must contain an uppercase letter".to_string());
        }
        if self.require_digits && !password.chars().any(|c| c.is_ascii_digit()) {
            violations.push("must contain a digit".to_string());
        }
        if self.require_symbols && password.chars().all(|c| c.is_alphanumeric()) {
            violations.push("must contain a symbol".to_string());
        }

        violations
    }

    pub fn check(&self, password: &str) -> Result<(), DirectoryError> {
        let violations = self.violations(password);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(DirectoryError::InvalidPassword(violations))
        }
    }
}

/// Attribute users sign in with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignInAlias {
    Email,
}

/// Authentication flows an app client may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthFlow {
    /// Direct username/password exchange
    #[serde(rename = "USER_PASSWORD_AUTH")]
    UserPassword,
    /// Secure remote password challenge
    #[serde(rename = "USER_SRP_AUTH")]
    UserSrp,
}

impl fmt::Display for AuthFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFlow::UserPassword => write!(f, "USER_PASSWORD_AUTH"),
            AuthFlow::UserSrp => write!(f, "USER_SRP_AUTH"),
        }
    }
}

/// An application client registered with the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDefinition {
    pub name: String,
    pub auth_flows: Vec<AuthFlow>,
}

impl ClientDefinition {
    /// The web client: password and SRP sign-in
    pub fn web() -> Self {
        Self {
            name: WEB_CLIENT_NAME.to_string(),
            auth_flows: vec![AuthFlow::UserPassword, AuthFlow::UserSrp],
        }
    }

    pub fn allows(&self, flow: AuthFlow) -> bool {
        self.auth_flows.contains(&flow)
    }
}

/// Declared configuration of the user directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryDefinition {
    pub pool_name: String,
    pub self_sign_up_enabled: bool,
    pub sign_in_alias: SignInAlias,
    pub auto_verify_email: bool,
    pub password_policy: PasswordPolicy,
    pub client: ClientDefinition,
}

impl DirectoryDefinition {
    pub fn ticketpro(pool_name: impl Into<String>) -> Self {
        Self {
            pool_name: pool_name.into(),
            self_sign_up_enabled: true,
            sign_in_alias: SignInAlias::Email,
            auto_verify_email: true,
            password_policy: PasswordPolicy::default(),
            client: ClientDefinition::web(),
        }
    }

    /// Default pool name for a stage, e.g. `ticketpro-users-dev`
    pub fn default_name(stage: &str) -> String {
        format!("{}-{}", USER_POOL_NAME_PREFIX, stage)
    }
}
