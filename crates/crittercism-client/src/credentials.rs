// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Credentials for the Crittercism OAuth exchange
//!
//! A client needs either a pre-issued bearer token or a password grant it can
//! exchange for one. Scoped transaction tokens always require the password
//! grant, so supplying both is the common case for long-running integrations.
//!
//! Secrets never show up in `Debug` output.

use core::fmt;
use std::str::FromStr;

use crate::error::{CrittercismError, CrittercismResult};

/// A string guaranteed to contain at least one non-whitespace character
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyString(Box<str>);

impl NonEmptyString {
    /// Validate and wrap a string
    ///
    /// Empty and whitespace-only input is rejected; surrounding whitespace is kept.
    pub fn new(s: impl Into<String>) -> Result<Self, String> {
        let s = s.into();
        if s.trim().is_empty() {
            Err("String cannot be empty or whitespace-only".to_string())
        } else {
            Ok(Self(s.into_boxed_str()))
        }
    }

    /// Borrow the contained string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NonEmptyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for NonEmptyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NonEmptyString {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for NonEmptyString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Client id, username and password used for the `password` grant
#[derive(Clone)]
pub struct PasswordGrant {
    client_id: NonEmptyString,
    username: NonEmptyString,
    password: NonEmptyString,
}

impl PasswordGrant {
    /// Build a password grant, rejecting empty fields
    pub fn new(
        client_id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> CrittercismResult<Self> {
        let field = |name: &str, value: String| {
            NonEmptyString::new(value)
                .map_err(|e| CrittercismError::config(format!("{name}: {e}")))
        };

        Ok(Self {
            client_id: field("client_id", client_id.into())?,
            username: field("username", username.into())?,
            password: field("password", password.into())?,
        })
    }

    /// OAuth client id, sent base64-encoded as HTTP Basic authorization
    pub fn client_id(&self) -> &str {
        self.client_id.as_str()
    }

    /// Account username
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Account password
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for PasswordGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordGrant")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Everything the client may use to obtain bearer tokens
#[derive(Clone, Default)]
pub struct Credentials {
    grant: Option<PasswordGrant>,
    token: Option<NonEmptyString>,
}

impl Credentials {
    /// Credentials that authenticate with a password grant at connect time
    pub fn password(grant: PasswordGrant) -> Self {
        Self {
            grant: Some(grant),
            token: None,
        }
    }

    /// Credentials with a pre-issued bearer token only
    ///
    /// Transaction endpoints will fail with a configuration error, since scoped
    /// tokens can only be obtained through the password grant.
    pub fn token(token: impl Into<String>) -> CrittercismResult<Self> {
        let token = NonEmptyString::new(token)
            .map_err(|e| CrittercismError::config(format!("token: {e}")))?;
        Ok(Self {
            grant: None,
            token: Some(token),
        })
    }

    /// Attach a pre-issued bearer token, skipping the exchange at connect time
    ///
    /// Blank tokens are ignored.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = NonEmptyString::new(token).ok();
        self
    }

    /// The password grant, if configured
    pub fn grant(&self) -> Option<&PasswordGrant> {
        self.grant.as_ref()
    }

    /// The pre-issued bearer token, if configured
    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_ref().map(NonEmptyString::as_str)
    }

    /// Reject credentials that can never produce a token
    pub fn validate(&self) -> CrittercismResult<()> {
        if self.grant.is_none() && self.token.is_none() {
            return Err(CrittercismError::config(
                "either a bearer token or a password grant is required",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("grant", &self.grant)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
