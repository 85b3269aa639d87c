//! Sessions
//!
//! An [`AuthUser`] is the signed-in identity every write is stamped with.
//! [`SessionRegistry`] resolves bearer tokens to users; it is built from the
//! `[[auth.users]]` config entries and is read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::UserEntry;

/// An authenticated session's user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Stable user id
    pub id: String,
    pub email: String,
    /// Optional profile name
    #[serde(default)]
    pub full_name: Option<String>,
}

impl AuthUser {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            full_name: None,
        }
    }

    /// Builder method: set the profile name
    pub fn full_name(mut self, name: impl Into<String>) -> Self {
        self.full_name = Some(name.into());
        self
    }

    /// Name shown next to articles and messages: the profile name, else the email
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

/// Bearer token → user lookup
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    tokens: HashMap<String, AuthUser>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configured users
    pub fn from_entries(entries: &[UserEntry]) -> Self {
        let mut registry = Self::new();
        for entry in entries {
            let mut user = AuthUser::new(&entry.id, &entry.email);
            user.full_name = entry.full_name.clone();
            registry.insert(&entry.token, user);
        }
        registry
    }

    /// Register a token for a user
    pub fn insert(&mut self, token: impl Into<String>, user: AuthUser) {
        self.tokens.insert(token.into(), user);
    }

    /// Resolve a token
    pub fn resolve(&self, token: &str) -> Option<&AuthUser> {
        self.tokens.get(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_full_name() {
        let user = AuthUser::new("u1", "asha@example.com").full_name("Asha Rao");
        assert_eq!(user.display_name(), "Asha Rao");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let user = AuthUser::new("u1", "asha@example.com");
        assert_eq!(user.display_name(), "asha@example.com");

        let blank = AuthUser::new("u2", "b@example.com").full_name("  ");
        assert_eq!(blank.display_name(), "b@example.com");
    }

    #[test]
    fn test_registry_from_entries() {
        let entries = vec![UserEntry {
            token: "secret".to_string(),
            id: "u1".to_string(),
            email: "asha@example.com".to_string(),
            full_name: Some("Asha".to_string()),
        }];

        let registry = SessionRegistry::from_entries(&entries);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("secret").unwrap().display_name(), "Asha");
        assert!(registry.resolve("wrong").is_none());
    }
}
