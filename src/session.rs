// 🔑 Session - explicit login state with explicit load/save boundaries
//
// A session is read once at startup, written on login and removed on logout.
// Callers hold the `Session` value and pass it down; nothing reads it ambiently.

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub name: Option<String>,
    /// Backend student id; absent for admins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

/// Bearer token plus the user it was issued to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }

    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

// ============================================================================
// SESSION STORE
// ============================================================================

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        SessionStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when nobody is logged in; a corrupt file is an error
    pub fn load(&self) -> Result<Option<Session>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read session: {:?}", self.path))
            }
        };

        let session: Session = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse session: {:?}", self.path))?;

        info!(username = %session.user.username, "session loaded");
        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create session dir: {:?}", parent))?;
            }
        }

        let json = serde_json::to_string_pretty(session).context("Failed to encode session")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write session: {:?}", self.path))?;

        info!(username = %session.user.username, "session saved");
        Ok(())
    }

    /// Logout. Clearing an absent session is not an error.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("session cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to clear session: {:?}", self.path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student_session() -> Session {
        Session {
            token: "abc.def.ghi".to_string(),
            user: SessionUser {
                username: "asha".to_string(),
                role: Role::Student,
                name: Some("Asha Rao".to_string()),
                id: Some(7),
            },
        }
    }

    #[test]
    fn test_load_without_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.json"));
        let session = student_session();

        store.save(&session).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded, session);
        assert!(!loaded.is_admin());
        assert_eq!(loaded.authorization_header(), "Bearer abc.def.ghi");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        store.save(&student_session()).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();

        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_corrupt_session_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = SessionStore::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("Failed to parse session"));
    }

    #[test]
    fn test_backend_user_shape() {
        let json = r#"{
            "token": "t",
            "user": { "username": "admin", "role": "admin", "name": "Admin User" }
        }"#;

        let session: Session = serde_json::from_str(json).unwrap();
        assert!(session.is_admin());
        assert_eq!(session.user.id, None);
    }
}
