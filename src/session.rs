//! Authentication context of the service.
//!
//! The session is built once at startup from the persisted session file and
//! shared with the API client, the reminder scheduler and the routes. Login
//! and registration persist the token, logout removes it again.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{fs, io, path::PathBuf};

use crate::error::SessionError;
use crate::models::{AuthResponse, User};
use crate::util::get_short_token;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
struct StoredAuth {
    token: String,
    user: User,
}

/// File-backed replacement for the app's local key-value storage.
#[derive(Clone, Debug)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> TokenStore {
        TokenStore { path: path.into() }
    }

    fn load(&self) -> Result<Option<StoredAuth>, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, auth: &StoredAuth) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(auth)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

pub struct Session {
    store: TokenStore,
    auth: Option<StoredAuth>,
}

impl Session {
    /// Loads the persisted token, starting unauthenticated if there is none
    /// or the file cannot be read.
    pub fn load(store: TokenStore) -> Session {
        let auth = match store.load() {
            Ok(auth) => auth,
            Err(e) => {
                warn!("session:: ignoring unreadable session file {:?}: {}", store.path, e);
                None
            }
        };
        if let Some(auth) = &auth {
            info!("session:: restored session for user {} (token ...{})", auth.user.id, get_short_token(&auth.token));
        }
        Session { store, auth }
    }

    pub fn token(&self) -> Option<&str> {
        self.auth.as_ref().map(|a| a.token.as_str())
    }

    pub fn user(&self) -> Option<&User> {
        self.auth.as_ref().map(|a| &a.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    pub fn establish(&mut self, response: AuthResponse) -> Result<&User, SessionError> {
        let auth = StoredAuth {
            token: response.access_token,
            user: response.user,
        };
        self.store.save(&auth)?;
        info!("session:: established for user {} (token ...{})", auth.user.id, get_short_token(&auth.token));
        Ok(&self.auth.insert(auth).user)
    }

    /// Logout. In-memory state is dropped even if the file cannot be removed.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        self.auth = None;
        self.store.clear()?;
        info!("session:: cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::auth_response;

    #[test]
    fn starts_empty_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::load(TokenStore::new(dir.path().join("session.json")));
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
    }

    #[test]
    fn persisted_token_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut session = Session::load(TokenStore::new(&path));
        session.establish(auth_response("tok-123")).unwrap();

        let reloaded = Session::load(TokenStore::new(&path));
        assert_eq!(reloaded.token(), Some("tok-123"));
        assert_eq!(reloaded.user().map(|u| u.name.as_str()), Some("Maria Souza"));
    }

    #[test]
    fn logout_removes_file_and_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut session = Session::load(TokenStore::new(&path));
        session.establish(auth_response("tok-123")).unwrap();
        session.clear().unwrap();

        assert!(!session.is_authenticated());
        assert!(!path.exists());
        assert!(!Session::load(TokenStore::new(&path)).is_authenticated());
        // second logout is harmless
        session.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        assert!(!Session::load(TokenStore::new(&path)).is_authenticated());
    }
}
