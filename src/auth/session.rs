use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tracing::{info, warn};

use crate::auth::jwt::{TokenState, inspect_token};
use crate::error::{DashboardError, DashboardResult};

/// Owned session context: the bearer token and where it is persisted.
///
/// Built once at startup and shared by reference; `teardown` is the only
/// way a token leaves, whether on logout or after the backend rejects it.
pub struct Session {
    token: RwLock<Option<String>>,
    token_file: Option<PathBuf>,
}

impl Session {
    /// Session without persistence.
    pub fn in_memory() -> Self {
        Self {
            token: RwLock::new(None),
            token_file: None,
        }
    }

    /// Picks up a token persisted by an earlier run, if any.
    pub fn restore(token_file: impl Into<PathBuf>) -> Self {
        let token_file = token_file.into();
        let token = match fs::read_to_string(&token_file) {
            Ok(raw) if !raw.trim().is_empty() => Some(raw.trim().to_string()),
            Ok(_) => None,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(error = %e, path = %token_file.display(), "Could not read persisted token");
                None
            }
        };

        let token = token.filter(|t| match inspect_token(t) {
            TokenState::Expired => {
                info!("Persisted token already expired, starting without a session");
                false
            }
            _ => true,
        });

        Self {
            token: RwLock::new(token),
            token_file: Some(token_file),
        }
    }

    pub fn establish(&self, token: String) -> DashboardResult<()> {
        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(DashboardError::validation("Token must not be empty"));
        }
        if inspect_token(&token) == TokenState::Expired {
            return Err(DashboardError::Auth("token already expired".into()));
        }

        if let Some(path) = &self.token_file {
            persist(path, &token)?;
        }

        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
        info!("Session established");
        Ok(())
    }

    /// Token for the `Authorization` header.
    pub fn bearer(&self) -> DashboardResult<String> {
        let token = self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| DashboardError::Auth("no active session".into()))?;

        if inspect_token(&token) == TokenState::Expired {
            self.teardown();
            return Err(DashboardError::Auth("token expired".into()));
        }

        Ok(token)
    }

    pub fn is_active(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn teardown(&self) {
        let had_token = self
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();

        if let Some(path) = &self.token_file {
            if let Err(e) = fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(error = %e, path = %path.display(), "Could not remove persisted token");
                }
            }
        }

        if had_token {
            info!("Session torn down");
        }
    }
}

fn persist(path: &Path, token: &str) -> DashboardResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DashboardError::Storage(e.to_string()))?;
    }
    fs::write(path, token).map_err(|e| DashboardError::Storage(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::tests::backend_token;
    use crate::test_support::temp_dir;

    #[test]
    fn bearer_requires_a_session() {
        let session = Session::in_memory();
        assert!(session.bearer().unwrap_err().is_auth());
        assert!(!session.is_active());
    }

    #[test]
    fn established_token_survives_restart() {
        let dir = temp_dir("session-restore");
        let path = dir.join("token");
        let token = backend_token(900);

        Session::restore(&path).establish(token.clone()).unwrap();

        let restored = Session::restore(&path);
        assert_eq!(restored.bearer().unwrap(), token);
    }

    #[test]
    fn teardown_forgets_memory_and_file() {
        let dir = temp_dir("session-teardown");
        let path = dir.join("token");
        let session = Session::restore(&path);
        session.establish(backend_token(900)).unwrap();

        session.teardown();

        assert!(!session.is_active());
        assert!(!path.exists());
        assert!(!Session::restore(&path).is_active());
    }

    #[test]
    fn expired_tokens_are_refused() {
        let session = Session::in_memory();
        let err = session.establish(backend_token(-300)).unwrap_err();
        assert!(err.is_auth());
        assert!(!session.is_active());
    }

    #[test]
    fn opaque_tokens_are_accepted() {
        let session = Session::in_memory();
        session.establish("opaque-token".into()).unwrap();
        assert_eq!(session.bearer().unwrap(), "opaque-token");
    }
}
