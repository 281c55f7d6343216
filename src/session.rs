use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{RemoteError, RemoteResult};
use crate::gateway::{self, Gateway, Method};
use crate::models::User;

#[derive(Debug, Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterBody<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Body of a successful login or registration.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    user: User,
}

/// Tracks who is signed in. The credentials themselves live in the
/// gateway's session cookie; this only remembers the resulting user.
pub struct SessionGuard<G> {
    gateway: G,
    user: RwLock<Option<User>>,
}

impl<G: Gateway> SessionGuard<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            user: RwLock::new(None),
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.read().is_some()
    }

    pub fn require_user(&self) -> RemoteResult<User> {
        self.current_user().ok_or_else(RemoteError::unauthorized)
    }

    /// Asks the service who the session belongs to. Any failure means
    /// "signed out".
    pub async fn check_auth(&self) -> Option<User> {
        let user = match gateway::get::<_, User>(&self.gateway, "/auth/me").await {
            Ok(user) => Some(user),
            Err(err) => {
                debug!(error = %err, "no active session");
                None
            }
        };
        *self.user.write() = user.clone();
        user
    }

    pub async fn login(&self, username: &str, password: &str) -> RemoteResult<User> {
        let AuthResponse { user }: AuthResponse = gateway::send(
            &self.gateway,
            Method::Post,
            "/auth/login",
            &LoginBody { username, password },
        )
        .await?;
        info!(user_id = user.id, "signed in");
        *self.user.write() = Some(user.clone());
        Ok(user)
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> RemoteResult<User> {
        let AuthResponse { user }: AuthResponse = gateway::send(
            &self.gateway,
            Method::Post,
            "/auth/register",
            &RegisterBody {
                username,
                email,
                password,
            },
        )
        .await?;
        info!(user_id = user.id, "registered");
        *self.user.write() = Some(user.clone());
        Ok(user)
    }

    pub async fn logout(&self) -> RemoteResult<()> {
        gateway::execute(&self.gateway, Method::Post, "/auth/logout", None).await?;
        *self.user.write() = None;
        Ok(())
    }
}
