//! Authenticated identity and the portal's sign-in gate.
//!
//! Authentication itself belongs to the hosted provider. The portal only needs to know who
//! is signed in, whether that is still being determined, and how to sign out.

use crate::constants::LOADING_PORTAL_MESSAGE;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// The provider has not answered yet.
    Loading,
    SignedOut,
    SignedIn(Identity),
}

/// What a protected view should do for the current [`AuthState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate<'a> {
    /// Show a waiting message.
    Loading(&'static str),
    /// Send the visitor to the sign-in destination. Not a recoverable error.
    Redirect(String),
    Ready(&'a Identity),
}

pub fn gate<'a>(state: &'a AuthState, sign_in_path: &str) -> Gate<'a> {
    match state {
        AuthState::Loading => Gate::Loading(LOADING_PORTAL_MESSAGE),
        AuthState::SignedOut => Gate::Redirect(sign_in_path.to_string()),
        AuthState::SignedIn(identity) => Gate::Ready(identity),
    }
}

/// Client-side session holding the provider's current answer.
#[derive(Debug, Clone)]
pub struct Session {
    state: AuthState,
}

impl Session {
    pub fn loading() -> Self {
        Self {
            state: AuthState::Loading,
        }
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self {
            state: AuthState::SignedIn(identity),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            state: AuthState::SignedOut,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            AuthState::SignedIn(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn sign_out(&mut self) {
        if let Some(identity) = self.identity() {
            tracing::info!(user = %identity.id, "signed out");
        }
        self.state = AuthState::SignedOut;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_follows_auth_state() {
        let identity = Identity {
            id: Uuid::new_v4(),
            email: None,
        };

        assert_eq!(
            gate(&AuthState::Loading, "/auth"),
            Gate::Loading("Loading your health portal...")
        );
        assert_eq!(
            gate(&AuthState::SignedOut, "/auth"),
            Gate::Redirect("/auth".into())
        );
        let signed_in = AuthState::SignedIn(identity.clone());
        assert_eq!(gate(&signed_in, "/auth"), Gate::Ready(&identity));
    }

    #[test]
    fn test_sign_out_clears_identity() {
        let mut session = Session::signed_in(Identity {
            id: Uuid::new_v4(),
            email: Some("amina@example.com".into()),
        });
        assert!(session.identity().is_some());

        session.sign_out();
        assert_eq!(session.state(), &AuthState::SignedOut);
        assert!(session.identity().is_none());
    }
}
