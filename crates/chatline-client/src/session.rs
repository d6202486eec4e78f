//! Authenticated session state.
//!
//! An [`AuthSession`] owns at most one realtime connection: it is opened
//! once the user is authenticated and torn down on sign-out.

use tracing::{debug, info};

use chatline_shared::UserId;

use crate::connection::{Connector, RealtimeConnection};
use crate::error::Result;

#[derive(Default)]
pub struct AuthSession {
    /// `None` until sign-in completes
    auth_user: Option<UserId>,
    connection: Option<Box<dyn RealtimeConnection>>,
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auth_user(&self) -> Option<&UserId> {
        self.auth_user.as_ref()
    }

    pub fn connection(&self) -> Option<&dyn RealtimeConnection> {
        self.connection.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.as_ref().is_some_and(|c| c.is_connected())
    }

    /// Record a successful sign-in (login, signup or auth check) and open
    /// the realtime connection.
    pub async fn sign_in(&mut self, user_id: UserId, connector: &dyn Connector) -> Result<()> {
        if self.auth_user.as_ref() != Some(&user_id) {
            // Another account's connection must not outlive its session
            self.disconnect_socket();
            self.auth_user = Some(user_id);
        }
        self.connect_socket(connector).await
    }

    /// Open the realtime connection for the authenticated user. No-op when
    /// nobody is signed in or a live connection is already held.
    pub async fn connect_socket(&mut self, connector: &dyn Connector) -> Result<()> {
        let Some(user_id) = self.auth_user.clone() else {
            debug!("Not signed in, skipping realtime connection");
            return Ok(());
        };
        if self.is_connected() {
            return Ok(());
        }

        // Drop a dead handle before replacing it
        self.disconnect_socket();

        let conn = connector.connect(&user_id).await?;
        self.connection = Some(conn);
        Ok(())
    }

    /// Close the realtime connection if one is open and forget the handle.
    pub fn disconnect_socket(&mut self) {
        if let Some(conn) = self.connection.take() {
            if conn.is_connected() {
                conn.disconnect();
            }
        }
    }

    pub fn sign_out(&mut self) {
        self.disconnect_socket();
        if let Some(user_id) = self.auth_user.take() {
            info!(user = %user_id, "Signed out");
        }
    }
}
