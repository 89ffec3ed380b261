//! Session manager connection.
//!
//! The application context owns one `SessionLink`. While connected, the
//! session manager's requests are routed into [`save`](super::save).

use super::{save, SessionHost, SessionPaths};

/// Installed program the session manager runs to restart the application.
pub const RESTART_COMMAND: &str = "kiln-cli";

/// Request delivered by the desktop session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRequest {
    /// The session is ending: save the window state only.
    Die,
    /// Save everything needed to restart in the same state.
    SaveYourself,
}

/// Connection state towards the session manager.
#[derive(Debug, Default)]
pub struct SessionLink {
    connected: bool,
    clone_command: Option<Vec<String>>,
}

impl SessionLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect. Returns `true` once connected; connecting twice is harmless.
    pub fn connect(&mut self) -> bool {
        if !self.connected {
            tracing::debug!("connected to session manager");
            self.connected = true;
        }
        self.connected
    }

    pub fn disconnect(&mut self) {
        if self.connected {
            tracing::debug!("disconnected from session manager");
        }
        self.connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Command the session manager runs to restore the application.
    pub fn clone_command(&self) -> Option<&[String]> {
        self.clone_command.as_deref()
    }

    /// Handle `request`. Returns `false` when not connected.
    pub fn handle(
        &mut self,
        request: SessionRequest,
        host: &mut dyn SessionHost,
        paths: &SessionPaths,
    ) -> bool {
        if !self.connected {
            tracing::debug!(?request, "session request ignored while disconnected");
            return false;
        }

        match request {
            SessionRequest::Die => {
                save(host, paths, false, false);
            }
            SessionRequest::SaveYourself => {
                save(host, paths, true, false);
                self.clone_command = Some(vec![RESTART_COMMAND.to_string()]);
            }
        }
        true
    }
}
