//! Server lifecycle state machine
//!
//! `Uninitialized -> Initialized -> ShuttingDown -> Exited`, one direction
//! only. `exit` is accepted from every state.

use crate::error::{LspError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Initialized,
    ShuttingDown,
    Exited,
}

impl LifecycleState {
    /// State after a successful `initialize`, or why it is not allowed now
    pub fn initialize(self) -> Result<Self> {
        match self {
            Self::Uninitialized => Ok(Self::Initialized),
            Self::Initialized => Err(LspError::InvalidRequest(
                "server is already initialized".to_string(),
            )),
            Self::ShuttingDown | Self::Exited => Err(LspError::InvalidRequest(
                "server is shutting down".to_string(),
            )),
        }
    }

    pub fn shutdown(self) -> Result<Self> {
        match self {
            Self::Initialized => Ok(Self::ShuttingDown),
            Self::Uninitialized => Err(LspError::ServerNotInitialized),
            Self::ShuttingDown | Self::Exited => Err(LspError::InvalidRequest(
                "shutdown was already requested".to_string(),
            )),
        }
    }

    pub fn exit(self) -> Self {
        Self::Exited
    }

    /// Gate for every request other than `initialize` and `shutdown`
    pub fn check_request(self, method: &str) -> Result<()> {
        match self {
            Self::Initialized => Ok(()),
            Self::Uninitialized => Err(LspError::ServerNotInitialized),
            Self::ShuttingDown | Self::Exited => Err(LspError::InvalidRequest(format!(
                "{} received after shutdown",
                method
            ))),
        }
    }

    /// Document and feature notifications are only processed while initialized
    pub fn accepts_notifications(self) -> bool {
        self == Self::Initialized
    }
}
