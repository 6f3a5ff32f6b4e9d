use crate::config::AppInfo;
use crate::events::EventContext;

/// The identity supplied through `identify`.
#[derive(Debug, Clone)]
pub struct Identity {
    /// The wallet address the session is attributed to.
    pub address: String,
    /// Optional application-level user id.
    pub user_id: Option<String>,
    /// Name of the wallet provider that produced the connection.
    pub provider_name: Option<String>,
}

impl Identity {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            user_id: None,
            provider_name: None,
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_provider(mut self, provider_name: impl Into<String>) -> Self {
        self.provider_name = Some(provider_name.into());
        self
    }
}

/// Process-lifetime session state, owned exclusively by the pipeline worker.
pub(crate) struct Session {
    device_id: String,
    identity: Option<Identity>,
    app: Option<AppInfo>,
}

impl Session {
    pub fn new(device_id: String, app: Option<AppInfo>) -> Self {
        Self {
            device_id,
            identity: None,
            app,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Replaces the current identity. Applies to events queued afterwards
    /// only; already-queued events keep their original attribution.
    pub fn apply_identity(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }

    /// Snapshots the current identity into an event context.
    pub fn context(&self) -> EventContext {
        EventContext {
            device_id: self.device_id.clone(),
            address: self.identity.as_ref().map(|i| i.address.clone()),
            user_id: self.identity.as_ref().and_then(|i| i.user_id.clone()),
            provider_name: self
                .identity
                .as_ref()
                .and_then(|i| i.provider_name.clone()),
            app: self.app.clone(),
        }
    }
}
