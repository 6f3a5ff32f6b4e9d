use crate::config::{DiagnosticsConfig, LogLevel};

/// Severity-gated bridge between the client's internal reporting and the
/// `tracing` ecosystem. Nothing in the client ever surfaces a failure to the
/// caller; this is the only place they are reported.
#[derive(Debug, Clone)]
pub(crate) struct Diagnostics {
    enabled: bool,
    levels: [bool; 4],
}

impl Diagnostics {
    pub fn new(config: &DiagnosticsConfig) -> Self {
        let mut levels = [false; 4];
        for level in &config.levels {
            levels[Self::index(*level)] = true;
        }
        Self {
            enabled: config.enabled,
            levels,
        }
    }

    fn index(level: LogLevel) -> usize {
        match level {
            LogLevel::Debug => 0,
            LogLevel::Info => 1,
            LogLevel::Warn => 2,
            LogLevel::Error => 3,
        }
    }

    pub fn allows(&self, level: LogLevel) -> bool {
        self.enabled && self.levels[Self::index(level)]
    }

    pub fn debug(&self, message: &str) {
        if self.allows(LogLevel::Debug) {
            tracing::debug!("{}", message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.allows(LogLevel::Info) {
            tracing::info!("{}", message);
        }
    }

    pub fn warn(&self, message: &str) {
        if self.allows(LogLevel::Warn) {
            tracing::warn!("{}", message);
        }
    }

    pub fn error(&self, message: &str) {
        if self.allows(LogLevel::Error) {
            tracing::error!("{}", message);
        }
    }
}
