use crate::table::Tone;

/// Transport lifecycle events the tracker reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    Connection,
    Close,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Closed,
    Connected,
    Error,
}

impl ConnectionStatus {
    /// Any state goes to `Error` on error; close always returns to `Closed`.
    pub fn on_event(self, event: &LifecycleEvent) -> Self {
        match event {
            LifecycleEvent::Connection => ConnectionStatus::Connected,
            LifecycleEvent::Close => ConnectionStatus::Closed,
            LifecycleEvent::Error(_) => ConnectionStatus::Error,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Closed => "Closed",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Error => "Error",
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            ConnectionStatus::Closed => Tone::Warning,
            ConnectionStatus::Connected => Tone::Connected,
            ConnectionStatus::Error => Tone::Failure,
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
