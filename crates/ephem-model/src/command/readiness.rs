use serde::{Deserialize, Serialize};

/// Readiness notifier state machine.
///
/// `Waiting` is the only non-terminal state; every consumed event ends in
/// exactly one of the other three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReadinessState {
    Waiting,
    Ready,
    TimedOut,
    Errored,
}

impl ReadinessState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReadinessState::Waiting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_waiting_is_open() {
        assert!(!ReadinessState::Waiting.is_terminal());
        for state in [ReadinessState::Ready, ReadinessState::TimedOut, ReadinessState::Errored] {
            assert!(state.is_terminal());
        }
        assert_eq!(serde_json::to_value(ReadinessState::TimedOut).unwrap(), "timedOut");
    }
}
