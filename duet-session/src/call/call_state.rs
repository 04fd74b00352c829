use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Offering,
    Answering,
    Connected,
    Ended,
}

impl CallState {
    fn rank(self) -> u8 {
        match self {
            CallState::Idle => 0,
            CallState::Offering | CallState::Answering => 1,
            CallState::Connected => 2,
            CallState::Ended => 3,
        }
    }

    /// Forward-only within one call attempt. Only `reset` goes back to `Idle`.
    pub fn can_advance_to(self, next: CallState) -> bool {
        next.rank() > self.rank()
    }

    /// A correspondent exists and the call has not ended.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            CallState::Offering | CallState::Answering | CallState::Connected
        )
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallState::Idle => "idle",
            CallState::Offering => "offering",
            CallState::Answering => "answering",
            CallState::Connected => "connected",
            CallState::Ended => "ended",
        };
        f.write_str(name)
    }
}
