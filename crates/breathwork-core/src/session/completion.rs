use serde::{Deserialize, Serialize};

/// One-shot completion latch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionTrigger {
    fired: bool,
}

impl CompletionTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Returns `true` the first time only.
    pub fn fire(&mut self) -> bool {
        if self.fired {
            tracing::warn!("completion requested after it already fired, ignoring");
            return false;
        }
        self.fired = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_exactly_once() {
        let mut trigger = CompletionTrigger::new();
        assert!(!trigger.has_fired());
        assert!(trigger.fire());
        assert!(trigger.has_fired());
        assert!(!trigger.fire());
        assert!(!trigger.fire());
    }
}
