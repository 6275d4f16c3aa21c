use async_trait::async_trait;
use atcmap_translator::{Decision, MappingSummary, OperatorPrompt};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Prompt that replays a fixed list of answers and records what it was shown.
/// Once the script runs out it answers `None`.
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<Option<Decision>>>,
    shown: Mutex<Vec<MappingSummary>>,
}

impl ScriptedPrompt {
    pub fn new(answers: Vec<Option<Decision>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            shown: Mutex::new(Vec::new()),
        }
    }

    pub fn answering(decisions: Vec<Decision>) -> Self {
        Self::new(decisions.into_iter().map(Some).collect())
    }

    pub fn shown(&self) -> Vec<MappingSummary> {
        self.shown.lock().clone()
    }

    pub fn times_shown(&self) -> usize {
        self.shown.lock().len()
    }
}

#[async_trait]
impl OperatorPrompt for ScriptedPrompt {
    async fn show(&self, summary: &MappingSummary) -> Option<Decision> {
        self.shown.lock().push(summary.clone());
        self.answers.lock().pop_front().flatten()
    }
}
