use std::sync::Arc;

use rand::{rng, seq::IndexedRandom};
use tracing::{info, instrument};

use crate::{
    dao::{
        content_api::ContentService,
        progress::{LevelProgress, ProgressUpdate},
    },
    dto::question::Question,
    error::ClientError,
};

/// Ungated levels used when playing against a random opponent.
pub const RANDOM_OPPONENT_LEVELS: [u32; 4] = [15, 16, 17, 18];

/// Single-player levels: lock checks, question fetch and progress bookkeeping.
#[derive(Clone)]
pub struct LevelService {
    content: Arc<dyn ContentService>,
    progress: LevelProgress,
}

impl LevelService {
    /// Service over the level endpoint, gated by `progress`.
    pub fn new(content: Arc<dyn ContentService>, progress: LevelProgress) -> Self {
        Self { content, progress }
    }

    /// Unlocked level counter.
    pub fn progress(&self) -> &LevelProgress {
        &self.progress
    }

    /// Fetch the questions of `level`, refusing levels that are still locked.
    #[instrument(skip(self))]
    pub async fn start_level(&self, level: u32) -> Result<Vec<Question>, ClientError> {
        let unlocked = self.progress.unlocked()?;
        if !self.progress.is_playable(level)? {
            return Err(ClientError::LevelLocked { level, unlocked });
        }

        let questions = self.content.level_questions(level).await?.questions;
        if questions.is_empty() {
            return Err(ClientError::MalformedResponse(format!(
                "level {level} has no questions"
            )));
        }
        if let Err(message) = questions.iter().try_for_each(Question::check) {
            return Err(ClientError::MalformedResponse(message));
        }

        info!(level, questions = questions.len(), "level started");
        Ok(questions)
    }

    /// Record the result of a finished level run.
    pub fn finish_level(
        &self,
        level: u32,
        points: u32,
        total_questions: usize,
    ) -> Result<ProgressUpdate, ClientError> {
        Ok(self.progress.record_run(level, points, total_questions)?)
    }
}

/// Pick one of the random-opponent levels.
pub fn random_opponent_level() -> u32 {
    RANDOM_OPPONENT_LEVELS
        .choose(&mut rng())
        .copied()
        .unwrap_or(RANDOM_OPPONENT_LEVELS[0])
}
