//! Per-device countdown-scored question sequence.
//!
//! The run is a pure state machine: callers feed it one-second [`QuizRun::tick`]s
//! and answer selections, and move it forward with [`QuizRun::advance`]. Timing
//! lives in [`crate::services::quiz_runner`].

use std::sync::Arc;

use thiserror::Error;

use crate::dto::question::Question;

/// Seconds on the clock for every question unless configured otherwise.
pub const DEFAULT_QUESTION_SECONDS: u32 = 10;

/// How a single question ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Correct answer, worth the seconds left on the clock.
    Correct {
        /// Selected label.
        answer: String,
        /// Seconds left when it was selected.
        points: u32,
    },
    /// Wrong answer, worth nothing.
    Incorrect {
        /// Selected label.
        answer: String,
    },
    /// The clock ran out before any answer.
    TimedOut,
}

impl AnswerOutcome {
    /// Points awarded for this question.
    pub fn points(&self) -> u32 {
        match self {
            AnswerOutcome::Correct { points, .. } => *points,
            AnswerOutcome::Incorrect { .. } | AnswerOutcome::TimedOut => 0,
        }
    }
}

/// Where the run currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunPhase {
    /// Question `index` is on screen with `remaining` seconds left.
    Presenting {
        /// Open question.
        index: usize,
        /// Seconds left on its clock.
        remaining: u32,
    },
    /// Question `index` has been decided; waiting to move on.
    Scoring {
        /// Decided question.
        index: usize,
        /// How it ended.
        outcome: AnswerOutcome,
    },
    /// Every question has been decided.
    Finished,
}

/// Operations that do not apply to the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// Question `index` already has an answer; later selections are ignored.
    #[error("question {index} was already answered")]
    AlreadyAnswered {
        /// Question that was already decided.
        index: usize,
    },
    /// The run is over.
    #[error("the run is finished")]
    Finished,
    /// `advance` called while a question is still open.
    #[error("question {index} is still open")]
    StillPresenting {
        /// Question still open.
        index: usize,
    },
}

/// Aggregate of a finished (or abandoned) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Points awarded.
    pub score: u32,
    /// Questions in the run.
    pub total_questions: usize,
    /// Points a perfect run would earn.
    pub max_score: u32,
    /// Outcome of each decided question, in order.
    pub outcomes: Vec<AnswerOutcome>,
}

impl RunSummary {
    /// Score as a percentage of the maximum attainable.
    pub fn percentage(&self) -> f64 {
        if self.max_score == 0 {
            return 0.0;
        }
        f64::from(self.score) / f64::from(self.max_score) * 100.0
    }
}

/// Local run over an immutable question set.
#[derive(Debug, Clone)]
pub struct QuizRun {
    questions: Arc<[Question]>,
    seconds_per_question: u32,
    phase: RunPhase,
    outcomes: Vec<AnswerOutcome>,
}

impl QuizRun {
    /// Start presenting the first question. An empty set is finished immediately.
    pub fn new(questions: Arc<[Question]>, seconds_per_question: u32) -> Self {
        let phase = if questions.is_empty() {
            RunPhase::Finished
        } else {
            RunPhase::Presenting {
                index: 0,
                remaining: seconds_per_question,
            }
        };

        Self {
            questions,
            seconds_per_question,
            phase,
            outcomes: Vec::new(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> &RunPhase {
        &self.phase
    }

    /// Number of questions in the run.
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Full countdown of each question.
    pub fn seconds_per_question(&self) -> u32 {
        self.seconds_per_question
    }

    /// Index of the question being shown or scored; the question count once finished.
    pub fn current_index(&self) -> usize {
        match self.phase {
            RunPhase::Presenting { index, .. } | RunPhase::Scoring { index, .. } => index,
            RunPhase::Finished => self.questions.len(),
        }
    }

    /// Question being shown or scored.
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            RunPhase::Finished => None,
            _ => self.questions.get(self.current_index()),
        }
    }

    /// Whether the current question is the final one.
    pub fn is_last_question(&self) -> bool {
        self.current_index() + 1 >= self.questions.len()
    }

    /// Whether every question has been decided.
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, RunPhase::Finished)
    }

    /// Points accumulated so far.
    pub fn score(&self) -> u32 {
        self.outcomes.iter().map(AnswerOutcome::points).sum()
    }

    /// Outcomes decided so far.
    pub fn outcomes(&self) -> &[AnswerOutcome] {
        &self.outcomes
    }

    /// Take one second off the clock. Returns the outcome when the question times out.
    pub fn tick(&mut self) -> Option<AnswerOutcome> {
        let RunPhase::Presenting { index, remaining } = self.phase else {
            return None;
        };

        let remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            self.phase = RunPhase::Presenting { index, remaining };
            return None;
        }

        Some(self.decide(index, AnswerOutcome::TimedOut))
    }

    /// Accept `label` as the answer to the open question, freezing its clock.
    pub fn select_answer(&mut self, label: &str) -> Result<AnswerOutcome, RunError> {
        let (index, remaining) = match self.phase {
            RunPhase::Presenting { index, remaining } => (index, remaining),
            RunPhase::Scoring { index, .. } => return Err(RunError::AlreadyAnswered { index }),
            RunPhase::Finished => return Err(RunError::Finished),
        };

        let outcome = if self.questions[index].is_correct(label) {
            AnswerOutcome::Correct {
                answer: label.to_string(),
                points: remaining,
            }
        } else {
            AnswerOutcome::Incorrect {
                answer: label.to_string(),
            }
        };

        Ok(self.decide(index, outcome))
    }

    /// Leave the scoring phase for the next question, or finish after the last one.
    pub fn advance(&mut self) -> Result<&RunPhase, RunError> {
        let index = match self.phase {
            RunPhase::Scoring { index, .. } => index,
            RunPhase::Presenting { index, .. } => {
                return Err(RunError::StillPresenting { index });
            }
            RunPhase::Finished => return Err(RunError::Finished),
        };

        let next = index + 1;
        self.phase = if next < self.questions.len() {
            RunPhase::Presenting {
                index: next,
                remaining: self.seconds_per_question,
            }
        } else {
            RunPhase::Finished
        };
        Ok(&self.phase)
    }

    /// Snapshot of the score and per-question outcomes.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            score: self.score(),
            total_questions: self.questions.len(),
            max_score: self.questions.len() as u32 * self.seconds_per_question,
            outcomes: self.outcomes.clone(),
        }
    }

    fn decide(&mut self, index: usize, outcome: AnswerOutcome) -> AnswerOutcome {
        self.outcomes.push(outcome.clone());
        self.phase = RunPhase::Scoring {
            index,
            outcome: outcome.clone(),
        };
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::question::{OptionsQuestion, QuoteQuestion};

    fn questions() -> Arc<[Question]> {
        vec![
            Question::Options(OptionsQuestion {
                question: "What is Monica skilled at?".into(),
                options: vec![
                    "Bricklaying".into(),
                    "Cooking".into(),
                    "American football".into(),
                    "Singing".into(),
                ],
                correct_answer: "Cooking".into(),
            }),
            Question::Quote(QuoteQuestion {
                quote: "Which team is co-owned by Shah Rukh Khan?".into(),
                correct_answer: "KKR".into(),
            }),
        ]
        .into()
    }

    #[test]
    fn immediate_correct_answer_scores_full_clock() {
        let mut run = QuizRun::new(questions(), DEFAULT_QUESTION_SECONDS);
        let outcome = run.select_answer("Cooking").unwrap();
        assert_eq!(outcome.points(), 10);
        assert_eq!(run.score(), 10);
    }

    #[test]
    fn points_equal_seconds_left() {
        let mut run = QuizRun::new(questions(), DEFAULT_QUESTION_SECONDS);
        for _ in 0..4 {
            assert_eq!(run.tick(), None);
        }
        let outcome = run.select_answer("Cooking").unwrap();
        assert_eq!(outcome.points(), 6);
    }

    #[test]
    fn wrong_answer_scores_zero() {
        let mut run = QuizRun::new(questions(), DEFAULT_QUESTION_SECONDS);
        let outcome = run.select_answer("Singing").unwrap();
        assert_eq!(
            outcome,
            AnswerOutcome::Incorrect {
                answer: "Singing".into()
            }
        );
        assert_eq!(run.score(), 0);
    }

    #[test]
    fn second_selection_is_ignored() {
        let mut run = QuizRun::new(questions(), DEFAULT_QUESTION_SECONDS);
        run.select_answer("Singing").unwrap();
        assert_eq!(
            run.select_answer("Cooking"),
            Err(RunError::AlreadyAnswered { index: 0 })
        );
        assert_eq!(run.score(), 0);
        assert_eq!(run.outcomes().len(), 1);
    }

    #[test]
    fn answer_freezes_clock() {
        let mut run = QuizRun::new(questions(), DEFAULT_QUESTION_SECONDS);
        run.select_answer("Cooking").unwrap();
        for _ in 0..20 {
            assert_eq!(run.tick(), None);
        }
        assert_eq!(run.score(), 10);
        assert!(matches!(run.phase(), RunPhase::Scoring { index: 0, .. }));
    }

    #[test]
    fn clock_running_out_times_out() {
        let mut run = QuizRun::new(questions(), DEFAULT_QUESTION_SECONDS);
        for _ in 0..9 {
            assert_eq!(run.tick(), None);
        }
        assert_eq!(run.tick(), Some(AnswerOutcome::TimedOut));
        assert_eq!(
            run.select_answer("Cooking"),
            Err(RunError::AlreadyAnswered { index: 0 })
        );
    }

    #[test]
    fn full_run_sums_awards() {
        let mut run = QuizRun::new(questions(), DEFAULT_QUESTION_SECONDS);
        run.tick();
        run.tick();
        run.select_answer("Cooking").unwrap();
        assert_eq!(
            run.advance().unwrap(),
            &RunPhase::Presenting {
                index: 1,
                remaining: 10
            }
        );
        while run.tick().is_none() {}
        assert_eq!(run.advance().unwrap(), &RunPhase::Finished);

        let summary = run.summary();
        assert_eq!(summary.score, 8);
        assert_eq!(summary.max_score, 20);
        assert_eq!(summary.outcomes.len(), 2);
        assert_eq!(summary.percentage(), 40.0);
        assert_eq!(run.current_index(), 2);
    }

    #[test]
    fn cannot_advance_open_question() {
        let mut run = QuizRun::new(questions(), DEFAULT_QUESTION_SECONDS);
        assert_eq!(run.advance(), Err(RunError::StillPresenting { index: 0 }));
    }

    #[test]
    fn index_never_goes_backwards() {
        let mut run = QuizRun::new(questions(), DEFAULT_QUESTION_SECONDS);
        let mut last = run.current_index();
        while !run.is_finished() {
            if run.select_answer("KKR").is_err() {
                run.advance().unwrap();
            }
            assert!(run.current_index() >= last);
            assert!(run.current_index() <= run.total_questions());
            last = run.current_index();
        }
    }

    #[test]
    fn empty_set_is_finished() {
        let run = QuizRun::new(Vec::<Question>::new().into(), DEFAULT_QUESTION_SECONDS);
        assert!(run.is_finished());
        assert_eq!(run.summary().score, 0);
        assert_eq!(run.current_question(), None);
    }
}
