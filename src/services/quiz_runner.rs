//! Drives a [`QuizRun`] in real time: one-second countdown, answer intake and
//! auto-advance. Each device runs its own loop; nothing here talks to the network.

use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use crate::{
    dto::question::Question,
    state::{AnswerOutcome, CancelToken, QuizRun, RunPhase, RunSummary},
};

/// Progress notifications emitted while a run is being played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizEvent {
    /// Question `index` of `total` is on screen with a full clock.
    QuestionPresented {
        /// Position in the run, from zero.
        index: usize,
        /// Questions in the run.
        total: usize,
        /// Question to show.
        question: Question,
        /// Full countdown.
        seconds: u32,
    },
    /// One second elapsed on the open question.
    Tick {
        /// Open question.
        index: usize,
        /// Seconds left.
        remaining: u32,
    },
    /// Question `index` was decided; `score` is the running total.
    AnswerScored {
        /// Decided question.
        index: usize,
        /// How it ended.
        outcome: AnswerOutcome,
        /// Running total.
        score: u32,
    },
    /// Every question has been decided.
    Finished(RunSummary),
}

/// Timer settings for the run loop.
#[derive(Debug, Clone, Copy)]
pub struct QuizRunner {
    tick: Duration,
    advance_delay: Duration,
}

impl Default for QuizRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

enum Step {
    Idle,
    Tick { index: usize, remaining: u32 },
    Scored(AnswerOutcome),
}

impl QuizRunner {
    /// One-second countdown; `advance_delay` pause after each decided question.
    pub fn new(advance_delay: Duration) -> Self {
        Self {
            tick: Duration::from_secs(1),
            advance_delay,
        }
    }

    /// Spawn the loop for `run`.
    ///
    /// Answer labels are read from `answers`; selections that arrive while a
    /// question is already decided are dropped. The returned stream ends with
    /// [`QuizEvent::Finished`] unless the run is cancelled or the stream is
    /// dropped, in which case the task resolves to `None`.
    pub fn start(
        &self,
        run: QuizRun,
        answers: mpsc::Receiver<String>,
        cancel: CancelToken,
    ) -> (ReceiverStream<QuizEvent>, JoinHandle<Option<RunSummary>>) {
        let (tx, rx) = mpsc::channel(16);
        let runner = *self;
        let handle = tokio::spawn(async move { runner.drive(run, answers, cancel, tx).await });
        (ReceiverStream::new(rx), handle)
    }

    async fn drive(
        self,
        mut run: QuizRun,
        mut answers: mpsc::Receiver<String>,
        cancel: CancelToken,
        tx: mpsc::Sender<QuizEvent>,
    ) -> Option<RunSummary> {
        if !present(&run, &tx).await {
            return finish(&run, &tx).await;
        }

        let mut clock = tokio::time::interval_at(Instant::now() + self.tick, self.tick);
        clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut answers_open = true;

        loop {
            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(index = run.current_index(), score = run.score(), "quiz run cancelled");
                    return None;
                }
                _ = tx.closed() => {
                    debug!("quiz event receiver dropped");
                    return None;
                }
                answer = answers.recv(), if answers_open => match answer {
                    Some(label) => match run.select_answer(&label) {
                        Ok(outcome) => Step::Scored(outcome),
                        Err(err) => {
                            debug!(error = %err, "ignoring answer");
                            Step::Idle
                        }
                    },
                    None => {
                        answers_open = false;
                        Step::Idle
                    }
                },
                _ = clock.tick() => match run.tick() {
                    Some(outcome) => Step::Scored(outcome),
                    None => match run.phase() {
                        RunPhase::Presenting { index, remaining } => Step::Tick {
                            index: *index,
                            remaining: *remaining,
                        },
                        _ => Step::Idle,
                    },
                },
            };

            let outcome = match step {
                Step::Idle => continue,
                Step::Tick { index, remaining } => {
                    if tx.send(QuizEvent::Tick { index, remaining }).await.is_err() {
                        return None;
                    }
                    continue;
                }
                Step::Scored(outcome) => outcome,
            };

            let index = run.current_index();
            debug!(index, points = outcome.points(), "question decided");
            let scored = QuizEvent::AnswerScored {
                index,
                outcome,
                score: run.score(),
            };
            if tx.send(scored).await.is_err() {
                return None;
            }

            if !run.is_last_question() {
                if cancel.sleep(self.advance_delay).await.is_err() {
                    info!(index, score = run.score(), "quiz run cancelled");
                    return None;
                }
                // Taps made while the result was showing belong to no question.
                while answers.try_recv().is_ok() {}
            }

            if run.advance().is_err() || run.is_finished() {
                return finish(&run, &tx).await;
            }
            if !present(&run, &tx).await {
                return None;
            }
            clock.reset();
        }
    }
}

/// Announce the open question. Returns false when there is nothing to present
/// or nobody is listening.
async fn present(run: &QuizRun, tx: &mpsc::Sender<QuizEvent>) -> bool {
    let Some(question) = run.current_question() else {
        return false;
    };
    let event = QuizEvent::QuestionPresented {
        index: run.current_index(),
        total: run.total_questions(),
        question: question.clone(),
        seconds: run.seconds_per_question(),
    };
    tx.send(event).await.is_ok()
}

async fn finish(run: &QuizRun, tx: &mpsc::Sender<QuizEvent>) -> Option<RunSummary> {
    let summary = run.summary();
    info!(
        score = summary.score,
        max_score = summary.max_score,
        "quiz run finished"
    );
    // The summary stands even if nobody is left to hear about it.
    let _ = tx.send(QuizEvent::Finished(summary.clone())).await;
    Some(summary)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::StreamExt;

    use super::*;
    use crate::{
        dto::question::{OptionsQuestion, QuoteQuestion},
        state::{DEFAULT_QUESTION_SECONDS, Lifetime},
    };

    fn questions() -> Arc<[Question]> {
        vec![
            Question::Options(OptionsQuestion {
                question: "What is Monica skilled at?".into(),
                options: vec!["Bricklaying".into(), "Cooking".into()],
                correct_answer: "Cooking".into(),
            }),
            Question::Quote(QuoteQuestion {
                quote: "Which team is known for their captain MS Dhoni?".into(),
                correct_answer: "CSK".into(),
            }),
        ]
        .into()
    }

    fn run() -> QuizRun {
        QuizRun::new(questions(), DEFAULT_QUESTION_SECONDS)
    }

    #[tokio::test(start_paused = true)]
    async fn answer_then_timeout() {
        let lifetime = Lifetime::new();
        let (answers, rx) = mpsc::channel(4);
        answers.send("Cooking".to_string()).await.unwrap();

        let (stream, handle) = QuizRunner::default().start(run(), rx, lifetime.token());
        let events: Vec<QuizEvent> = stream.collect().await;
        let summary = handle.await.unwrap().unwrap();

        assert_eq!(summary.score, 10);
        assert_eq!(
            summary.outcomes,
            vec![
                AnswerOutcome::Correct {
                    answer: "Cooking".into(),
                    points: 10
                },
                AnswerOutcome::TimedOut
            ]
        );

        assert!(matches!(
            events.first(),
            Some(QuizEvent::QuestionPresented { index: 0, total: 2, seconds: 10, .. })
        ));
        let ticks = events
            .iter()
            .filter(|event| matches!(event, QuizEvent::Tick { index: 1, .. }))
            .count();
        assert_eq!(ticks, 9);
        assert_eq!(events.last(), Some(&QuizEvent::Finished(summary)));
    }

    #[tokio::test(start_paused = true)]
    async fn late_answer_scores_remaining_seconds() {
        let lifetime = Lifetime::new();
        let (answers, rx) = mpsc::channel(4);
        let (stream, handle) = QuizRunner::default().start(run(), rx, lifetime.token());

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(3_500)).await;
            answers.send("Cooking".to_string()).await.unwrap();
            // Arrives while the first result is showing and must not leak into question two.
            answers.send("CSK".to_string()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2_500)).await;
            answers.send("CSK".to_string()).await.unwrap();
        });

        let events: Vec<QuizEvent> = stream.collect().await;
        let summary = handle.await.unwrap().unwrap();

        // 7 seconds left on the first question, 9 on the second.
        assert_eq!(summary.score, 16);
        let scored: Vec<u32> = events
            .iter()
            .filter_map(|event| match event {
                QuizEvent::AnswerScored { score, .. } => Some(*score),
                _ => None,
            })
            .collect();
        assert_eq!(scored, vec![7, 16]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_abandons_run() {
        let lifetime = Lifetime::new();
        let (_answers, rx) = mpsc::channel(4);
        let (stream, handle) = QuizRunner::default().start(run(), rx, lifetime.token());

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        drop(lifetime);

        assert_eq!(handle.await.unwrap(), None);
        let events: Vec<QuizEvent> = stream.collect().await;
        assert!(!events.iter().any(|e| matches!(e, QuizEvent::Finished(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_run_finishes_immediately() {
        let lifetime = Lifetime::new();
        let (_answers, rx) = mpsc::channel(1);
        let run = QuizRun::new(Vec::<Question>::new().into(), DEFAULT_QUESTION_SECONDS);
        let (stream, handle) = QuizRunner::default().start(run, rx, lifetime.token());

        let events: Vec<QuizEvent> = stream.collect().await;
        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.score, 0);
        assert_eq!(events, vec![QuizEvent::Finished(summary)]);
    }
}
