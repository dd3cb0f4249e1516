use std::sync::Arc;

use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    dao::{
        content_api::ContentService,
        identity::{PlayerIdentity, load_identity, save_identity},
        kv_store::KeyValueStore,
    },
    dto::{
        question::Question,
        room::{ErrorCode, ServiceMessage},
        validation::RegistrationInput,
    },
    error::ClientError,
};

/// Weekly challenge: one-time registration and the weekly question set.
#[derive(Clone)]
pub struct ChallengeService {
    content: Arc<dyn ContentService>,
    store: Arc<dyn KeyValueStore>,
}

fn rejection(status: &ServiceMessage, code: ErrorCode) -> Option<ClientError> {
    (status.rejection_code() == Some(code)).then(|| ClientError::Rejected {
        code: Some(code),
        message: status.message.clone().unwrap_or_default(),
    })
}

impl ChallengeService {
    /// Service over the challenge endpoint, keeping the identity in `store`.
    pub fn new(content: Arc<dyn ContentService>, store: Arc<dyn KeyValueStore>) -> Self {
        Self { content, store }
    }

    /// Identity registered on this device, if any.
    pub fn stored_identity(&self) -> Result<Option<PlayerIdentity>, ClientError> {
        Ok(load_identity(self.store.as_ref())?)
    }

    /// Register `name` and `email`. Nothing is stored when the name is taken.
    #[instrument(skip(self, email))]
    pub async fn register(&self, name: &str, email: &str) -> Result<PlayerIdentity, ClientError> {
        RegistrationInput {
            name: name.to_string(),
            email: email.to_string(),
        }
        .validate()?;

        let response = self.content.challenge(name.to_string()).await?;
        if let Some(err) = rejection(&response.status, ErrorCode::NameTaken) {
            warn!("challenge name already taken");
            return Err(err);
        }

        let identity = PlayerIdentity {
            name: name.to_string(),
            email: email.to_string(),
        };
        save_identity(self.store.as_ref(), &identity)?;
        info!("challenge identity registered");
        Ok(identity)
    }

    /// Fetch this week's questions for the registered identity.
    pub async fn fetch_questions(&self) -> Result<Vec<Question>, ClientError> {
        let identity = self.stored_identity()?.ok_or(ClientError::NotRegistered)?;

        let response = self.content.challenge(identity.name.clone()).await?;
        if let Some(err) = rejection(&response.status, ErrorCode::WeeklyLimitReached) {
            info!(name = %identity.name, "weekly challenge allowance used up");
            return Err(err);
        }

        let questions = response.questions;
        if questions.is_empty() {
            return Err(match response.status.message {
                Some(message) => ClientError::Rejected {
                    code: response.status.code,
                    message,
                },
                None => ClientError::MalformedResponse("challenge has no questions".into()),
            });
        }
        if let Err(message) = questions.iter().try_for_each(Question::check) {
            return Err(ClientError::MalformedResponse(message));
        }
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        dao::{error::ApiResult, identity::NAME_KEY, kv_store::MemoryStore},
        dto::{
            content::{
                ChallengeResponse, LeaderboardKind, LeaderboardResponse, LevelQuestionsResponse,
            },
            question::QuoteQuestion,
        },
    };

    /// Knows one taken name; allows two plays per name.
    #[derive(Default)]
    struct WeeklyChallenge {
        plays: AtomicU32,
    }

    impl ContentService for WeeklyChallenge {
        fn level_questions(&self, _: u32) -> BoxFuture<'static, ApiResult<LevelQuestionsResponse>> {
            Box::pin(async { Ok(LevelQuestionsResponse::default()) })
        }

        fn challenge(&self, name: String) -> BoxFuture<'static, ApiResult<ChallengeResponse>> {
            let plays = self.plays.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                let response = if name == "Gunther" {
                    ChallengeResponse {
                        questions: Vec::new(),
                        status: ServiceMessage {
                            message: Some("User already exists".into()),
                            code: None,
                        },
                    }
                } else if plays >= 2 {
                    ChallengeResponse {
                        questions: Vec::new(),
                        status: ServiceMessage {
                            message: Some("You have already played 10 times this week".into()),
                            code: None,
                        },
                    }
                } else {
                    ChallengeResponse {
                        questions: vec![Question::Quote(QuoteQuestion {
                            quote: "Which team has won the most IPL titles?".into(),
                            correct_answer: "MI".into(),
                        })],
                        status: ServiceMessage::default(),
                    }
                };
                Ok(response)
            })
        }

        fn leaderboard(
            &self,
            _: LeaderboardKind,
        ) -> BoxFuture<'static, ApiResult<LeaderboardResponse>> {
            Box::pin(async { Ok(LeaderboardResponse::default()) })
        }
    }

    fn service() -> (Arc<MemoryStore>, ChallengeService) {
        let store = Arc::new(MemoryStore::new());
        let service = ChallengeService::new(Arc::new(WeeklyChallenge::default()), store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn play_requires_registration() {
        let (_store, service) = service();
        assert!(matches!(
            service.fetch_questions().await,
            Err(ClientError::NotRegistered)
        ));
    }

    #[tokio::test]
    async fn taken_name_is_not_stored() {
        let (store, service) = service();
        let err = service
            .register("Gunther", "gunther@centralperk.com")
            .await
            .unwrap_err();
        assert!(err.alert().message.contains("already exists"));
        assert_eq!(store.get(NAME_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn bad_email_never_reaches_service() {
        let (_store, service) = service();
        let err = service.register("Janice", "oh-my-god").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn registered_player_plays_until_limit() {
        let (_store, service) = service();
        let identity = service.register("Janice", "janice@example.com").await.unwrap();
        assert_eq!(service.stored_identity().unwrap(), Some(identity));

        assert_eq!(service.fetch_questions().await.unwrap().len(), 1);
        let err = service.fetch_questions().await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Rejected {
                code: Some(ErrorCode::WeeklyLimitReached),
                ..
            }
        ));
        assert!(err.alert().message.contains("come back next week"));
    }
}
