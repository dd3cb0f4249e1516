//! Binge Brain terminal client wiring the room, level, quote and challenge flows.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, anyhow};
use binge_brain::{
    config::ClientConfig,
    dao::{
        content_api::{ContentService, HttpContentService},
        kv_store::{JsonFileStore, KeyValueStore},
        progress::{LevelProgress, ProgressUpdate},
        room_api::{HttpRoomService, RoomService},
    },
    dto::question::Question,
    error::ClientError,
    services::{
        capabilities::{AdPlacement, AdProvider, AudioPlayer, TracingAds, TracingAudio},
        challenge_service::ChallengeService,
        leaderboard_service::LeaderboardService,
        level_service::{LevelService, random_opponent_level},
        quiz_runner::{QuizEvent, QuizRunner},
        quote_bank::{TEAM_ROSTER, draw_quotes},
        reconciliation::ReconciliationClient,
        session_service::SessionClient,
    },
    state::{CancelToken, Lifetime, QuizRun, RoomSession, RunSummary},
};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines, Stdin},
    sync::mpsc,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Input = Lines<BufReader<Stdin>>;

#[derive(Debug, Parser)]
#[command(name = "binge-brain", version, about = "Themed trivia quiz client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a multiplayer room and wait for an opponent.
    Create {
        #[arg(long)]
        name: String,
    },
    /// Join a multiplayer room by its identifier.
    Join {
        #[arg(long)]
        name: String,
        #[arg(long)]
        room: String,
    },
    /// Play a single-player level (a random opponent level when omitted).
    Level { level: Option<u32> },
    /// Guess the team behind each quote.
    Quote,
    /// Weekly challenge.
    #[command(subcommand)]
    Challenge(ChallengeCommand),
    /// Show a leaderboard.
    #[command(subcommand)]
    Leaderboard(LeaderboardCommand),
    /// Run the local stub services.
    StubServer {
        #[arg(long, default_value = "127.0.0.1:8787")]
        addr: SocketAddr,
    },
}

#[derive(Debug, Subcommand)]
enum ChallengeCommand {
    /// Register the name and email used for the weekly challenge.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Play this week's challenge.
    Play,
}

#[derive(Debug, Subcommand)]
enum LeaderboardCommand {
    /// Cumulative weekly scores.
    Weekly,
    /// Best single-game scores.
    Points,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = ClientConfig::load();

    let lifetime = Lifetime::new();
    let handle = lifetime.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown requested");
        handle.cancel();
    });

    if let Command::StubServer { addr } = cli.command {
        return run_stub(addr, lifetime.token()).await;
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let app = App::new(config)?;
    let cancel = lifetime.token();

    let outcome = match cli.command {
        Command::Create { name } => app.create(&name, &cancel, &mut input).await,
        Command::Join { name, room } => app.join(&name, &room, &cancel, &mut input).await,
        Command::Level { level } => {
            app.level(level.unwrap_or_else(random_opponent_level), &cancel, &mut input)
                .await
        }
        Command::Quote => app.quote(&cancel, &mut input).await,
        Command::Challenge(ChallengeCommand::Register { name, email }) => {
            app.register(&name, &email).await
        }
        Command::Challenge(ChallengeCommand::Play) => app.challenge(&cancel, &mut input).await,
        Command::Leaderboard(LeaderboardCommand::Weekly) => app.leaderboard(true).await,
        Command::Leaderboard(LeaderboardCommand::Points) => app.leaderboard(false).await,
        Command::StubServer { .. } => Ok(()),
    };

    outcome.map_err(|err| {
        let alert = err.alert();
        warn!(error = %err, "operation failed");
        anyhow!("{}: {}", alert.title, alert.message)
    })
}

/// Wired services for one invocation.
struct App {
    config: ClientConfig,
    sessions: SessionClient,
    reconciliation: ReconciliationClient,
    levels: LevelService,
    challenge: ChallengeService,
    leaderboards: LeaderboardService,
    runner: QuizRunner,
    ads: TracingAds,
    audio: TracingAudio,
}

impl App {
    fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let rooms: Arc<dyn RoomService> = Arc::new(
            HttpRoomService::new(&config.room_endpoint, config.request_timeout)
                .context("building room service client")?,
        );
        let content: Arc<dyn ContentService> = Arc::new(
            HttpContentService::new(config.content_endpoints(), config.request_timeout)
                .context("building content service client")?,
        );
        let store: Arc<dyn KeyValueStore> = Arc::new(
            JsonFileStore::open(&config.store_path).context("opening local store")?,
        );
        let progress = LevelProgress::new(store.clone(), config.unlock_threshold_percent);

        Ok(Self {
            sessions: SessionClient::new(rooms.clone(), config.session_settings()),
            reconciliation: ReconciliationClient::new(rooms, config.result_poll),
            levels: LevelService::new(content.clone(), progress),
            challenge: ChallengeService::new(content.clone(), store),
            leaderboards: LeaderboardService::new(content),
            runner: QuizRunner::new(config.advance_delay),
            ads: TracingAds,
            audio: TracingAudio,
            config,
        })
    }

    async fn create(
        &self,
        name: &str,
        cancel: &CancelToken,
        input: &mut Input,
    ) -> Result<(), ClientError> {
        let mut session = self.sessions.create_room(name).await?;
        println!("Room created: {}", session.room_id());
        println!("Share this ID with your opponent. Waiting for them to join...");
        self.sessions.wait_for_opponent(&mut session, cancel).await?;
        println!("Opponent joined!");
        self.play_match(&mut session, cancel, input).await
    }

    async fn join(
        &self,
        name: &str,
        room_id: &str,
        cancel: &CancelToken,
        input: &mut Input,
    ) -> Result<(), ClientError> {
        println!("Joining room {room_id}...");
        let mut session = self.sessions.join_room(name, room_id, cancel).await?;
        self.play_match(&mut session, cancel, input).await
    }

    async fn play_match(
        &self,
        session: &mut RoomSession,
        cancel: &CancelToken,
        input: &mut Input,
    ) -> Result<(), ClientError> {
        let Some(summary) = self.play(session.questions(), cancel, input).await? else {
            return Err(ClientError::Cancelled);
        };

        println!("Submitting score {}; waiting for your opponent...", summary.score);
        let result = self
            .reconciliation
            .submit_and_await(session, summary.score, cancel)
            .await?;

        for player in &result.players {
            println!("  {:<20} {}", player.name, player.score);
        }
        if result.local_player_won {
            println!("You win!");
        } else {
            println!("Winner: {}", result.winner);
        }
        Ok(())
    }

    async fn level(
        &self,
        level: u32,
        cancel: &CancelToken,
        input: &mut Input,
    ) -> Result<(), ClientError> {
        let questions = self.levels.start_level(level).await?;
        let total = questions.len();
        let Some(summary) = self.play(questions.into(), cancel, input).await? else {
            return Err(ClientError::Cancelled);
        };

        match self.levels.finish_level(level, summary.score, total)? {
            ProgressUpdate::Unlocked { unlocked } => println!("Level {unlocked} unlocked!"),
            ProgressUpdate::Unchanged { unlocked } => {
                println!("Highest unlocked level: {unlocked}")
            }
        }
        Ok(())
    }

    async fn quote(&self, cancel: &CancelToken, input: &mut Input) -> Result<(), ClientError> {
        self.play(draw_quotes().into(), cancel, input).await?;
        Ok(())
    }

    async fn register(&self, name: &str, email: &str) -> Result<(), ClientError> {
        let identity = self.challenge.register(name, email).await?;
        println!("Registered {} for the weekly challenge.", identity.name);
        Ok(())
    }

    async fn challenge(&self, cancel: &CancelToken, input: &mut Input) -> Result<(), ClientError> {
        let questions = self.challenge.fetch_questions().await?;
        self.play(questions.into(), cancel, input).await?;
        Ok(())
    }

    async fn leaderboard(&self, weekly: bool) -> Result<(), ClientError> {
        let entries = if weekly {
            self.leaderboards.weekly().await?
        } else {
            self.leaderboards.points().await?
        };
        self.ads.show_banner(AdPlacement::Leaderboard);
        for (rank, entry) in entries.iter().enumerate() {
            println!("{:>3}. {:<20} {}", rank + 1, entry.name, entry.points);
        }
        Ok(())
    }

    /// Run `questions` interactively. Answers are typed as option numbers.
    async fn play(
        &self,
        questions: Arc<[Question]>,
        cancel: &CancelToken,
        input: &mut Input,
    ) -> Result<Option<RunSummary>, ClientError> {
        let run = QuizRun::new(questions, self.config.question_seconds);
        let (answers, answers_rx) = mpsc::channel(4);
        let (mut events, task) = self.runner.start(run, answers_rx, cancel.clone());
        let mut choices: Vec<String> = Vec::new();
        let mut input_open = true;

        self.audio.play("quiz-theme");
        loop {
            tokio::select! {
                event = events.next() => {
                    let Some(event) = event else { break };
                    render(&event, &mut choices);
                }
                line = input.next_line(), if input_open => match line {
                    Ok(Some(line)) => {
                        let picked = line
                            .trim()
                            .parse::<usize>()
                            .ok()
                            .and_then(|n| n.checked_sub(1))
                            .and_then(|i| choices.get(i));
                        match picked {
                            Some(label) => {
                                // The runner ends the run on its own; a closed channel is fine.
                                let _ = answers.send(label.clone()).await;
                            }
                            None => println!("Type a number between 1 and {}", choices.len()),
                        }
                    }
                    Ok(None) | Err(_) => input_open = false,
                },
            }
        }
        self.audio.stop();

        let summary = task
            .await
            .map_err(|err| ClientError::InvalidState(format!("quiz task failed: {err}")))?;
        if summary.is_some() {
            self.ads.show_banner(AdPlacement::Results);
        }
        Ok(summary)
    }
}

/// Print a quiz event and remember the labels of the open question.
fn render(event: &QuizEvent, choices: &mut Vec<String>) {
    match event {
        QuizEvent::QuestionPresented {
            index,
            total,
            question,
            seconds,
        } => {
            *choices = question
                .choices(&TEAM_ROSTER)
                .into_iter()
                .map(str::to_string)
                .collect();
            println!();
            println!("Question {}/{} ({seconds}s)", index + 1, total);
            println!("{}", question.prompt());
            for (i, label) in choices.iter().enumerate() {
                println!("  {}. {label}", i + 1);
            }
        }
        QuizEvent::Tick { remaining, .. } if *remaining <= 3 => println!("  {remaining}..."),
        QuizEvent::Tick { .. } => {}
        QuizEvent::AnswerScored { outcome, score, .. } => {
            println!("  +{} (total {score})", outcome.points());
        }
        QuizEvent::Finished(summary) => {
            println!();
            println!(
                "Finished: {} / {} ({:.0}%)",
                summary.score,
                summary.max_score,
                summary.percentage()
            );
        }
    }
}

#[cfg(feature = "stub-server")]
async fn run_stub(addr: SocketAddr, cancel: CancelToken) -> anyhow::Result<()> {
    use binge_brain::stub::routes::{StubState, serve};

    let listener = tokio::net::TcpListener::bind(addr).await.context("binding stub server")?;
    serve(listener, StubState::default(), async move {
        cancel.cancelled().await;
    })
    .await
    .context("serving stub")?;
    Ok(())
}

#[cfg(not(feature = "stub-server"))]
async fn run_stub(_addr: SocketAddr, _cancel: CancelToken) -> anyhow::Result<()> {
    Err(anyhow!("built without the `stub-server` feature"))
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,binge_brain=debug,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
