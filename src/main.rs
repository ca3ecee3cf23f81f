use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use voice_study::backend::{self, Backend, BackendError};
use voice_study::wizard::{self, Alert, ProfileForm, RecordingStep, RecordingTask, WizardStep};
use voice_study::{format_countdown, Config, ExerciseDefinition, SessionContext, SessionStore, TimerState, UploadPipeline};

#[derive(Parser)]
#[command(name = "voice-study", version, about = "Voice recording study wizard")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/voice-study")]
    config: String,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in with a study keycode
    Login {
        #[arg(long)]
        keycode: String,
    },
    /// Submit the demographic form
    Profile {
        #[arg(long)]
        age: String,
        #[arg(long)]
        gender: String,
        #[arg(long)]
        pd_status: String,
    },
    /// Record and upload the reading passage
    Reading,
    /// Record and upload the sustained vowels
    Vowels,
    /// Show the latest stored record
    Status,
    /// Forget the logged in user
    Logout,
    /// Walk through every step interactively
    Run,
}

struct App {
    config: Config,
    backend: Arc<dyn Backend>,
    store: SessionStore,
    pipeline: UploadPipeline,
}

impl App {
    fn new(config: Config) -> Result<Self> {
        let store = SessionStore::new(config.session.path());
        let saved = store.load();
        let backend =
            backend::connect(&config.backend, saved.access_token()).context("Failed to set up backend")?;
        let pipeline = UploadPipeline::new(backend.clone(), config.upload.partial_failure);

        info!("Using {} backend", backend.name());
        Ok(Self {
            config,
            backend,
            store,
            pipeline,
        })
    }

    /// Record the step's exercises unless kept clips are waiting, then upload
    async fn record(&self, step: &mut RecordingStep, session: &SessionContext) -> Result<()> {
        session.require_user()?;

        if step.needs_capture() {
            if step.task() == RecordingTask::Reading {
                eprintln!("Read aloud:\n\n  {}\n", self.config.tasks.reading_passage);
            }

            let device = wizard::capture_device(&self.config.audio)?;
            let flow = step
                .task()
                .build_flow(&self.config.tasks, device, &self.config.audio.recordings_dir());

            let result = step.capture(flow, render_tick).await.map(|_| ());
            eprintln!();
            result?;
        } else {
            info!("Retrying upload of {} recorded clip(s)", step.recorded().len());
        }

        let record = step.submit(&self.pipeline, self.backend.as_ref(), session).await?;

        match step.task() {
            RecordingTask::Reading => {
                eprintln!("Uploaded: {}", record.task2_recording_url.unwrap_or_default());
            }
            RecordingTask::Vowels => {
                for url in record.task3_recordings.unwrap_or_default() {
                    eprintln!("Uploaded: {}", url);
                }
            }
        }
        Ok(())
    }

    async fn status(&self, session: &SessionContext) -> Result<()> {
        let user_id = session.require_user()?;

        match self.backend.get_latest_record(user_id).await {
            Ok(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            Err(BackendError::NotFound) => println!("No records yet for {}", user_id),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}

fn render_tick(exercise: &ExerciseDefinition, state: &TimerState) {
    eprint!("\r{:<10} {}  ", exercise.name, format_countdown(state.remaining()));
    let _ = std::io::stderr().flush();
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> Result<String> {
    eprint!("{}: ", label);
    std::io::stderr().flush()?;
    match lines.next_line().await? {
        Some(line) => Ok(line.trim().to_string()),
        None => bail!("Input closed"),
    }
}

async fn run_wizard(app: &App) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session = app.store.load();
    let mut reading = RecordingStep::new(RecordingTask::Reading);
    let mut vowels = RecordingStep::new(RecordingTask::Vowels);
    let mut step = if session.is_logged_in() {
        WizardStep::Profile
    } else {
        WizardStep::Login
    };

    loop {
        if let Some(position) = step.stepper_position() {
            eprintln!("\n== Step {} of 3: {} ==", position, step);
        }

        let outcome = match step {
            WizardStep::Login => {
                let keycode = prompt(&mut lines, "Keycode").await?;
                wizard::login(app.backend.as_ref(), &app.store, &keycode)
                    .await
                    .map(|logged_in| session = logged_in)
            }
            WizardStep::Profile => {
                let form = ProfileForm {
                    age: prompt(&mut lines, "Age").await?,
                    gender: prompt(&mut lines, "Gender").await?,
                    pd_status: prompt(&mut lines, "PD status").await?,
                };
                wizard::submit_profile(app.backend.as_ref(), &session, &form)
                    .await
                    .map(|_| ())
            }
            WizardStep::Reading | WizardStep::Vowels => {
                let recording = if step == WizardStep::Reading {
                    &mut reading
                } else {
                    &mut vowels
                };
                let label = if recording.needs_capture() {
                    "Press Enter to start recording"
                } else {
                    "Press Enter to retry the upload"
                };
                prompt(&mut lines, label).await?;
                app.record(recording, &session).await
            }
            WizardStep::Done => {
                eprintln!("\nThank you! All tasks are complete.");
                return app.status(&session).await;
            }
        };

        match outcome {
            Ok(()) => step = step.next(),
            Err(e) => {
                warn!("{} step failed: {:#}", step, e);
                eprintln!("{}", Alert::from_error(&e));
                if !session.is_logged_in() {
                    step = WizardStep::Login;
                }
            }
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.config)?;
    info!("Loaded config: {}", config.service.name);

    let app = App::new(config)?;

    match cli.command {
        Command::Login { keycode } => {
            let session = wizard::login(app.backend.as_ref(), &app.store, &keycode).await?;
            if let Some(user_id) = session.user_id() {
                println!("Logged in as {}", user_id);
            }
        }
        Command::Profile { age, gender, pd_status } => {
            let session = app.store.load();
            let form = ProfileForm { age, gender, pd_status };
            wizard::submit_profile(app.backend.as_ref(), &session, &form).await?;
            println!("Profile saved");
        }
        Command::Reading => {
            let mut step = RecordingStep::new(RecordingTask::Reading);
            app.record(&mut step, &app.store.load()).await?
        }
        Command::Vowels => {
            let mut step = RecordingStep::new(RecordingTask::Vowels);
            app.record(&mut step, &app.store.load()).await?
        }
        Command::Status => app.status(&app.store.load()).await?,
        Command::Logout => {
            app.store.clear()?;
            println!("Logged out");
        }
        Command::Run => run_wizard(&app).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = execute(cli).await {
        error!("{:#}", e);
        eprintln!("{}", Alert::from_error(&e));
        std::process::exit(1);
    }
}
