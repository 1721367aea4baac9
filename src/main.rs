use anyhow::Context;
use clap::{Parser, Subcommand};
use ghosttuner::config::{ProviderSettings, StudyConfig, load_env_file};
use ghosttuner::harness::{RandomSampler, TrialState, Tuner};
use ghosttuner::objective::CommandObjective;
use ghosttuner::params::render_line;
use ghosttuner::prompting;
use ghosttuner::providers::ProviderKind;
use ghosttuner::{Conversation, LlmSampler, ModelProvider};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(author, version, about = "Hyperparameter search driven by a chat model", long_about = None)]
struct Args {
    #[arg(long, env = "GHOSTTUNER_PROVIDER", default_value_t = ProviderKind::OpenAI)]
    provider: ProviderKind,

    /// Model name; defaults to the provider's default model
    #[arg(long, env = "GHOSTTUNER_MODEL")]
    model: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Custom base URL for OpenAI API (e.g., for proxy or compatible services)
    #[arg(long, env = "OPENAI_BASE_URL")]
    openai_url: Option<String>,

    /// Custom base URL for Ollama API
    #[arg(long, env = "OLLAMA_BASE_URL")]
    ollama_url: Option<String>,

    #[arg(long, short)]
    tracing: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a study, evaluating each configuration with the study's command
    Run {
        study: PathBuf,

        /// Number of trials; defaults to the study budget
        #[arg(long)]
        trials: Option<usize>,

        /// Seed for parameters sampled outside the model's configuration
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the opening prompt for a study without contacting the model
    Prompt { study: PathBuf },
    /// List the models offered by the provider
    Models,
}

impl Args {
    fn provider_settings(&self) -> ProviderSettings {
        let base_url = match self.provider {
            ProviderKind::OpenAI => self.openai_url.clone(),
            ProviderKind::Ollama => self.ollama_url.clone(),
        };
        ProviderSettings {
            provider: self.provider,
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            base_url,
        }
    }
}

fn setup_tracing(enable: bool) -> anyhow::Result<()> {
    let level = if enable { Level::TRACE } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting default subscriber failed")
}

async fn run(
    settings: &ProviderSettings,
    study_path: &Path,
    trials: Option<usize>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let study = StudyConfig::load(study_path)?;
    let provider = settings.create_provider()?;
    let model = provider
        .create_chat_model(settings.model_name())
        .with_context(|| format!("Provider {} has no model {}", settings.provider, settings.model_name()))?;

    let conversation = Conversation::new(model, study.conversation_settings());
    let mut sampler = LlmSampler::new(conversation);
    if let Some(seed) = seed {
        sampler = sampler.with_fallback(RandomSampler::seeded(seed));
    }

    let mut objective = CommandObjective::new(&study.command, study.search_space())?;
    let mut tuner = Tuner::new(sampler);
    tuner
        .optimize(trials.unwrap_or(study.budget), &mut objective)
        .await?;

    for trial in tuner.study().trials() {
        match (trial.state, trial.value) {
            (TrialState::Complete, Some(value)) => println!(
                "trial {:>3}  loss {}  {}",
                trial.number,
                prompting::format_loss(value),
                render_line(&trial.params)
            ),
            (state, _) => println!("trial {:>3}  {:?}", trial.number, state),
        }
    }
    match tuner.best_trial() {
        Some(best) => println!(
            "best: trial {} with loss {}: {}",
            best.number,
            prompting::format_loss(best.value.unwrap_or(f64::NAN)),
            render_line(&best.params)
        ),
        None => println!("no trial completed"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env_file();
    let args = Args::parse();
    setup_tracing(args.tracing)?;
    let settings = args.provider_settings();

    match &args.command {
        Command::Run { study, trials, seed } => run(&settings, study, *trials, *seed).await,
        Command::Prompt { study } => {
            let conversation = StudyConfig::load(study)?.conversation_settings();
            println!("{}", prompting::SYSTEM_PROMPT);
            println!();
            println!(
                "{}",
                prompting::initial_message(
                    &conversation.model_type,
                    &conversation.search_space,
                    conversation.budget,
                    &conversation.example,
                )
            );
            Ok(())
        }
        Command::Models => {
            let provider = settings.create_provider()?;
            for model in provider.list_models().await? {
                println!("{}", model);
            }
            Ok(())
        }
    }
}
