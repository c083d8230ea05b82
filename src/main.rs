use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use localbot::agent::ChatAgent;
use localbot::config::Config;
use localbot::providers::seq2seq::{device_label, select_device};
use localbot::providers::Seq2SeqProvider;
use localbot::repl::Repl;

#[derive(Parser)]
#[command(name = "localbot")]
#[command(about = "Local command-line chatbot backed by a seq2seq model")]
struct Args {
    #[arg(help = "Ask a single question and exit")]
    prompt: Option<String>,

    #[arg(short, long, help = "Hugging Face model id (e.g. google/flan-t5-base)")]
    model: Option<String>,

    #[arg(long, help = "Model revision on the hub")]
    revision: Option<String>,

    #[arg(long, help = "Number of exchanges kept in memory")]
    memory_turns: Option<usize>,

    #[arg(short, long, help = "Path to a config.toml")]
    config: Option<PathBuf>,

    #[arg(long, help = "Run on the CPU even if an accelerator is available")]
    cpu: bool,

    #[arg(long, help = "Sampling seed")]
    seed: Option<u64>,

    #[arg(short, long, help = "Verbose output")]
    verbose: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.model.model_id = model.clone();
        }
        if let Some(revision) = &self.revision {
            config.model.revision = revision.clone();
        }
        if let Some(turns) = self.memory_turns {
            config.memory.max_turns = turns;
        }
        if let Some(seed) = self.seed {
            config.model.seed = Some(seed);
        }
        if self.cpu {
            config.model.force_cpu = true;
        }
    }
}

/// Installs the subscriber once; chatty third-party crates are held at `error`.
fn init_logging(verbose: bool) -> Result<()> {
    let default_directives = if verbose {
        "localbot=debug,hf_hub=error,tokenizers=error,candle_core=error,candle_transformers=error"
    } else {
        "localbot=warn,hf_hub=error,tokenizers=error,candle_core=error,candle_transformers=error"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from the data directory .env file
    if let Some(data_dir) = localbot::utils::paths::get_data_dir() {
        let env_path = data_dir.join(".env");
        if env_path.exists() {
            dotenv::from_path(env_path).ok();
        }
    }

    let args = Args::parse();
    init_logging(args.verbose)?;

    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    println!("{}", "=".repeat(60));
    println!("🤖 LOCAL COMMAND-LINE CHATBOT");
    println!("{}", "=".repeat(60));
    println!("🔄 Loading model: {}", config.model.model_id);
    println!("⏳ This may take a few minutes on first run...\n");

    let device = select_device(config.model.force_cpu)?;
    println!("💻 Using device: {}", device_label(&device));

    let model_config = config.model.clone();
    let provider = match tokio::task::spawn_blocking(move || Seq2SeqProvider::load(&model_config, device)).await? {
        Ok(provider) => provider,
        Err(e) => {
            println!("❌ Error loading model: {}", e);
            return Err(e);
        }
    };
    println!("✅ Model loaded successfully!\n");

    let agent = ChatAgent::new(Arc::new(provider), &config);

    match args.prompt {
        Some(prompt) => run_single_query(agent, &prompt).await,
        None => run_interactive_mode(agent).await,
    }
}

async fn run_interactive_mode(agent: ChatAgent) -> Result<()> {
    info!("Starting interactive session");
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut repl = Repl::new(agent, stdin, std::io::stdout());
    repl.print_welcome()?;
    repl.run().await
}

async fn run_single_query(mut agent: ChatAgent, prompt: &str) -> Result<()> {
    if let Some(reply) = agent.handle_turn(prompt).await? {
        println!("Bot: {}", reply.text);
    }
    Ok(())
}
