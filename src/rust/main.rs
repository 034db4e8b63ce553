use kinder::{ClassifierRegistry, RegistryConfig};
use log::info;
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON training set: an array of {"text", "classification"} objects
    #[arg(short, long)]
    training_set: PathBuf,

    /// Name to register the classifier under
    #[arg(short, long, default_value = "default")]
    name: String,

    /// Print the full ranked distribution instead of the best label
    #[arg(short, long)]
    details: bool,

    /// Fail instead of waiting longer than this for a classifier lock
    #[arg(long)]
    lock_timeout_ms: Option<u64>,

    /// Texts to classify
    #[arg(required = true)]
    texts: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    kinder::init_logger();
    let args = Args::parse();

    let mut config = RegistryConfig::from_env();
    if let Some(ms) = args.lock_timeout_ms {
        config = config.with_lock_timeout(Duration::from_millis(ms));
    }
    let registry = ClassifierRegistry::new().with_config(config);

    let start_time = Instant::now();
    registry.create_classifier(&args.name).await?;
    registry.train_from_json(&args.training_set, &args.name).await?;
    let info = registry.info(&args.name).await?;
    info!(
        "Trained '{}' on {} documents ({} labels) in {:.2?}",
        info.name,
        info.trained_document_count,
        info.labels.len(),
        start_time.elapsed()
    );

    for text in &args.texts {
        if args.details {
            let details = registry.classify_details(text, &args.name).await?;
            println!("{}", serde_json::to_string(&details)?);
        } else {
            let label = registry.classify(text, &args.name).await?;
            println!("{}", label.unwrap_or_default());
        }
    }

    Ok(())
}
