use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use console::style;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use autopress::{
    AutopressError, Config, ConfigLoader, ContentGenerator, DateRange, FsMediaStore,
    GenerateImage, GenerationRequest, ImageGenerator, InMemoryStatusStore, JobQueue, JobRecord,
    Result, UsageTracker,
};

#[derive(Parser)]
#[command(name = "autopress")]
#[command(version, about = "Asynchronous AI article generation pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, help = "Path to a config file (overrides the lookup chain)")]
    config: Option<std::path::PathBuf>,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an article and poll until it finishes
    Generate {
        #[arg(long, help = "Article topic")]
        topic: Option<String>,
        #[arg(long, help = "Output language, e.g. en-US")]
        language: Option<String>,
        #[arg(long, help = "Writing style")]
        style: Option<String>,
        #[arg(long, help = "Tone of voice")]
        tone: Option<String>,
        #[arg(long, help = "Number of sections")]
        paragraphs: Option<u32>,
        #[arg(long, help = "Approximate words per section")]
        words: Option<u32>,
        #[arg(long, help = "Maximum output tokens")]
        max_tokens: Option<u32>,
        #[arg(long, help = "Text model override")]
        model: Option<String>,
        #[arg(long, help = "Sampling temperature")]
        temperature: Option<f32>,
        #[arg(long, help = "Print the raw payload as JSON")]
        json: bool,
    },

    /// Show recorded usage and cost
    Usage {
        #[arg(long, help = "Start date (YYYY-MM-DD, inclusive)")]
        from: Option<NaiveDate>,
        #[arg(long, help = "End date (YYYY-MM-DD, inclusive)")]
        to: Option<NaiveDate>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        per_page: u32,
    },
}

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    });

    let runtime = Runtime::new()
        .map_err(|e| AutopressError::Config(format!("Failed to start runtime: {e}")))?;

    match cli.command {
        Commands::Generate {
            topic,
            language,
            style,
            tone,
            paragraphs,
            words,
            max_tokens,
            model,
            temperature,
            json,
        } => {
            let request = GenerationRequest {
                topic,
                language,
                style,
                tone,
                paragraphs,
                words_per_paragraph: words,
                max_tokens,
                model,
                temperature,
                seo_hint: None,
                fixed_tags: None,
            };
            runtime.block_on(run_generate(config, request, json))
        }
        Commands::Usage {
            from,
            to,
            page,
            per_page,
        } => run_usage(&config, DateRange { start: from, end: to }, page, per_page),
    }
}

async fn run_generate(config: Arc<Config>, request: GenerationRequest, json: bool) -> Result<()> {
    let usage = Arc::new(UsageTracker::open(&config.usage.db_path)?);
    let generator = Arc::new(ContentGenerator::new(Arc::clone(&config), usage)?);

    let image: Option<Arc<dyn GenerateImage>> = if config.image.enabled {
        let media = Arc::new(FsMediaStore::new(".autopress/media"));
        Some(Arc::new(ImageGenerator::new(&config, media)?))
    } else {
        None
    };

    let queue = JobQueue::new(
        Arc::new(InMemoryStatusStore::new()),
        generator,
        image,
        Duration::from_secs(config.queue.job_ttl_secs),
    );

    let job_id = queue.dispatch(request)?;
    println!("{} {}", style("Dispatched job").cyan(), style(&job_id).bold());

    loop {
        tokio::time::sleep(Duration::from_millis(500)).await;
        match queue.status(&job_id) {
            JobRecord::Processing => continue,
            JobRecord::Completed { data } => {
                println!("{}", style("Completed").green().bold());
                if json {
                    println!("{}", serde_json::to_string_pretty(&data)?);
                } else {
                    println!("{} {}", style("Title:").bold(), data.title);
                    println!("{} {}", style("Tags:").bold(), data.tags.join(", "));
                    if let Some(url) = &data.image_preview_url {
                        println!("{} {}", style("Image:").bold(), url);
                    }
                    if let Some(err) = &data.image_preview_error {
                        println!("{} {}", style("Image error:").yellow(), err);
                    }
                    println!("\n{}", data.content_html);
                }
                return Ok(());
            }
            JobRecord::Error { code, message } => {
                return Err(AutopressError::Storage(format!(
                    "generation failed ({code}): {message}"
                )));
            }
        }
    }
}

fn run_usage(config: &Config, range: DateRange, page: u32, per_page: u32) -> Result<()> {
    let tracker = UsageTracker::open(&config.usage.db_path)?;
    let report = tracker.history(&range, page, per_page)?;

    if report.records.is_empty() {
        println!("No usage recorded for the selected range.");
        return Ok(());
    }

    for record in &report.records {
        let when = chrono::DateTime::from_timestamp(record.timestamp, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| record.timestamp.to_string());
        println!(
            "{}  {:<14} {:>7} prompt {:>7} completion  ${:.6}",
            when, record.model, record.prompt_tokens, record.completion_tokens, record.cost
        );
    }

    println!(
        "\n{} {} calls, {} tokens, ${:.6}",
        style("Total:").bold(),
        report.summary.total_records,
        report.summary.total_tokens,
        report.summary.total_cost
    );
    Ok(())
}
