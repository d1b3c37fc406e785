use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use zh_core::{ArticleStorage, StoredArticle};
use zh_inference::{BackendKind, DEFAULT_BASE_PROMPT};
use zh_scrapers::{CrawlConfig, DuplicatePolicy, PipelineOptions, ScraperManager, TvbsScraper};
use zh_storage::backends::sqlite::DEFAULT_DB_PATH;

mod logging;

const TOO_LARGE: &str = "Duration too large";

#[derive(Debug, Clone, Copy, PartialEq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if !current_number.is_empty() {
                let num = current_number
                    .parse::<u64>()
                    .map_err(|_| TOO_LARGE.to_string())?;
                let multiplier = match c {
                    's' => 1,
                    'm' => 60,
                    'h' => 3600,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                };
                total_seconds = num
                    .checked_mul(multiplier)
                    .and_then(|secs| total_seconds.checked_add(secs))
                    .ok_or_else(|| TOO_LARGE.to_string())?;
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A bare number means seconds
        if !current_number.is_empty() {
            total_seconds = current_number
                .parse::<u64>()
                .ok()
                .and_then(|secs| total_seconds.checked_add(secs))
                .ok_or_else(|| TOO_LARGE.to_string())?;
            has_unit = true;
        }

        if !has_unit || total_seconds == 0 {
            return Err("Duration must be a positive number of seconds, minutes or hours".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(name = "zh", author, version, about = "Learn chinese by reading news articles", long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, default_value = DEFAULT_DB_PATH)]
    db: PathBuf,
    /// Storage backend: sqlite or memory
    #[arg(long, global = true, default_value = "sqlite")]
    storage: String,
    /// Generation backend: ollama (default), gemini or echo
    #[arg(long, global = true, default_value = "ollama")]
    model: String,
    /// Backend model name, e.g. llama3:latest or gemini-pro
    #[arg(long, global = true)]
    model_name: Option<String>,
    /// Backend base URL
    #[arg(long, global = true)]
    model_url: Option<String>,
    /// Instruction prepended to every article
    #[arg(long, global = true, default_value = DEFAULT_BASE_PROMPT)]
    prompt: String,
    /// Network timeout for page fetches and generation calls (e.g. 30s, 2m)
    #[arg(long, global = true)]
    timeout: Option<HumanDuration>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the scraper and save the results
    Run {
        /// Number of articles to visit
        #[arg(short, long, default_value_t = zh_scrapers::manager::DEFAULT_LIMIT)]
        limit: usize,
        /// End the pass at the first article that is already stored
        #[arg(long)]
        stop_on_duplicate: bool,
    },
    /// List all the articles saved
    Ls,
    /// Print one saved article
    Show { id: String },
    /// Serve the saved articles as JSON
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
}

fn inference_config(cli: &Cli) -> anyhow::Result<zh_inference::Config> {
    let mut config = zh_inference::Config {
        backend: BackendKind::from_str(&cli.model)?,
        model_name: cli.model_name.clone(),
        model_url: cli.model_url.clone(),
        base_prompt: cli.prompt.clone(),
        ..zh_inference::Config::default()
    };
    if let Some(timeout) = cli.timeout {
        config.timeout = timeout.0;
    }
    Ok(config)
}

fn crawl_config(cli: &Cli) -> CrawlConfig {
    let mut config = CrawlConfig::default();
    if let Some(timeout) = cli.timeout {
        config.timeout = timeout.0;
    }
    config
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).chain(std::iter::once('…')).collect()
}

fn print_table(articles: &[StoredArticle]) {
    println!("{:<8}  {:<25}  {:<30}  {}", "Id", "Title", "Article", "Created");
    for article in articles {
        println!(
            "{:<8}  {:<25}  {:<30}  {}",
            article.id,
            truncate(&article.title, 24),
            truncate(&article.article, 29),
            article.created_at
        );
    }
}

fn print_article(article: &StoredArticle) {
    println!("{}\n{}\n{}\n", article.title, article.link, article.created_at);
    println!("{}\n", article.article);
    println!("{}", article.article_gen);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let storage: Arc<dyn ArticleStorage> = zh_storage::create_storage(&cli.storage, &cli.db)?;
    storage.ensure_initialized().await?;

    match cli.command {
        Commands::Run {
            limit,
            stop_on_duplicate,
        } => {
            let inference = zh_inference::create_model(&inference_config(&cli)?)?;
            let scraper = Arc::new(TvbsScraper::new(&crawl_config(&cli))?);
            let manager = ScraperManager::new(storage.clone(), inference, scraper);

            let options = PipelineOptions {
                limit,
                duplicate_policy: if stop_on_duplicate {
                    DuplicatePolicy::Stop
                } else {
                    DuplicatePolicy::Skip
                },
            };
            let report = manager.run(&options).await?;
            info!(
                "🏁 {} scraped, {} written, {} already stored, {} failed",
                report.scraped,
                report.written,
                report.duplicates,
                report.generation_failures + report.write_failures
            );
        }
        Commands::Ls => print_table(&storage.fetch_all().await?),
        Commands::Show { ref id } => print_article(&storage.fetch_by_id(id).await?),
        Commands::Serve { addr } => zh_web::serve(zh_web::AppState { storage }, addr).await?,
    }

    Ok(())
}
