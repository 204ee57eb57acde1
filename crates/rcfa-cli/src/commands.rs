//! Command implementations

use crate::cli::{Cli, Commands};
use crate::output::{output_batch_summary, output_response, output_result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use rcfa_app::app::AnalysisService;
use rcfa_app::config::{Config, API_KEY_ENV};
use rcfa_app::scanner::scan_directory;
use rcfa_types::{AnalysisContext, BatchEntry, BatchResults, CacheError, Error, OutputFormat, Result};
use rcfa_vision::{build_expert_prompt, Cache, ResponseParser, VisionBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

const DEFAULT_JOBS: usize = 4;

pub async fn execute(cli: Cli) -> Result<()> {
    // Load config, then environment, then CLI args
    let mut config = Config::load()?;
    config.apply_env();
    if let Some(ref model) = cli.model {
        config.model = model.clone();
    }

    let output_format = cli.format.unwrap_or(config.output_format);

    match &cli.command {
        Commands::Analyze {
            image,
            context,
            no_cache,
        } => {
            // Cache disabled if: --no-cache OR config.cache_enabled=false
            let use_cache = !no_cache && config.cache_enabled;
            cmd_analyze(&config, image.clone(), context.to_context(), use_cache, output_format).await
        }

        Commands::Batch {
            folder,
            context,
            output,
            no_cache,
            jobs,
        } => {
            // 0 = auto CPU count
            let job_count = match jobs {
                Some(0) => num_cpus::get(),
                Some(n) => *n,
                None => DEFAULT_JOBS,
            };
            let use_cache = !no_cache && config.cache_enabled;
            cmd_batch(
                &cli,
                &config,
                folder.clone(),
                context.to_context(),
                output.clone(),
                use_cache,
                job_count,
                output_format,
            )
            .await
        }

        Commands::Prompt { context } => cmd_prompt(&context.to_context()),

        Commands::Parse { file } => cmd_parse(file.clone(), output_format),

        Commands::Status => cmd_status(&config),

        Commands::Config {
            show,
            set_api_key,
            set_model,
            set_base_url,
            set_timeout,
            set_cache,
            set_output,
            reset,
        } => cmd_config(ConfigUpdate {
            show: *show,
            api_key: set_api_key.clone(),
            model: set_model.clone(),
            base_url: set_base_url.clone(),
            timeout_secs: *set_timeout,
            cache_enabled: *set_cache,
            output_format: *set_output,
            reset: *reset,
        }),

        Commands::Cache { clear, stats } => cmd_cache(&config, *clear, *stats),
    }
}

async fn cmd_analyze(
    config: &Config,
    image: PathBuf,
    context: AnalysisContext,
    use_cache: bool,
    output_format: OutputFormat,
) -> Result<()> {
    let service = AnalysisService::from_config(config, use_cache);

    let outcome = service
        .analyze_path(&image, &context)
        .await
        .map_err(|e| Error::AnalysisFailed(e.to_string()))?;

    if outcome.response.analysis.is_degraded() {
        warn!(image = %image.display(), "analysis returned a degraded result");
    }

    output_response(output_format, &outcome.response, outcome.from_cache)
}

#[allow(clippy::too_many_arguments)]
async fn cmd_batch(
    cli: &Cli,
    config: &Config,
    folder: PathBuf,
    context: AnalysisContext,
    output: Option<PathBuf>,
    use_cache: bool,
    jobs: usize,
    output_format: OutputFormat,
) -> Result<()> {
    let images = scan_directory(&folder)?;

    if images.is_empty() {
        return Err(Error::FileNotFound(format!(
            "No images found in {}",
            folder.display()
        )));
    }

    let service = AnalysisService::from_config(config, use_cache);
    if !service.analyzer().is_ready() {
        return Err(Error::NotReady(format!(
            "API key not configured. Set {} or run `bearing-rcfa config --set-api-key`",
            API_KEY_ENV
        )));
    }

    let total_images = images.len();
    let jobs = jobs.max(1);
    if cli.verbose {
        eprintln!(
            "Found {} images to analyze with {} parallel jobs (cache: {})",
            total_images,
            jobs,
            if service.cache_enabled() { "on" } else { "off" }
        );
    }

    let pb = ProgressBar::new(total_images as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let started_at = Utc::now();

    let service = Arc::new(service);
    let context = Arc::new(context);
    let permits = Arc::new(Semaphore::new(jobs));
    let mut tasks = JoinSet::new();

    for image in images {
        let service = Arc::clone(&service);
        let context = Arc::clone(&context);
        let permits = Arc::clone(&permits);
        let pb = pb.clone();

        tasks.spawn(async move {
            // The semaphore is never closed, so acquire only fails on shutdown
            let _permit = permits.acquire_owned().await.ok();

            let filename = image
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_string();
            pb.set_message(filename);

            let outcome = service.analyze_path(&image, &context).await;
            pb.inc(1);

            match outcome {
                Ok(outcome) => BatchEntry {
                    image_path: image.display().to_string(),
                    response: Some(outcome.response),
                    error: None,
                    cached: outcome.from_cache,
                },
                Err(e) => BatchEntry {
                    image_path: image.display().to_string(),
                    response: None,
                    error: Some(e.to_string()),
                    cached: false,
                },
            }
        });
    }

    let mut entries = Vec::with_capacity(total_images);
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(entry) => {
                if let Some(ref error) = entry.error {
                    debug!(image = %entry.image_path, %error, "analysis failed");
                }
                entries.push(entry);
            }
            Err(e) => warn!(error = %e, "batch task aborted"),
        }
    }

    pb.finish_with_message("Complete");

    // Sort entries by image path for consistent output
    entries.sort_by(|a, b| a.image_path.cmp(&b.image_path));

    let results = BatchResults {
        entries,
        context: Arc::unwrap_or_clone(context),
        started_at,
        completed_at: Utc::now(),
    };

    if let Some(output_path) = output {
        let content = serde_json::to_string_pretty(&results)?;
        std::fs::write(&output_path, content)?;
        println!("Results saved to: {}", output_path.display());
    } else if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(&results)?;
        println!("{}", content);
        return Ok(());
    }

    output_batch_summary(&results);
    Ok(())
}

fn cmd_prompt(context: &AnalysisContext) -> Result<()> {
    println!("{}", build_expert_prompt(context));
    Ok(())
}

fn cmd_parse(file: PathBuf, output_format: OutputFormat) -> Result<()> {
    if !file.exists() {
        return Err(Error::FileNotFound(file.display().to_string()));
    }

    let raw = std::fs::read_to_string(&file)?;
    let result = ResponseParser::new().parse(&raw);
    output_result(output_format, &result)
}

fn cmd_status(config: &Config) -> Result<()> {
    let backend = config.backend();

    println!("Analyzer status");
    println!("===============");
    println!("Model:    {}", backend.model_name());
    println!("API key:  {}", config.masked_api_key());
    println!("Timeout:  {}s", config.timeout_secs);

    if backend.is_ready() {
        println!("\n✓ Ready to analyze");
    } else {
        println!("\n✗ Not ready: API key not configured");
        println!("  Set {} or run `bearing-rcfa config --set-api-key <KEY>`", API_KEY_ENV);
    }

    Ok(())
}

/// Requested changes from the `config` subcommand
struct ConfigUpdate {
    show: bool,
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    cache_enabled: Option<bool>,
    output_format: Option<OutputFormat>,
    reset: bool,
}

fn cmd_config(update: ConfigUpdate) -> Result<()> {
    if update.reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    // The saved file only; environment overrides are not persisted
    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(api_key) = update.api_key {
        config.api_key = Some(api_key).filter(|k| !k.trim().is_empty());
        modified = true;
    }

    if let Some(model) = update.model {
        config.model = model;
        modified = true;
    }

    if let Some(base_url) = update.base_url {
        config.api_base_url = Some(base_url).filter(|u| !u.trim().is_empty());
        modified = true;
    }

    if let Some(timeout_secs) = update.timeout_secs {
        config.timeout_secs = timeout_secs;
        modified = true;
    }

    if let Some(cache_enabled) = update.cache_enabled {
        config.cache_enabled = cache_enabled;
        modified = true;
    }

    if let Some(output_format) = update.output_format {
        config.output_format = output_format;
        modified = true;
    }

    if modified {
        config.validate()?;
        config.save()?;
        println!("Configuration updated");
    }

    if update.show || !modified {
        println!("{}", config);
    }

    Ok(())
}

fn cmd_cache(config: &Config, clear: bool, stats: bool) -> Result<()> {
    if !config.cache_enabled {
        return Err(Error::Cache(CacheError::IoError(
            "Cache is disabled. Enable with: bearing-rcfa config --set-cache true".to_string(),
        )));
    }

    let cache = Cache::new(config.cache_dir()?)?;

    if clear {
        let count = cache.clear()?;
        println!("Cleared {} cached entries", count);
    }

    if stats || !clear {
        let stats = cache.stats()?;
        println!("{}", stats.display());
    }

    Ok(())
}
