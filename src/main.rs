//! # Lead Resolver CLI
//!
//! Command-line interface for the lead-resolver library
//! (`lead_resolver_core`). This binary parses arguments, sets up
//! configuration, loads the data files, validates contacts (either single or
//! from a file), and handles output and pattern-store persistence.

use lead_resolver_core::{
    initialize_validator, validate_leads, validate_single_lead, BadEmailSet, Config,
    ConfigBuilder, Contact, EmailStatus, FormatHints, HttpTransport, LeadValidator,
    PatternStore, ValidationReport, VerificationClient,
};

// Dependencies specific to the CLI binary
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};

type ProductionValidator = LeadValidator<VerificationClient<HttpTransport>>;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Infers and verifies business contact email addresses.",
    long_about = "Lead Resolver generates prioritized candidate addresses per contact, checks them \
against an external verification provider, and learns the address pattern each company uses."
)]
struct AppArgs {
    /// Path to the input JSON file containing contact rows (file mode).
    #[arg(short, long, default_value = "input.json", env = "LEAD_RESOLVER_INPUT")]
    input: String,

    /// Path to the output JSON file with every annotated row.
    #[arg(
        short,
        long,
        default_value = "validated.json",
        env = "LEAD_RESOLVER_OUTPUT"
    )]
    output: String,

    /// Path to the output JSON file with only Valid/Catch-All rows, sorted by company.
    #[arg(
        long,
        default_value = "deliverable.json",
        env = "LEAD_RESOLVER_DELIVERABLE"
    )]
    deliverable_output: String,

    /// First name of a single contact (enables single-contact mode). Requires --last and --company.
    #[arg(long, env = "LEAD_RESOLVER_FIRST", requires = "last", requires = "company")]
    first: Option<String>,

    /// Last name of a single contact. Requires --first and --company.
    #[arg(long, env = "LEAD_RESOLVER_LAST", requires = "first", requires = "company")]
    last: Option<String>,

    /// Company name of a single contact. Requires --first and --last.
    #[arg(long, env = "LEAD_RESOLVER_COMPANY", requires = "first", requires = "last")]
    company: Option<String>,

    /// Print the single-contact result to standard output instead of a file.
    #[arg(long, default_value = "false", env = "LEAD_RESOLVER_STDOUT")]
    stdout: bool,

    /// Path to a configuration file (TOML format) to load settings from. CLI args override file settings.
    #[arg(long, env = "LEAD_RESOLVER_CONFIG")]
    config_file: Option<String>,

    /// Maximum number of concurrent validations.
    #[arg(short, long, env = "LEAD_RESOLVER_CONCURRENCY")]
    concurrency: Option<usize>,

    /// API key for the verification provider.
    #[arg(long, env = "LEAD_RESOLVER_API_KEY")]
    api_key: Option<String>,

    /// Base URL of the verification provider endpoint.
    #[arg(long, env = "LEAD_RESOLVER_VERIFIER_URL")]
    verifier_url: Option<String>,

    /// Retry budget per candidate address.
    #[arg(long, env = "LEAD_RESOLVER_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    /// HTTP request timeout in seconds.
    #[arg(long, env = "LEAD_RESOLVER_REQUEST_TIMEOUT")]
    request_timeout: Option<u64>,

    /// Path to the static format hints JSON file.
    #[arg(long, env = "LEAD_RESOLVER_FORMAT_HINTS")]
    format_hints: Option<String>,

    /// Treat a missing format hints file as a fatal error.
    #[arg(long, default_value = "false", env = "LEAD_RESOLVER_REQUIRE_FORMAT_HINTS")]
    require_format_hints: bool,

    /// Path to the known-bad emails JSON file.
    #[arg(long, env = "LEAD_RESOLVER_BAD_EMAILS")]
    bad_emails: Option<String>,

    /// Path to the dynamic pattern database JSON file.
    #[arg(long, env = "LEAD_RESOLVER_PATTERN_DB")]
    pattern_db: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_thread_names(true)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Setting up tracing subscriber failed")?;

    tracing::info!(
        "Lead Resolver CLI v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let args = AppArgs::parse();
    tracing::debug!("Parsed CLI arguments: {:?}", args);

    let mut config_builder = ConfigBuilder::new();

    if let Some(ref path) = args.config_file {
        config_builder = config_builder.config_file(path);
    }
    if let Some(c) = args.concurrency {
        config_builder = config_builder.max_concurrency(c);
    }
    if let Some(ref key) = args.api_key {
        config_builder = config_builder.verifier_api_key(key);
    }
    if let Some(ref url) = args.verifier_url {
        config_builder = config_builder.verifier_base_url(url);
    }
    if let Some(attempts) = args.max_attempts {
        config_builder = config_builder.max_verification_attempts(attempts);
    }
    if let Some(t) = args.request_timeout {
        config_builder = config_builder.request_timeout(Duration::from_secs(t));
    }
    if let Some(ref path) = args.format_hints {
        config_builder = config_builder.format_hints_path(path);
    }
    if args.require_format_hints {
        config_builder = config_builder.require_format_hints(true);
    }
    if let Some(ref path) = args.bad_emails {
        config_builder = config_builder.bad_emails_path(path);
    }
    if let Some(ref path) = args.pattern_db {
        config_builder = config_builder.pattern_db_path(path);
    }

    let config = match config_builder.build() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return Err(anyhow::anyhow!("Failed to build configuration: {}", e));
        }
    };
    tracing::debug!("Effective configuration loaded: {:?}", *config);

    let hints = FormatHints::load(
        Path::new(&config.format_hints_path),
        config.require_format_hints,
    )
    .map_err(|e| anyhow::anyhow!("Failed to load format hints: {}", e))?;
    let bad_emails = BadEmailSet::load(Path::new(&config.bad_emails_path));
    let store = Arc::new(PatternStore::load(Path::new(&config.pattern_db_path)));

    let validator = initialize_validator(
        Arc::clone(&config),
        hints,
        bad_emails,
        Arc::clone(&store),
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize validator: {}", e))?;
    let validator = Arc::new(validator);

    let is_single_mode = args.first.is_some();
    let start_time = Instant::now();

    let execution_result = if is_single_mode {
        process_single_mode(&validator, &args).await
    } else {
        process_file_mode(config.clone(), Arc::clone(&validator), &args, start_time).await
    };

    if let Err(e) = execution_result {
        tracing::error!("Execution failed: {}", e);
        return Err(e);
    }

    tracing::info!("Persisting pattern database to '{}'...", config.pattern_db_path);
    validator
        .pattern_store()
        .save(Path::new(&config.pattern_db_path))
        .map_err(|e| anyhow::anyhow!("Failed to persist pattern database: {}", e))?;

    if !is_single_mode {
        tracing::info!(
            "Processing finished successfully. Total duration: {:.2?}",
            start_time.elapsed()
        );
    }

    Ok(())
}

async fn process_single_mode(validator: &ProductionValidator, args: &AppArgs) -> Result<()> {
    tracing::info!("Running in Single Contact mode.");
    let start_time = Instant::now();

    let contact = Contact::new(
        args.first.as_deref().unwrap_or_default(),
        args.last.as_deref().unwrap_or_default(),
        args.company.as_deref().unwrap_or_default(),
    );
    tracing::info!(
        "Validating Name='{} {}', Company='{}'",
        contact.first_name,
        contact.last_name,
        contact.company
    );

    let result = validate_single_lead(validator, contact).await;

    if args.stdout {
        print_single_result(&result);
    } else {
        tracing::info!("Saving result to '{}'...", args.output);
        save_contacts(&[result], &args.output)?;
        tracing::info!("Result saved successfully to '{}'.", args.output);
    }
    tracing::info!("Single mode finished. Duration: {:.2?}", start_time.elapsed());
    Ok(())
}

async fn process_file_mode(
    config: Arc<Config>,
    validator: Arc<ProductionValidator>,
    args: &AppArgs,
    start_time: Instant,
) -> Result<()> {
    tracing::info!(
        "Running in File Processing mode. Input: '{}', Output: '{}', Deliverable: '{}'",
        args.input,
        args.output,
        args.deliverable_output
    );
    let input_path = Path::new(&args.input);

    if !input_path.exists() || !input_path.is_file() {
        return Err(anyhow::anyhow!(
            "Input file not found or is not a file: {}",
            args.input
        ));
    }
    ensure_writable(&args.output)?;
    ensure_writable(&args.deliverable_output)?;

    tracing::info!("Loading contacts from '{}'...", args.input);
    let contacts = load_contacts(&args.input)?;
    let total_records_loaded = contacts.len();
    if total_records_loaded == 0 {
        tracing::warn!(
            "Input file '{}' is empty or contains no valid rows. Saving empty results files.",
            args.input
        );
        save_contacts(&[], &args.output)?;
        save_contacts(&[], &args.deliverable_output)?;
        return Ok(());
    }
    tracing::info!("Loaded {} records from input file.", total_records_loaded);

    tracing::info!(
        "Starting email validation for {} records (Concurrency: {})...",
        total_records_loaded,
        config.max_concurrency
    );
    let pb = ProgressBar::new(total_records_loaded as u64);
    pb.set_style(ProgressStyle::default_bar()
         .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) | ETA: {eta} | {msg}")
         .context("Failed to set progress bar template")?
         .progress_chars("=> "));
    pb.set_message("Validating contacts...");
    pb.enable_steady_tick(Duration::from_millis(120));

    let report = validate_leads(config, validator, contacts).await;

    pb.set_position(report.results.len() as u64);
    pb.finish_with_message(format!("Validated {} records", report.results.len()));

    tracing::info!("Saving all results to '{}'...", args.output);
    save_contacts(&report.results, &args.output)?;
    tracing::info!(
        "Saving {} deliverable rows to '{}'...",
        report.deliverable.len(),
        args.deliverable_output
    );
    save_contacts(&report.deliverable, &args.deliverable_output)?;
    tracing::info!("Results saved successfully.");

    log_summary(&report, total_records_loaded, start_time.elapsed());

    Ok(())
}

/// Creates the output file (and parent directories) up front so permission
/// problems surface before the network work starts.
fn ensure_writable(path_str: &str) -> Result<()> {
    let path = Path::new(path_str);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            tracing::debug!("Creating output directory: {}", parent_dir.display());
            std::fs::create_dir_all(parent_dir).with_context(|| {
                format!(
                    "Failed to create output directory '{}'",
                    parent_dir.display()
                )
            })?;
        }
    }
    File::create(path)
        .with_context(|| format!("Cannot write to output file '{}'. Check permissions.", path_str))?;
    tracing::debug!("Output path '{}' seems writable.", path_str);
    Ok(())
}

fn load_contacts(file_path: &str) -> Result<Vec<Contact>> {
    tracing::debug!("Opening input file: {}", file_path);
    let file = File::open(file_path)
        .with_context(|| format!("Failed to open input file '{}'", file_path))?;
    let reader = BufReader::new(file);

    tracing::debug!("Parsing JSON from file: {}", file_path);
    let records: Vec<Contact> = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse JSON from '{}'. Ensure it's an array of contact row objects.",
            file_path
        )
    })?;

    Ok(records)
}

/// Saves contact rows to the specified JSON file.
/// Uses `serde_json` with pretty printing for human readability.
fn save_contacts(contacts: &[Contact], file_path: &str) -> Result<()> {
    tracing::debug!("Creating output file: {}", file_path);
    let file = File::create(file_path)
        .with_context(|| format!("Failed to create/truncate output file '{}'", file_path))?;
    let writer = BufWriter::new(file);

    tracing::debug!(
        "Writing {} rows as JSON to file: {}",
        contacts.len(),
        file_path
    );
    serde_json::to_writer_pretty(writer, contacts)
        .with_context(|| format!("Failed to serialize rows to JSON for '{}'", file_path))?;

    Ok(())
}

/// Logs a summary of the batch results to the console using `tracing::info`.
fn log_summary(report: &ValidationReport, original_total: usize, duration: Duration) {
    tracing::info!("-------------------- Validation Summary --------------------");
    tracing::info!("Total Records in Input File : {}", original_total);
    tracing::info!("Records Processed           : {}", report.results.len());
    tracing::info!("  - Valid                   : {}", report.valid_count());
    tracing::info!("  - Catch-All               : {}", report.catch_all_count());
    tracing::info!("  - Invalid                 : {}", report.invalid_count());
    tracing::info!("Deliverable Rows            : {}", report.deliverable.len());
    tracing::info!("Total Time Taken            : {:.2?}", duration);
    if duration.as_secs_f64() > 0.01 && !report.results.is_empty() {
        let rate = (report.results.len() as f64) / duration.as_secs_f64();
        tracing::info!("Processing Rate             : {:.2} records/sec", rate);
    }
    tracing::info!("----------------------------------------------------------");
}

/// Prints the result for a single contact to standard output.
fn print_single_result(result: &Contact) {
    const BLUE: &str = "\x1b[34m";
    const GREEN: &str = "\x1b[32m";
    const YELLOW: &str = "\x1b[33m";
    const RED: &str = "\x1b[31m";
    const RESET: &str = "\x1b[0m";

    println!("\n{BLUE}===== Lead Resolver Result ====={RESET}");
    println!("Name:    {} {}", result.first_name, result.last_name);
    println!("Company: {}", result.company);

    match result.email_status {
        EmailStatus::Valid => {
            println!("\n{GREEN}Status: VALID{RESET}");
            println!("Email:  {GREEN}{}{RESET}", result.validated_email);
        }
        EmailStatus::CatchAll => {
            println!("\n{YELLOW}Status: CATCH-ALL{RESET}");
            println!("Email:  {YELLOW}{}{RESET} (unverifiable mailbox)", result.validated_email);
        }
        EmailStatus::Invalid => {
            println!("\n{RED}Status: INVALID{RESET}");
            println!("Reason: No candidate address could be confirmed.");
        }
    }

    println!("{BLUE}==============================={RESET}\n");
}
