//! Tenderlens command-line entrypoint.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use mimalloc::MiMalloc;
use serde_json::json;

use tenderlens::catalog::{QuestionCatalog, read_seed};
use tenderlens::config::Config;
use tenderlens::extract::{ExtractionOutcome, SearchSpec, SectionExtractor};
use tenderlens::pdf::{PdfSource, probe_page};
use tenderlens::sink::{AnswerRecord, EvaluationSink, JsonlSink, ScoringRequest};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const DEFAULT_CATALOG_PATH: &str = "./.data/questions.json";

#[derive(Parser)]
#[command(name = "tenderlens")]
#[command(about = "Criterion-section extraction from tender-response PDFs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract one criterion section from a PDF
    Extract(ExtractArgs),
    /// Print per-page text and image statistics
    Probe {
        /// PDF to inspect
        pdf: PathBuf,
    },
    /// Manage the question catalog
    #[command(subcommand)]
    Questions(QuestionsCommand),
}

#[derive(Args)]
struct ExtractArgs {
    /// PDF to search
    pdf: PathBuf,

    /// Question id, e.g. Q3
    #[arg(short, long)]
    question: String,

    /// Heading label; ignored when the question comes from the catalog
    #[arg(short, long, default_value = "Criterion")]
    label: String,

    /// Match the label literally instead of combining it with the question number
    #[arg(long)]
    no_auto_increment: bool,

    /// Read the question's search settings and prompt from this catalog
    #[arg(long, env = "TENDERLENS_CATALOG_PATH")]
    catalog: Option<PathBuf>,

    /// Applicant (document owner) id recorded on cache entries and answer records
    #[arg(long)]
    applicant_id: Option<i64>,

    /// Append the answer record to this JSON-lines file
    #[arg(long, requires = "applicant_id")]
    jsonl: Option<PathBuf>,
}

#[derive(Subcommand)]
enum QuestionsCommand {
    /// Import questions from a JSON array seed file
    Import {
        seed: PathBuf,
        /// Refuse to import unless the catalog is empty
        #[arg(long)]
        blank: bool,
        #[arg(long, env = "TENDERLENS_CATALOG_PATH", default_value = DEFAULT_CATALOG_PATH)]
        catalog: PathBuf,
    },
    /// Write the catalog as a JSON array in question order
    Export {
        out: PathBuf,
        #[arg(long, env = "TENDERLENS_CATALOG_PATH", default_value = DEFAULT_CATALOG_PATH)]
        catalog: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    match cli.command {
        Command::Extract(args) => run_extract(&config, args).await,
        Command::Probe { pdf } => run_probe(&config, &pdf).await,
        Command::Questions(QuestionsCommand::Import {
            seed,
            blank,
            catalog,
        }) => run_import(&seed, blank, &catalog),
        Command::Questions(QuestionsCommand::Export { out, catalog }) => {
            run_export(&out, &catalog)
        }
    }
}

async fn run_extract(config: &Config, args: ExtractArgs) -> anyhow::Result<()> {
    let catalog = args
        .catalog
        .as_deref()
        .map(QuestionCatalog::load)
        .transpose()
        .context("failed to load question catalog")?;
    let question = match &catalog {
        Some(catalog) => Some(catalog.require(&args.question)?.clone()),
        None => None,
    };

    let spec = match &question {
        Some(question) => question.search_spec(),
        None => SearchSpec::new(&args.question, &args.label, !args.no_auto_increment),
    };

    tracing::info!(
        q_id = %spec.id,
        label = %spec.search_label,
        auto_increment = spec.auto_increment,
        ocr_backend = config.has_ocr_backend(),
        cache_path = %config.cache_path.display(),
        "Tenderlens extraction starting"
    );

    let extractor = SectionExtractor::from_config(config)?;
    let outcome = extractor
        .extract_path(&args.pdf, &spec, args.applicant_id)
        .await;

    let mut output = match &outcome {
        ExtractionOutcome::Found(result) => json!({
            "q_id": spec.id,
            "status": outcome.label(),
            "header": result.header,
            "paragraph": result.paragraph,
        }),
        ExtractionOutcome::NotFound => json!({
            "q_id": spec.id,
            "status": outcome.label(),
        }),
        ExtractionOutcome::Unreadable { reason } => json!({
            "q_id": spec.id,
            "status": outcome.label(),
            "reason": reason,
        }),
    };

    if let Some(result) = outcome.as_found() {
        let record = AnswerRecord::from_result(args.applicant_id.unwrap_or_default(), &spec.id, result);

        if let Some(question) = &question {
            let request = ScoringRequest::build(record.clone(), question)?;
            output["scoring_prompt"] = json!(request.prompt);
        }

        if let Some(path) = &args.jsonl {
            JsonlSink::new(path).record(record).await?;
            tracing::info!(path = %path.display(), "Answer record written");
        }
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run_probe(config: &Config, pdf: &Path) -> anyhow::Result<()> {
    let extractor = SectionExtractor::from_config(config)?;
    let document = extractor
        .open(pdf)
        .await
        .with_context(|| format!("failed to open {}", pdf.display()))?;

    let pages: Vec<_> = (0..document.page_count())
        .map(|index| probe_page(&document, index))
        .collect::<Result<_, _>>()?;

    println!("pages: {}", pages.len());
    for page in &pages {
        println!(
            "page {:>4}  native_chars {:>6}  text_blocks {:>4}  image_blocks {:>3}  scanned {}",
            page.page_index + 1,
            page.native_chars,
            page.text_blocks,
            page.image_blocks,
            page.scanned
        );
    }
    Ok(())
}

fn run_import(seed: &Path, blank: bool, catalog_path: &Path) -> anyhow::Result<()> {
    let entries = read_seed(seed)?;
    let mut catalog = QuestionCatalog::load(catalog_path)?;

    let report = if blank {
        catalog.import_blank(&entries)?
    } else {
        catalog.import(&entries)
    };
    catalog.save(catalog_path)?;

    println!(
        "created {}, updated {}, skipped {} ({} questions in {})",
        report.created,
        report.updated,
        report.skipped,
        catalog.len(),
        catalog_path.display()
    );
    Ok(())
}

fn run_export(out: &Path, catalog_path: &Path) -> anyhow::Result<()> {
    let catalog = QuestionCatalog::load(catalog_path)?;
    std::fs::write(out, catalog.export_json()?)
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!("exported {} questions to {}", catalog.len(), out.display());
    Ok(())
}
