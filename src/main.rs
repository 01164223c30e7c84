//! scrawl2org CLI application
//!
//! Command-line interface for the scrawl2org library.

use anyhow::Context;
use clap::{Parser, Subcommand};
use scrawl2org::ocr::LlmOcr;
use scrawl2org::utils::{basename, format_file_size};
use scrawl2org::{
    Config, DisplayOptions, OcrEngine, OcrProvider, PageExtractor, PdfProcessor, ScrawlError,
    TerminalSink,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "scrawl2org")]
#[command(about = "Incrementally extract PDF page images into SQLite, with optional OCR")]
#[command(version)]
struct Cli {
    /// SQLite database file
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a PDF and store its pages, skipping unchanged ones
    Process {
        /// PDF file to process
        pdf: PathBuf,

        /// Rewrite every page even if nothing changed
        #[arg(short, long)]
        force: bool,

        /// Skip OCR entirely
        #[arg(long)]
        no_ocr: bool,

        /// OCR engine (stub or llm)
        #[arg(long)]
        ocr_engine: Option<OcrEngine>,

        /// Model name for the llm engine
        #[arg(long)]
        ocr_model: Option<String>,

        /// OpenAI-compatible API base URL for the llm engine
        #[arg(long)]
        api_base: Option<String>,
    },

    /// Extract stored pages as images
    Extract {
        /// PDF whose pages to extract (only the file name is used)
        pdf: PathBuf,

        /// Pages, e.g. "1", "1-3" or "1,3,5-7"
        pages: String,

        /// Output file; several pages become <stem>_pageNNN.<ext>
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Always display inline with the kitty graphics protocol
        #[arg(long)]
        kitty: bool,

        /// Never display inline
        #[arg(long)]
        no_kitty: bool,

        /// Display width in terminal cells
        #[arg(long)]
        width: Option<u32>,

        /// Display height in terminal cells
        #[arg(long)]
        height: Option<u32>,
    },

    /// List stored PDFs
    List,

    /// Print the stored OCR text of a page
    Text {
        /// PDF whose page to read (only the file name is used)
        pdf: PathBuf,

        /// 1-based page number
        page: u32,
    },

    /// List the endpoint's models and test the llm OCR connection
    OcrCheck {
        /// Model name to test
        #[arg(long)]
        ocr_model: Option<String>,

        /// OpenAI-compatible API base URL
        #[arg(long)]
        api_base: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG still wins when set
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_status(&e))
        }
    }
}

/// Status 2 for bad input such as a malformed page spec, 1 for everything else
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ScrawlError>() {
        Some(e) if e.is_input_error() => 2,
        _ => 1,
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(database) = cli.database {
        config.database = database;
    }

    match cli.command {
        Commands::Process {
            pdf,
            force,
            no_ocr,
            ocr_engine,
            ocr_model,
            api_base,
        } => {
            if no_ocr {
                config.ocr.enabled = false;
            }
            if let Some(engine) = ocr_engine {
                config.ocr.engine = engine;
            }
            if ocr_model.is_some() {
                config.ocr.model = ocr_model;
            }
            if api_base.is_some() {
                config.ocr.api_base = api_base;
            }
            config.ocr = config.ocr.with_env_api_key();
            process_command(&config, pdf, force)
        }
        Commands::Extract {
            pdf,
            pages,
            output,
            kitty,
            no_kitty,
            width,
            height,
        } => {
            config.display = DisplayOptions {
                force_inline: kitty,
                disable_inline: no_kitty,
                width,
                height,
            };
            extract_command(&config, pdf, &pages, output)
        }
        Commands::List => list_command(&config),
        Commands::Text { pdf, page } => text_command(&config, pdf, page),
        Commands::OcrCheck {
            ocr_model,
            api_base,
        } => {
            if ocr_model.is_some() {
                config.ocr.model = ocr_model;
            }
            if api_base.is_some() {
                config.ocr.api_base = api_base;
            }
            config.ocr = config.ocr.with_env_api_key();
            ocr_check_command(&config)
        }
    }
}

fn process_command(config: &Config, pdf: PathBuf, force: bool) -> anyhow::Result<()> {
    let mut processor = PdfProcessor::new(config)?;
    let report = processor.process(&pdf, force)?;

    if report.was_skipped() {
        println!("{} is unchanged, nothing to do", report.filename);
        return Ok(());
    }

    println!("Processed {}", report.filename);
    println!("   Pages: {}", report.page_count);
    println!("   Written: {}", report.pages_written);
    println!("   Unchanged: {}", report.pages_unchanged);
    if report.pages_pruned > 0 {
        println!("   Removed: {}", report.pages_pruned);
    }
    if report.ocr_failures > 0 {
        println!("   OCR failures: {}", report.ocr_failures);
    }

    Ok(())
}

fn extract_command(
    config: &Config,
    pdf: PathBuf,
    pages: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    // Reject bad flag combinations before touching the store
    config.display.validate()?;

    let name = basename(&pdf)?;
    let extractor = PageExtractor::new(config)?;
    let report = extractor.extract(
        &name,
        pages,
        output.as_deref(),
        &config.display,
        &mut TerminalSink,
    )?;

    for path in &report.written {
        println!("Wrote {}", path.display());
    }
    if !report.missing.is_empty() {
        eprintln!(
            "Warning: {} page(s) not found: {:?}",
            report.missing.len(),
            report.missing
        );
    }

    Ok(())
}

fn list_command(config: &Config) -> anyhow::Result<()> {
    let extractor = PageExtractor::new(config)?;
    let db = extractor.database();
    let files = db.list_files()?;

    if files.is_empty() {
        println!("No PDFs stored in {}", config.database.display());
        return Ok(());
    }

    for name in &files {
        let pages = match db.lookup_file_id(name)? {
            Some(id) => db.count_pages(id)?,
            None => 0,
        };
        println!("{} ({} pages)", name, pages);
    }

    let stats = db.stats()?;
    println!();
    println!(
        "{} file(s), {} page(s), {} of images",
        stats.file_count,
        stats.page_count,
        format_file_size(stats.total_image_bytes)
    );

    Ok(())
}

fn text_command(config: &Config, pdf: PathBuf, page: u32) -> anyhow::Result<()> {
    let name = basename(&pdf)?;
    let extractor = PageExtractor::new(config)?;

    match extractor.read_ocr_text(&name, page)? {
        Some(ocr) => {
            let text = ocr.get("text").and_then(|t| t.as_str()).unwrap_or_default();
            println!("{}", text);
        }
        None => eprintln!("No OCR text stored for page {} of {}", page, name),
    }

    Ok(())
}

fn ocr_check_command(config: &Config) -> anyhow::Result<()> {
    let provider = LlmOcr::from_config(&config.ocr)?;

    println!("Models at {}:", provider.api_base());
    for model in provider.list_models() {
        println!("   {}", model);
    }

    let model = provider.model().unwrap_or_default();
    if !provider.check_connection()? {
        anyhow::bail!("{} answered, but not with OK", model);
    }
    println!("Connection OK ({})", model);

    Ok(())
}
