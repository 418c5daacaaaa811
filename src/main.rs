use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use dotenv::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

use resume_rag::commands::run_shell;
use resume_rag::document::{PdfiumRasterizer, ProcessedResume, ResumeProcessor, TesseractEngine};
use resume_rag::{AppConfig, RagSession};

/// Reads a résumé with OCR, indexes it, then answers questions about it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Résumé to read (.png, .jpg, .jpeg or .pdf)
    resume_path: PathBuf,

    /// Vector store collection, overrides RESUME_COLLECTION
    #[arg(long)]
    collection: Option<String>,

    /// Qdrant URL, overrides QDRANT_URL
    #[arg(long)]
    qdrant_url: Option<String>,

    /// Query the existing collection without storing this résumé again
    #[arg(long)]
    skip_index: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = AppConfig::from_env().context("loading configuration")?;
    if let Some(collection) = args.collection {
        config.collection = collection;
    }
    if let Some(url) = args.qdrant_url {
        config.qdrant_url = url;
    }

    println!(
        "Got {} for {}",
        extension_label(&args.resume_path).bright_cyan(),
        args.resume_path.display().to_string().bright_yellow()
    );

    let ProcessedResume { pages, workdir } =
        extract_pages(args.resume_path.clone(), config.clone()).await?;
    // Rendered page images are no longer needed once the text is out.
    drop(workdir);

    println!("Final Output:");
    for page in &pages {
        println!("{}", page);
    }

    let session = RagSession::connect(&config)
        .await
        .context("initialising RAG session")?;

    if args.skip_index {
        log::info!("skipping indexing, querying collection {}", session.collection());
    } else {
        let stored = session
            .embed_documents(&pages)
            .await
            .context("indexing résumé pages")?;
        println!(
            "Indexed {} page(s) into {} with {}",
            stored.to_string().bright_green(),
            session.collection().bright_cyan(),
            session.embedding_model()
        );
    }

    run_shell(&session).await.context("interactive shell")?;
    Ok(())
}

/// Extension with its leading dot, or empty when the path has none.
fn extension_label(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// Runs format detection, rasterization and OCR off the async runtime.
async fn extract_pages(path: PathBuf, config: AppConfig) -> Result<ProcessedResume> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Reading {}", path.display()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let display = path.display().to_string();
    let result = tokio::task::spawn_blocking(move || {
        let engine = TesseractEngine::new(
            config.tesseract_datapath.clone(),
            config.tesseract_language.clone(),
        );
        let rasterizer = PdfiumRasterizer::new(config.render_width);
        let mut processor = ResumeProcessor::new(engine, rasterizer, config.jpeg_enabled);
        processor.process(&path)
    })
    .await;
    spinner.finish_and_clear();

    let resume = result
        .context("OCR task did not complete")?
        .with_context(|| format!("extracting pages from {}", display))?;
    let failed = resume.pages.iter().filter(|p| p.is_failed()).count();
    if failed > 0 {
        log::warn!("{} of {} page(s) could not be read", failed, resume.pages.len());
    }
    Ok(resume)
}
