use anyhow::{Context, Result};
use atcmap::console::{AutoApprove, ConsolePrompt};
use atcmap::{
    init_logging_with, JsonFileStore, LoadContext, LoadOutcome, LogFormat, MappingSummary,
    OperatorPrompt, ToolTranslator, BUILD_DATE, VERSION,
};
use atcmap_core::ManualMappings;
use atcmap_settings::magazine_capacity_or_default;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufReader};

#[derive(Parser)]
#[command(name = "atcmap")]
#[command(about = "Map CAM tool numbers to ATC magazine pockets", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding tools.json, plugin-settings.json and settings.json
    #[arg(long, global = true, env = "ATCMAP_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a program, asking how to handle tools that need attention
    Translate(TranslateArgs),
    /// Show how a program's tools map onto the magazine
    Status {
        /// G-code file
        file: PathBuf,
    },
}

#[derive(Args)]
struct TranslateArgs {
    /// G-code file
    file: PathBuf,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Map without prompting
    #[arg(short, long)]
    yes: bool,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn open_store(data_dir: Option<PathBuf>) -> Result<JsonFileStore> {
    match data_dir {
        Some(dir) => Ok(JsonFileStore::new(dir)),
        None => JsonFileStore::default_location().context("Failed to locate data directory"),
    }
}

async fn translate<P: OperatorPrompt>(
    store: JsonFileStore,
    prompt: P,
    args: &TranslateArgs,
) -> Result<bool> {
    let content = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let translator = ToolTranslator::new(store, prompt);
    let outcome = translator
        .on_program_load(&content, &LoadContext::new(file_name(&args.file)))
        .await;

    let text = match outcome {
        LoadOutcome::Aborted => {
            eprintln!("Load cancelled, nothing written");
            return Ok(false);
        }
        LoadOutcome::Original(text) => {
            eprintln!("Program left unchanged");
            text
        }
        LoadOutcome::Translated(program) => {
            eprintln!(
                "Translated {} tool change(s), {} height offset(s), {} comment(s)",
                program.rewrite.tool_numbers,
                program.rewrite.height_offsets,
                program.rewrite.comments
            );
            if program.sync.saved {
                eprintln!("Updated {} tool(s) in the library", program.sync.updates());
            }
            program.rewrite.text
        }
    };

    match &args.output {
        Some(path) => tokio::fs::write(path, text)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(text.as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    Ok(true)
}

async fn status(store: JsonFileStore, file: &Path) -> Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let capacity = magazine_capacity_or_default(&store).await;
    let translator = ToolTranslator::new(store, AutoApprove);
    let classification = translator.analyze(&content, &ManualMappings::new()).await;
    if classification.is_empty() {
        println!("{}: no tool changes found", file_name(file));
        return Ok(());
    }

    let summary = MappingSummary::new(
        file_name(file),
        classification,
        capacity,
        ManualMappings::new(),
    );
    println!("{}", summary);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    init_logging_with(format, level)?;
    tracing::debug!("atcmap {} (built {})", VERSION, BUILD_DATE);

    let store = open_store(cli.data_dir)?;
    tracing::debug!("Using data directory {}", store.root().display());

    match cli.command {
        Commands::Translate(args) => {
            let loaded = if args.yes {
                translate(store, AutoApprove, &args).await?
            } else {
                let prompt =
                    ConsolePrompt::new(BufReader::new(tokio::io::stdin()), tokio::io::stderr());
                translate(store, prompt, &args).await?
            };
            if !loaded {
                std::process::exit(1);
            }
        }
        Commands::Status { file } => status(store, &file).await?,
    }

    Ok(())
}
