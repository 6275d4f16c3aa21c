//! Console operator prompt
//!
//! Prints the mapping summary and reads one command per line:
//!
//! ```text
//! map | bypass | cancel | refresh | remap <tool> <pocket|none> | help
//! ```
//!
//! End of input counts as no decision, which the translator treats as bypass.

use async_trait::async_trait;
use atcmap_core::{PocketOverride, ToolId};
use atcmap_translator::{Decision, MappingSummary, OperatorPrompt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

const HELP: &str = "Commands:
  map                        translate with the mapping shown
  bypass                     load the program unchanged
  cancel                     do not load the program
  refresh                    re-read the tool library and settings
  remap <tool> <pocket|none> move a tool to a pocket, or out of the magazine
";

fn parse_number(text: &str) -> Option<u32> {
    let digits = text
        .strip_prefix('T')
        .or_else(|| text.strip_prefix('t'))
        .unwrap_or(text);
    digits.parse().ok()
}

/// Parse one console command
pub fn parse_command(line: &str, summary: &MappingSummary) -> Result<Decision, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Err("Enter a command (help for a list)".to_string());
    };

    let decision = match command.to_ascii_lowercase().as_str() {
        "map" | "m" => Decision::Map,
        "bypass" | "b" => Decision::Bypass,
        "cancel" | "c" => Decision::Cancel,
        "refresh" | "r" => Decision::Refresh {
            session_mappings: None,
        },
        "remap" => {
            let tool = words
                .next()
                .and_then(parse_number)
                .filter(|&t| t > 0)
                .ok_or_else(|| "Usage: remap <tool> <pocket|none>".to_string())?;
            let pocket = match words.next() {
                Some(word) if word.eq_ignore_ascii_case("none") || word == "-" => {
                    PocketOverride::NotInMagazine
                }
                Some(word) => match parse_number(word) {
                    Some(p) if (1..=summary.magazine_capacity).contains(&p) => {
                        PocketOverride::Pocket(p)
                    }
                    _ => {
                        return Err(format!(
                            "Pocket must be 1..={} or none",
                            summary.magazine_capacity
                        ))
                    }
                },
                None => return Err("Usage: remap <tool> <pocket|none>".to_string()),
            };
            Decision::Remap {
                tool_id: ToolId(tool),
                pocket,
            }
        }
        other => return Err(format!("Unknown command '{}' (help for a list)", other)),
    };

    if words.next().is_some() {
        return Err("Too many arguments".to_string());
    }
    Ok(decision)
}

/// Prompt reading commands from `input` and writing to `output`
pub struct ConsolePrompt<R, W> {
    io: Mutex<(R, W)>,
}

impl<R, W> ConsolePrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a prompt over a reader and a writer
    pub fn new(input: R, output: W) -> Self {
        Self {
            io: Mutex::new((input, output)),
        }
    }

    async fn ask(&self, summary: &MappingSummary) -> std::io::Result<Option<Decision>> {
        let mut io = self.io.lock().await;
        let (input, output) = &mut *io;

        output
            .write_all(format!("\n{}\n\n", summary).as_bytes())
            .await?;
        loop {
            output.write_all(b"[map/bypass/cancel/remap/refresh]> ").await?;
            output.flush().await?;

            let mut line = String::new();
            if input.read_line(&mut line).await? == 0 {
                return Ok(None);
            }
            if line.trim().eq_ignore_ascii_case("help") {
                output.write_all(HELP.as_bytes()).await?;
                continue;
            }
            match parse_command(&line, summary) {
                Ok(decision) => return Ok(Some(decision)),
                Err(message) => {
                    output.write_all(format!("{}\n", message).as_bytes()).await?;
                }
            }
        }
    }
}

#[async_trait]
impl<R, W> OperatorPrompt for ConsolePrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn show(&self, summary: &MappingSummary) -> Option<Decision> {
        match self.ask(summary).await {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!("Console prompt failed: {}", e);
                None
            }
        }
    }
}

/// Prompt that always answers `map`
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl OperatorPrompt for AutoApprove {
    async fn show(&self, summary: &MappingSummary) -> Option<Decision> {
        tracing::info!("{}: {}", summary.file_name, summary.status.title());
        Some(Decision::Map)
    }
}
