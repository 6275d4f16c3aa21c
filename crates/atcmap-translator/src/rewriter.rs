//! Rewriter
//!
//! Substitutes pocket numbers for tool numbers, line by line:
//! - code lines: the first `T<n>` word, then the first `H<n>` word of the
//!   rewritten line, each only when `n` is in the translation map
//! - comment-only lines: the first `T<n>` becomes
//!   `T<pocket> [<label>: tool <n>]`
//!
//! Everything else passes through byte for byte, including `\r` and a
//! trailing newline.

use crate::classifier::Classification;
use crate::scanner::{first_height_word, first_tool_word, is_comment_line, mask_comments, Word};
use atcmap_core::ToolId;
use std::collections::BTreeMap;

/// Tool identifier to pocket, for one rewrite
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationMap {
    pockets: BTreeMap<ToolId, u32>,
}

impl TranslationMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Map built from the in-magazine bucket
    pub fn from_classification(classification: &Classification) -> Self {
        classification
            .in_magazine
            .iter()
            .filter_map(|r| r.pocket.map(|pocket| (r.tool, pocket)))
            .collect()
    }

    /// Add an entry
    pub fn insert(&mut self, tool: ToolId, pocket: u32) -> Option<u32> {
        self.pockets.insert(tool, pocket)
    }

    /// Pocket for a tool
    pub fn get(&self, tool: ToolId) -> Option<u32> {
        self.pockets.get(&tool).copied()
    }

    /// Iterate in tool order
    pub fn iter(&self) -> impl Iterator<Item = (ToolId, u32)> + '_ {
        self.pockets.iter().map(|(&tool, &pocket)| (tool, pocket))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.pockets.len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.pockets.is_empty()
    }
}

impl FromIterator<(ToolId, u32)> for TranslationMap {
    fn from_iter<I: IntoIterator<Item = (ToolId, u32)>>(iter: I) -> Self {
        Self {
            pockets: iter.into_iter().collect(),
        }
    }
}

/// Rewrite options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Source name written into annotated comments
    pub annotation_label: String,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            annotation_label: "Fusion".to_string(),
        }
    }
}

/// Rewritten program and what was changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteResult {
    /// Rewritten program text
    pub text: String,
    /// `T` words substituted on code lines
    pub tool_numbers: usize,
    /// `H` words substituted
    pub height_offsets: usize,
    /// Comment lines annotated
    pub comments: usize,
    /// Lines that differ from the input
    pub lines_changed: usize,
}

impl RewriteResult {
    /// Whether anything was rewritten
    pub fn changed(&self) -> bool {
        self.lines_changed > 0
    }
}

fn replace_digits(line: &str, word: &Word, replacement: &str) -> String {
    let mut out = String::with_capacity(line.len() + replacement.len());
    out.push_str(&line[..word.digits.start]);
    out.push_str(replacement);
    out.push_str(&line[word.digits.end..]);
    out
}

fn rewrite_comment(line: &str, map: &TranslationMap, label: &str) -> Option<String> {
    let word = first_tool_word(line)?;
    let pocket = map.get(ToolId(word.value))?;
    let original = &line[word.digits.clone()];
    Some(replace_digits(
        line,
        &word,
        &format!("{} [{}: tool {}]", pocket, label, original),
    ))
}

/// Rewrite a program with the given translation map
pub fn rewrite_program(
    program: &str,
    map: &TranslationMap,
    options: &RewriteOptions,
) -> RewriteResult {
    let mut result = RewriteResult::default();
    if map.is_empty() {
        result.text = program.to_string();
        return result;
    }

    let mut lines = Vec::new();
    for line in program.split('\n') {
        if line.trim().is_empty() {
            lines.push(line.to_string());
            continue;
        }

        if is_comment_line(line) {
            match rewrite_comment(line, map, &options.annotation_label) {
                Some(rewritten) => {
                    result.comments += 1;
                    result.lines_changed += 1;
                    lines.push(rewritten);
                }
                None => lines.push(line.to_string()),
            }
            continue;
        }

        let mut current = line.to_string();
        let mut changed = false;

        if let Some(word) = first_tool_word(&mask_comments(&current)) {
            if let Some(pocket) = map.get(ToolId(word.value)) {
                tracing::debug!("T{} -> T{}", word.value, pocket);
                current = replace_digits(&current, &word, &pocket.to_string());
                result.tool_numbers += 1;
                changed = true;
            }
        }

        if let Some(word) = first_height_word(&mask_comments(&current)) {
            if let Some(pocket) = map.get(ToolId(word.value)) {
                current = replace_digits(&current, &word, &pocket.to_string());
                result.height_offsets += 1;
                changed = true;
            }
        }

        if changed && current != line {
            result.lines_changed += 1;
        }
        lines.push(current);
    }

    result.text = lines.join("\n");
    tracing::info!(
        "Translated {} tool number(s), {} height offset(s) and {} comment(s)",
        result.tool_numbers,
        result.height_offsets,
        result.comments
    );
    result
}
