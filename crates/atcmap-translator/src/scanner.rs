//! Program scanner
//!
//! Finds tool-change commands (`M6 T12`, `M06 T12`, `M6T12`, `T12 M6`) in
//! program text and resolves each referenced tool against the library.
//!
//! Comment text never contributes a tool change. Parenthetical comments and
//! `;` tails are masked with spaces before matching, so byte offsets into the
//! masked line are byte offsets into the original line.

use atcmap_core::{ManualMappings, ToolId, ToolLibrary, ToolRecord};
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;
use std::sync::OnceLock;

/// One tool-change occurrence found in a program
#[derive(Debug, Clone, PartialEq)]
pub struct ToolReference {
    /// 1-based line of the first tool change naming this tool
    pub line: usize,
    /// Tool identifier as written in the program
    pub tool: ToolId,
    /// Library record for the tool, if the library knows it
    pub entry: Option<ToolRecord>,
    /// Whether a manual override exists for the tool
    pub has_override: bool,
    /// Pocket assigned by the classifier
    pub pocket: Option<u32>,
}

impl ToolReference {
    /// Name to show for this tool
    pub fn display_name(&self) -> String {
        self.entry
            .as_ref()
            .map(ToolRecord::display_name)
            .unwrap_or_else(|| "Unknown tool".to_string())
    }
}

/// A letter-prefixed numeric word located in a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Byte range of the letter
    pub letter: Range<usize>,
    /// Byte range of the digits
    pub digits: Range<usize>,
    /// Parsed value of the digits
    pub value: u32,
}

fn m6_regex() -> &'static Regex {
    static M6_REGEX: OnceLock<Regex> = OnceLock::new();
    M6_REGEX.get_or_init(|| {
        Regex::new(r"(?i)(?:^|[^A-Za-z])M0?6(?:[^0-9.]|$)").expect("invalid regex pattern")
    })
}

fn tool_word_regex() -> &'static Regex {
    static TOOL_REGEX: OnceLock<Regex> = OnceLock::new();
    TOOL_REGEX.get_or_init(|| {
        Regex::new(r"(?i)(?:^|[^A-Za-z])(?P<letter>T)(?P<digits>\d+)")
            .expect("invalid regex pattern")
    })
}

fn height_word_regex() -> &'static Regex {
    static HEIGHT_REGEX: OnceLock<Regex> = OnceLock::new();
    HEIGHT_REGEX.get_or_init(|| {
        Regex::new(r"(?i)(?:^|[^A-Za-z])(?P<letter>H)(?P<digits>\d+)")
            .expect("invalid regex pattern")
    })
}

fn first_word(regex: &Regex, text: &str) -> Option<Word> {
    let caps = regex.captures(text)?;
    let letter = caps.name("letter")?;
    let digits = caps.name("digits")?;
    let value = digits.as_str().parse::<u32>().ok()?;
    Some(Word {
        letter: letter.range(),
        digits: digits.range(),
        value,
    })
}

/// First `T<n>` word in `text`
pub fn first_tool_word(text: &str) -> Option<Word> {
    first_word(tool_word_regex(), text)
}

/// First `H<n>` word in `text`
pub fn first_height_word(text: &str) -> Option<Word> {
    first_word(height_word_regex(), text)
}

/// Replace comment text (parenthetical and `;` to end of line) with spaces.
/// Parentheses nest; a comment ends at the `)` that closes the outermost `(`.
///
/// The result has the same byte length as `line`.
pub fn mask_comments(line: &str) -> String {
    let mut masked = String::with_capacity(line.len());
    let mut depth = 0usize;
    let mut in_tail = false;

    for ch in line.chars() {
        let hide = if in_tail {
            true
        } else if ch == '(' {
            depth += 1;
            true
        } else if depth > 0 {
            if ch == ')' {
                depth -= 1;
            }
            true
        } else if ch == ';' {
            in_tail = true;
            true
        } else {
            false
        };

        if hide && ch != '\r' {
            masked.extend(std::iter::repeat(' ').take(ch.len_utf8()));
        } else {
            masked.push(ch);
        }
    }
    masked
}

/// A non-blank line with nothing outside of comments
pub fn is_comment_line(line: &str) -> bool {
    !line.trim().is_empty() && mask_comments(line).trim().is_empty()
}

/// Tool named by the tool-change command on this line, if any.
///
/// Requires an `M6`/`M06` word and a `T<n>` word in the code portion of the
/// line. `T0` (unload) is not a tool.
pub fn find_tool_change(line: &str) -> Option<ToolId> {
    if line.trim().is_empty() {
        return None;
    }
    let code = mask_comments(line);
    if !m6_regex().is_match(&code) {
        return None;
    }
    let word = first_tool_word(&code)?;
    (word.value > 0).then_some(ToolId(word.value))
}

/// Scan program text for tool changes.
///
/// Each tool is reported once, at its first tool-change line. Lines are
/// split on `\n`; a trailing `\r` is ignored by the patterns.
pub fn scan_program(
    program: &str,
    library: &ToolLibrary,
    mappings: &ManualMappings,
) -> Vec<ToolReference> {
    let mut seen = HashSet::new();
    let mut references = Vec::new();

    for (index, line) in program.split('\n').enumerate() {
        let Some(tool) = find_tool_change(line) else {
            continue;
        };
        if !seen.insert(tool) {
            continue;
        }
        tracing::debug!("Tool change to {} at line {}", tool, index + 1);
        references.push(ToolReference {
            line: index + 1,
            tool,
            entry: library.get(tool).cloned(),
            has_override: mappings.contains(tool),
            pocket: None,
        });
    }

    references
}
