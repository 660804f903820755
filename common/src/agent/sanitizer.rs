//! reduce a model reply to its sql and sql-comment lines.
//!
//! this is textual classification, not parsing. a reply fully wrapped in a
//! markdown fence is unwrapped first, then every line is classified on its
//! own and kept or dropped depending on the scan state.

use crate::error::{Result, SqlPromptError};
use once_cell::sync::Lazy;
use regex::Regex;

const FENCE: &str = "```";

/// substrings marking a line as commentary about the sql rather than sql
pub const DEFAULT_META_MARKERS: [&str; 2] = ["Explanation", "Note:"];

/// language tag right after an opening fence, up to and including the newline
static OPENING_FENCE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A[A-Za-z0-9_+.\-]*[ \t]*\r?\n").unwrap());

/// what a single line looks like, independent of its neighbours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `--`, `/* ... */`
    Comment,
    Code,
    Blank,
    /// fences, headings, prose and meta-commentary
    Discard,
}

/// the scanner's only state: whether sql has started yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanState {
    #[default]
    Preamble,
    InSql,
}

impl ScanState {
    /// returns the next state and whether the line is kept.
    /// comment and code lines open the sql body; blank lines survive only inside it.
    pub fn step(self, kind: LineKind) -> (ScanState, bool) {
        match (self, kind) {
            (_, LineKind::Comment | LineKind::Code) => (ScanState::InSql, true),
            (ScanState::InSql, LineKind::Blank) => (ScanState::InSql, true),
            (state, LineKind::Blank | LineKind::Discard) => (state, false),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sanitizer {
    markers: Vec<String>,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::with_markers(DEFAULT_META_MARKERS)
    }
}

impl Sanitizer {
    pub fn with_markers<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(Into::into)
                .filter(|m: &String| !m.is_empty())
                .collect(),
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn classify(&self, line: &str) -> LineKind {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            return LineKind::Blank;
        }
        if trimmed.starts_with(FENCE) {
            return LineKind::Discard;
        }
        if is_sql_comment(trimmed) {
            return LineKind::Comment;
        }
        if trimmed.starts_with('#') || self.is_meta_commentary(trimmed) || is_prose(trimmed) {
            return LineKind::Discard;
        }
        LineKind::Code
    }

    fn is_meta_commentary(&self, trimmed: &str) -> bool {
        trimmed.starts_with("SQL") || self.markers.iter().any(|m| trimmed.contains(m.as_str()))
    }

    /// keep sql and sql-comment lines, in order, joined with `\n`.
    /// an empty result means the reply held no sql.
    pub fn sanitize(&self, raw_reply: &str) -> String {
        let text = strip_outer_fence(raw_reply);

        let mut state = ScanState::default();
        let mut kept = Vec::new();

        for line in text.split('\n') {
            let (next, keep) = state.step(self.classify(line));
            if keep {
                kept.push(line);
            }
            state = next;
        }

        kept.join("\n")
    }

    /// like [`Sanitizer::sanitize`], but a reply without sql is an error
    pub fn require_sql(&self, raw_reply: &str) -> Result<String> {
        let sql = self.sanitize(raw_reply);
        if sql.trim().is_empty() {
            tracing::warn!(reply_len = raw_reply.len(), "reply contained no sql lines");
            return Err(SqlPromptError::NoSqlGenerated);
        }
        Ok(sql)
    }
}

/// sanitize with the default markers
pub fn sanitize(raw_reply: &str) -> String {
    Sanitizer::default().sanitize(raw_reply)
}

fn is_sql_comment(trimmed: &str) -> bool {
    trimmed.starts_with("--")
        || trimmed.starts_with("/*")
        || trimmed.ends_with("*/")
        || trimmed.contains("/*")
}

/// lead-in lines ("Here is the query:") and plain sentences. only a line
/// whose first word is capitalised but not upper-case can be prose, so
/// clauses led by keywords (`WHERE id = ?`) stay code.
fn is_prose(trimmed: &str) -> bool {
    let first_word = trimmed.split_whitespace().next().unwrap_or_default();
    is_sentence_word(first_word) && trimmed.ends_with([':', '.', '!', '?'])
}

/// `Here`, `I'm`, `I`: capitalised, and not a keyword-like upper-case word
fn is_sentence_word(word: &str) -> bool {
    if !word.chars().next().is_some_and(|c| c.is_uppercase()) {
        return false;
    }
    let letters = word.chars().filter(|c| c.is_alphabetic()).count();
    letters < 2 || word.chars().any(|c| c.is_lowercase())
}

/// unwrap the outermost fence when it encloses the whole trimmed reply
fn strip_outer_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    if trimmed.len() < 2 * FENCE.len() || !trimmed.starts_with(FENCE) || !trimmed.ends_with(FENCE) {
        return reply;
    }

    let inner = &trimmed[FENCE.len()..trimmed.len() - FENCE.len()];
    let inner = match OPENING_FENCE_TAG.find(inner) {
        Some(tag) => &inner[tag.end()..],
        None => inner,
    };
    inner.strip_suffix('\n').unwrap_or(inner)
}
