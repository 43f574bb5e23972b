//! MCQ text parser.
//!
//! Turns the free-text output of a generation model into structured
//! [`GeneratedQuestion`]s. The expected block shape is:
//!
//! ```text
//! 1. What is 2+2?
//! A. 3
//! B. 4
//! C. 5
//! D. 6
//! Answer: B
//! ```
//!
//! Extraction is best-effort: blocks that do not complete all six fields are
//! dropped without an error, and the blocks around them are still returned.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{GeneratedQuestion, OptionLetter};

/// A numbered stem, optionally wrapped in markdown emphasis or a heading
/// marker and optionally prefixed with `Q` / `Question`.
static QUESTION_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[*_#>]+\s*)?(?i:q(?:uestion)?\s*)?\d+\.(.*)$")
        .expect("question start pattern")
});

static OPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-D])\.(.*)$").expect("option pattern"));

static ANSWER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[*_]*Answer:[*_]*\s*[*_]*([A-D])").expect("answer pattern")
});

/// Questions extracted from one piece of text, plus how many blocks were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub questions: Vec<GeneratedQuestion>,
    /// Blocks that were started but never completed the six-field shape.
    pub skipped: usize,
}

/// Parse generated text into questions, dropping malformed blocks.
pub fn parse_mcqs(raw_text: &str) -> Vec<GeneratedQuestion> {
    parse_mcqs_detailed(raw_text).questions
}

/// Like [`parse_mcqs`], but also reports the number of dropped blocks.
pub fn parse_mcqs_detailed(raw_text: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    let mut current: Option<BlockBuilder> = None;

    for (idx, raw_line) in raw_text.lines().enumerate() {
        let line_no = idx + 1;
        match classify(raw_line) {
            Line::Blank => {}
            Line::QuestionStart(rest) => {
                if current.is_some() {
                    tracing::debug!(line_no, "new question before previous block completed");
                    outcome.skipped += 1;
                }
                current = Some(BlockBuilder::new(rest));
            }
            Line::Option(letter, rest) => {
                let Some(block) = current.as_mut() else {
                    continue;
                };
                if block.next_letter() == Some(letter) {
                    block.start_option(rest);
                } else {
                    tracing::debug!(line_no, %letter, "option out of order, dropping block");
                    current = None;
                    outcome.skipped += 1;
                }
            }
            Line::Answer(letter) => {
                let Some(block) = current.take() else {
                    continue;
                };
                match block.finish(letter) {
                    Some(question) => outcome.questions.push(question),
                    None => {
                        tracing::debug!(line_no, "incomplete block at answer line, dropping");
                        outcome.skipped += 1;
                    }
                }
            }
            Line::Text(text) => {
                if let Some(block) = current.as_mut() {
                    block.push_text(text);
                }
            }
        }
    }

    if current.is_some() {
        tracing::debug!("text ended inside an unfinished block");
        outcome.skipped += 1;
    }

    outcome
}

enum Line<'a> {
    Blank,
    QuestionStart(&'a str),
    Option(OptionLetter, &'a str),
    Answer(OptionLetter),
    Text(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    if line.trim().is_empty() {
        return Line::Blank;
    }

    if let Some(caps) = ANSWER_LINE.captures(line) {
        if let Some(letter) = first_letter(caps.get(1).map(|m| m.as_str())) {
            return Line::Answer(letter);
        }
    }

    if let Some(caps) = OPTION_LINE.captures(line) {
        if let Some(letter) = first_letter(caps.get(1).map(|m| m.as_str())) {
            let rest = caps.get(2).map_or("", |m| m.as_str());
            return Line::Option(letter, rest);
        }
    }

    if let Some(caps) = QUESTION_START.captures(line) {
        let rest = caps.get(1).map_or("", |m| m.as_str());
        // "3.14 is ..." is prose, not a numbered question.
        if !rest.starts_with(|c: char| c.is_ascii_digit()) {
            return Line::QuestionStart(strip_emphasis(rest));
        }
    }

    Line::Text(line)
}

/// `**1. Stem?**` and `**1.** Stem?` both yield `Stem?`.
fn strip_emphasis(s: &str) -> &str {
    s.trim().trim_matches(|c| c == '*' || c == '_').trim()
}

fn first_letter(s: Option<&str>) -> Option<OptionLetter> {
    s.and_then(|s| s.parse().ok())
}

/// Accumulates the fields of one block in marker order.
struct BlockBuilder {
    stem: String,
    options: Vec<String>,
}

impl BlockBuilder {
    fn new(first_stem_line: &str) -> Self {
        let mut block = Self {
            stem: String::new(),
            options: Vec::with_capacity(4),
        };
        block.push_text(first_stem_line);
        block
    }

    fn next_letter(&self) -> Option<OptionLetter> {
        OptionLetter::ALL.get(self.options.len()).copied()
    }

    fn start_option(&mut self, first_line: &str) {
        self.options.push(String::new());
        self.push_text(first_line);
    }

    /// Append a line to whichever field is currently being collected.
    fn push_text(&mut self, text: &str) {
        let field = match self.options.last_mut() {
            Some(option) => option,
            None => &mut self.stem,
        };
        let text = text.trim_end();
        if field.trim().is_empty() {
            field.clear();
            field.push_str(text.trim_start());
        } else {
            field.push('\n');
            field.push_str(text);
        }
    }

    fn finish(self, answer: OptionLetter) -> Option<GeneratedQuestion> {
        let stem = self.stem.trim().to_string();
        if stem.is_empty() {
            return None;
        }
        let options: [String; 4] = self
            .options
            .into_iter()
            .map(|o| o.trim().to_string())
            .collect::<Vec<_>>()
            .try_into()
            .ok()?;
        Some(GeneratedQuestion::new(stem, options, answer))
    }
}
