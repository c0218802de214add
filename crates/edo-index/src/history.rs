//! Change histories stored as `logs` objects.
//!
//! A history is the fixed-column listing the remote produces for an
//! element. Two kinds of lines matter, everything else (page headers,
//! separators, blank lines) is ignored:
//!
//! ```text
//! col: 0  2 3   7 8   12 13
//!        ' 'VVLL         detail text          change level detail
//!        '+'VVLL          source text          line added at VVLL
//!        '+'VVLL-VVLL     source text          added, later deleted
//! ```
//!
//! Levels are four digits and compare as fixed-width strings.

use std::ops::Range;

/// Parsed change history of one element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct History {
    pub levels: Vec<ChangeLevel>,
    pub lines: Vec<HistoryLine>,
}

/// One change level and the text describing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeLevel {
    pub level: String,
    pub detail: String,
}

/// Detail text split into its fixed-width fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeDetail {
    pub user: String,
    pub date: String,
    pub ccid: String,
    pub comment: String,
}

/// A source line with the level that added it and, if any, deleted it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryLine {
    pub added: String,
    pub deleted: Option<String>,
    pub text: String,
}

impl HistoryLine {
    /// Whether this line is part of the element at `level`.
    pub fn present_at(&self, level: &str) -> bool {
        self.added.as_str() <= level
            && !self.deleted.as_deref().is_some_and(|deleted| deleted <= level)
    }
}

impl ChangeLevel {
    /// Split the detail text as `user(8) date(13) ccid(12) comment`.
    pub fn fields(&self) -> ChangeDetail {
        let field = |range: Range<usize>| {
            cols(&self.detail, range.start, Some(range.end))
                .trim()
                .to_string()
        };
        ChangeDetail {
            user: field(0..8),
            date: field(9..22),
            ccid: field(23..35),
            comment: cols(&self.detail, 36, None).trim().to_string(),
        }
    }
}

impl History {
    /// Parse a history listing. Unrecognized lines are skipped.
    pub fn parse(text: &str) -> Self {
        let mut history = Self::default();
        for line in text.split('\n') {
            let line = line.trim_end_matches('\r');
            match line.chars().nth(2) {
                Some(' ') => {
                    let level = cols(line, 3, Some(7));
                    if is_level(level) {
                        history.levels.push(ChangeLevel {
                            level: level.to_string(),
                            detail: cols(line, 13, None).to_string(),
                        });
                    }
                }
                Some('+') => {
                    let added = cols(line, 3, Some(7));
                    if !is_level(added) {
                        continue;
                    }
                    let deleted = match line.chars().nth(7) {
                        Some('-') => Some(cols(line, 8, Some(12)))
                            .filter(|level| is_level(level))
                            .map(str::to_string),
                        _ => None,
                    };
                    history.lines.push(HistoryLine {
                        added: added.to_string(),
                        deleted,
                        text: cols(line, 13, None).to_string(),
                    });
                }
                _ => {}
            }
        }
        history
    }

    /// The change level record for `level`, if the listing has one.
    pub fn level(&self, level: &str) -> Option<&ChangeLevel> {
        self.levels.iter().find(|l| l.level == level)
    }

    /// The most recent level mentioned by any detail line.
    pub fn latest_level(&self) -> Option<&str> {
        self.levels.iter().map(|l| l.level.as_str()).max()
    }

    /// Rebuild the element text as it was at `level`.
    pub fn reconstruct(&self, level: &str) -> String {
        self.lines
            .iter()
            .filter(|line| line.present_at(level))
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn is_level(s: &str) -> bool {
    s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Character columns `start..end` of `line`, clamped to its length.
fn cols(line: &str, start: usize, end: Option<usize>) -> &str {
    let byte_at = |col: usize| {
        line.char_indices()
            .nth(col)
            .map_or(line.len(), |(i, _)| i)
    };
    let from = byte_at(start);
    let to = end.map_or(line.len(), byte_at);
    &line[from..to.max(from)]
}
