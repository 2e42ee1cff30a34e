use serde::{Deserialize, Serialize};

/// Tunable behavior for the whole pipeline.
///
/// Out-of-range values are silently clamped to the nearest valid value, never
/// surfaced as errors. Unspecified fields fall back to their defaults when
/// deserialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Target line count per segment
    pub lines_per_segment: usize,
    /// Spaces per tab at normalization; zero deletes tabs
    pub tab_width: usize,
    /// Post-error slack before the input locks
    pub slack: usize,
    /// Hard per-segment character cap
    pub max_segment_chars: usize,
    /// When false, comments are skipped by the engine
    pub include_comments: bool,
    /// Leading spaces per line are skipped
    pub skip_leading_indentation: bool,
    /// Trailing spaces and tabs per line are skipped
    pub trim_trailing_whitespace: bool,
    /// Enter on a newline collapses consecutive newlines
    pub auto_skip_blank_lines: bool,
    /// Space is accepted where a newline is expected
    pub whitespace_advances_newline: bool,
}

pub const LINES_PER_SEGMENT_RANGE: (usize, usize) = (1, 5000);
pub const TAB_WIDTH_RANGE: (usize, usize) = (0, 16);
pub const SLACK_RANGE: (usize, usize) = (0, 50);
pub const MAX_SEGMENT_CHARS_RANGE: (usize, usize) = (500, 500_000);

impl Default for Settings {
    fn default() -> Self {
        Self {
            lines_per_segment: 20,
            tab_width: 4,
            slack: 3,
            max_segment_chars: 10_000,
            include_comments: false,
            skip_leading_indentation: true,
            trim_trailing_whitespace: true,
            auto_skip_blank_lines: true,
            whitespace_advances_newline: false,
        }
    }
}

impl Settings {
    /// Coerce every numeric field into its valid range.
    pub fn clamped(mut self) -> Self {
        self.lines_per_segment = clamp(self.lines_per_segment, LINES_PER_SEGMENT_RANGE);
        self.tab_width = clamp(self.tab_width, TAB_WIDTH_RANGE);
        self.slack = clamp(self.slack, SLACK_RANGE);
        self.max_segment_chars = clamp(self.max_segment_chars, MAX_SEGMENT_CHARS_RANGE);
        self
    }
}

fn clamp(value: usize, (min, max): (usize, usize)) -> usize {
    value.clamp(min, max)
}
