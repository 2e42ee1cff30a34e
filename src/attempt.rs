use serde::{Deserialize, Serialize};

use crate::{Counters, Millis, Segment, Settings, unproductive_percent, words_per_minute};

/// Caller-supplied identity and timing for one attempt.
///
/// The core never reads a clock; both timestamps are injected, in
/// milliseconds since the epoch.
#[derive(Debug, Clone)]
pub struct AttemptContext {
    pub id: String,
    pub file_path: String,
    pub file_name: String,
    pub start_at_ms: i64,
    pub end_at_ms: i64,
}

/// The record produced exactly once when an engine reports completion.
///
/// Field names follow the persisted document layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: String,
    pub file_path: String,
    pub file_name: String,
    pub segment_index: usize,
    pub segment_start_line: usize,
    pub segment_end_line: usize,
    pub lines_per_segment: usize,
    pub tab_width: usize,
    pub slack_n: usize,
    pub typeable_chars: usize,
    pub typed_keystrokes: usize,
    pub incorrect: usize,
    pub collateral: usize,
    pub backspaces: usize,
    pub correct_chars: usize,
    pub start_at_ms: i64,
    pub end_at_ms: i64,
    pub duration_ms: i64,
    pub wpm: f64,
    pub unproductive_percent: f64,
}

impl Attempt {
    /// Combine engine counters with the policy values that were in effect
    /// and the injected timestamps.
    pub fn assemble(
        context: AttemptContext,
        segment: &Segment,
        settings: &Settings,
        counters: &Counters,
    ) -> Self {
        let duration_ms = (context.end_at_ms - context.start_at_ms).max(0);

        Self {
            id: context.id,
            file_path: context.file_path,
            file_name: context.file_name,
            segment_index: segment.index,
            segment_start_line: segment.start_line,
            segment_end_line: segment.end_line,
            lines_per_segment: settings.lines_per_segment,
            tab_width: settings.tab_width,
            slack_n: settings.slack,
            typeable_chars: counters.typeable_chars,
            typed_keystrokes: counters.typed_keystrokes,
            incorrect: counters.incorrect,
            collateral: counters.collateral,
            backspaces: counters.backspaces,
            correct_chars: counters.correct_chars,
            start_at_ms: context.start_at_ms,
            end_at_ms: context.end_at_ms,
            duration_ms,
            wpm: words_per_minute(counters.correct_chars, duration_ms as Millis),
            unproductive_percent: unproductive_percent(
                counters.typed_keystrokes,
                counters.incorrect,
                counters.collateral,
                counters.backspaces,
            ),
        }
    }
}
