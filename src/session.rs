use thiserror::Error;
use tracing::debug;

use crate::{
    Attempt, AttemptContext, EngineOptions, Segment, Settings, SkipPolicy, TypingEngine,
    comment_ranges, local_comment_ranges, normalize, plan_skip_ranges, split_segments,
};

/// One preparation request, identified by the caller.
///
/// The identifier is carried through untouched; the embedding layer discards
/// results whose identifier no longer matches the most recent request.
#[derive(Debug, Clone)]
pub struct PrepareRequest {
    pub request_id: u64,
    pub content: String,
    pub file_name: String,
}

/// The all-or-nothing output of a preparation request.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub request_id: u64,
    pub file_name: String,
    pub segments: Vec<Segment>,
}

/// Normalize, lex and segment file content in one pass.
///
/// Pure input-to-output; suited to a background worker for large files. No
/// partial results are ever produced.
pub fn prepare(request: &PrepareRequest, settings: &Settings) -> Prepared {
    let segments = prepare_segments(&request.content, &request.file_name, settings);
    debug!(
        request_id = request.request_id,
        file_name = %request.file_name,
        segments = segments.len(),
        "prepared"
    );

    Prepared {
        request_id: request.request_id,
        file_name: request.file_name.clone(),
        segments,
    }
}

/// Normalize `content`, lex comments by file name, split into segments and
/// rebase comment ranges to segment-local offsets.
pub fn prepare_segments(content: &str, file_name: &str, settings: &Settings) -> Vec<Segment> {
    let settings = settings.clone().clamped();

    let normalized = normalize(content, settings.tab_width);
    let comments = comment_ranges(&normalized, file_name);

    let mut segments = split_segments(
        &normalized,
        settings.lines_per_segment,
        settings.max_segment_chars,
    );
    for segment in &mut segments {
        segment.comment_ranges =
            local_comment_ranges(&comments, segment.start_offset, segment.end_offset);
    }
    segments
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Cannot finalize: segment is not fully typed")]
    Incomplete,
}

/// A typing session over one segment.
///
/// Plans the segment's skip ranges from the active settings, owns the engine
/// for the attempt, and assembles the final record on completion.
#[derive(Debug)]
pub struct SegmentSession {
    segment: Segment,
    settings: Settings,
    engine: TypingEngine,
}

impl SegmentSession {
    pub fn new(segment: Segment, settings: &Settings) -> Self {
        let settings = settings.clone().clamped();

        let policy = SkipPolicy {
            include_comments: settings.include_comments,
            skip_leading_indentation: settings.skip_leading_indentation,
            trim_trailing_whitespace: settings.trim_trailing_whitespace,
        };
        let skip_ranges = plan_skip_ranges(&segment.text, &segment.comment_ranges, &policy);

        let options = EngineOptions {
            slack: settings.slack,
            auto_skip_blank_lines: settings.auto_skip_blank_lines,
            whitespace_advances_newline: settings.whitespace_advances_newline,
        };
        let engine = TypingEngine::new(&segment.text, options, skip_ranges);

        Self {
            segment,
            settings,
            engine,
        }
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    pub fn engine(&self) -> &TypingEngine {
        &self.engine
    }

    pub fn handle_key(&mut self, char: char) {
        self.engine.handle_key(char);
    }

    pub fn handle_backspace(&mut self) {
        self.engine.handle_backspace();
    }

    pub fn is_complete(&self) -> bool {
        self.engine.is_complete()
    }

    /// Consume the session and produce the attempt record.
    ///
    /// Should only be called once the engine reports completion.
    pub fn finalize(self, context: AttemptContext) -> Result<Attempt, SessionError> {
        if !self.engine.is_complete() {
            return Err(SessionError::Incomplete);
        }

        Ok(Attempt::assemble(
            context,
            &self.segment,
            &self.settings,
            self.engine.counters(),
        ))
    }
}
