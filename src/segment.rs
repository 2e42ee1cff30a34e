use crate::TextRange;

/// A contiguous slice of the normalized text, presented as one unit of
/// practice.
///
/// `start_line` and `end_line` are 1-based inclusive. `text` equals the
/// normalized chars in `[start_offset, end_offset)`; the newline separating
/// one segment from the next belongs to neither. When a single physical line
/// is hard-split by the char cap, the resulting segments share a line number.
///
/// `comment_ranges` are expressed in segment-local offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub comment_ranges: Vec<TextRange>,
}

/// Split normalized text into ordered segments bounded by a line count and a
/// hard char cap.
///
/// * `lines_per_segment` - target line count, coerced to at least 1.
/// * `max_segment_chars` - hard cap on segment length; zero means unbounded.
///
/// Lines accumulate into a segment until appending the next one would exceed
/// either bound, at which point the pending segment is emitted. A single line
/// longer than the cap is flushed and then sliced into cap-sized segments
/// that all carry the same line number.
pub fn split_segments(
    normalized: &str,
    lines_per_segment: usize,
    max_segment_chars: usize,
) -> Vec<Segment> {
    let lines_per_segment = lines_per_segment.max(1);
    let max_chars = if max_segment_chars == 0 {
        usize::MAX
    } else {
        max_segment_chars
    };

    let chars: Vec<char> = normalized.chars().collect();
    let lines = line_spans(&chars);

    let mut segments: Vec<Segment> = Vec::new();
    // First pending line (0-based) and its start offset; None when nothing is
    // accumulated
    let mut pending: Option<(usize, usize)> = None;
    let mut pending_lines = 0;
    let mut pending_chars = 0;

    let mut emit = |segments: &mut Vec<Segment>,
                    first_line: usize,
                    last_line: usize,
                    start_offset: usize,
                    end_offset: usize| {
        segments.push(Segment {
            index: segments.len(),
            start_line: first_line + 1,
            end_line: last_line + 1,
            text: chars[start_offset..end_offset].iter().collect(),
            start_offset,
            end_offset,
            comment_ranges: Vec::new(),
        });
    };

    for (line_idx, line) in lines.iter().enumerate() {
        let line_len = line.len();

        if line_len > max_chars {
            // Oversize line: flush whatever is pending, then slice the line
            // itself into cap-sized segments sharing one line number
            if let Some((first_line, start_offset)) = pending.take() {
                emit(
                    &mut segments,
                    first_line,
                    line_idx - 1,
                    start_offset,
                    lines[line_idx - 1].end,
                );
                pending_lines = 0;
                pending_chars = 0;
            }

            let mut slice_start = line.start;
            while slice_start < line.end {
                let slice_end = (slice_start + max_chars).min(line.end);
                emit(&mut segments, line_idx, line_idx, slice_start, slice_end);
                slice_start = slice_end;
            }
            continue;
        }

        match pending {
            Some((first_line, start_offset)) => {
                let would_overflow = pending_lines + 1 > lines_per_segment
                    || pending_chars + 1 + line_len > max_chars;
                if would_overflow {
                    emit(
                        &mut segments,
                        first_line,
                        line_idx - 1,
                        start_offset,
                        lines[line_idx - 1].end,
                    );
                    pending = Some((line_idx, line.start));
                    pending_lines = 1;
                    pending_chars = line_len;
                } else {
                    pending_lines += 1;
                    pending_chars += 1 + line_len;
                }
            }
            None => {
                pending = Some((line_idx, line.start));
                pending_lines = 1;
                pending_chars = line_len;
            }
        }
    }

    if let Some((first_line, start_offset)) = pending {
        let last_line = lines.len() - 1;
        emit(
            &mut segments,
            first_line,
            last_line,
            start_offset,
            lines[last_line].end,
        );
    }

    segments
}

/// Intersect a sorted global range list with `[start, end)` and rebase to
/// local offsets. A linear pass suffices because both sides are sorted.
pub fn local_comment_ranges(global: &[TextRange], start: usize, end: usize) -> Vec<TextRange> {
    global
        .iter()
        .skip_while(|range| range.end <= start)
        .take_while(|range| range.start < end)
        .filter_map(|range| {
            let clipped_start = range.start.max(start);
            let clipped_end = range.end.min(end);
            (clipped_start < clipped_end)
                .then(|| TextRange::new(clipped_start - start, clipped_end - start))
        })
        .collect()
}

/// Line content spans, excluding terminating newlines. Computed in one
/// left-to-right pass over the newline positions.
fn line_spans(chars: &[char]) -> Vec<TextRange> {
    let mut lines = Vec::new();
    let mut line_start = 0;
    for (i, char) in chars.iter().enumerate() {
        if *char == '\n' {
            lines.push(TextRange { start: line_start, end: i });
            line_start = i + 1;
        }
    }
    lines.push(TextRange {
        start: line_start,
        end: chars.len(),
    });
    lines
}
