use crate::{TextRange, covered, merge_ranges};

/// Policy flags controlling which parts of a segment are shown but never
/// typed. Blank-line auto-advance is handled by the engine, not here.
#[derive(Debug, Clone, Copy)]
pub struct SkipPolicy {
    pub include_comments: bool,
    pub skip_leading_indentation: bool,
    pub trim_trailing_whitespace: bool,
}

/// Compose the skip set for one segment from its comment ranges and the
/// policy flags.
///
/// The result is clipped to the segment, sorted and coalesced, ready for the
/// engine's binary-search membership queries.
pub fn plan_skip_ranges(text: &str, comments: &[TextRange], policy: &SkipPolicy) -> Vec<TextRange> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let mut space_skips: Vec<TextRange> = Vec::new();
    if policy.skip_leading_indentation {
        space_skips.extend(leading_indentation(&chars));
    }
    if !policy.include_comments {
        space_skips.extend(pre_comment_padding(&chars, comments));
    }
    if policy.trim_trailing_whitespace {
        space_skips.extend(trailing_whitespace(&chars));
    }

    let base = if policy.include_comments {
        merge_ranges(space_skips, len)
    } else {
        let mut combined = comments.to_vec();
        combined.extend(space_skips);
        merge_ranges(combined, len)
    };

    if policy.include_comments {
        return base;
    }

    let mut all = base.clone();
    all.extend(skippable_line_breaks(&chars, &base));
    merge_ranges(all, len)
}

/// Per line, the maximal prefix of ASCII spaces.
pub fn leading_indentation(chars: &[char]) -> Vec<TextRange> {
    let mut ranges = Vec::new();
    for line in line_spans(chars) {
        let mut end = line.start;
        while end < line.end && chars[end] == ' ' {
            end += 1;
        }
        if end > line.start {
            ranges.push(TextRange::new(line.start, end));
        }
    }
    ranges
}

/// Per line, the maximal suffix of spaces and tabs before the terminator.
pub fn trailing_whitespace(chars: &[char]) -> Vec<TextRange> {
    let mut ranges = Vec::new();
    for line in line_spans(chars) {
        let mut start = line.end;
        while start > line.start && matches!(chars[start - 1], ' ' | '\t') {
            start -= 1;
        }
        if start < line.end {
            ranges.push(TextRange::new(start, line.end));
        }
    }
    ranges
}

/// For each comment that does not start at the first column, the run of
/// spaces immediately before it, bounded by the line start.
pub fn pre_comment_padding(chars: &[char], comments: &[TextRange]) -> Vec<TextRange> {
    let mut ranges = Vec::new();
    for comment in comments {
        if comment.start == 0 || comment.start > chars.len() {
            continue;
        }
        let line_start = line_start_of(chars, comment.start);
        if comment.start == line_start {
            continue;
        }
        let mut start = comment.start;
        while start > line_start && chars[start - 1] == ' ' {
            start -= 1;
        }
        if start < comment.start {
            ranges.push(TextRange::new(start, comment.start));
        }
    }
    ranges
}

/// Newlines whose entire line content lies within the union of `base`.
///
/// A blank line has no content, so its newline qualifies. A trailing comment
/// after code does not cover its line, so that newline stays typeable.
pub fn skippable_line_breaks(chars: &[char], base: &[TextRange]) -> Vec<TextRange> {
    let mut ranges = Vec::new();
    let mut line_start = 0;
    for (i, char) in chars.iter().enumerate() {
        if *char == '\n' {
            if covered(base, TextRange::new(line_start, i)) {
                ranges.push(TextRange::new(i, i + 1));
            }
            line_start = i + 1;
        }
    }
    ranges
}

fn line_spans(chars: &[char]) -> Vec<TextRange> {
    let mut lines = Vec::new();
    let mut line_start = 0;
    for (i, char) in chars.iter().enumerate() {
        if *char == '\n' {
            lines.push(TextRange::new(line_start, i));
            line_start = i + 1;
        }
    }
    lines.push(TextRange::new(line_start, chars.len()));
    lines
}

fn line_start_of(chars: &[char], pos: usize) -> usize {
    chars[..pos]
        .iter()
        .rposition(|char| *char == '\n')
        .map_or(0, |newline| newline + 1)
}
