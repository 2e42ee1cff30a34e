use derive_more::Display;

use crate::{TextRange, merge_ranges, range_at, total_len};

/// Per-character visual state.
#[derive(Debug, Default, Display, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// Never typed into
    #[default]
    #[display("untouched")]
    Untouched,
    /// Typed and matching
    #[display("correct")]
    Correct,
    /// The first mismatch of an error run
    #[display("incorrect")]
    Incorrect,
    /// Typed while an error was active, within slack
    #[display("collateral")]
    Collateral,
}

/// Aggregate keystroke accounting for one engine.
///
/// `typeable_chars` is fixed at construction; the rest move with input.
/// Backspace never rewinds `incorrect`, `collateral` or `typed_keystrokes`;
/// only `correct_chars` follows mark rewrites.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub typeable_chars: usize,
    pub typed_keystrokes: usize,
    pub incorrect: usize,
    pub collateral: usize,
    pub backspaces: usize,
    pub correct_chars: usize,
}

/// Behavior flags for a typing engine.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Extra keystrokes permitted between the first mismatch and the lock
    pub slack: usize,
    /// Enter on a newline collapses the consecutive newlines that follow
    pub auto_skip_blank_lines: bool,
    /// Space is accepted where a newline is expected
    pub whitespace_advances_newline: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            slack: 3,
            auto_skip_blank_lines: false,
            whitespace_advances_newline: false,
        }
    }
}

/// An unresolved mismatch.
#[derive(Debug, Clone, Copy)]
struct ActiveError {
    /// Position of the first mismatched character
    first_index: usize,
    /// Value of `typed_positions.len()` at the instant the error began
    typed_progress: usize,
}

/// The strict per-segment typing state machine.
///
/// Consumes single characters and one backspace primitive; exposes
/// completion, per-character marks and aggregate counters. Skip ranges make
/// the logical cursor advance across unreachable regions without counting
/// keystrokes.
///
/// The engine distinguishes the logical position (`cursor`, which jumps over
/// skip ranges and auto-skipped newlines) from typed progress (`typed_end`
/// and the order of `typed_positions`). The visual layer relies on that
/// distinction to highlight the truly-typed prefix separately from
/// auto-advanced content.
///
/// Not thread-safe across operations; each engine is owned by a single
/// controller and every call is atomic with respect to observers.
#[derive(Debug, Clone)]
pub struct TypingEngine {
    text: Vec<char>,
    options: EngineOptions,
    skip_ranges: Vec<TextRange>,

    cursor: usize,
    typed_end: usize,
    error: Option<ActiveError>,
    locked: bool,

    marks: Vec<Mark>,
    counted_correct: Vec<bool>,
    /// Positions the user has physically typed into, in typing order
    typed_positions: Vec<usize>,

    counters: Counters,
}

impl TypingEngine {
    /// Create an engine over `text` with a pre-planned skip set.
    ///
    /// The skip ranges are re-merged defensively so membership queries can
    /// assume a sorted, coalesced list. A skip range starting at offset 0 is
    /// crossed immediately.
    pub fn new(text: &str, options: EngineOptions, skip_ranges: Vec<TextRange>) -> Self {
        let text: Vec<char> = text.chars().collect();
        let len = text.len();
        let skip_ranges = merge_ranges(skip_ranges, len);

        let counters = Counters {
            typeable_chars: len - total_len(&skip_ranges),
            ..Counters::default()
        };

        let mut engine = Self {
            marks: vec![Mark::default(); len],
            counted_correct: vec![false; len],
            typed_positions: Vec::new(),
            text,
            options,
            skip_ranges,
            cursor: 0,
            typed_end: 0,
            error: None,
            locked: false,
            counters,
        };
        engine.skip_forward();
        engine
    }

    /// Total number of characters in the segment text.
    pub fn text_len(&self) -> usize {
        self.text.len()
    }

    /// Logical position; never strictly inside a skip range.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Furthest position typed through, excluding auto-advanced ones.
    pub fn typed_end(&self) -> usize {
        self.typed_end
    }

    /// One mark per character of the segment text.
    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    /// Position of the first mismatch while an error is active.
    pub fn error_index(&self) -> Option<usize> {
        self.error.map(|error| error.first_index)
    }

    /// True once slack is exhausted; normal input is ignored until a
    /// backspace releases the lock.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// The segment is complete when the cursor has passed the end with no
    /// unresolved error and no lock.
    pub fn is_complete(&self) -> bool {
        self.cursor >= self.text.len() && self.error.is_none() && !self.locked
    }

    /// Consume one typed character.
    ///
    /// Every call counts a keystroke, including while locked or after
    /// completion; that keeps the unproductive-percent metric meaningful.
    pub fn handle_key(&mut self, char: char) {
        self.counters.typed_keystrokes += 1;
        if self.locked {
            return;
        }

        self.skip_forward();
        if self.cursor >= self.text.len() {
            return;
        }

        if let Some(error) = self.error {
            let typed_distance = self.typed_positions.len() - error.typed_progress;
            if typed_distance <= self.options.slack {
                self.set_mark(self.cursor, Mark::Collateral, false);
                self.typed_positions.push(self.cursor);
                self.counters.collateral += 1;
                self.advance_typed();
            } else {
                self.locked = true;
            }
            return;
        }

        let expected = self.text[self.cursor];
        let char = if self.options.whitespace_advances_newline && char == ' ' && expected == '\n' {
            '\n'
        } else {
            char
        };

        if char != expected {
            self.set_mark(self.cursor, Mark::Incorrect, false);
            self.error = Some(ActiveError {
                first_index: self.cursor,
                typed_progress: self.typed_positions.len(),
            });
            self.typed_positions.push(self.cursor);
            self.counters.incorrect += 1;
            self.advance_typed();
            return;
        }

        self.set_mark(self.cursor, Mark::Correct, true);
        self.typed_positions.push(self.cursor);
        self.cursor += 1;
        self.typed_end = self.cursor;

        if char == '\n' && self.options.auto_skip_blank_lines {
            // Collapse the blank lines that follow: each consecutive newline
            // is marked correct but stays uncounted and untyped
            while self.cursor < self.text.len() && self.text[self.cursor] == '\n' {
                self.set_mark(self.cursor, Mark::Correct, false);
                self.cursor += 1;
            }
        }

        self.skip_forward();
    }

    /// Undo the most recent physical keystroke.
    ///
    /// Counts as a keystroke and a backspace, and always releases the lock.
    /// The popped position reverts to untouched; a counted correct gives its
    /// `correct_chars` credit back.
    pub fn handle_backspace(&mut self) {
        self.counters.typed_keystrokes += 1;
        self.counters.backspaces += 1;
        self.locked = false;

        let Some(position) = self.typed_positions.pop() else {
            return;
        };

        self.cursor = position;
        self.typed_end = position;
        self.set_mark(position, Mark::Untouched, false);

        if let Some(error) = self.error {
            if self.cursor <= error.first_index {
                self.error = None;
            }
        }
    }

    /// Advance the cursor by one typed position, record the typed frontier,
    /// then cross any skip range.
    fn advance_typed(&mut self) {
        self.cursor += 1;
        self.typed_end = self.cursor;
        self.skip_forward();
    }

    /// Move the cursor to the end of whichever skip range contains it,
    /// repeatedly. Binary search per step over the merged list.
    fn skip_forward(&mut self) {
        while let Some(range) = range_at(&self.skip_ranges, self.cursor) {
            self.cursor = range.end;
        }
    }

    /// The single write path for marks: reconciles the counted-correct
    /// bitmap and `correct_chars` on every rewrite. Out-of-range writes are
    /// ignored.
    fn set_mark(&mut self, index: usize, mark: Mark, counted: bool) {
        if index >= self.marks.len() {
            return;
        }

        let now_counted = mark == Mark::Correct && counted;
        if self.counted_correct[index] && !now_counted {
            self.counters.correct_chars -= 1;
        } else if !self.counted_correct[index] && now_counted {
            self.counters.correct_chars += 1;
        }

        self.counted_correct[index] = now_counted;
        self.marks[index] = mark;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(text: &str, slack: usize) -> TypingEngine {
        TypingEngine::new(
            text,
            EngineOptions {
                slack,
                ..EngineOptions::default()
            },
            vec![],
        )
    }

    fn type_str(engine: &mut TypingEngine, input: &str) {
        for char in input.chars() {
            engine.handle_key(char);
        }
    }

    #[test]
    fn test_all_correct() {
        let mut engine = engine("abc", 3);
        type_str(&mut engine, "abc");

        let counters = engine.counters();
        assert_eq!(counters.incorrect, 0);
        assert_eq!(counters.collateral, 0);
        assert_eq!(counters.backspaces, 0);
        assert_eq!(counters.correct_chars, 3);
        assert_eq!(engine.cursor(), 3);
        assert!(engine.is_complete());
        assert_eq!(
            engine.marks(),
            &[Mark::Correct, Mark::Correct, Mark::Correct]
        );
    }

    #[test]
    fn test_slack_within_bound() {
        let mut engine = engine("abcd", 3);
        type_str(&mut engine, "xbcd");

        let counters = engine.counters();
        assert_eq!(counters.incorrect, 1);
        assert_eq!(counters.collateral, 3);
        assert!(!engine.is_locked());
        assert_eq!(engine.error_index(), Some(0));
        assert_eq!(engine.cursor(), 4);
        assert!(!engine.is_complete());
        assert_eq!(
            engine.marks(),
            &[
                Mark::Incorrect,
                Mark::Collateral,
                Mark::Collateral,
                Mark::Collateral,
            ]
        );
    }

    #[test]
    fn test_exceeding_slack_locks() {
        let mut engine = engine("abcdef", 2);
        type_str(&mut engine, "xbcd");

        assert!(engine.is_locked());
        assert_eq!(engine.cursor(), 3);

        // Locked input still counts keystrokes but moves nothing
        engine.handle_key('e');
        assert_eq!(engine.cursor(), 3);
        assert_eq!(engine.counters().typed_keystrokes, 5);

        engine.handle_backspace();
        assert!(!engine.is_locked());
        assert_eq!(engine.cursor(), 2);
        assert_eq!(engine.counters().backspaces, 1);
        assert_eq!(engine.marks()[2], Mark::Untouched);
    }

    #[test]
    fn test_auto_skip_blank_lines() {
        let mut engine = TypingEngine::new(
            "\n\nP",
            EngineOptions {
                slack: 3,
                auto_skip_blank_lines: true,
                whitespace_advances_newline: false,
            },
            vec![],
        );
        engine.handle_key('\n');

        assert_eq!(engine.cursor(), 2);
        assert_eq!(engine.counters().correct_chars, 1);
        assert_eq!(engine.counters().typed_keystrokes, 1);
        assert_eq!(
            engine.marks(),
            &[Mark::Correct, Mark::Correct, Mark::Untouched]
        );
        // Only the typed newline is counted; the walk stops at 'P'
        assert_eq!(engine.typed_end(), 1);
    }

    #[test]
    fn test_skip_over_comment() {
        let mut engine = TypingEngine::new(
            "a/*c*/b",
            EngineOptions::default(),
            vec![TextRange::new(1, 6)],
        );

        assert_eq!(engine.counters().typeable_chars, 2);

        engine.handle_key('a');
        assert_eq!(engine.cursor(), 6);
        assert_eq!(engine.typed_end(), 1);

        engine.handle_key('b');
        assert_eq!(engine.cursor(), 7);
        assert!(engine.is_complete());
        assert_eq!(engine.counters().correct_chars, 2);
        assert_eq!(engine.counters().typed_keystrokes, 2);
    }

    #[test]
    fn test_slack_excludes_skipped_ranges() {
        let mut engine = TypingEngine::new(
            "a/*c*/b",
            EngineOptions {
                slack: 1,
                ..EngineOptions::default()
            },
            vec![TextRange::new(1, 6)],
        );

        engine.handle_key('x');
        assert_eq!(engine.error_index(), Some(0));
        assert_eq!(engine.cursor(), 6);
        assert!(!engine.is_locked());

        // The comment interior did not count toward slack
        engine.handle_key('b');
        assert_eq!(engine.counters().collateral, 1);
        assert_eq!(engine.cursor(), 7);
        assert!(!engine.is_locked());
    }

    #[test]
    fn test_backspace_resolves_error() {
        let mut engine = engine("abc", 3);
        engine.handle_key('x');
        assert_eq!(engine.error_index(), Some(0));

        engine.handle_backspace();
        assert_eq!(engine.error_index(), None);
        assert_eq!(engine.cursor(), 0);

        type_str(&mut engine, "abc");
        assert!(engine.is_complete());
        assert_eq!(engine.counters().correct_chars, 3);
        assert_eq!(engine.counters().incorrect, 1);
    }

    #[test]
    fn test_backspace_round_trip() {
        let mut engine = engine("abcd", 3);

        for _ in 0..3 {
            engine.handle_key('a');
            engine.handle_backspace();
        }

        assert_eq!(engine.cursor(), 0);
        assert_eq!(engine.typed_end(), 0);
        assert!(engine.marks().iter().all(|mark| *mark == Mark::Untouched));

        let counters = engine.counters();
        assert_eq!(counters.correct_chars, 0);
        assert_eq!(counters.typed_keystrokes, 6);
        assert_eq!(counters.backspaces, 3);
    }

    #[test]
    fn test_backspace_on_empty_input() {
        let mut engine = engine("ab", 3);
        engine.handle_backspace();

        assert_eq!(engine.cursor(), 0);
        assert_eq!(engine.counters().typed_keystrokes, 1);
        assert_eq!(engine.counters().backspaces, 1);
    }

    #[test]
    fn test_mark_display() {
        assert_eq!(Mark::Untouched.to_string(), "untouched");
        assert_eq!(Mark::Correct.to_string(), "correct");
        assert_eq!(Mark::Incorrect.to_string(), "incorrect");
        assert_eq!(Mark::Collateral.to_string(), "collateral");
    }

    #[test]
    fn test_empty_text_complete_immediately() {
        let engine = engine("", 3);
        assert!(engine.is_complete());
        assert_eq!(engine.counters().typeable_chars, 0);
    }

    #[test]
    fn test_all_skip_segment() {
        let engine = TypingEngine::new(
            "/* x */",
            EngineOptions::default(),
            vec![TextRange::new(0, 7)],
        );
        assert!(engine.is_complete());
        assert_eq!(engine.counters().typeable_chars, 0);
        assert_eq!(engine.cursor(), 7);
    }

    #[test]
    fn test_keystrokes_after_completion_counted() {
        let mut engine = engine("a", 3);
        engine.handle_key('a');
        assert!(engine.is_complete());

        engine.handle_key('z');
        assert!(engine.is_complete());
        assert_eq!(engine.counters().typed_keystrokes, 2);
        assert_eq!(engine.counters().correct_chars, 1);
    }

    #[test]
    fn test_whitespace_advances_newline() {
        let mut engine = TypingEngine::new(
            "a\nb",
            EngineOptions {
                slack: 3,
                auto_skip_blank_lines: false,
                whitespace_advances_newline: true,
            },
            vec![],
        );

        engine.handle_key('a');
        engine.handle_key(' ');
        engine.handle_key('b');

        assert!(engine.is_complete());
        assert_eq!(engine.counters().correct_chars, 3);
        assert_eq!(engine.counters().incorrect, 0);
    }

    #[test]
    fn test_space_elsewhere_still_mismatches() {
        let mut engine = TypingEngine::new(
            "ab",
            EngineOptions {
                whitespace_advances_newline: true,
                ..EngineOptions::default()
            },
            vec![],
        );

        engine.handle_key(' ');
        assert_eq!(engine.counters().incorrect, 1);
        assert_eq!(engine.marks()[0], Mark::Incorrect);
    }

    #[test]
    fn test_typed_positions_invariants() {
        let mut engine = TypingEngine::new(
            "ab/*c*/d",
            EngineOptions::default(),
            vec![TextRange::new(2, 7)],
        );
        type_str(&mut engine, "abd");

        // Every reachable state keeps the frontier ordering
        assert!(engine.typed_end() <= engine.cursor());
        assert!(engine.cursor() <= engine.text_len());
        assert_eq!(
            engine.counters().correct_chars,
            engine
                .marks()
                .iter()
                .filter(|mark| **mark == Mark::Correct)
                .count()
        );
        assert!(engine.is_complete());
    }

    #[test]
    fn test_correct_chars_tracks_counted_marks_only() {
        let mut engine = TypingEngine::new(
            "\n\n\nz",
            EngineOptions {
                auto_skip_blank_lines: true,
                ..EngineOptions::default()
            },
            vec![],
        );
        engine.handle_key('\n');

        // Three newlines marked correct, one counted
        assert_eq!(engine.counters().correct_chars, 1);
        assert_eq!(
            engine
                .marks()
                .iter()
                .filter(|mark| **mark == Mark::Correct)
                .count(),
            3
        );

        engine.handle_key('z');
        assert!(engine.is_complete());
        assert_eq!(engine.counters().correct_chars, 2);
    }

    #[test]
    fn test_lock_then_recover_to_completion() {
        let mut engine = engine("abc", 0);
        engine.handle_key('x');
        // Slack of zero locks on the very next key
        engine.handle_key('b');
        assert!(engine.is_locked());
        assert_eq!(engine.cursor(), 1);

        engine.handle_backspace();
        assert!(!engine.is_locked());
        assert_eq!(engine.error_index(), None);

        type_str(&mut engine, "abc");
        assert!(engine.is_complete());
        assert_eq!(engine.counters().correct_chars, 3);
    }
}
