use crate::{AVERAGE_WORD_LENGTH, Float, Millis};

/// Calculate words per minute from booked correct characters.
///
/// * `correct_chars` - How many correctly typed characters were booked
/// * `duration_ms` - Attempt duration in milliseconds
///
/// Returns `0` for non-positive or non-finite durations.
pub fn words_per_minute(correct_chars: usize, duration_ms: Millis) -> Float {
    if !duration_ms.is_finite() || duration_ms <= 0.0 {
        return 0.0;
    }

    let words = correct_chars as Float / AVERAGE_WORD_LENGTH as Float;
    let minutes = duration_ms / 60_000.0;
    words / minutes
}

/// Calculate the share of keystrokes that produced no forward progress.
///
/// Mismatches, collateral keystrokes and backspaces all count as
/// unproductive; the result is a percentage of all keystrokes, `0` when
/// nothing was typed.
pub fn unproductive_percent(
    typed_keystrokes: usize,
    incorrect: usize,
    collateral: usize,
    backspaces: usize,
) -> Float {
    if typed_keystrokes == 0 {
        return 0.0;
    }

    let unproductive = (incorrect + collateral + backspaces) as Float;
    unproductive / typed_keystrokes as Float * 100.0
}
