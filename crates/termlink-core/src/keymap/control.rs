//! Control-sequence tables used by the key mapper.
//!
//! Terminals predate named keys: Ctrl+letter is sent as a C0 control code and
//! word motion is the readline `ESC b` / `ESC f` convention.  These tables
//! keep the byte-level details out of the rule ordering in `keymap::mod`.

/// Readline "backward-word" (`ESC b`), sent for Alt+ArrowLeft.
pub const WORD_BACKWARD: &str = "\u{1b}b";

/// Readline "forward-word" (`ESC f`), sent for Alt+ArrowRight.
pub const WORD_FORWARD: &str = "\u{1b}f";

/// Readline "backward-kill-word" (`ESC DEL`), sent for Alt+Backspace.
pub const DELETE_WORD_BACKWARD: &str = "\u{1b}\u{7f}";

/// Maps a lowercase ASCII letter to its C0 control code.
///
/// `'a'` → `U+0001` through `'z'` → `U+001A`.  Anything else returns `None`.
pub fn ctrl_letter_code(letter: char) -> Option<char> {
    if letter.is_ascii_lowercase() {
        // 'a' is 0x61; the control code is the letter's alphabet index + 1.
        char::from_u32(letter as u32 - 'a' as u32 + 1)
    } else {
        None
    }
}

/// Parses a DOM function-key name (`"F1"`..`"F12"`) into its number.
pub fn parse_function_key(key: &str) -> Option<u8> {
    let digits = key.strip_prefix('F')?;
    if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u8 = digits.parse().ok()?;
    (1..=12).contains(&n).then_some(n)
}

/// `true` for a single printable character: exactly one `char`, not a
/// control character.
pub fn single_printable(key: &str) -> Option<char> {
    let mut chars = key.chars();
    let first = chars.next()?;
    if chars.next().is_some() || first.is_control() {
        return None;
    }
    Some(first)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
