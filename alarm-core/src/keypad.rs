//! 4x3 matrix keypad layout and the polling seam used by the controller.

/// Number of row lines on the keypad.
pub const KEYPAD_ROWS: usize = 4;
/// Number of column lines on the keypad.
pub const KEYPAD_COLS: usize = 3;

/// Characters printed on the keypad, indexed by `[row][column]`.
pub const KEYPAD_LAYOUT: [[char; KEYPAD_COLS]; KEYPAD_ROWS] = [
    ['1', '2', '3'],
    ['4', '5', '6'],
    ['7', '8', '9'],
    ['*', '0', '#'],
];

/// Looks up the character at a matrix intersection.
pub const fn key_at(row: usize, col: usize) -> Option<char> {
    if row < KEYPAD_ROWS && col < KEYPAD_COLS {
        Some(KEYPAD_LAYOUT[row][col])
    } else {
        None
    }
}

/// Returns `true` for characters present on the keypad.
pub fn is_keypad_char(key: char) -> bool {
    KEYPAD_LAYOUT.iter().flatten().any(|&candidate| candidate == key)
}

/// Source of key presses.
pub trait Keypad {
    /// Returns the next pressed key, if any. At most one key per call.
    fn poll_key(&mut self) -> Option<char>;
}
