//! 4x3 matrix keypad scanned row by row.

use alarm_core::keypad::{KEYPAD_COLS, KEYPAD_ROWS, Keypad, key_at};
use embassy_stm32::gpio::{Input, Output};
use embassy_time::{Duration, block_for};

/// Time for a driven row to settle before the columns are read.
const ROW_SETTLE: Duration = Duration::from_micros(5);

pub struct MatrixKeypad<'d> {
    rows: [Output<'d>; KEYPAD_ROWS],
    cols: [Input<'d>; KEYPAD_COLS],
    held: Option<char>,
}

impl<'d> MatrixKeypad<'d> {
    /// Rows idle high; columns must be pulled up.
    pub fn new(mut rows: [Output<'d>; KEYPAD_ROWS], cols: [Input<'d>; KEYPAD_COLS]) -> Self {
        for row in &mut rows {
            row.set_high();
        }
        Self {
            rows,
            cols,
            held: None,
        }
    }

    fn scan(&mut self) -> Option<char> {
        let mut found = None;
        for (row_index, row) in self.rows.iter_mut().enumerate() {
            row.set_low();
            block_for(ROW_SETTLE);
            if found.is_none() {
                found = self
                    .cols
                    .iter()
                    .position(Input::is_low)
                    .and_then(|col| key_at(row_index, col));
            }
            row.set_high();
        }
        found
    }
}

impl Keypad for MatrixKeypad<'_> {
    /// Reports a key once when it goes down.
    fn poll_key(&mut self) -> Option<char> {
        let current = self.scan();
        let pressed = match (self.held, current) {
            (None, Some(key)) => Some(key),
            _ => None,
        };
        self.held = current;
        pressed
    }
}
