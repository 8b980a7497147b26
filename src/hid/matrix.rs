//! Key-matrix scan translation.
//!
//! The scan interrupt shifts in one byte per scan line (active low: a
//! cleared bit means the switch at that column is closed). This module turns
//! those bytes into a [`KeyboardReport`] through a keymap, and only yields
//! a report when the scan differs from the previous one.

use super::keyboard::KeyboardReport;
use super::keycode::*;
use crate::config::MATRIX_ROWS;

/// Columns per scan line (one shift-register byte).
pub const MATRIX_COLS: usize = 8;

/// Key usage for each (row, column). `NO_EVENT` marks an unpopulated switch.
pub type Keymap<const ROWS: usize> = [[u8; MATRIX_COLS]; ROWS];

/// Default two-row layout.
pub const DEFAULT_KEYMAP: Keymap<MATRIX_ROWS> = [
    [KEY_Q, KEY_W, KEY_E, KEY_R, KEY_T, KEY_Y, KEY_U, KEY_I],
    [KEY_A, KEY_S, KEY_D, KEY_F, KEY_G, KEY_H, KEY_J, KEY_K],
];

/// Edge-detecting matrix-to-report translator.
pub struct MatrixScanner<const ROWS: usize> {
    keymap: Keymap<ROWS>,
    previous: [u8; ROWS],
}

impl<const ROWS: usize> MatrixScanner<ROWS> {
    /// Start with every switch released.
    pub const fn new(keymap: Keymap<ROWS>) -> Self {
        Self {
            keymap,
            previous: [0xFF; ROWS],
        }
    }

    /// Feed one debounced scan. Returns the new report on a press/release edge.
    pub fn scan(&mut self, lines: &[u8; ROWS]) -> Option<KeyboardReport> {
        if *lines == self.previous {
            return None;
        }
        self.previous = *lines;

        let mut report = KeyboardReport::empty();
        for (row, &line) in self.keymap.iter().zip(lines.iter()) {
            for (col, &usage) in row.iter().enumerate() {
                if line & (1 << col) == 0 && usage != NO_EVENT {
                    report.press(usage);
                }
            }
        }
        Some(report)
    }
}

impl Default for MatrixScanner<MATRIX_ROWS> {
    fn default() -> Self {
        Self::new(DEFAULT_KEYMAP)
    }
}
