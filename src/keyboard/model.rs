/// A physical key, identified by its layout-independent code.
///
/// `base`/`shifted` are the characters a US terminal reports for the key, which
/// is how a terminal key press is traced back to the physical key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicalKey {
    pub code: &'static str,
    pub label: &'static str,
    pub base: char,
    pub shifted: char,
}

const fn key(code: &'static str, label: &'static str, base: char, shifted: char) -> PhysicalKey {
    PhysicalKey {
        code,
        label,
        base,
        shifted,
    }
}

pub const SPACE_CODE: &str = "Space";
pub const BACKSPACE_CODE: &str = "Backspace";

const DIGIT_ROW: &[PhysicalKey] = &[
    key("Backquote", "`", '`', '~'),
    key("Digit1", "1", '1', '!'),
    key("Digit2", "2", '2', '@'),
    key("Digit3", "3", '3', '#'),
    key("Digit4", "4", '4', '$'),
    key("Digit5", "5", '5', '%'),
    key("Digit6", "6", '6', '^'),
    key("Digit7", "7", '7', '&'),
    key("Digit8", "8", '8', '*'),
    key("Digit9", "9", '9', '('),
    key("Digit0", "0", '0', ')'),
    key("Minus", "-", '-', '_'),
    key("Equal", "=", '=', '+'),
];

const TOP_ROW: &[PhysicalKey] = &[
    key("KeyQ", "Q", 'q', 'Q'),
    key("KeyW", "W", 'w', 'W'),
    key("KeyE", "E", 'e', 'E'),
    key("KeyR", "R", 'r', 'R'),
    key("KeyT", "T", 't', 'T'),
    key("KeyY", "Y", 'y', 'Y'),
    key("KeyU", "U", 'u', 'U'),
    key("KeyI", "I", 'i', 'I'),
    key("KeyO", "O", 'o', 'O'),
    key("KeyP", "P", 'p', 'P'),
    key("BracketLeft", "[", '[', '{'),
    key("BracketRight", "]", ']', '}'),
    key("Backslash", "\\", '\\', '|'),
];

const HOME_ROW: &[PhysicalKey] = &[
    key("KeyA", "A", 'a', 'A'),
    key("KeyS", "S", 's', 'S'),
    key("KeyD", "D", 'd', 'D'),
    key("KeyF", "F", 'f', 'F'),
    key("KeyG", "G", 'g', 'G'),
    key("KeyH", "H", 'h', 'H'),
    key("KeyJ", "J", 'j', 'J'),
    key("KeyK", "K", 'k', 'K'),
    key("KeyL", "L", 'l', 'L'),
    key("Semicolon", ";", ';', ':'),
    key("Quote", "'", '\'', '"'),
];

const BOTTOM_ROW: &[PhysicalKey] = &[
    key("KeyZ", "Z", 'z', 'Z'),
    key("KeyX", "X", 'x', 'X'),
    key("KeyC", "C", 'c', 'C'),
    key("KeyV", "V", 'v', 'V'),
    key("KeyB", "B", 'b', 'B'),
    key("KeyN", "N", 'n', 'N'),
    key("KeyM", "M", 'm', 'M'),
    key("Comma", ",", ',', '<'),
    key("Period", ".", '.', '>'),
    key("Slash", "/", '/', '?'),
];

/// Character-producing rows, top to bottom.
pub const ROWS: &[&[PhysicalKey]] = &[DIGIT_ROW, TOP_ROW, HOME_ROW, BOTTOM_ROW];

/// All character keys in row order.
pub fn all_keys() -> impl Iterator<Item = &'static PhysicalKey> {
    ROWS.iter().flat_map(|row| row.iter())
}

/// Physical code for a character reported by the terminal (shift-insensitive).
pub fn code_for_char(ch: char) -> Option<&'static str> {
    if ch == ' ' {
        return Some(SPACE_CODE);
    }
    all_keys()
        .find(|k| k.base == ch || k.shifted == ch)
        .map(|k| k.code)
}

pub fn find(code: &str) -> Option<&'static PhysicalKey> {
    all_keys().find(|k| k.code == code)
}

/// Position of a code in row order; used to make key lookups deterministic.
pub fn row_order(code: &str) -> usize {
    all_keys()
        .position(|k| k.code == code)
        .unwrap_or(usize::MAX)
}
