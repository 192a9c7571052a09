#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hand {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Finger {
    Pinky,
    Ring,
    Middle,
    Index,
    Thumb,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FingerAssignment {
    pub hand: Hand,
    pub finger: Finger,
}

impl FingerAssignment {
    pub fn new(hand: Hand, finger: Finger) -> Self {
        Self { hand, finger }
    }
}

/// Touch-typing finger for a physical key code.
pub fn finger_for_code(code: &str) -> FingerAssignment {
    use Finger::*;
    use Hand::*;

    match code {
        "Backquote" | "Digit1" | "KeyQ" | "KeyA" | "KeyZ" => FingerAssignment::new(Left, Pinky),
        "Digit2" | "KeyW" | "KeyS" | "KeyX" => FingerAssignment::new(Left, Ring),
        "Digit3" | "KeyE" | "KeyD" | "KeyC" => FingerAssignment::new(Left, Middle),
        "Digit4" | "Digit5" | "KeyR" | "KeyT" | "KeyF" | "KeyG" | "KeyV" | "KeyB" => {
            FingerAssignment::new(Left, Index)
        }
        "Digit6" | "Digit7" | "KeyY" | "KeyU" | "KeyH" | "KeyJ" | "KeyN" | "KeyM" => {
            FingerAssignment::new(Right, Index)
        }
        "Digit8" | "KeyI" | "KeyK" | "Comma" => FingerAssignment::new(Right, Middle),
        "Digit9" | "KeyO" | "KeyL" | "Period" => FingerAssignment::new(Right, Ring),
        "Space" => FingerAssignment::new(Right, Thumb),
        _ => FingerAssignment::new(Right, Pinky),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_row_fingers() {
        assert_eq!(
            finger_for_code("KeyF"),
            FingerAssignment::new(Hand::Left, Finger::Index)
        );
        assert_eq!(
            finger_for_code("KeyJ"),
            FingerAssignment::new(Hand::Right, Finger::Index)
        );
        assert_eq!(
            finger_for_code("Semicolon"),
            FingerAssignment::new(Hand::Right, Finger::Pinky)
        );
    }

    #[test]
    fn test_kana_extra_keys_go_to_right_pinky() {
        assert_eq!(finger_for_code("BracketLeft").finger, Finger::Pinky);
        assert_eq!(finger_for_code("Backslash").hand, Hand::Right);
    }
}
