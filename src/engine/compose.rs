/// Voicing mark (dakuten), spacing form.
pub const DAKUTEN: char = '゛';
/// Semi-voicing mark (handakuten), spacing form.
pub const HANDAKUTEN: char = '゜';

const DAKUTEN_TABLE: &[(char, char)] = &[
    ('う', 'ゔ'),
    ('か', 'が'),
    ('き', 'ぎ'),
    ('く', 'ぐ'),
    ('け', 'げ'),
    ('こ', 'ご'),
    ('さ', 'ざ'),
    ('し', 'じ'),
    ('す', 'ず'),
    ('せ', 'ぜ'),
    ('そ', 'ぞ'),
    ('た', 'だ'),
    ('ち', 'ぢ'),
    ('つ', 'づ'),
    ('て', 'で'),
    ('と', 'ど'),
    ('は', 'ば'),
    ('ひ', 'び'),
    ('ふ', 'ぶ'),
    ('へ', 'べ'),
    ('ほ', 'ぼ'),
];

const HANDAKUTEN_TABLE: &[(char, char)] = &[
    ('は', 'ぱ'),
    ('ひ', 'ぴ'),
    ('ふ', 'ぷ'),
    ('へ', 'ぺ'),
    ('ほ', 'ぽ'),
];

/// A voiced kana split into the two keystrokes that produce it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decomposed {
    pub base: char,
    pub mark: char,
}

fn table_for(mark: char) -> Option<&'static [(char, char)]> {
    match mark {
        DAKUTEN => Some(DAKUTEN_TABLE),
        HANDAKUTEN => Some(HANDAKUTEN_TABLE),
        _ => None,
    }
}

pub fn is_mark(ch: char) -> bool {
    ch == DAKUTEN || ch == HANDAKUTEN
}

/// Combine a base kana with a mark. `None` when the pair has no voiced form.
pub fn compose(base: char, mark: char) -> Option<char> {
    table_for(mark)?
        .iter()
        .find(|(b, _)| *b == base)
        .map(|&(_, voiced)| voiced)
}

/// Split a voiced kana into its base and mark. `None` for anything else.
pub fn decompose(ch: char) -> Option<Decomposed> {
    voiced_pairs()
        .find(|(_, voiced)| *voiced == ch)
        .map(|(parts, _)| parts)
}

pub fn is_composed(ch: char) -> bool {
    decompose(ch).is_some()
}

/// Every `(base, mark) -> voiced` entry of the table.
pub fn voiced_pairs() -> impl Iterator<Item = (Decomposed, char)> {
    DAKUTEN_TABLE
        .iter()
        .map(|&(base, voiced)| (Decomposed { base, mark: DAKUTEN }, voiced))
        .chain(HANDAKUTEN_TABLE.iter().map(|&(base, voiced)| {
            (
                Decomposed {
                    base,
                    mark: HANDAKUTEN,
                },
                voiced,
            )
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_compose_dakuten() {
        assert_eq!(compose('か', DAKUTEN), Some('が'));
        assert_eq!(compose('う', DAKUTEN), Some('ゔ'));
        assert_eq!(compose('ほ', DAKUTEN), Some('ぼ'));
    }

    #[test]
    fn test_compose_handakuten_only_h_row() {
        assert_eq!(compose('は', HANDAKUTEN), Some('ぱ'));
        assert_eq!(compose('か', HANDAKUTEN), None);
    }

    #[test]
    fn test_compose_rejects_non_mark() {
        assert_eq!(compose('か', 'か'), None);
        assert_eq!(compose('な', DAKUTEN), None);
    }

    #[test]
    fn test_decompose() {
        assert_eq!(
            decompose('が'),
            Some(Decomposed {
                base: 'か',
                mark: DAKUTEN
            })
        );
        assert_eq!(
            decompose('ぴ'),
            Some(Decomposed {
                base: 'ひ',
                mark: HANDAKUTEN
            })
        );
        assert_eq!(decompose('か'), None);
        assert_eq!(decompose(' '), None);
    }

    #[test]
    fn test_round_trip_over_whole_table() {
        for (parts, voiced) in voiced_pairs() {
            assert_eq!(compose(parts.base, parts.mark), Some(voiced));
            assert_eq!(decompose(voiced), Some(parts));
        }
    }

    #[test]
    fn test_each_voiced_char_has_one_origin() {
        let voiced: Vec<char> = voiced_pairs().map(|(_, v)| v).collect();
        let unique: HashSet<char> = voiced.iter().copied().collect();
        assert_eq!(voiced.len(), unique.len());
        assert_eq!(voiced.len(), 26);
    }

    #[test]
    fn test_is_mark() {
        assert!(is_mark(DAKUTEN));
        assert!(is_mark(HANDAKUTEN));
        assert!(!is_mark('か'));
    }
}
