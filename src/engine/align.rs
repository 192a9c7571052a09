use std::collections::BTreeSet;

use icu_normalizer::ComposingNormalizerBorrowed;

use crate::engine::compose::decompose;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputState {
    /// Base kana waiting for the mark that completes the expected voiced kana.
    Pending,
    Correct,
    Wrong,
    /// Overflow input with no target position left to consume it.
    Ignored,
}

/// Result of aligning an input buffer against a target sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Alignment {
    pub correct: BTreeSet<usize>,
    pub wrong: BTreeSet<usize>,
    /// First target position not yet resolved.
    pub progress: usize,
    pub input_to_target: Vec<Option<usize>>,
    pub input_states: Vec<InputState>,
}

impl Alignment {
    pub fn is_complete(&self, target_len: usize) -> bool {
        self.wrong.is_empty() && self.progress >= target_len
    }

    pub fn has_pending(&self) -> bool {
        self.input_states
            .last()
            .is_some_and(|s| *s == InputState::Pending)
    }
}

/// Align `input` against `target` in a single left-to-right pass.
///
/// A wrong keystroke consumes its target position; nothing backtracks. Callers
/// re-run this on the whole buffer after every edit, so deletions are handled
/// by recomputation. For a voiced target the base keystroke stays `Pending`
/// and the following mark keystroke carries the `Correct` state, so each
/// target position is credited to exactly one input position.
pub fn evaluate(target: &[char], input: &[char], allow_skip_spaces: bool) -> Alignment {
    let mut correct = BTreeSet::new();
    let mut wrong = BTreeSet::new();
    let mut input_to_target: Vec<Option<usize>> = vec![None; input.len()];
    let mut states: Vec<Option<InputState>> = vec![None; input.len()];

    let mut ti = 0;
    let mut ii = 0;
    while ii < input.len() && ti < target.len() {
        let ch = input[ii];
        if allow_skip_spaces {
            while ti < target.len() && target[ti] == ' ' && ch != ' ' {
                correct.insert(ti);
                ti += 1;
            }
        }
        if ti >= target.len() {
            states[ii] = Some(InputState::Ignored);
            ii += 1;
            continue;
        }

        let expected = target[ti];
        input_to_target[ii] = Some(ti);

        if let Some(parts) = decompose(expected)
            && ch == parts.base
        {
            states[ii] = Some(InputState::Pending);
            if input.get(ii + 1) == Some(&parts.mark) {
                input_to_target[ii + 1] = Some(ti);
                states[ii + 1] = Some(InputState::Correct);
                correct.insert(ti);
                ti += 1;
                ii += 2;
            } else {
                ii += 1;
            }
            continue;
        }

        if ch == expected {
            correct.insert(ti);
            states[ii] = Some(InputState::Correct);
        } else {
            wrong.insert(ti);
            states[ii] = Some(InputState::Wrong);
        }
        ti += 1;
        ii += 1;
    }

    if allow_skip_spaces {
        while ti < target.len() && target[ti] == ' ' {
            correct.insert(ti);
            ti += 1;
        }
    }

    let input_states = states
        .into_iter()
        .enumerate()
        .map(|(i, state)| {
            state.unwrap_or_else(|| {
                input_to_target[i] = None;
                InputState::Ignored
            })
        })
        .collect();

    Alignment {
        correct,
        wrong,
        progress: ti,
        input_to_target,
        input_states,
    }
}

/// Number of target positions that may take two keystrokes (base + mark).
pub fn composable_extra(target: &[char]) -> usize {
    target.iter().filter(|&&ch| decompose(ch).is_some()).count()
}

pub fn max_input_len(target: &[char]) -> usize {
    target.len() + composable_extra(target)
}

/// Truncate an input buffer to what the target can possibly consume.
pub fn clamp_input<'a>(input: &'a [char], target: &[char]) -> &'a [char] {
    let max = max_input_len(target);
    if input.len() <= max {
        input
    } else {
        &input[..max]
    }
}

/// NFC-compose raw text-box input so combining voicing marks fold into the
/// precomposed kana. Spacing marks (゛ ゜) have no canonical composition and
/// pass through untouched.
pub fn normalize_input(raw: &str) -> String {
    ComposingNormalizerBorrowed::new_nfc()
        .normalize(raw)
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn eval(target: &str, input: &str, skip: bool) -> Alignment {
        evaluate(&chars(target), &chars(input), skip)
    }

    fn set(items: &[usize]) -> BTreeSet<usize> {
        items.iter().copied().collect()
    }

    #[test]
    fn test_direct_match_prefix() {
        let a = eval("ねこ", "ね", false);
        assert_eq!(a.correct, set(&[0]));
        assert!(a.wrong.is_empty());
        assert_eq!(a.progress, 1);
        assert_eq!(a.input_states, vec![InputState::Correct]);
        assert_eq!(a.input_to_target, vec![Some(0)]);
    }

    #[test]
    fn test_wrong_keystroke_consumes_position() {
        let a = eval("ねこ", "ろこ", false);
        assert_eq!(a.wrong, set(&[0]));
        assert_eq!(a.correct, set(&[1]));
        assert_eq!(a.progress, 2);
        assert!(!a.is_complete(2));
    }

    #[test]
    fn test_composed_character_two_stage() {
        let a = eval("が", "か", false);
        assert_eq!(a.input_states, vec![InputState::Pending]);
        assert_eq!(a.progress, 0);
        assert!(a.correct.is_empty());
        assert!(a.has_pending());

        let a = eval("が", "か゛", false);
        assert_eq!(a.correct, set(&[0]));
        assert_eq!(a.progress, 1);
        assert_eq!(
            a.input_states,
            vec![InputState::Pending, InputState::Correct]
        );
        assert_eq!(a.input_to_target, vec![Some(0), Some(0)]);
        assert!(a.is_complete(1));
    }

    #[test]
    fn test_precomposed_input_matches_directly() {
        let a = eval("がっこう", "が", false);
        assert_eq!(a.correct, set(&[0]));
        assert_eq!(a.progress, 1);
    }

    #[test]
    fn test_base_followed_by_other_char_is_judged_against_same_target() {
        // "か" stays pending, then "こ" is compared with "が" and is wrong.
        let a = eval("がこ", "かこ", false);
        assert_eq!(
            a.input_states,
            vec![InputState::Pending, InputState::Wrong]
        );
        assert_eq!(a.wrong, set(&[0]));
        assert_eq!(a.progress, 1);
    }

    #[test]
    fn test_wrong_mark_after_base() {
        let a = eval("ば", "は゜", false);
        assert_eq!(a.wrong, set(&[0]));
        assert_eq!(a.progress, 1);
    }

    #[test]
    fn test_sentence_space_skip() {
        let target = "わたし は";
        let a = eval(target, "わたしは", true);
        assert_eq!(a.correct, set(&[0, 1, 2, 3, 4]));
        assert!(a.wrong.is_empty());
        assert_eq!(a.progress, target.chars().count());
    }

    #[test]
    fn test_space_typed_explicitly_still_matches() {
        let a = eval("わたし は", "わたし は", true);
        assert_eq!(a.progress, 5);
        assert!(a.wrong.is_empty());
    }

    #[test]
    fn test_trailing_target_spaces_resolved_when_skipping() {
        let a = eval("ね ", "ね", true);
        assert_eq!(a.progress, 2);
        assert!(a.is_complete(2));

        let a = eval("ね ", "ね", false);
        assert_eq!(a.progress, 1);
    }

    #[test]
    fn test_space_is_wrong_without_skip_policy() {
        let a = eval("わ た", "わた", false);
        assert_eq!(a.wrong, set(&[1]));
    }

    #[test]
    fn test_overflow_input_is_ignored() {
        let a = eval("ね", "ねこい", false);
        assert_eq!(a.progress, 1);
        assert_eq!(
            a.input_states,
            vec![InputState::Correct, InputState::Ignored, InputState::Ignored]
        );
        assert_eq!(a.input_to_target, vec![Some(0), None, None]);
    }

    #[test]
    fn test_empty_target_and_input() {
        let a = eval("", "", false);
        assert_eq!(a.progress, 0);
        assert!(a.is_complete(0));

        let a = eval("", "ね", false);
        assert_eq!(a.input_states, vec![InputState::Ignored]);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let cases = [
            ("がっこう", "か゛っこ", false),
            ("わたし は", "わたしは", true),
            ("ねこ", "ろこい", false),
        ];
        for (target, input, skip) in cases {
            assert_eq!(eval(target, input, skip), eval(target, input, skip));
        }
    }

    #[test]
    fn test_progress_is_monotonic_under_append() {
        let cases = [
            ("がっこう", "か゛っこう", false),
            ("ぱん", "はは゜ん", false),
            ("わたし は がくせい", "わたしはか゛くせい", true),
            ("ねこ", "ろろろ", false),
        ];
        for (target, input, skip) in cases {
            let target = chars(target);
            let input = chars(input);
            let mut last = 0;
            for end in 0..=input.len() {
                let progress = evaluate(&target, &input[..end], skip).progress;
                assert!(
                    progress >= last,
                    "progress regressed from {last} to {progress} at {end}"
                );
                last = progress;
            }
        }
    }

    #[test]
    fn test_max_input_len_counts_voiced_positions() {
        let target = chars("がっこうぱ");
        assert_eq!(composable_extra(&target), 2);
        assert_eq!(max_input_len(&target), 7);
    }

    #[test]
    fn test_clamp_input_keeps_result_stable() {
        let target = chars("ねこ");
        let input = chars("ねこいぬ");
        let clamped = clamp_input(&input, &target);
        assert_eq!(clamped.len(), 2);

        let full = evaluate(&target, &input, false);
        let truncated = evaluate(&target, clamped, false);
        assert_eq!(full.correct, truncated.correct);
        assert_eq!(full.wrong, truncated.wrong);
        assert_eq!(full.progress, truncated.progress);
        assert_eq!(&full.input_states[..2], &truncated.input_states[..]);
    }

    #[test]
    fn test_clamp_input_leaves_short_input_alone() {
        let target = chars("が");
        let input = chars("か゛");
        assert_eq!(clamp_input(&input, &target), &input[..]);
    }

    #[test]
    fn test_normalize_folds_combining_mark() {
        assert_eq!(normalize_input("か\u{3099}"), "が");
        assert_eq!(normalize_input("は\u{309A}"), "ぱ");
    }

    #[test]
    fn test_normalize_keeps_spacing_mark() {
        assert_eq!(normalize_input("か゛"), "か゛");
        assert_eq!(normalize_input("ねこ"), "ねこ");
    }
}
