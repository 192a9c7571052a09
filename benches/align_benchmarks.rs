use criterion::{Criterion, black_box, criterion_group, criterion_main};

use kanadr::engine::align::{evaluate, normalize_input};
use kanadr::session::round::TextRound;

const SENTENCE: &str = "きょうは とても いい てんきですね。がっこうの まえで ともだちに あいました。";

/// Typed text with one miss every seven kana and the voiced kana split into
/// base plus mark, the way mapped keyboards deliver them.
fn make_input(target: &[char]) -> Vec<char> {
    let mut input = Vec::with_capacity(target.len() * 2);
    for (i, &ch) in target.iter().enumerate() {
        if i % 7 == 3 {
            input.push('ろ');
            continue;
        }
        match ch {
            'が' => input.extend(['か', '゛']),
            'で' => input.extend(['て', '゛']),
            'だ' => input.extend(['た', '゛']),
            _ => input.push(ch),
        }
    }
    input
}

fn bench_evaluate(c: &mut Criterion) {
    let target: Vec<char> = SENTENCE.chars().collect();
    let input = make_input(&target);

    c.bench_function("evaluate (sentence, full input)", |b| {
        b.iter(|| evaluate(black_box(&target), black_box(&input), false))
    });

    let long_target: Vec<char> = SENTENCE.repeat(8).chars().collect();
    let long_input = make_input(&long_target);
    c.bench_function("evaluate (8 sentences, skip spaces)", |b| {
        b.iter(|| evaluate(black_box(&long_target), black_box(&long_input), true))
    });
}

fn bench_normalize(c: &mut Criterion) {
    let raw: String = make_input(&SENTENCE.chars().collect::<Vec<_>>())
        .into_iter()
        .map(|ch| if ch == '゛' { '\u{3099}' } else { ch })
        .collect();

    c.bench_function("normalize_input (combining marks)", |b| {
        b.iter(|| normalize_input(black_box(&raw)))
    });
}

fn bench_typing_round(c: &mut Criterion) {
    let target: Vec<char> = SENTENCE.chars().collect();
    let input = make_input(&target);

    // Re-evaluates the whole buffer on every keystroke.
    c.bench_function("TextRound push_char (whole sentence)", |b| {
        b.iter(|| {
            let mut round = TextRound::new(SENTENCE, false);
            for &ch in &input {
                round.push_char(black_box(ch));
            }
            round
        })
    });
}

criterion_group!(benches, bench_evaluate, bench_normalize, bench_typing_round);
criterion_main!(benches);
