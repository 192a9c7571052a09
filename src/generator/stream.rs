use rand::Rng;
use rand::seq::SliceRandom;

/// `len` kana drawn uniformly (with repetition) from `pool`.
pub fn kana_stream<R: Rng + ?Sized>(pool: &[char], len: usize, rng: &mut R) -> String {
    if pool.is_empty() {
        return String::new();
    }
    (0..len).filter_map(|_| pool.choose(rng).copied()).collect()
}

/// A nonsense "word" of 2..=`max_len` pool kana.
pub fn random_word<R: Rng + ?Sized>(pool: &[char], max_len: usize, rng: &mut R) -> String {
    let max_len = max_len.max(2);
    let len = rng.gen_range(2..=max_len);
    kana_stream(pool, len, rng)
}
