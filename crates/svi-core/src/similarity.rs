//! String similarity heuristic
//!
//! The resolver only depends on [`Similarity`]; [`SimilarText`] is the
//! default and reproduces PHP's `similar_text` percentage so thresholds
//! tuned against existing stores keep their meaning.

/// Symmetric percentage similarity between two keys
pub trait Similarity: Send + Sync {
    /// Score in `0.0..=100.0`
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Longest-common-substring percentage (`similar_text`)
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarText;

impl Similarity for SimilarText {
    #[inline]
    fn score(&self, a: &str, b: &str) -> f64 {
        similar_text_percent(a, b)
    }
}

impl<T: Similarity + ?Sized> Similarity for std::sync::Arc<T> {
    #[inline]
    fn score(&self, a: &str, b: &str) -> f64 {
        (**self).score(a, b)
    }
}

/// Number of matching bytes between `a` and `b`
#[must_use]
pub fn similar_text(a: &str, b: &str) -> usize {
    similar_bytes(a.as_bytes(), b.as_bytes())
}

/// Matching bytes as a percentage of the combined length
#[must_use]
pub fn similar_text_percent(a: &str, b: &str) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    (similar_text(a, b) * 2) as f64 * 100.0 / total as f64
}

struct CommonRun {
    pos_a: usize,
    pos_b: usize,
    len: usize,
    improvements: usize,
}

/// First longest common run; `improvements` counts how often the best grew.
fn longest_common_run(a: &[u8], b: &[u8]) -> CommonRun {
    let mut best = CommonRun {
        pos_a: 0,
        pos_b: 0,
        len: 0,
        improvements: 0,
    };
    for p in 0..a.len() {
        for q in 0..b.len() {
            let len = a[p..]
                .iter()
                .zip(&b[q..])
                .take_while(|(x, y)| x == y)
                .count();
            if len > best.len {
                best.len = len;
                best.pos_a = p;
                best.pos_b = q;
                best.improvements += 1;
            }
        }
    }
    best
}

fn similar_bytes(a: &[u8], b: &[u8]) -> usize {
    let run = longest_common_run(a, b);
    if run.len == 0 {
        return 0;
    }

    let mut sum = run.len;
    if run.pos_a > 0 && run.pos_b > 0 && run.improvements > 1 {
        sum += similar_bytes(&a[..run.pos_a], &b[..run.pos_b]);
    }
    let end_a = run.pos_a + run.len;
    let end_b = run.pos_b + run.len;
    if end_a < a.len() && end_b < b.len() {
        sum += similar_bytes(&a[end_a..], &b[end_b..]);
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identical_strings_score_100() {
        assert!(approx(similar_text_percent("red", "red"), 100.0));
    }

    #[test]
    fn empty_strings_score_zero() {
        assert!(approx(similar_text_percent("", ""), 0.0));
        assert!(approx(similar_text_percent("red", ""), 0.0));
    }

    #[test]
    fn known_php_values() {
        // similar_text("World", "Word") == 4
        assert_eq!(similar_text("World", "Word"), 4);
        assert!(approx(similar_text_percent("red", "red_svipro_large"), 600.0 / 19.0));
    }

    #[test]
    fn score_is_symmetric_for_slug_pairs() {
        let pairs = [("blue", "bleu"), ("large", "x-large"), ("dark-red", "red")];
        for (a, b) in pairs {
            assert!(approx(similar_text_percent(a, b), similar_text_percent(b, a)));
        }
    }

    struct Constant(f64);

    impl Similarity for Constant {
        fn score(&self, _: &str, _: &str) -> f64 {
            self.0
        }
    }

    #[test]
    fn shared_similarities_delegate() {
        let shared: std::sync::Arc<dyn Similarity> = std::sync::Arc::new(Constant(50.0));
        assert!(approx(shared.score("a", "b"), 50.0));
        assert!(approx(SimilarText.score("abc", "abc"), 100.0));
    }
}
