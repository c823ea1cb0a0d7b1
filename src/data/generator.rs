// ============================================================
// Layer 4 — Record Generator
// ============================================================
// Produces one synthetic labelled record per call:
//
//   with probability p      → a name drawn uniformly from the
//                             category set           (flag = true)
//   with probability 1 - p  → 4..=34 characters drawn uniformly
//                             from [a-zA-Z0-9]       (flag = false)
//
// The random source is a parameter, so a seeded RNG gives a
// reproducible stream of records.

use rand::Rng;

use crate::domain::{
    categories::CategorySet,
    error::{PipelineError, PipelineResult},
    record::Record,
};

/// Default chance that a record is a category member.
pub const POSITIVE_PROBABILITY: f64 = 0.4;

/// Inclusive length bounds for noise strings.
pub const MIN_NOISE_LEN: usize = 4;
pub const MAX_NOISE_LEN: usize = 34;

/// Lower-case letters, upper-case letters, then digits (62 symbols).
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone)]
pub struct RecordGenerator {
    categories: CategorySet,
    positive_probability: f64,
}

impl RecordGenerator {
    pub fn new(categories: CategorySet) -> Self {
        Self {
            categories,
            positive_probability: POSITIVE_PROBABILITY,
        }
    }

    /// Override the member probability. Must lie in [0, 1].
    pub fn with_positive_probability(mut self, p: f64) -> PipelineResult<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(PipelineError::Configuration(format!(
                "positive probability must be within [0, 1], got {p}"
            )));
        }
        self.positive_probability = p;
        Ok(self)
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    /// Draw one record from `rng`.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Record {
        if rng.gen_bool(self.positive_probability) {
            let members = self.categories.as_slice();
            let name = &members[rng.gen_range(0..members.len())];
            Record::from_value(name.as_str(), true)
        } else {
            Record::from_value(noise(rng), false)
        }
    }
}

fn noise<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.gen_range(MIN_NOISE_LEN..=MAX_NOISE_LEN);
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn small_generator() -> RecordGenerator {
        RecordGenerator::new(CategorySet::new(["pug", "husky"]).unwrap())
    }

    #[test]
    fn test_content_matches_value() {
        let gen = RecordGenerator::new(CategorySet::breeds());
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let r = gen.generate(&mut rng);
            assert_eq!(r.content.len(), r.value.chars().count());
            for (code, ch) in r.content.iter().zip(r.value.chars()) {
                assert_eq!(*code, ch as u32);
            }
        }
    }

    #[test]
    fn test_negative_records_are_alphanumeric_noise() {
        let gen = small_generator();
        let mut rng = StdRng::seed_from_u64(11);
        let negatives: Vec<Record> = (0..500)
            .map(|_| gen.generate(&mut rng))
            .filter(|r| !r.flag)
            .collect();
        assert!(!negatives.is_empty());
        for r in negatives {
            assert!((MIN_NOISE_LEN..=MAX_NOISE_LEN).contains(&r.value.len()));
            assert!(r.value.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_positive_records_come_from_category_set() {
        let gen = small_generator();
        let mut rng = StdRng::seed_from_u64(3);
        let positives: Vec<Record> = (0..200)
            .map(|_| gen.generate(&mut rng))
            .filter(|r| r.flag)
            .collect();
        assert!(!positives.is_empty());
        assert!(positives.iter().all(|r| gen.categories().contains(&r.value)));
    }

    #[test]
    fn test_seeded_stream_is_frozen() {
        // ChaCha8Rng output is stable across releases, unlike StdRng
        let gen = small_generator();
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let stream: Vec<(String, bool)> = (0..10)
            .map(|_| {
                let r = gen.generate(&mut rng);
                (r.value, r.flag)
            })
            .collect();

        let expected = [
            ("husky", true),
            ("EctE06NWAQCSBK8rQ7Y2sGhC3", false),
            ("XOMJ0H", false),
            ("husky", true),
            ("MUCajJo95czlOrRz3plfrtTeR6V4M", false),
            ("OF97QVn", false),
            ("XVqXJDPo6OE0YM1qAhP41xpt7pfGS", false),
            ("ID0T0", false),
            ("4wEShBMGrSlcNcXWFuLD8fC", false),
            ("LShrWt8ZKPY1lKxfaqosyX17kmtdd", false),
        ];
        let expected: Vec<(String, bool)> =
            expected.iter().map(|(v, f)| (v.to_string(), *f)).collect();
        assert_eq!(stream, expected);
    }

    #[test]
    fn test_all_zero_rng_picks_first_member_and_shortest_noise() {
        // Every draw of 0 selects the low end of each range
        let mut rng = rand::rngs::mock::StepRng::new(0, 0);
        let member = small_generator().generate(&mut rng);
        assert_eq!((member.value.as_str(), member.flag), ("pug", true));

        let noise = small_generator()
            .with_positive_probability(0.0)
            .unwrap()
            .generate(&mut rng);
        assert_eq!((noise.value.as_str(), noise.flag), ("aaaa", false));
    }

    #[test]
    fn test_positive_rate_near_probability() {
        let gen = small_generator();
        let mut rng = StdRng::seed_from_u64(99);
        let n = 5_000;
        let positives = (0..n).filter(|_| gen.generate(&mut rng).flag).count();
        let rate = positives as f64 / n as f64;
        assert!((rate - POSITIVE_PROBABILITY).abs() < 0.03, "rate = {rate}");
    }

    #[test]
    fn test_probability_extremes() {
        let mut rng = StdRng::seed_from_u64(5);
        let always = small_generator().with_positive_probability(1.0).unwrap();
        assert!((0..50).all(|_| always.generate(&mut rng).flag));
        let never = small_generator().with_positive_probability(0.0).unwrap();
        assert!((0..50).all(|_| !never.generate(&mut rng).flag));
    }

    #[test]
    fn test_invalid_probability_rejected() {
        for p in [f64::NAN, f64::INFINITY, -0.1, 1.5] {
            assert!(
                matches!(
                    small_generator().with_positive_probability(p),
                    Err(PipelineError::Configuration(_))
                ),
                "p = {p}"
            );
        }
    }
}
