use chrono::{Days, NaiveDate};
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use std::fmt;
use uuid::Uuid;

const ASCII_LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Upper bound for unbounded regex repetitions (`*`, `+`, `{n,}`)
const MAX_REPEAT: u32 = 10;

/// Seeded source of every random draw made while generating documents.
///
/// Two randomizers built from the same seed produce the same stream of values.
pub struct Randomizer {
    rng: XorShiftRng,
    seed: u64,
}

impl fmt::Debug for Randomizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Randomizer").field("seed", &self.seed).finish()
    }
}

impl Randomizer {
    /// Create a randomizer; without a seed one is drawn from the thread rng.
    pub fn new(seed: Option<u64>) -> Randomizer {
        let seed = seed.unwrap_or_else(rand::random::<u64>);
        tracing::debug!("Using random seed {}", seed);

        Randomizer {
            rng: XorShiftRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub(crate) fn rng(&mut self) -> &mut XorShiftRng {
        &mut self.rng
    }

    /// Uniform draw from `[0, 1)`.
    pub fn probability(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Uniform integer in `[min, max]`; reversed bounds are swapped.
    pub fn integer(&mut self, min: i64, max: i64) -> i64 {
        let (low, high) = if min <= max { (min, max) } else { (max, min) };
        self.rng.random_range(low..=high)
    }

    /// Uniform `usize` in `[min, max]`; reversed bounds are swapped.
    pub fn count(&mut self, min: usize, max: usize) -> usize {
        let (low, high) = if min <= max { (min, max) } else { (max, min) };
        self.rng.random_range(low..=high)
    }

    pub fn boolean(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }

    pub fn choose<'a, T>(&mut self, options: &'a [T]) -> Option<&'a T> {
        options.choose(&mut self.rng)
    }

    pub fn bytes(&mut self, length: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; length];
        self.rng.fill(bytes.as_mut_slice());
        bytes
    }

    /// String of ASCII letters with a length drawn from `[min, max]`.
    ///
    /// Missing bounds default to 1 and 20, and the maximum is capped at 50
    /// unless the minimum itself is larger.
    pub fn ascii_string(&mut self, min_length: Option<usize>, max_length: Option<usize>) -> String {
        let min_length = min_length.unwrap_or(1);
        let max_length = match max_length {
            Some(max) if max >= min_length => max,
            _ => min_length.max(20),
        };
        let max_length = max_length.min(min_length.max(50));

        let length = self.count(min_length, max_length);
        (0..length)
            .map(|_| ASCII_LETTERS[self.rng.random_range(0..ASCII_LETTERS.len())] as char)
            .collect()
    }

    /// Sample a string matching the regular expression `pattern`.
    pub fn regex(&mut self, pattern: &str) -> Result<String, rand_regex::Error> {
        let regex = rand_regex::Regex::compile(pattern, MAX_REPEAT)?;
        Ok(self.rng.sample::<String, _>(&regex))
    }

    /// Random version 4 UUID, drawn from the seeded stream.
    pub fn uuid(&mut self) -> String {
        let mut bytes = [0u8; 16];
        self.rng.fill(&mut bytes);

        bytes[6] = (bytes[6] & 0x0f) | 0x40;
        bytes[8] = (bytes[8] & 0x3f) | 0x80;

        Uuid::from_bytes(bytes).to_string()
    }

    /// Uniform date in `[from, until]`.
    pub fn random_date(&mut self, from: NaiveDate, until: NaiveDate) -> NaiveDate {
        let (from, until) = if from <= until { (from, until) } else { (until, from) };
        let span = (until - from).num_days();
        let offset = self.rng.random_range(0..=span);

        from.checked_add_days(Days::new(offset.unsigned_abs()))
            .unwrap_or(until)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut first = Randomizer::new(Some(42));
        let mut second = Randomizer::new(Some(42));

        for _ in 0..20 {
            assert_eq!(first.integer(-1000, 1000), second.integer(-1000, 1000));
        }
        assert_eq!(first.ascii_string(None, None), second.ascii_string(None, None));
        assert_eq!(first.uuid(), second.uuid());
    }

    #[test]
    fn test_integer_bounds() {
        let mut randomizer = Randomizer::new(Some(1));
        for _ in 0..200 {
            let value = randomizer.integer(5, -5);
            assert!((-5..=5).contains(&value));
        }
        assert_eq!(randomizer.integer(7, 7), 7);
    }

    #[test]
    fn test_ascii_string_lengths() {
        let mut randomizer = Randomizer::new(Some(2));
        for _ in 0..100 {
            let value = randomizer.ascii_string(None, None);
            assert!((1..=20).contains(&value.len()));
            assert!(value.chars().all(|ch| ch.is_ascii_alphabetic()));

            let capped = randomizer.ascii_string(Some(30), Some(500));
            assert!((30..=50).contains(&capped.len()));

            let exact = randomizer.ascii_string(Some(8), Some(8));
            assert_eq!(exact.len(), 8);
        }

        let long = randomizer.ascii_string(Some(60), None);
        assert_eq!(long.len(), 60);
    }

    #[test]
    fn test_regex_sample() {
        let mut randomizer = Randomizer::new(Some(3));
        let matcher = regex::Regex::new("^[A-Z]{2}[0-9]{3}$").unwrap();
        for _ in 0..50 {
            let value = randomizer.regex("[A-Z]{2}[0-9]{3}").unwrap();
            assert!(matcher.is_match(&value), "{}", value);
        }

        assert!(randomizer.regex("[unclosed").is_err());
    }

    #[test]
    fn test_uuid_version() {
        let mut randomizer = Randomizer::new(Some(4));
        let value = Uuid::parse_str(&randomizer.uuid()).unwrap();
        assert_eq!(value.get_version_num(), 4);
        assert_ne!(randomizer.uuid(), randomizer.uuid());
    }

    #[test]
    fn test_random_date_range() {
        let mut randomizer = Randomizer::new(Some(5));
        let from = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let until = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
        for _ in 0..100 {
            let date = randomizer.random_date(from, until);
            assert!(date >= from && date <= until);
        }
        assert_eq!(randomizer.random_date(from, from), from);
    }
}
