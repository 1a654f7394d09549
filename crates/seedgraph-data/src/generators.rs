//! Scalar generators: words, sentences, passwords and dates
//!
//! All generators draw from the caller's RNG so seeded runs are reproducible.

use chrono::{Duration, Local, Months, NaiveDate, NaiveDateTime};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

const VOWELS: &[u8] = b"aeiou";
const CONSONANTS: &[u8] = b"bcdfghjklmnprstvwz";
const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
// ASCII 33..=47
const PUNCTUATION: &[u8] = b"!\"#$%&'()*+,-./";

fn pick(rng: &mut dyn RngCore, alphabet: &[u8]) -> char {
    char::from(alphabet[rng.random_range(0..alphabet.len())])
}

/// Pronounceable lowercase word of `len` letters
///
/// Alternates consonants and vowels, starting with either.
#[must_use]
pub fn word(rng: &mut dyn RngCore, len: usize) -> String {
    let mut vowel = rng.random_bool(0.5);
    (0..len)
        .map(|_| {
            let c = pick(rng, if vowel { VOWELS } else { CONSONANTS });
            vowel = !vowel;
            c
        })
        .collect()
}

fn words(rng: &mut dyn RngCore, count: usize) -> String {
    let mut out = String::new();
    for i in 0..count {
        if i > 0 {
            out.push(' ');
        }
        let len = rng.random_range(3..10);
        out.push_str(&word(rng, len));
    }
    out
}

/// Sentence of 7 to 19 words
#[must_use]
pub fn sentence(rng: &mut dyn RngCore) -> String {
    let count = rng.random_range(7..20);
    words(rng, count)
}

/// Paragraph of 20 to 29 words
#[must_use]
pub fn paragraph(rng: &mut dyn RngCore) -> String {
    let count = rng.random_range(20..30);
    words(rng, count)
}

/// 16-character alphanumeric password
#[must_use]
pub fn password(rng: &mut dyn RngCore) -> String {
    (0..16).map(|_| pick(rng, ALPHANUMERIC)).collect()
}

/// Password with guaranteed character classes
///
/// Two each of upper, lower, digit, punctuation and alphanumeric, shuffled.
#[must_use]
pub fn secure_password(rng: &mut dyn RngCore) -> String {
    let mut chars = Vec::with_capacity(10);
    for alphabet in [UPPER, LOWER, DIGITS, PUNCTUATION, ALPHANUMERIC] {
        chars.push(pick(rng, alphabet));
        chars.push(pick(rng, alphabet));
    }
    chars.shuffle(rng);
    chars.into_iter().collect()
}

/// Uniform date in `[start, end]`
#[must_use]
pub fn date_between(rng: &mut dyn RngCore, start: NaiveDate, end: NaiveDate) -> NaiveDate {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    let days = (end - start).num_days();
    start + Duration::days(rng.random_range(0..=days))
}

/// Date between 1970-01-01 and `today`
#[must_use]
pub fn past_date(rng: &mut dyn RngCore, today: NaiveDate) -> NaiveDate {
    date_between(rng, NaiveDate::default(), today)
}

/// Date between `today` and twenty years later
#[must_use]
pub fn future_date(rng: &mut dyn RngCore, today: NaiveDate) -> NaiveDate {
    let end = today.checked_add_months(Months::new(240)).unwrap_or(today);
    date_between(rng, today, end)
}

/// Date within twenty years either side of `today`
#[must_use]
pub fn any_date(rng: &mut dyn RngCore, today: NaiveDate) -> NaiveDate {
    let start = today.checked_sub_months(Months::new(240)).unwrap_or(today);
    let end = today.checked_add_months(Months::new(240)).unwrap_or(today);
    date_between(rng, start, end)
}

/// `now` shifted by -10 to +14 whole years of 365 days
#[must_use]
pub fn date_time_near(rng: &mut dyn RngCore, now: NaiveDateTime) -> NaiveDateTime {
    let years: i64 = rng.random_range(-10..15);
    now + Duration::days(years * 365)
}

/// Current local date
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Current local date-time
#[must_use]
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn sentence_and_paragraph_word_counts() {
        let mut rng = rng();
        for _ in 0..200 {
            let s = sentence(&mut rng);
            let n = s.split(' ').count();
            assert!((7..20).contains(&n), "{n} words");
            assert!(s.split(' ').all(|w| (3..10).contains(&w.len())));

            let p = paragraph(&mut rng);
            assert!((20..30).contains(&p.split(' ').count()));
        }
    }

    #[test]
    fn password_shapes() {
        let mut rng = rng();
        let p = password(&mut rng);
        assert_eq!(p.len(), 16);
        assert!(p.chars().all(|c| c.is_ascii_alphanumeric()));

        for _ in 0..100 {
            let s = secure_password(&mut rng);
            assert_eq!(s.len(), 10);
            assert!(s.chars().filter(char::is_ascii_uppercase).count() >= 2);
            assert!(s.chars().filter(char::is_ascii_lowercase).count() >= 2);
            assert!(s.chars().filter(char::is_ascii_digit).count() >= 2);
            assert!(s.chars().filter(char::is_ascii_punctuation).count() >= 2);
        }
    }

    #[test]
    fn dates_stay_in_bounds() {
        let mut rng = rng();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        let horizon = NaiveDate::from_ymd_opt(2044, 6, 1).unwrap();
        for _ in 0..500 {
            let past = past_date(&mut rng, today);
            assert!(past >= epoch && past <= today);
            let future = future_date(&mut rng, today);
            assert!(future >= today && future <= horizon);
        }
    }

    #[test]
    fn date_time_shift_is_whole_years() {
        let mut rng = rng();
        let now = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        for _ in 0..100 {
            let shifted = date_time_near(&mut rng, now);
            let days = (shifted - now).num_days();
            assert_eq!(days % 365, 0);
            assert!((-3650..=14 * 365).contains(&days));
        }
    }
}
