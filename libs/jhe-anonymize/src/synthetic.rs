//! Synthetic demographics

use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;

/// Constant stand-in for any real phone number.
pub const PLACEHOLDER_PHONE: &str = "(510) 555-1234";

pub const EMAIL_DOMAIN: &str = "example.edu";

/// ISO calendar date format used by the Exchange.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const FIRST_NAMES: &[&str] = &[
    "Aaliyah", "Adrian", "Alicia", "Andre", "Beatriz", "Brandon", "Carmen", "Chloe", "Daniel",
    "Deborah", "Elena", "Emeka", "Farah", "Gabriel", "Grace", "Hannah", "Hiroshi", "Imani",
    "Isaac", "Jasmine", "Jorge", "Kavya", "Kevin", "Laura", "Lucas", "Maya", "Mohammed",
    "Nadia", "Noah", "Olivia", "Omar", "Priya", "Rafael", "Rosa", "Samuel", "Sofia", "Tariq",
    "Thomas", "Valentina", "Wei", "Yara", "Zoe",
];

const LAST_NAMES: &[&str] = &[
    "Adams", "Alvarez", "Bailey", "Bennett", "Chen", "Clarke", "Diaz", "Edwards", "Evans",
    "Fischer", "Garcia", "Gupta", "Hall", "Hernandez", "Ibrahim", "Jackson", "Johnson", "Kim",
    "Kowalski", "Lee", "Lopez", "Martin", "Mendoza", "Nguyen", "Okafor", "Ortiz", "Patel",
    "Perez", "Quinn", "Reyes", "Robinson", "Sanchez", "Singh", "Tanaka", "Taylor", "Usman",
    "Vasquez", "Walker", "Wright", "Xu", "Young", "Zhang",
];

pub fn first_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    pick(FIRST_NAMES, rng)
}

pub fn last_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    pick(LAST_NAMES, rng)
}

fn pick<R: Rng + ?Sized>(names: &[&str], rng: &mut R) -> String {
    names.choose(rng).copied().unwrap_or_default().to_string()
}

/// `first.last@example.edu`, lower-cased.
pub fn email(first: &str, last: &str) -> String {
    format!("{first}.{last}@{EMAIL_DOMAIN}").to_lowercase()
}

/// Earliest and latest synthetic birth dates, inclusive.
pub fn birth_date_bounds() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(1950, 1, 1).expect("valid calendar date"),
        NaiveDate::from_ymd_opt(2005, 1, 1).expect("valid calendar date"),
    )
}

/// Uniformly random date within [`birth_date_bounds`].
pub fn birth_date<R: Rng + ?Sized>(rng: &mut R) -> NaiveDate {
    let (earliest, latest) = birth_date_bounds();
    let span = (latest - earliest).num_days();
    earliest + Duration::days(rng.gen_range(0..=span))
}
