use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_SHAPE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref LOCAL_PART_CHARS: Regex = Regex::new(r"^[a-zA-Z0-9._%+-]+$").unwrap();
    static ref USERNAME_CHARS: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

const ALLOWED_DOMAIN_SUFFIXES: [&str; 9] = [
    ".com", ".co", ".net", ".org", ".edu", ".gov", ".io", ".info", ".biz",
];

const KEYBOARD_SEQUENCES: [&str; 12] = [
    "qwerty", "asdfgh", "zxcvbn", "123456", "qwer", "asdf", "zxcv", "1234", "5678", "poiu",
    "lkjh", "mnbv",
];

const VOWELS: &str = "aeiouAEIOU";
const SEPARATORS: &str = "_-";
const PASSWORD_SPECIALS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

const MAX_CONSONANT_RUN: usize = 4;
const MAX_SEPARATOR_RUN: usize = 2;

/// Checks an email candidate rule by rule and returns the first failing
/// rule's message, or `None` when the address is acceptable.
pub fn classify_email(candidate: &str) -> Option<&'static str> {
    if candidate.is_empty() {
        return Some("Email is required");
    }
    if !EMAIL_SHAPE.is_match(candidate) {
        return Some("Invalid email format");
    }
    let Some((local, domain)) = candidate.split_once('@') else {
        return Some("Invalid email format");
    };
    if local.chars().count() < 3 {
        return Some("Email must have at least 3 characters before the @");
    }
    if has_repeated_run(local) {
        return Some("Email cannot repeat the same character three times in a row");
    }
    if !ALLOWED_DOMAIN_SUFFIXES
        .iter()
        .any(|suffix| domain.ends_with(suffix))
    {
        return Some("Email domain is not allowed");
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.last().map_or(true, |label| label.len() < 2) {
        return Some("Email domain is incomplete");
    }
    if !LOCAL_PART_CHARS.is_match(local) {
        return Some("Email contains invalid characters");
    }
    if local.starts_with(['.', '-']) || local.ends_with(['.', '-']) {
        return Some("Email cannot start or end with . or -");
    }
    if local.contains("..") {
        return Some("Email cannot contain consecutive dots");
    }
    None
}

/// Checks a username candidate rule by rule, first failing rule wins.
pub fn classify_username(candidate: &str) -> Option<&'static str> {
    if candidate.is_empty() {
        return Some("Username is required");
    }
    let length = candidate.chars().count();
    if length < 3 {
        return Some("Username must have at least 3 characters");
    }
    if length > 20 {
        return Some("Username cannot exceed 20 characters");
    }
    if !USERNAME_CHARS.is_match(candidate) {
        return Some("Username may only contain letters, numbers, hyphens and underscores");
    }
    if has_repeated_run(candidate) {
        return Some("Username cannot repeat the same character three times in a row");
    }
    if has_keyboard_sequence(candidate) {
        return Some("Username looks like an obvious keyboard pattern");
    }
    if has_long_consonant_run(candidate) {
        return Some("Username has too many consonants in a row");
    }
    if has_repeating_block(candidate) {
        return Some("Username has a repetitive pattern");
    }
    if has_separator_run(candidate) {
        return Some("Username has too many special characters in a row");
    }
    None
}

/// Password gate: minimum length, then at least one uppercase letter AND one
/// special character. Lowercase letters are not required.
pub fn classify_password(candidate: &str) -> Option<&'static str> {
    if candidate.chars().count() < 6 {
        return Some("Password must have at least 6 characters");
    }
    let has_uppercase = candidate.chars().any(|c| c.is_ascii_uppercase());
    let has_special = candidate.chars().any(|c| PASSWORD_SPECIALS.contains(c));
    if !has_uppercase || !has_special {
        return Some("Password must contain at least one uppercase letter and one special character");
    }
    None
}

// The `regex` crate has no backreferences, so the run and block detectors
// below are linear scans rather than the `(.)\1\1`-style patterns one might
// reach for.

fn has_repeated_run(text: &str) -> bool {
    let mut previous = None;
    let mut run = 0;
    for c in text.chars() {
        if Some(c) == previous {
            run += 1;
            if run >= 3 {
                return true;
            }
        } else {
            previous = Some(c);
            run = 1;
        }
    }
    false
}

fn has_keyboard_sequence(text: &str) -> bool {
    let lower = text.to_lowercase();
    KEYBOARD_SEQUENCES.iter().any(|seq| lower.contains(seq))
}

/// A run of more than `MAX_CONSONANT_RUN` consonant letters. Vowels and
/// non-letters reset the run.
fn has_long_consonant_run(text: &str) -> bool {
    let mut run = 0;
    for c in text.chars() {
        if VOWELS.contains(c) {
            run = 0;
        } else if c.is_ascii_alphabetic() {
            run += 1;
            if run > MAX_CONSONANT_RUN {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// Leading block of length 2..=len/2 that the remainder starts by repeating,
/// e.g. "abab", "abcabc", "12121212". Scans block lengths ascending.
fn has_repeating_block(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < 4 {
        return false;
    }
    for block in 2..=chars.len() / 2 {
        if chars[block..].starts_with(&chars[..block]) {
            return true;
        }
    }
    false
}

fn has_separator_run(text: &str) -> bool {
    let mut run = 0;
    for c in text.chars() {
        if SEPARATORS.contains(c) {
            run += 1;
            if run > MAX_SEPARATOR_RUN {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}
