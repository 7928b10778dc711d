use crate::models::{Candidate, RawCandidate, Role};
use std::collections::BTreeSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize a raw candidate record
///
/// Free-text fields become token sets, list fields become tag sets and
/// admins are folded into the mentor role. Missing data always becomes an
/// empty set, never an error.
pub fn normalize_candidate(raw: RawCandidate) -> Candidate {
    Candidate {
        role: Role::from(raw.role),
        course: raw.course,
        city: normalize_city(raw.city.as_deref()),
        pronouns: normalize_tags(raw.pronouns.as_deref()),
        ethnicity: normalize_tags(raw.ethnicity.as_deref()),
        lgbt: normalize_tags(raw.lgbt.as_deref()),
        hobby: tokenize(raw.hobby.as_deref()),
        music: tokenize(raw.music.as_deref()),
        games: tokenize(raw.games.as_deref()),
        sports: tokenize(raw.sports.as_deref()),
        party_frequency: raw.parties,
        assigned: raw.assigned.unwrap_or(0),
        id: raw.id,
    }
}

/// Lower-case and strip diacritics ("São" -> "sao")
#[inline]
pub fn fold(text: &str) -> String {
    text.nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Split free text into folded tokens on any non-alphanumeric character
pub fn tokenize(text: Option<&str>) -> BTreeSet<String> {
    let Some(text) = text else {
        return BTreeSet::new();
    };

    fold(text)
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Canonical city string: folded tokens joined by single spaces
pub fn normalize_city(city: Option<&str>) -> String {
    let Some(city) = city else {
        return String::new();
    };

    fold(city)
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fold each tag as a whole, collapsing inner whitespace and dropping blanks
pub fn normalize_tags(tags: Option<&[String]>) -> BTreeSet<String> {
    tags.unwrap_or_default()
        .iter()
        .map(|tag| fold(tag).split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|tag| !tag.is_empty())
        .collect()
}
