use crate::core::solver::ScoreMatrix;
use crate::models::{Candidate, ScoringWeights};
use std::collections::BTreeSet;

/// Per-attribute similarity terms, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubScores {
    pub course: f64,
    pub city: f64,
    pub pronouns: f64,
    pub ethnicity: f64,
    pub lgbt: f64,
    pub hobby: f64,
    pub music: f64,
    pub games: f64,
    pub sports: f64,
    pub parties: f64,
}

impl SubScores {
    /// Weighted sum of all terms
    pub fn weighted(&self, weights: &ScoringWeights) -> f64 {
        self.course * weights.course
            + self.city * weights.city
            + self.pronouns * weights.pronouns
            + self.ethnicity * weights.ethnicity
            + self.lgbt * weights.lgbt
            + self.hobby * weights.hobby
            + self.music * weights.music
            + self.games * weights.games
            + self.sports * weights.sports
            + self.parties * weights.parties
    }
}

/// Compute every sub-score for a mentee/mentor pair
///
/// The terms are symmetric: swapping the arguments gives the same result.
pub fn sub_scores(mentee: &Candidate, mentor: &Candidate, party_scale: u8) -> SubScores {
    SubScores {
        course: exact_match(mentee.course.as_ref(), mentor.course.as_ref()),
        city: exact_match(non_empty(&mentee.city), non_empty(&mentor.city)),
        pronouns: jaccard(&mentee.pronouns, &mentor.pronouns),
        ethnicity: jaccard(&mentee.ethnicity, &mentor.ethnicity),
        lgbt: jaccard(&mentee.lgbt, &mentor.lgbt),
        hobby: jaccard(&mentee.hobby, &mentor.hobby),
        music: jaccard(&mentee.music, &mentor.music),
        games: jaccard(&mentee.games, &mentor.games),
        sports: jaccard(&mentee.sports, &mentor.sports),
        parties: party_closeness(mentee.party_frequency, mentor.party_frequency, party_scale),
    }
}

/// Compatibility score (>= 0) of a mentee with a mentor
///
/// score = course_match * w.course
///       + city_match * w.city
///       + Σ jaccard(set) * w.set        (pronouns, ethnicity, lgbt, hobby, music, games, sports)
///       + party_closeness * w.parties
pub fn calculate_compatibility(
    mentee: &Candidate,
    mentor: &Candidate,
    weights: &ScoringWeights,
    party_scale: u8,
) -> f64 {
    sub_scores(mentee, mentor, party_scale).weighted(weights).max(0.0)
}

/// Dense mentee x mentor score matrix
///
/// A candidate listed in both pools is never paired with itself; that cell
/// is left empty.
pub fn build_score_matrix(
    mentees: &[Candidate],
    mentors: &[Candidate],
    weights: &ScoringWeights,
    party_scale: u8,
) -> ScoreMatrix {
    let mut matrix = ScoreMatrix::new(mentees.len(), mentors.len());
    for (i, mentee) in mentees.iter().enumerate() {
        for (j, mentor) in mentors.iter().enumerate() {
            if mentee.id == mentor.id {
                continue;
            }
            matrix.set(i, j, Some(calculate_compatibility(mentee, mentor, weights, party_scale)));
        }
    }
    matrix
}

/// Jaccard similarity, 0 when both sets are empty
#[inline]
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// 1 when both values are present and equal
#[inline]
fn exact_match<T: PartialEq + ?Sized>(a: Option<&T>, b: Option<&T>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) if a == b => 1.0,
        _ => 0.0,
    }
}

#[inline]
fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// 1 - |Δ| / scale, clipped to [0, 1]; 0 when either side is unknown
#[inline]
fn party_closeness(a: Option<u8>, b: Option<u8>, scale: u8) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return 0.0;
    };
    if scale == 0 {
        return if a == b { 1.0 } else { 0.0 };
    }
    let delta = (a as f64 - b as f64).abs();
    (1.0 - delta / scale as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalize::normalize_candidate;
    use crate::models::{Course, RawCandidate, RawRole};

    fn create_candidate(
        id: &str,
        role: RawRole,
        course: Course,
        city: &str,
        hobby: &str,
    ) -> Candidate {
        normalize_candidate(RawCandidate {
            id: id.to_string(),
            role,
            course: Some(course),
            city: Some(city.to_string()),
            hobby: Some(hobby.to_string()),
            ..RawCandidate::default()
        })
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_jaccard() {
        assert_eq!(jaccard(&set(&[]), &set(&[])), 0.0);
        assert_eq!(jaccard(&set(&["a", "b"]), &set(&["a", "b"])), 1.0);
        assert_eq!(jaccard(&set(&["a", "b"]), &set(&["b", "c"])), 1.0 / 3.0);
        assert_eq!(jaccard(&set(&["a"]), &set(&[])), 0.0);
    }

    #[test]
    fn test_party_closeness() {
        assert_eq!(party_closeness(Some(5), Some(5), 10), 1.0);
        assert_eq!(party_closeness(Some(0), Some(10), 10), 0.0);
        assert!((party_closeness(Some(2), Some(5), 10) - 0.7).abs() < 1e-12);
        assert_eq!(party_closeness(Some(0), Some(200), 10), 0.0);
        assert_eq!(party_closeness(None, Some(5), 10), 0.0);
        assert_eq!(party_closeness(None, None, 10), 0.0);
    }

    #[test]
    fn test_identical_profiles_score_every_term() {
        let mentee =
            create_candidate("b1", RawRole::MenteeEligible, Course::CC, "Campinas", "chess");
        let mentor =
            create_candidate("v1", RawRole::MentorEligible, Course::CC, "campinas", "Chess");

        let terms = sub_scores(&mentee, &mentor, 10);
        assert_eq!(terms.course, 1.0);
        assert_eq!(terms.city, 1.0);
        assert_eq!(terms.hobby, 1.0);
        assert_eq!(terms.music, 0.0);
        assert_eq!(terms.parties, 0.0);
    }

    #[test]
    fn test_score_is_symmetric() {
        let a =
            create_candidate("b1", RawRole::MenteeEligible, Course::CC, "Campinas", "chess, go");
        let b = create_candidate("v1", RawRole::MentorEligible, Course::EC, "Campinas", "go");
        let weights = ScoringWeights::default();

        assert_eq!(
            calculate_compatibility(&a, &b, &weights, 10),
            calculate_compatibility(&b, &a, &weights, 10)
        );
    }

    #[test]
    fn test_missing_data_scores_course_only() {
        let mentee = normalize_candidate(RawCandidate {
            id: "b1".to_string(),
            course: Some(Course::CC),
            ..RawCandidate::default()
        });
        let mentor = normalize_candidate(RawCandidate {
            id: "v1".to_string(),
            role: RawRole::MentorEligible,
            course: Some(Course::CC),
            ..RawCandidate::default()
        });
        let weights = ScoringWeights::default();

        let score = calculate_compatibility(&mentee, &mentor, &weights, 10);
        assert_eq!(score, weights.course);
        assert!(!score.is_nan());
    }

    #[test]
    fn test_empty_cities_do_not_match() {
        let mentee =
            normalize_candidate(RawCandidate { id: "b1".to_string(), ..RawCandidate::default() });
        let mentor = normalize_candidate(RawCandidate {
            id: "v1".to_string(),
            role: RawRole::MentorEligible,
            ..RawCandidate::default()
        });

        let score = calculate_compatibility(&mentee, &mentor, &ScoringWeights::default(), 10);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_score_matrix_skips_self_pairs() {
        let mentee =
            create_candidate("x", RawRole::MenteeEligible, Course::CC, "Campinas", "chess");
        let same = create_candidate("x", RawRole::MentorEligible, Course::CC, "Campinas", "chess");
        let other = create_candidate("y", RawRole::MentorEligible, Course::CC, "Campinas", "chess");

        let matrix = build_score_matrix(&[mentee], &[same, other], &ScoringWeights::default(), 10);
        assert_eq!(matrix.get(0, 0), None);
        assert!(matrix.get(0, 1).is_some());
    }
}
