use crate::core::{
    error::MatchError,
    normalize::normalize_candidate,
    scoring::build_score_matrix,
    serialize::to_relation_map,
    solver::{solve, total_score},
};
use crate::models::{
    Assignment, Candidate, MatchingParams, RawCandidate, RelationMap, Role, ScoringWeights,
};
use std::collections::HashSet;

/// Result of one matching run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    pub assignment: Assignment,
    /// Sum of the compatibility scores of all matched pairs
    pub total_score: f64,
    /// Mentees left without a mentor, in id order
    pub unmatched: Vec<String>,
    pub mentee_count: usize,
    pub mentor_count: usize,
}

impl MatchOutcome {
    pub fn relations(&self) -> RelationMap {
        to_relation_map(&self.assignment)
    }
}

/// Matching orchestrator
///
/// # Pipeline Stages
/// 1. Normalize every raw record (admins become mentors)
/// 2. Split the pools and reject duplicate ids / over-capacity mentors
/// 3. Sort both pools by id so ties resolve the same way every run
/// 4. Score every mentee against every mentor
/// 5. Solve the capacitated assignment and collapse it to mentor ids
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: ScoringWeights,
    params: MatchingParams,
}

impl Matcher {
    pub fn new(weights: ScoringWeights, params: MatchingParams) -> Self {
        Self { weights, params }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: ScoringWeights::default(),
            params: MatchingParams::default(),
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn params(&self) -> &MatchingParams {
        &self.params
    }

    /// Check weights and parameters before any run
    pub fn validate(&self) -> Result<(), MatchError> {
        self.weights.validate().map_err(MatchError::InvalidConfig)?;
        self.params.validate().map_err(MatchError::InvalidConfig)
    }

    /// Run one matching round over an eligible-user snapshot
    ///
    /// Pure: the same snapshot always yields the same outcome.
    pub fn run(&self, records: Vec<RawCandidate>) -> Result<MatchOutcome, MatchError> {
        self.validate()?;

        let (mut mentees, mut mentors): (Vec<Candidate>, Vec<Candidate>) = records
            .into_iter()
            .map(normalize_candidate)
            .partition(|candidate| candidate.role == Role::Mentee);

        ensure_unique_ids(&mentees, Role::Mentee)?;
        ensure_unique_ids(&mentors, Role::Mentor)?;

        mentees.sort_by(|a, b| a.id.cmp(&b.id));
        mentors.sort_by(|a, b| a.id.cmp(&b.id));

        let capacities = mentors
            .iter()
            .map(|mentor| self.remaining_capacity(mentor))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            "Matching {} mentees against {} mentors ({} open slots)",
            mentees.len(),
            mentors.len(),
            capacities.iter().map(|c| *c as usize).sum::<usize>()
        );

        let scores = build_score_matrix(&mentees, &mentors, &self.weights, self.params.party_scale);
        let slots = solve(&scores, &capacities, self.params.min_score)?;

        let mut assignment = Assignment::new();
        let mut unmatched = Vec::new();
        for (mentee, slot) in mentees.iter().zip(&slots) {
            match slot {
                Some(col) => {
                    assignment.assign(mentee.id.clone(), mentors[*col].id.clone());
                }
                None => unmatched.push(mentee.id.clone()),
            }
        }

        let outcome = MatchOutcome {
            total_score: total_score(&scores, &slots),
            assignment,
            unmatched,
            mentee_count: mentees.len(),
            mentor_count: mentors.len(),
        };

        tracing::debug!(
            "Matched {} pairs (total score {:.3}), {} mentees unmatched",
            outcome.assignment.len(),
            outcome.total_score,
            outcome.unmatched.len()
        );

        Ok(outcome)
    }

    fn remaining_capacity(&self, mentor: &Candidate) -> Result<u32, MatchError> {
        self.params
            .max_capacity
            .checked_sub(mentor.assigned)
            .ok_or_else(|| MatchError::InvalidCapacity {
                id: mentor.id.clone(),
                assigned: mentor.assigned,
                max: self.params.max_capacity,
            })
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

fn ensure_unique_ids(pool: &[Candidate], role: Role) -> Result<(), MatchError> {
    let mut seen = HashSet::with_capacity(pool.len());
    for candidate in pool {
        if !seen.insert(candidate.id.as_str()) {
            return Err(MatchError::DuplicateId {
                role,
                id: candidate.id.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, RawRole};

    fn create_candidate(
        id: &str,
        role: RawRole,
        course: Course,
        city: &str,
        hobby: &str,
    ) -> RawCandidate {
        RawCandidate {
            id: id.to_string(),
            role,
            course: Some(course),
            city: Some(city.to_string()),
            hobby: Some(hobby.to_string()),
            ..RawCandidate::default()
        }
    }

    #[test]
    fn test_prefers_fully_compatible_mentor() {
        let matcher = Matcher::with_default_weights();
        let records = vec![
            create_candidate("A", RawRole::MenteeEligible, Course::CC, "Campinas", "chess"),
            create_candidate("M1", RawRole::MentorEligible, Course::CC, "Campinas", "chess"),
            create_candidate("M2", RawRole::MentorEligible, Course::EC, "Rio", ""),
        ];

        let outcome = matcher.run(records).unwrap();

        assert_eq!(outcome.assignment.mentor_of("A"), Some("M1"));
        assert!(outcome.unmatched.is_empty());
        assert_eq!(outcome.mentor_count, 2);
    }

    #[test]
    fn test_admins_are_mentors() {
        let matcher = Matcher::with_default_weights();
        let records = vec![
            create_candidate("b1", RawRole::MenteeEligible, Course::CC, "Campinas", "chess"),
            create_candidate("adm", RawRole::Admin, Course::CC, "Campinas", "chess"),
        ];

        let outcome = matcher.run(records).unwrap();
        assert_eq!(outcome.assignment.mentor_of("b1"), Some("adm"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let matcher = Matcher::with_default_weights();
        let records = vec![
            create_candidate("v1", RawRole::MentorEligible, Course::CC, "Campinas", ""),
            create_candidate("v1", RawRole::Admin, Course::CC, "Campinas", ""),
        ];

        let err = matcher.run(records).unwrap_err();
        assert!(matches!(err, MatchError::DuplicateId { role: Role::Mentor, .. }));
    }

    #[test]
    fn test_over_capacity_mentor_rejected() {
        let matcher = Matcher::with_default_weights();
        let mut mentor =
            create_candidate("v1", RawRole::MentorEligible, Course::CC, "Campinas", "");
        mentor.assigned = Some(3);

        let err = matcher.run(vec![mentor]).unwrap_err();
        assert!(matches!(err, MatchError::InvalidCapacity { assigned: 3, max: 2, .. }));
    }

    #[test]
    fn test_existing_relations_reduce_capacity() {
        let matcher = Matcher::with_default_weights();
        let mut mentor =
            create_candidate("v1", RawRole::MentorEligible, Course::CC, "Campinas", "chess");
        mentor.assigned = Some(1);
        let records = vec![
            mentor,
            create_candidate("b1", RawRole::MenteeEligible, Course::CC, "Campinas", "chess"),
            create_candidate("b2", RawRole::MenteeEligible, Course::CC, "Campinas", "chess"),
        ];

        let outcome = matcher.run(records).unwrap();
        assert_eq!(outcome.assignment.len(), 1);
        assert_eq!(outcome.unmatched, vec!["b2".to_string()]);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let weights = ScoringWeights { hobby: -1.0, ..ScoringWeights::default() };
        let matcher = Matcher::new(weights, MatchingParams::default());

        let err = matcher.run(vec![]).unwrap_err();
        assert!(matches!(err, MatchError::InvalidConfig(_)));
    }

    #[test]
    fn test_empty_pools() {
        let matcher = Matcher::with_default_weights();

        let only_mentors =
            vec![create_candidate("v1", RawRole::MentorEligible, Course::CC, "Campinas", "")];
        let outcome = matcher.run(only_mentors).unwrap();
        assert!(outcome.assignment.is_empty());

        let only_mentees =
            vec![create_candidate("b1", RawRole::MenteeEligible, Course::CC, "Campinas", "")];
        let outcome = matcher.run(only_mentees).unwrap();
        assert!(outcome.assignment.is_empty());
        assert_eq!(outcome.unmatched, vec!["b1".to_string()]);
    }
}
