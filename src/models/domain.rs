use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use validator::Validate;

/// Undergraduate program a candidate is enrolled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Course {
    #[serde(alias = "cc")]
    CC,
    #[serde(alias = "ec")]
    EC,
}

impl FromStr for Course {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CC" => Ok(Course::CC),
            "EC" => Ok(Course::EC),
            other => Err(format!("unknown course: {}", other)),
        }
    }
}

impl Course {
    /// Parse a course, dropping values outside the two known programs
    pub fn parse_lenient(value: &str) -> Option<Course> {
        match value.parse() {
            Ok(course) => Some(course),
            Err(e) => {
                tracing::warn!("Ignoring course: {}", e);
                None
            }
        }
    }
}

/// Unknown courses become `None` instead of failing the whole record
fn lenient_course<'de, D>(deserializer: D) -> Result<Option<Course>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.as_deref().and_then(Course::parse_lenient))
}

/// Role as reported by the eligible-user collaborator
///
/// Accepts both the canonical names and the vocabulary used by the
/// user database (`veterane`, `bixe`, `ADMIN`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RawRole {
    #[default]
    #[serde(alias = "bixe", alias = "mentee")]
    MenteeEligible,
    #[serde(alias = "veterane", alias = "mentor")]
    MentorEligible,
    #[serde(alias = "ADMIN")]
    Admin,
}

impl FromStr for RawRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "mentee-eligible" | "mentee" | "bixe" => Ok(RawRole::MenteeEligible),
            "mentor-eligible" | "mentor" | "veterane" => Ok(RawRole::MentorEligible),
            "admin" | "ADMIN" => Ok(RawRole::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Role inside a matching run; admins are folded into `Mentor`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Mentee,
    Mentor,
}

impl From<RawRole> for Role {
    fn from(value: RawRole) -> Self {
        match value {
            RawRole::MenteeEligible => Role::Mentee,
            RawRole::MentorEligible | RawRole::Admin => Role::Mentor,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Mentee => write!(f, "mentee"),
            Role::Mentor => write!(f, "mentor"),
        }
    }
}

/// Candidate record exactly as received from the eligible-user query
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RawCandidate {
    #[validate(length(min = 1))]
    pub id: String,
    pub role: RawRole,
    #[serde(default, deserialize_with = "lenient_course")]
    pub course: Option<Course>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub pronouns: Option<Vec<String>>,
    #[serde(default)]
    pub ethnicity: Option<Vec<String>>,
    #[serde(default, alias = "lgbtAffiliations")]
    pub lgbt: Option<Vec<String>>,
    #[serde(default)]
    pub hobby: Option<String>,
    #[serde(default)]
    pub music: Option<String>,
    #[serde(default)]
    pub games: Option<String>,
    #[serde(default)]
    pub sports: Option<String>,
    #[serde(default, alias = "partyFrequency")]
    pub parties: Option<u8>,
    /// Mentees this mentor already sponsors
    #[serde(default, alias = "existingMentees")]
    pub assigned: Option<u32>,
}

/// Normalized candidate used by the scorer and solver
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub role: Role,
    pub course: Option<Course>,
    /// Folded city tokens joined by single spaces, empty when unknown
    pub city: String,
    pub pronouns: BTreeSet<String>,
    pub ethnicity: BTreeSet<String>,
    pub lgbt: BTreeSet<String>,
    pub hobby: BTreeSet<String>,
    pub music: BTreeSet<String>,
    pub games: BTreeSet<String>,
    pub sports: BTreeSet<String>,
    pub party_frequency: Option<u8>,
    pub assigned: u32,
}

/// Mentee id -> mentor id, the solved pairing of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pairs: BTreeMap<String, String>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pairing. Returns false if the mentee was already assigned.
    pub fn assign(&mut self, mentee_id: impl Into<String>, mentor_id: impl Into<String>) -> bool {
        let mentee_id = mentee_id.into();
        if self.pairs.contains_key(&mentee_id) {
            return false;
        }
        self.pairs.insert(mentee_id, mentor_id.into());
        true
    }

    pub fn mentor_of(&self, mentee_id: &str) -> Option<&str> {
        self.pairs.get(mentee_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in mentee id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of mentees assigned to each mentor
    pub fn mentor_load(&self) -> BTreeMap<&str, usize> {
        let mut load = BTreeMap::new();
        for mentor in self.pairs.values() {
            *load.entry(mentor.as_str()).or_insert(0) += 1;
        }
        load
    }
}

/// Relation map handed to the persistence collaborator
pub type RelationMap = BTreeMap<String, BTreeSet<String>>;

/// One godchild -> godparent relation row
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GodparentRelation {
    pub godchild_id: String,
    pub godparent_id: String,
}

/// Scoring weights, one per compared attribute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
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

impl ScoringWeights {
    /// Upper bound accepted for a single weight
    pub const MAX_WEIGHT: f64 = 1_000_000.0;

    pub fn as_array(&self) -> [(&'static str, f64); 10] {
        [
            ("course", self.course),
            ("city", self.city),
            ("pronouns", self.pronouns),
            ("ethnicity", self.ethnicity),
            ("lgbt", self.lgbt),
            ("hobby", self.hobby),
            ("music", self.music),
            ("games", self.games),
            ("sports", self.sports),
            ("parties", self.parties),
        ]
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().map(|(_, w)| w).sum()
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, weight) in self.as_array() {
            if !weight.is_finite() || weight < 0.0 || weight > Self::MAX_WEIGHT {
                return Err(format!(
                    "weight '{}' must be within [0, {}], got {}",
                    name,
                    Self::MAX_WEIGHT,
                    weight
                ));
            }
        }
        Ok(())
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            course: 3.0,
            city: 1.0,
            pronouns: 8.0,
            ethnicity: 4.0,
            lgbt: 3.0,
            hobby: 2.0,
            music: 1.0,
            games: 1.0,
            sports: 2.0,
            parties: 2.0,
        }
    }
}

/// Run-level matching parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingParams {
    /// Mentees a single mentor may sponsor
    pub max_capacity: u32,
    /// Edges scoring below this are never used
    pub min_score: f64,
    /// Largest possible party frequency difference
    pub party_scale: u8,
}

impl MatchingParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_capacity == 0 {
            return Err("max_capacity must be at least 1".to_string());
        }
        if !self.min_score.is_finite() {
            return Err(format!("min_score must be finite, got {}", self.min_score));
        }
        if self.party_scale == 0 {
            return Err("party_scale must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for MatchingParams {
    fn default() -> Self {
        Self {
            max_capacity: 2,
            min_score: 0.0,
            party_scale: 10,
        }
    }
}
