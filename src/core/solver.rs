//! Capacitated maximum-weight assignment.
//!
//! Mentors with capacity `k` are expanded into `k` unit slots and every
//! mentee gets a private zero-weight "unmatched" column. The resulting
//! rectangular assignment problem is solved exactly with the Hungarian
//! algorithm (shortest augmenting paths with potentials), then slots are
//! collapsed back to mentor columns.
//!
//! Edge costs are compared lexicographically on integer components:
//! 1. total score (quantized to `1 / SCORE_SCALE`), maximized
//! 2. number of matched pairs, maximized
//! 3. `mentee_row * slots + slot` summed, minimized, which makes ties
//!    resolve towards lower rows and lower columns
//!
//! Working on integers keeps potentials exact, so the tie-breaking terms
//! are never drowned out by floating point noise.

use crate::core::error::SolverError;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Scores are compared in units of 1e-6
pub const SCORE_SCALE: f64 = 1_000_000.0;

/// Dense mentee (rows) x mentor (columns) score matrix.
/// `None` marks a pair that must never be matched.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<Option<f64>>,
}

impl ScoreMatrix {
    /// Matrix with every edge absent
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
        }
    }

    /// Build a matrix from row vectors. Short rows leave their trailing
    /// cells absent.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut matrix = Self::new(rows.len(), cols);
        for (i, row) in rows.into_iter().enumerate() {
            for (j, score) in row.into_iter().enumerate() {
                matrix.set(i, j, Some(score));
            }
        }
        matrix
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, score: Option<f64>) {
        self.cells[row * self.cols + col] = score;
    }
}

/// Lexicographic edge cost; see module docs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
struct Cost {
    score: i64,
    pairs: i64,
    order: i64,
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost {
            score: self.score + rhs.score,
            pairs: self.pairs + rhs.pairs,
            order: self.order + rhs.order,
        }
    }
}

impl Sub for Cost {
    type Output = Cost;

    fn sub(self, rhs: Cost) -> Cost {
        Cost {
            score: self.score - rhs.score,
            pairs: self.pairs - rhs.pairs,
            order: self.order - rhs.order,
        }
    }
}

impl AddAssign for Cost {
    fn add_assign(&mut self, rhs: Cost) {
        *self = *self + rhs;
    }
}

impl SubAssign for Cost {
    fn sub_assign(&mut self, rhs: Cost) {
        *self = *self - rhs;
    }
}

#[inline]
fn quantize(score: f64) -> i64 {
    (score * SCORE_SCALE).round() as i64
}

/// Solve the capacitated assignment
///
/// # Arguments
/// * `scores` - mentee x mentor compatibility matrix
/// * `capacities` - remaining capacity of each mentor column
/// * `min_score` - edges scoring below this floor are treated as absent
///
/// # Returns
/// For every mentee row, the mentor column it is matched to, if any.
pub fn solve(
    scores: &ScoreMatrix,
    capacities: &[u32],
    min_score: f64,
) -> Result<Vec<Option<usize>>, SolverError> {
    if capacities.len() != scores.cols() {
        return Err(SolverError::CapacityMismatch {
            expected: scores.cols(),
            got: capacities.len(),
        });
    }

    for row in 0..scores.rows() {
        for col in 0..scores.cols() {
            if matches!(scores.get(row, col), Some(score) if !score.is_finite()) {
                return Err(SolverError::NonFiniteScore { row, col });
            }
        }
    }

    let mentees = scores.rows();

    // A mentor never needs more slots than there are mentees
    let slot_owner: Vec<usize> = capacities
        .iter()
        .enumerate()
        .flat_map(|(col, &capacity)| {
            std::iter::repeat(col).take((capacity as usize).min(mentees))
        })
        .collect();
    let slots = slot_owner.len();

    if mentees == 0 || slots == 0 {
        return Ok(vec![None; mentees]);
    }

    let admissible = |row: usize, col: usize| {
        scores.get(row, col).filter(|score| *score >= min_score)
    };

    let cost = |row: usize, column: usize| -> Option<Cost> {
        if column < slots {
            admissible(row, slot_owner[column]).map(|score| Cost {
                score: -quantize(score),
                pairs: -1,
                order: (row * slots + column) as i64,
            })
        } else if column - slots == row {
            Some(Cost::default())
        } else {
            None
        }
    };

    let matched_columns = hungarian(mentees, slots + mentees, cost)?;

    let assignment: Vec<Option<usize>> = matched_columns
        .into_iter()
        .map(|column| (column < slots).then(|| slot_owner[column]))
        .collect();

    verify(scores, capacities, min_score, &assignment)?;

    Ok(assignment)
}

/// Sum of the scores of all matched edges
pub fn total_score(scores: &ScoreMatrix, assignment: &[Option<usize>]) -> f64 {
    assignment
        .iter()
        .enumerate()
        .filter_map(|(row, col)| col.and_then(|col| scores.get(row, col)))
        .sum()
}

/// Minimum-cost assignment of every row to a distinct column (rows <= cols).
///
/// `cost` returns `None` for forbidden cells. Returns the column chosen
/// for each row.
fn hungarian<F>(rows: usize, cols: usize, cost: F) -> Result<Vec<usize>, SolverError>
where
    F: Fn(usize, usize) -> Option<Cost>,
{
    // 1-indexed; index 0 is the virtual source column/row
    let mut u = vec![Cost::default(); rows + 1];
    let mut v = vec![Cost::default(); cols + 1];
    let mut matched_row = vec![0usize; cols + 1];
    let mut way = vec![0usize; cols + 1];

    for row in 1..=rows {
        matched_row[0] = row;
        let mut j0 = 0usize;
        let mut min_slack: Vec<Option<Cost>> = vec![None; cols + 1];
        let mut used = vec![false; cols + 1];

        loop {
            used[j0] = true;
            let i0 = matched_row[j0];
            let mut delta: Option<Cost> = None;
            let mut j1 = 0usize;

            for j in 1..=cols {
                if used[j] {
                    continue;
                }
                if let Some(c) = cost(i0 - 1, j - 1) {
                    let reduced = c - u[i0] - v[j];
                    if min_slack[j].map_or(true, |slack| reduced < slack) {
                        min_slack[j] = Some(reduced);
                        way[j] = j0;
                    }
                }
                if let Some(slack) = min_slack[j] {
                    if delta.map_or(true, |d| slack < d) {
                        delta = Some(slack);
                        j1 = j;
                    }
                }
            }

            let delta = delta.ok_or(SolverError::NoAugmentingPath { row: row - 1 })?;

            for j in 0..=cols {
                if used[j] {
                    u[matched_row[j]] += delta;
                    v[j] -= delta;
                } else if let Some(slack) = min_slack[j].as_mut() {
                    *slack -= delta;
                }
            }

            j0 = j1;
            if matched_row[j0] == 0 {
                break;
            }
        }

        // Flip the augmenting path
        loop {
            let j1 = way[j0];
            matched_row[j0] = matched_row[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut row_to_col = vec![usize::MAX; rows];
    for col in 1..=cols {
        if matched_row[col] != 0 {
            row_to_col[matched_row[col] - 1] = col - 1;
        }
    }

    if let Some(row) = row_to_col.iter().position(|&col| col == usize::MAX) {
        return Err(SolverError::Inconsistent(format!("row {} left without a column", row)));
    }

    Ok(row_to_col)
}

/// Re-check the capacity and edge constraints on a solved assignment
fn verify(
    scores: &ScoreMatrix,
    capacities: &[u32],
    min_score: f64,
    assignment: &[Option<usize>],
) -> Result<(), SolverError> {
    let mut load = vec![0u32; capacities.len()];

    for (row, col) in assignment.iter().enumerate() {
        let Some(col) = *col else {
            continue;
        };
        match scores.get(row, col) {
            Some(score) if score >= min_score => {}
            _ => {
                return Err(SolverError::Inconsistent(format!(
                    "mentee {} matched over inadmissible edge to mentor {}",
                    row, col
                )));
            }
        }
        load[col] += 1;
        if load[col] > capacities[col] {
            return Err(SolverError::Inconsistent(format!(
                "mentor {} exceeds capacity {}",
                col, capacities[col]
            )));
        }
    }

    Ok(())
}
