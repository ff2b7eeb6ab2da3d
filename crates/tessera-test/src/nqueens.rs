//! N-Queens problem fixtures.
//!
//! Queens are fixed to columns; the planning variable is the row. The score
//! is minus the number of queen pairs sharing a row or a diagonal.
//!
//! ```
//! use tessera_scoring::{IncrementalScoreDirectorFactory, ScoreDirector, ScoreDirectorFactory};
//! use tessera_test::nqueens::{self, NQueens, NQueensCalculator};
//!
//! let factory = IncrementalScoreDirectorFactory::new(NQueensCalculator::default)
//!     .with_assertion_score_fn(nqueens::conflicts);
//! let mut director = factory.build_score_director(NQueens::with_rows(&[0, 2, 1, 3]));
//! assert_eq!(director.calculate_score(), nqueens::conflicts(director.working_solution()));
//! ```

use std::collections::HashMap;

use tessera_core::{PlanningSolution, SimpleScore};
use tessera_scoring::IncrementalScoreCalculator;

/// A queen fixed to a column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Queen {
    pub column: usize,
    pub row: Option<usize>,
}

/// N-Queens problem solution.
#[derive(Clone, Debug)]
pub struct NQueens {
    pub n: usize,
    pub queens: Vec<Queen>,
    pub score: Option<SimpleScore>,
}

impl NQueens {
    /// Creates an N-Queens solution with no rows assigned.
    pub fn uninitialized(n: usize) -> Self {
        Self {
            n,
            queens: (0..n).map(|column| Queen { column, row: None }).collect(),
            score: None,
        }
    }

    /// Creates an N-Queens solution with queen `i` on `rows[i]`.
    pub fn with_rows(rows: &[usize]) -> Self {
        Self {
            n: rows.len(),
            queens: rows
                .iter()
                .enumerate()
                .map(|(column, &row)| Queen {
                    column,
                    row: Some(row),
                })
                .collect(),
            score: None,
        }
    }

    pub fn rows(&self) -> Vec<Option<usize>> {
        self.queens.iter().map(|q| q.row).collect()
    }
}

impl PlanningSolution for NQueens {
    type Score = SimpleScore;

    fn score(&self) -> Option<Self::Score> {
        self.score
    }

    fn set_score(&mut self, score: Option<Self::Score>) {
        self.score = score;
    }

    fn is_initialized(&self) -> bool {
        self.queens.iter().all(|q| q.row.is_some())
    }
}

/// Counts conflicting queen pairs from scratch.
pub fn conflicts(solution: &NQueens) -> SimpleScore {
    let placed: Vec<(i64, i64)> = solution
        .queens
        .iter()
        .filter_map(|q| q.row.map(|row| (q.column as i64, row as i64)))
        .collect();
    let mut count = 0;
    for (i, &(c1, r1)) in placed.iter().enumerate() {
        for &(c2, r2) in &placed[i + 1..] {
            if r1 == r2 || (r1 - r2).abs() == (c1 - c2).abs() {
                count += 1;
            }
        }
    }
    SimpleScore::of(-count)
}

pub fn queen_count(solution: &NQueens) -> usize {
    solution.queens.len()
}

pub fn row_count(solution: &NQueens) -> usize {
    solution.n
}

pub fn get_row(solution: &NQueens, queen_index: usize) -> Option<usize> {
    solution.queens[queen_index].row
}

pub fn set_row(solution: &mut NQueens, queen_index: usize, row: Option<usize>) {
    solution.queens[queen_index].row = row;
}

/// Incremental conflict counter keyed by row and both diagonals.
#[derive(Debug, Default)]
pub struct NQueensCalculator {
    rows: HashMap<i64, i64>,
    ascending: HashMap<i64, i64>,
    descending: HashMap<i64, i64>,
    conflicts: i64,
}

impl NQueensCalculator {
    fn keys(queen: &Queen) -> Option<(i64, i64, i64)> {
        let row = queen.row? as i64;
        let column = queen.column as i64;
        Some((row, row + column, row - column))
    }

    fn insert(&mut self, queen: &Queen) {
        let Some((row, asc, desc)) = Self::keys(queen) else {
            return;
        };
        for (counts, key) in [
            (&mut self.rows, row),
            (&mut self.ascending, asc),
            (&mut self.descending, desc),
        ] {
            let count = counts.entry(key).or_insert(0);
            self.conflicts += *count;
            *count += 1;
        }
    }

    fn retract(&mut self, queen: &Queen) {
        let Some((row, asc, desc)) = Self::keys(queen) else {
            return;
        };
        for (counts, key) in [
            (&mut self.rows, row),
            (&mut self.ascending, asc),
            (&mut self.descending, desc),
        ] {
            let count = counts.entry(key).or_insert(0);
            *count -= 1;
            self.conflicts -= *count;
        }
    }
}

impl IncrementalScoreCalculator<NQueens> for NQueensCalculator {
    fn reset_working_solution(&mut self, solution: &NQueens) {
        *self = Self::default();
        for queen in &solution.queens {
            self.insert(queen);
        }
    }

    fn before_variable_changed(&mut self, solution: &NQueens, entity_index: usize, _: &str) {
        self.retract(&solution.queens[entity_index]);
    }

    fn after_variable_changed(&mut self, solution: &NQueens, entity_index: usize, _: &str) {
        self.insert(&solution.queens[entity_index]);
    }

    fn calculate_score(&self) -> SimpleScore {
        SimpleScore::of(-self.conflicts)
    }
}
