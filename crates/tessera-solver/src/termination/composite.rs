//! Composite termination conditions (AND/OR).

use tessera_core::Score;

use super::{Progress, Termination};

/// Terminates when ANY child terminates.
///
/// ```
/// use tessera_core::SimpleScore;
/// use tessera_solver::termination::{
///     OrTermination, StepCountTermination, Termination, TimeTermination,
/// };
///
/// // Terminate after 30 seconds OR 1000 steps
/// let termination: OrTermination<SimpleScore> = OrTermination::new(vec![
///     Box::new(TimeTermination::seconds(30)),
///     Box::new(StepCountTermination::new(1000)),
/// ]);
/// ```
#[derive(Debug)]
pub struct OrTermination<Sc: Score> {
    terminations: Vec<Box<dyn Termination<Sc>>>,
}

impl<Sc: Score> OrTermination<Sc> {
    pub fn new(terminations: Vec<Box<dyn Termination<Sc>>>) -> Self {
        Self { terminations }
    }
}

impl<Sc: Score> Termination<Sc> for OrTermination<Sc> {
    fn is_terminated(&self, progress: &Progress<Sc>) -> bool {
        self.terminations.iter().any(|t| t.is_terminated(progress))
    }
}

/// Terminates when ALL children terminate.
///
/// An empty `AndTermination` never terminates.
#[derive(Debug)]
pub struct AndTermination<Sc: Score> {
    terminations: Vec<Box<dyn Termination<Sc>>>,
}

impl<Sc: Score> AndTermination<Sc> {
    pub fn new(terminations: Vec<Box<dyn Termination<Sc>>>) -> Self {
        Self { terminations }
    }
}

impl<Sc: Score> Termination<Sc> for AndTermination<Sc> {
    fn is_terminated(&self, progress: &Progress<Sc>) -> bool {
        !self.terminations.is_empty() && self.terminations.iter().all(|t| t.is_terminated(progress))
    }
}
