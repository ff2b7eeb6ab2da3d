//! Grouped task assignment fixtures.
//!
//! Tasks belong to groups and are assigned to machines. Constraints never
//! cross groups, so the score of a plan is the sum of the scores of its
//! groups, which makes [`partition_by_group`] a lossless split:
//!
//! - hard: -1 per pair of tasks of the same group on the same machine
//! - soft: -(duration * (machine + 1)) per assigned task
//!
//! ```
//! use tessera_core::{HardSoftScore, Score};
//! use tessera_test::task::{self, TaskPlan};
//!
//! let plan = TaskPlan::generate(3, 4, 2);
//! let parts = task::partition_by_group(&plan, None);
//! assert_eq!(parts.len(), 3);
//! let summed = HardSoftScore::accumulate(parts.iter().map(task::score));
//! assert_eq!(summed, task::score(&plan));
//! ```

use std::collections::{BTreeSet, HashMap};

use tessera_core::{HardSoftScore, PlanningSolution};
use tessera_scoring::IncrementalScoreCalculator;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    /// Index of the task in the unpartitioned plan.
    pub id: usize,
    pub group: usize,
    pub duration: i64,
    pub machine: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct TaskPlan {
    pub machine_count: usize,
    pub tasks: Vec<Task>,
    pub score: Option<HardSoftScore>,
}

impl TaskPlan {
    /// Builds `group_count * tasks_per_group` unassigned tasks with varied
    /// durations.
    pub fn generate(group_count: usize, tasks_per_group: usize, machine_count: usize) -> Self {
        let tasks = (0..group_count * tasks_per_group)
            .map(|id| Task {
                id,
                group: id / tasks_per_group,
                duration: 1 + (id as i64 * 7) % 5,
                machine: None,
            })
            .collect();
        Self {
            machine_count,
            tasks,
            score: None,
        }
    }

    pub fn machines(&self) -> Vec<Option<usize>> {
        self.tasks.iter().map(|t| t.machine).collect()
    }
}

impl PlanningSolution for TaskPlan {
    type Score = HardSoftScore;

    fn score(&self) -> Option<Self::Score> {
        self.score
    }

    fn set_score(&mut self, score: Option<Self::Score>) {
        self.score = score;
    }

    fn is_initialized(&self) -> bool {
        self.tasks.iter().all(|t| t.machine.is_some())
    }
}

/// Scores a plan from scratch.
pub fn score(plan: &TaskPlan) -> HardSoftScore {
    let mut hard = 0;
    let mut soft = 0;
    for (i, a) in plan.tasks.iter().enumerate() {
        let Some(machine) = a.machine else { continue };
        soft -= a.duration * (machine as i64 + 1);
        for b in &plan.tasks[i + 1..] {
            if a.group == b.group && b.machine == Some(machine) {
                hard -= 1;
            }
        }
    }
    HardSoftScore::of(hard, soft)
}

pub fn task_count(plan: &TaskPlan) -> usize {
    plan.tasks.len()
}

pub fn machine_count(plan: &TaskPlan) -> usize {
    plan.machine_count
}

pub fn get_machine(plan: &TaskPlan, task_index: usize) -> Option<usize> {
    plan.tasks[task_index].machine
}

pub fn set_machine(plan: &mut TaskPlan, task_index: usize, machine: Option<usize>) {
    plan.tasks[task_index].machine = machine;
}

/// Splits a plan into partitions holding whole groups.
///
/// Without a requested count every group gets its own partition; otherwise
/// groups are dealt round-robin over `requested` partitions (at most one per
/// group).
pub fn partition_by_group(plan: &TaskPlan, requested: Option<usize>) -> Vec<TaskPlan> {
    let groups: Vec<usize> = plan
        .tasks
        .iter()
        .map(|t| t.group)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if groups.is_empty() {
        return Vec::new();
    }
    let count = requested.map_or(groups.len(), |r| r.clamp(1, groups.len()));
    let bucket_of: HashMap<usize, usize> = groups
        .iter()
        .enumerate()
        .map(|(position, &group)| (group, position % count))
        .collect();

    let mut partitions: Vec<TaskPlan> = (0..count)
        .map(|_| TaskPlan {
            machine_count: plan.machine_count,
            tasks: Vec::new(),
            score: None,
        })
        .collect();
    for task in &plan.tasks {
        partitions[bucket_of[&task.group]].tasks.push(task.clone());
    }
    partitions
}

/// Copies the machine assignments of solved partitions back by task id.
pub fn merge_groups(original: &TaskPlan, partitions: Vec<TaskPlan>) -> TaskPlan {
    let mut merged = original.clone();
    let index_of: HashMap<usize, usize> = merged
        .tasks
        .iter()
        .enumerate()
        .map(|(index, t)| (t.id, index))
        .collect();
    for task in partitions.into_iter().flat_map(|p| p.tasks) {
        if let Some(&index) = index_of.get(&task.id) {
            merged.tasks[index].machine = task.machine;
        }
    }
    merged.score = None;
    merged
}

/// Incremental version of [`score`].
#[derive(Debug, Default)]
pub struct TaskCalculator {
    per_group_machine: HashMap<(usize, usize), i64>,
    hard: i64,
    soft: i64,
}

impl TaskCalculator {
    fn insert(&mut self, task: &Task) {
        let Some(machine) = task.machine else { return };
        let count = self
            .per_group_machine
            .entry((task.group, machine))
            .or_insert(0);
        self.hard -= *count;
        *count += 1;
        self.soft -= task.duration * (machine as i64 + 1);
    }

    fn retract(&mut self, task: &Task) {
        let Some(machine) = task.machine else { return };
        let count = self
            .per_group_machine
            .entry((task.group, machine))
            .or_insert(0);
        *count -= 1;
        self.hard += *count;
        self.soft += task.duration * (machine as i64 + 1);
    }
}

impl IncrementalScoreCalculator<TaskPlan> for TaskCalculator {
    fn reset_working_solution(&mut self, plan: &TaskPlan) {
        *self = Self::default();
        for task in &plan.tasks {
            self.insert(task);
        }
    }

    fn before_variable_changed(&mut self, plan: &TaskPlan, entity_index: usize, _: &str) {
        self.retract(&plan.tasks[entity_index]);
    }

    fn after_variable_changed(&mut self, plan: &TaskPlan, entity_index: usize, _: &str) {
        self.insert(&plan.tasks[entity_index]);
    }

    fn calculate_score(&self) -> HardSoftScore {
        HardSoftScore::of(self.hard, self.soft)
    }
}
