use std::collections::HashMap;

use proptest::prelude::*;
use tessera_core::{PlanningSolution, SimpleScore, TesseraError};

use super::*;
use crate::IncrementalScoreCalculator;

#[derive(Clone, Debug)]
struct Lineup {
    values: Vec<i64>,
    score: Option<SimpleScore>,
}

impl Lineup {
    fn new(values: Vec<i64>) -> Self {
        Self {
            values,
            score: None,
        }
    }
}

impl PlanningSolution for Lineup {
    type Score = SimpleScore;

    fn score(&self) -> Option<Self::Score> {
        self.score
    }

    fn set_score(&mut self, score: Option<Self::Score>) {
        self.score = score;
    }
}

// One penalty per pair of entities sharing a value.
fn duplicate_pairs(solution: &Lineup) -> SimpleScore {
    let mut pairs = 0;
    for (i, a) in solution.values.iter().enumerate() {
        for b in &solution.values[i + 1..] {
            if a == b {
                pairs += 1;
            }
        }
    }
    SimpleScore::of(-pairs)
}

#[derive(Default)]
struct DuplicateCalculator {
    counts: HashMap<i64, i64>,
    pairs: i64,
}

impl DuplicateCalculator {
    fn insert(&mut self, value: i64) {
        let count = self.counts.entry(value).or_insert(0);
        self.pairs += *count;
        *count += 1;
    }

    fn retract(&mut self, value: i64) {
        let count = self.counts.entry(value).or_insert(0);
        *count -= 1;
        self.pairs -= *count;
    }
}

impl IncrementalScoreCalculator<Lineup> for DuplicateCalculator {
    fn reset_working_solution(&mut self, solution: &Lineup) {
        self.counts.clear();
        self.pairs = 0;
        for &value in &solution.values {
            self.insert(value);
        }
    }

    fn before_variable_changed(&mut self, solution: &Lineup, entity_index: usize, _: &str) {
        self.retract(solution.values[entity_index]);
    }

    fn after_variable_changed(&mut self, solution: &Lineup, entity_index: usize, _: &str) {
        self.insert(solution.values[entity_index]);
    }

    fn calculate_score(&self) -> SimpleScore {
        SimpleScore::of(-self.pairs)
    }
}

// Forgets to insert the new value after a change.
#[derive(Default)]
struct ForgetfulCalculator {
    inner: DuplicateCalculator,
}

impl IncrementalScoreCalculator<Lineup> for ForgetfulCalculator {
    fn reset_working_solution(&mut self, solution: &Lineup) {
        self.inner.reset_working_solution(solution);
    }

    fn before_variable_changed(&mut self, solution: &Lineup, entity_index: usize, name: &str) {
        self.inner
            .before_variable_changed(solution, entity_index, name);
    }

    fn after_variable_changed(&mut self, _: &Lineup, _: usize, _: &str) {}

    fn calculate_score(&self) -> SimpleScore {
        self.inner.calculate_score()
    }
}

fn change(director: &mut dyn ScoreDirector<Lineup>, entity_index: usize, value: i64) {
    director.before_variable_changed(0, entity_index, "value");
    director.working_solution_mut().values[entity_index] = value;
    director.after_variable_changed(0, entity_index, "value");
}

fn incremental_factory() -> IncrementalScoreDirectorFactory<Lineup, DuplicateCalculator> {
    IncrementalScoreDirectorFactory::new(DuplicateCalculator::default)
}

#[test]
fn test_simple_director_caches_until_change() {
    let mut director = SimpleScoreDirector::new(Lineup::new(vec![1, 1, 2]), duplicate_pairs);
    assert_eq!(director.calculate_score(), SimpleScore::of(-1));
    assert_eq!(director.working_solution().score(), Some(SimpleScore::of(-1)));

    change(&mut director, 2, 1);
    assert_eq!(director.calculate_score(), SimpleScore::of(-3));
}

#[test]
fn test_incremental_matches_simple_director() {
    let mut incremental = incremental_factory().build_score_director(Lineup::new(vec![0, 1, 2, 3]));
    let mut simple = SimpleScoreDirector::new(Lineup::new(vec![0, 1, 2, 3]), duplicate_pairs);

    for (entity_index, value) in [(0, 1), (2, 1), (3, 1), (1, 5), (0, 5)] {
        change(&mut incremental, entity_index, value);
        change(&mut simple, entity_index, value);
        assert_eq!(incremental.calculate_score(), simple.calculate_score());
    }
    assert!(incremental.is_incremental());
    assert_eq!(incremental.pending_change_count(), 0);
}

#[test]
#[should_panic(expected = "programming error")]
fn test_after_without_before_panics() {
    let mut director = incremental_factory().build_score_director(Lineup::new(vec![0, 1]));
    director.after_variable_changed(0, 1, "value");
}

#[test]
#[should_panic(expected = "programming error")]
fn test_after_for_other_entity_panics() {
    let mut director = incremental_factory().build_score_director(Lineup::new(vec![0, 1]));
    director.before_variable_changed(0, 0, "value");
    director.after_variable_changed(0, 1, "value");
}

#[test]
#[should_panic(expected = "after_entity_added")]
fn test_after_entity_added_needs_matching_kind() {
    let mut director = incremental_factory().build_score_director(Lineup::new(vec![0, 1]));
    director.before_variable_changed(0, 1, "value");
    director.after_entity_added(0, 1);
}

#[test]
fn test_entity_added_resets_by_default() {
    let mut director = incremental_factory().build_score_director(Lineup::new(vec![4, 5]));
    assert_eq!(director.calculate_score(), SimpleScore::of(0));

    director.before_entity_added(0, 2);
    director.working_solution_mut().values.push(4);
    director.after_entity_added(0, 2);
    assert_eq!(director.calculate_score(), SimpleScore::of(-1));

    director.before_entity_removed(0, 0);
    director.working_solution_mut().values.remove(0);
    director.after_entity_removed(0, 0);
    assert_eq!(director.calculate_score(), SimpleScore::of(0));
}

#[test]
fn test_set_working_solution_reinitializes() {
    let mut director = incremental_factory().build_score_director(Lineup::new(vec![1, 2]));
    director.before_variable_changed(0, 0, "value");
    director.set_working_solution(Lineup::new(vec![3, 3, 3]));
    assert_eq!(director.pending_change_count(), 0);
    assert_eq!(director.calculate_score(), SimpleScore::of(-3));
}

#[test]
fn test_recording_undo_restores_incremental_score() {
    let mut director = incremental_factory().build_score_director(Lineup::new(vec![1, 2, 3]));
    let before = director.calculate_score();

    let mut recording = RecordingScoreDirector::new(&mut director);
    let old_value = recording.working_solution().values[2];
    change(&mut recording, 2, 1);
    recording.register_undo(Box::new(move |s: &mut Lineup| s.values[2] = old_value));
    assert_eq!(recording.calculate_score(), SimpleScore::of(-1));
    assert_eq!(recording.change_count(), 1);

    recording.undo_changes();
    assert!(recording.is_empty());
    assert_eq!(recording.calculate_score(), before);
    recording
        .assert_expected_working_score(before, "undo of change 2 -> 1")
        .unwrap();
    drop(recording);

    assert_eq!(director.working_solution().values, vec![1, 2, 3]);
    assert_eq!(director.pending_change_count(), 0);
}

#[test]
fn test_from_scratch_assertion_detects_corruption() {
    let factory = IncrementalScoreDirectorFactory::new(ForgetfulCalculator::default);
    let mut director = factory.build_score_director(Lineup::new(vec![1, 1, 2]));
    change(&mut director, 2, 1);
    let working = director.calculate_score();

    let err = director
        .assert_working_score_from_scratch(working, "step 1")
        .unwrap_err();
    match err {
        TesseraError::ScoreCorruption {
            completed_action,
            expected,
            actual,
        } => {
            assert_eq!(completed_action, "step 1");
            assert_eq!(expected, "-3");
            assert_eq!(actual, working.to_string());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_assertion_score_fn_overrides_fresh_calculator() {
    let factory = IncrementalScoreDirectorFactory::new(ForgetfulCalculator::default)
        .with_assertion_score_fn(|_: &Lineup| SimpleScore::of(-100));
    let mut director = factory.build_score_director(Lineup::new(vec![1]));
    let working = director.calculate_score();
    let err = director
        .assert_working_score_from_scratch(working, "init")
        .unwrap_err();
    assert!(err.to_string().contains("expected -100"));
}

#[test]
fn test_expected_score_assertion() {
    let mut director = incremental_factory().build_score_director(Lineup::new(vec![7, 7]));
    assert!(director
        .assert_expected_working_score(SimpleScore::of(-1), "init")
        .is_ok());
    let err = director
        .assert_expected_working_score(SimpleScore::of(0), "step 3")
        .unwrap_err();
    assert!(err.is_assertion_failure());
}

#[derive(Clone, Debug)]
struct Shifts {
    hours: Vec<i64>,
    cached_total: i64,
    score: Option<SimpleScore>,
}

impl PlanningSolution for Shifts {
    type Score = SimpleScore;

    fn score(&self) -> Option<Self::Score> {
        self.score
    }

    fn set_score(&mut self, score: Option<Self::Score>) {
        self.score = score;
    }
}

impl ShadowVariableSupport for Shifts {
    fn update_entity_shadows(&mut self, _entity_index: usize) {
        self.cached_total = self.hours.iter().sum();
    }

    fn update_all_shadows(&mut self) {
        self.cached_total = self.hours.iter().sum();
    }
}

fn overtime(solution: &Shifts) -> SimpleScore {
    SimpleScore::of(-(solution.cached_total - 40).max(0))
}

#[test]
fn test_shadow_aware_updates_shadows_before_scoring() {
    let solution = Shifts {
        hours: vec![20, 20],
        cached_total: 0,
        score: None,
    };
    let factory = ShadowAwareScoreDirectorFactory::new(SimpleScoreDirectorFactory::new(overtime));
    let mut director = factory.build_score_director(solution);
    assert_eq!(director.working_solution().cached_total, 40);

    director.before_variable_changed(0, 1, "hours");
    director.working_solution_mut().hours[1] = 25;
    director.after_variable_changed(0, 1, "hours");
    assert_eq!(director.calculate_score(), SimpleScore::of(-5));

    let score = director.calculate_score();
    assert!(director
        .assert_shadow_variables_are_not_stale(score, "step 1")
        .is_ok());
}

#[test]
fn test_stale_shadow_variables_are_detected() {
    let solution = Shifts {
        hours: vec![20, 20],
        cached_total: 40,
        score: None,
    };
    let mut director = ShadowAwareScoreDirector::new(SimpleScoreDirector::new(solution, overtime));

    // Mutation that bypasses the notification protocol
    director.working_solution_mut().hours[0] = 30;
    let working = director.calculate_score();
    assert_eq!(working, SimpleScore::of(0));

    let err = director
        .assert_shadow_variables_are_not_stale(working, "step 7")
        .unwrap_err();
    assert!(matches!(err, TesseraError::ShadowVariableStale { .. }));
    assert!(err.to_string().contains("step 7"));
}

#[test]
fn test_factory_builds_independent_directors() {
    let factory = incremental_factory();
    let mut first = factory.build_score_director(Lineup::new(vec![1, 1]));
    let mut second = factory.build_score_director(Lineup::new(vec![1, 2]));

    change(&mut first, 1, 2);
    assert_eq!(first.calculate_score(), SimpleScore::of(0));
    assert_eq!(second.calculate_score(), SimpleScore::of(0));
    change(&mut second, 1, 1);
    assert_eq!(second.calculate_score(), SimpleScore::of(-1));
}

proptest! {
    #[test]
    fn prop_replay_equals_reset(
        initial in proptest::collection::vec(0i64..5, 1..12),
        changes in proptest::collection::vec((0usize..12, 0i64..5), 0..40),
    ) {
        let mut director = incremental_factory().build_score_director(Lineup::new(initial.clone()));
        for (entity_index, value) in changes {
            let entity_index = entity_index % initial.len();
            change(&mut director, entity_index, value);
        }
        let replayed = director.calculate_score();

        let mut fresh = DuplicateCalculator::default();
        fresh.reset_working_solution(director.working_solution());
        prop_assert_eq!(replayed, fresh.calculate_score());
        prop_assert_eq!(replayed, duplicate_pairs(director.working_solution()));
    }

    #[test]
    fn prop_do_then_undo_is_identity(
        initial in proptest::collection::vec(0i64..4, 1..10),
        entity_index in 0usize..10,
        value in 0i64..4,
    ) {
        let entity_index = entity_index % initial.len();
        let mut director = incremental_factory().build_score_director(Lineup::new(initial.clone()));
        let before = director.calculate_score();

        let mut recording = RecordingScoreDirector::new(&mut director);
        let old_value = recording.working_solution().values[entity_index];
        change(&mut recording, entity_index, value);
        recording.register_undo(Box::new(move |s: &mut Lineup| s.values[entity_index] = old_value));
        recording.undo_changes();

        prop_assert_eq!(recording.calculate_score(), before);
        prop_assert_eq!(&recording.working_solution().values, &initial);
    }
}
