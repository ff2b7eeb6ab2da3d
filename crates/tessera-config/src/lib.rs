//! Configuration system for Tessera.
//!
//! Load solver configuration from TOML or YAML to control termination,
//! phases, partitioning and acceptors without code changes.
//!
//! # Examples
//!
//! ```
//! use tessera_config::{PhaseConfig, SolverConfig};
//! use std::time::Duration;
//!
//! let config = SolverConfig::from_toml_str(r#"
//!     environment_mode = "reproducible"
//!     random_seed = 7
//!
//!     [termination]
//!     seconds_spent_limit = 30
//!
//!     [[phases]]
//!     type = "partitioned_search"
//!     solution_partitioner = "by_group"
//!     runnable_part_thread_limit = "availableProcessorCount / 2"
//!
//!     [phases.solution_partitioner_custom_properties]
//!     group_field = "department"
//! "#).unwrap();
//!
//! assert_eq!(config.time_limit(), Some(Duration::from_secs(30)));
//! let PhaseConfig::PartitionedSearch(partitioned) = &config.phases[0] else {
//!     panic!("expected a partitioned search phase");
//! };
//! assert_eq!(partitioned.nested_phases().len(), 2);
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use tessera_config::SolverConfig;
//!
//! let config = SolverConfig::load("solver.toml").unwrap_or_default();
//! ```

pub mod expression;
mod inherit;
mod thread_limit;


use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tessera_core::TesseraError;

pub use expression::ExpressionError;
pub use inherit::Inherit;
use inherit::{inherit_config, inherit_list, inherit_map, inherit_optional_list, inherit_property};
pub use thread_limit::RunnablePartThreadLimit;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("The runnable_part_thread_limit ({expression}) is invalid: {reason}")]
    InvalidThreadLimit { expression: String, reason: String },
}

impl From<ConfigError> for TesseraError {
    fn from(err: ConfigError) -> Self {
        TesseraError::Config(err.to_string())
    }
}

/// Main solver configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SolverConfig {
    /// Environment mode affecting reproducibility and assertions.
    pub environment_mode: Option<EnvironmentMode>,

    /// Random seed for reproducible results.
    pub random_seed: Option<u64>,

    /// Solver-level termination.
    pub termination: Option<TerminationConfig>,

    /// Phase configurations, run in order.
    #[serde(default)]
    pub phases: Vec<PhaseConfig>,
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML or YAML file, chosen by extension.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist or cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn with_environment_mode(mut self, mode: EnvironmentMode) -> Self {
        self.environment_mode = Some(mode);
        self
    }

    pub fn with_termination_seconds(mut self, seconds: u64) -> Self {
        self.termination = Some(TerminationConfig {
            seconds_spent_limit: Some(seconds),
            ..self.termination.unwrap_or_default()
        });
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_phase(mut self, phase: PhaseConfig) -> Self {
        self.phases.push(phase);
        self
    }

    /// Returns the configured environment mode or the default.
    pub fn environment_mode(&self) -> EnvironmentMode {
        self.environment_mode.unwrap_or_default()
    }

    /// Returns the termination time limit, if configured.
    pub fn time_limit(&self) -> Option<Duration> {
        self.termination.as_ref().and_then(|t| t.time_limit())
    }
}

impl Inherit for SolverConfig {
    fn inherit(&self, parent: &Self) -> Self {
        Self {
            environment_mode: inherit_property(&self.environment_mode, &parent.environment_mode),
            random_seed: inherit_property(&self.random_seed, &parent.random_seed),
            termination: inherit_config(&self.termination, &parent.termination),
            phases: inherit_list(&self.phases, &parent.phases),
        }
    }
}

/// Environment mode affecting reproducibility and assertions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentMode {
    /// No assertions, no guaranteed reproducibility.
    #[default]
    NonReproducible,

    /// Deterministic: the same seed yields the same result.
    Reproducible,

    /// Intrusive assertions that are cheap.
    FastAssert,

    /// Full recalculation checks that do not alter the search.
    NonIntrusiveFullAssert,

    /// All assertions.
    FullAssert,
}

impl EnvironmentMode {
    pub fn is_reproducible(self) -> bool {
        self != EnvironmentMode::NonReproducible
    }

    /// True for modes that recompute the step score from scratch.
    pub fn is_non_intrusive_full_asserted(self) -> bool {
        matches!(
            self,
            EnvironmentMode::NonIntrusiveFullAssert | EnvironmentMode::FullAssert
        )
    }

    /// True for modes that check the expected step score and shadow staleness.
    pub fn is_intrusive_fast_asserted(self) -> bool {
        matches!(self, EnvironmentMode::FastAssert | EnvironmentMode::FullAssert)
    }
}

/// How multiple termination criteria combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationCompositionStyle {
    /// Terminate when any criterion is met.
    #[default]
    Or,
    /// Terminate when all criteria are met.
    And,
}

/// Termination configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TerminationConfig {
    pub termination_composition_style: Option<TerminationCompositionStyle>,

    pub milliseconds_spent_limit: Option<u64>,

    /// Maximum seconds to spend.
    pub seconds_spent_limit: Option<u64>,

    /// Maximum minutes to spend.
    pub minutes_spent_limit: Option<u64>,

    /// Target best score, e.g. `"0hard/0soft"`.
    pub best_score_limit: Option<String>,

    /// Stop as soon as the best score is feasible.
    pub best_score_feasible: Option<bool>,

    /// Maximum number of steps.
    pub step_count_limit: Option<u64>,

    /// Maximum steps without improvement.
    pub unimproved_step_count_limit: Option<u64>,

    /// Maximum seconds without improvement.
    pub unimproved_seconds_spent_limit: Option<u64>,
}

impl TerminationConfig {
    /// Returns the summed time limit, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        let millis = self
            .milliseconds_spent_limit
            .unwrap_or(0)
            .saturating_add(self.seconds_spent_limit.unwrap_or(0).saturating_mul(1_000))
            .saturating_add(self.minutes_spent_limit.unwrap_or(0).saturating_mul(60_000));
        if millis > 0 {
            Some(Duration::from_millis(millis))
        } else {
            None
        }
    }

    pub fn unimproved_time_limit(&self) -> Option<Duration> {
        self.unimproved_seconds_spent_limit.map(Duration::from_secs)
    }

    pub fn composition_style(&self) -> TerminationCompositionStyle {
        self.termination_composition_style.unwrap_or_default()
    }

    pub fn with_step_count_limit(mut self, steps: u64) -> Self {
        self.step_count_limit = Some(steps);
        self
    }

    pub fn with_milliseconds_spent_limit(mut self, millis: u64) -> Self {
        self.milliseconds_spent_limit = Some(millis);
        self
    }
}

impl Inherit for TerminationConfig {
    fn inherit(&self, parent: &Self) -> Self {
        Self {
            termination_composition_style: inherit_property(
                &self.termination_composition_style,
                &parent.termination_composition_style,
            ),
            milliseconds_spent_limit: inherit_property(
                &self.milliseconds_spent_limit,
                &parent.milliseconds_spent_limit,
            ),
            seconds_spent_limit: inherit_property(
                &self.seconds_spent_limit,
                &parent.seconds_spent_limit,
            ),
            minutes_spent_limit: inherit_property(
                &self.minutes_spent_limit,
                &parent.minutes_spent_limit,
            ),
            best_score_limit: inherit_property(&self.best_score_limit, &parent.best_score_limit),
            best_score_feasible: inherit_property(
                &self.best_score_feasible,
                &parent.best_score_feasible,
            ),
            step_count_limit: inherit_property(&self.step_count_limit, &parent.step_count_limit),
            unimproved_step_count_limit: inherit_property(
                &self.unimproved_step_count_limit,
                &parent.unimproved_step_count_limit,
            ),
            unimproved_seconds_spent_limit: inherit_property(
                &self.unimproved_seconds_spent_limit,
                &parent.unimproved_seconds_spent_limit,
            ),
        }
    }
}

/// Phase configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PhaseConfig {
    ConstructionHeuristic(ConstructionHeuristicConfig),
    LocalSearch(LocalSearchConfig),
    PartitionedSearch(PartitionedSearchConfig),
}

impl PhaseConfig {
    /// Returns the phase-level termination, if any.
    pub fn termination(&self) -> Option<&TerminationConfig> {
        match self {
            PhaseConfig::ConstructionHeuristic(c) => c.termination.as_ref(),
            PhaseConfig::LocalSearch(c) => c.termination.as_ref(),
            PhaseConfig::PartitionedSearch(c) => c.termination.as_ref(),
        }
    }
}

impl Inherit for PhaseConfig {
    fn inherit(&self, parent: &Self) -> Self {
        match (self, parent) {
            (PhaseConfig::ConstructionHeuristic(c), PhaseConfig::ConstructionHeuristic(p)) => {
                PhaseConfig::ConstructionHeuristic(c.inherit(p))
            }
            (PhaseConfig::LocalSearch(c), PhaseConfig::LocalSearch(p)) => {
                PhaseConfig::LocalSearch(c.inherit(p))
            }
            (PhaseConfig::PartitionedSearch(c), PhaseConfig::PartitionedSearch(p)) => {
                PhaseConfig::PartitionedSearch(c.inherit(p))
            }
            (child, _) => child.clone(),
        }
    }
}

/// Construction heuristic configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ConstructionHeuristicConfig {
    pub construction_heuristic_type: Option<ConstructionHeuristicType>,

    /// Phase termination configuration.
    pub termination: Option<TerminationConfig>,
}

impl Inherit for ConstructionHeuristicConfig {
    fn inherit(&self, parent: &Self) -> Self {
        Self {
            construction_heuristic_type: inherit_property(
                &self.construction_heuristic_type,
                &parent.construction_heuristic_type,
            ),
            termination: inherit_config(&self.termination, &parent.termination),
        }
    }
}

/// Construction heuristic types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionHeuristicType {
    /// Assign each entity, in order, the value with the best score.
    #[default]
    FirstFit,

    /// Like first fit, but take the first value that keeps the score feasible.
    FirstFeasibleFit,
}

/// Local search configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LocalSearchConfig {
    pub acceptor: Option<AcceptorConfig>,

    pub forager: Option<ForagerConfig>,

    /// Phase termination configuration.
    pub termination: Option<TerminationConfig>,
}

impl Inherit for LocalSearchConfig {
    fn inherit(&self, parent: &Self) -> Self {
        Self {
            acceptor: inherit_property(&self.acceptor, &parent.acceptor),
            forager: inherit_config(&self.forager, &parent.forager),
            termination: inherit_config(&self.termination, &parent.termination),
        }
    }
}

/// Acceptor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AcceptorConfig {
    /// Only accept moves that do not worsen the last step score.
    HillClimbing,

    /// Compare against the score from `late_acceptance_size` steps ago.
    LateAcceptance(LateAcceptanceConfig),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LateAcceptanceConfig {
    pub late_acceptance_size: Option<usize>,
}

/// Forager configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ForagerConfig {
    /// Number of accepted moves to collect before picking the step.
    pub accepted_count_limit: Option<usize>,
}

impl Inherit for ForagerConfig {
    fn inherit(&self, parent: &Self) -> Self {
        Self {
            accepted_count_limit: inherit_property(
                &self.accepted_count_limit,
                &parent.accepted_count_limit,
            ),
        }
    }
}

/// Partitioned search configuration.
///
/// Strategy fields hold ids resolved against the strategy registry the host
/// passes to the phase builder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PartitionedSearchConfig {
    /// Registry id of the solution partitioner.
    pub solution_partitioner: Option<String>,

    /// Properties handed to the partitioner factory.
    pub solution_partitioner_custom_properties: Option<BTreeMap<String, String>>,

    /// Registry id of the thread factory; unset uses `PartThread` naming.
    pub thread_factory: Option<String>,

    /// `"AUTO"`, `"UNLIMITED"` or an expression over `availableProcessorCount`.
    pub runnable_part_thread_limit: Option<String>,

    /// Requested number of partitions, passed to the partitioner.
    pub partition_count: Option<usize>,

    /// Nested phases run inside every partition.
    pub phases: Option<Vec<PhaseConfig>>,

    /// Phase termination configuration.
    pub termination: Option<TerminationConfig>,
}

impl PartitionedSearchConfig {
    pub fn with_solution_partitioner(mut self, id: impl Into<String>) -> Self {
        self.solution_partitioner = Some(id.into());
        self
    }

    pub fn with_custom_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.solution_partitioner_custom_properties
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_runnable_part_thread_limit(mut self, limit: impl Into<String>) -> Self {
        self.runnable_part_thread_limit = Some(limit.into());
        self
    }

    pub fn with_partition_count(mut self, count: usize) -> Self {
        self.partition_count = Some(count);
        self
    }

    pub fn with_phases(mut self, phases: Vec<PhaseConfig>) -> Self {
        self.phases = Some(phases);
        self
    }

    pub fn with_termination(mut self, termination: TerminationConfig) -> Self {
        self.termination = Some(termination);
        self
    }

    /// Returns the parsed thread limit setting.
    pub fn runnable_part_thread_limit(&self) -> RunnablePartThreadLimit {
        RunnablePartThreadLimit::from_config(self.runnable_part_thread_limit.as_deref())
    }

    /// Returns the nested phases, defaulting to construction heuristic then
    /// local search when unset or empty.
    pub fn nested_phases(&self) -> Vec<PhaseConfig> {
        match &self.phases {
            Some(phases) if !phases.is_empty() => phases.clone(),
            _ => vec![
                PhaseConfig::ConstructionHeuristic(ConstructionHeuristicConfig::default()),
                PhaseConfig::LocalSearch(LocalSearchConfig::default()),
            ],
        }
    }
}

impl Inherit for PartitionedSearchConfig {
    fn inherit(&self, parent: &Self) -> Self {
        Self {
            solution_partitioner: inherit_property(
                &self.solution_partitioner,
                &parent.solution_partitioner,
            ),
            solution_partitioner_custom_properties: inherit_map(
                &self.solution_partitioner_custom_properties,
                &parent.solution_partitioner_custom_properties,
            ),
            thread_factory: inherit_property(&self.thread_factory, &parent.thread_factory),
            runnable_part_thread_limit: inherit_property(
                &self.runnable_part_thread_limit,
                &parent.runnable_part_thread_limit,
            ),
            partition_count: inherit_property(&self.partition_count, &parent.partition_count),
            phases: inherit_optional_list(&self.phases, &parent.phases),
            termination: inherit_config(&self.termination, &parent.termination),
        }
    }
}
