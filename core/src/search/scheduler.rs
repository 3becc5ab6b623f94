//! Saturation scheduler
//!
//! Rule matches are enumerated once per run (or read from the match cache)
//! since they only depend on the numeric model. Every level then:
//!
//! 1. checks the budget,
//! 2. verifies the not yet applied matches against the state at level start,
//! 3. applies them in order,
//! 4. commits cheap table derivations (equalities and constants), and
//!    angle/ratio pair derivations only when the cheap ones added nothing.
//!
//! The goal is checked after each phase. A level that adds nothing ends the
//! run.

use super::stats::{LevelStats, Outcome, SearchResult};
use crate::algebra::{derive_new_facts, Derivation};
use crate::error::{DdarError, DdarResult};
use crate::geometry::justify;
use crate::ir::{Dependency, EntityId, GeoState, Reason, Statement};
use crate::rules::{all_rules, enumerate_all, verify, Binding, MatchCache, Rule};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Solver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Maximum number of levels
    pub max_levels: usize,

    /// Wall-clock budget, checked once per level
    pub timeout_ms: u64,

    /// Match cache file
    pub cache_path: Option<PathBuf>,

    /// Run the algebraic derivation sweep after the rules
    pub use_algebra: bool,

    /// Cap on angle/ratio pair derivations per level
    pub max_pair_derivations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_levels: 20,
            timeout_ms: 60_000,
            cache_path: None,
            use_algebra: true,
            max_pair_derivations: 200,
        }
    }
}

/// Level-by-level forward chaining solver
#[derive(Debug, Clone)]
pub struct Solver {
    config: SolverConfig,
    rules: Vec<Rule>,
}

impl Solver {
    /// Solver with the default rule set
    pub fn new(config: SolverConfig) -> DdarResult<Self> {
        Ok(Self::with_rules(config, all_rules()?))
    }

    pub fn with_rules(config: SolverConfig, rules: Vec<Rule>) -> Self {
        Self { config, rules }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Run until the goal is proved, saturation, or the budget runs out
    ///
    /// Everything committed before termination stays in the state.
    pub fn run(&self, state: &mut GeoState) -> DdarResult<SearchResult> {
        let start = Instant::now();
        let goal = state.goal.clone().ok_or(DdarError::NoGoal)?;

        let mut cache = self
            .config
            .cache_path
            .as_ref()
            .map(|path| MatchCache::load(path, state.fingerprint()));
        let matches = self.matches(state, cache.as_mut());

        let searched = self.search(state, &goal, &matches, start);

        if let (Some(cache), Some(path)) = (&cache, &self.config.cache_path) {
            if cache.is_dirty() {
                if let Err(e) = cache.save(path) {
                    warn!(path = %path.display(), error = %e, "failed to write match cache");
                }
            }
        }

        let mut result = searched?;
        result.elapsed_ms = elapsed_ms(start);
        if result.solved() {
            state.ensure_proved(&goal)?;
            result.proof = Some(state.proof_trace()?);
        }
        info!(
            outcome = %result.outcome,
            levels = result.levels_run(),
            elapsed_ms = result.elapsed_ms,
            "search finished"
        );
        Ok(result)
    }

    /// Bindings for every rule, from the cache where possible
    fn matches(&self, state: &GeoState, mut cache: Option<&mut MatchCache>) -> Vec<Vec<Binding>> {
        let mut matches: Vec<Option<Vec<Binding>>> = self
            .rules
            .iter()
            .map(|rule| {
                cache
                    .as_deref()
                    .and_then(|c| c.bindings(state, &rule.signature()))
            })
            .collect();

        let missing: Vec<usize> = (0..matches.len()).filter(|i| matches[*i].is_none()).collect();
        let rules: Vec<&Rule> = missing.iter().map(|i| &self.rules[*i]).collect();
        let fresh = enumerate_all(&rules, state.points(), state.coordinates());
        debug!(
            cached = self.rules.len() - missing.len(),
            enumerated = missing.len(),
            "rule matches ready"
        );

        for (i, bindings) in missing.into_iter().zip(fresh) {
            if let Some(cache) = cache.as_deref_mut() {
                cache.insert_bindings(state, self.rules[i].signature(), &bindings);
            }
            matches[i] = Some(bindings);
        }
        matches.into_iter().map(Option::unwrap_or_default).collect()
    }

    fn search(
        &self,
        state: &mut GeoState,
        goal: &Statement,
        matches: &[Vec<Binding>],
        start: Instant,
    ) -> DdarResult<SearchResult> {
        let budget = Duration::from_millis(self.config.timeout_ms);
        let mut result = SearchResult::new(Outcome::Exhausted);
        if state.is_proved(goal) {
            result.outcome = Outcome::Solved;
            return Ok(result);
        }

        let mut applied: FxHashSet<(usize, &Binding)> = FxHashSet::default();

        for level in 1..=self.config.max_levels {
            if start.elapsed() >= budget {
                info!(level, "time budget exhausted");
                return Ok(result);
            }
            let level_start = Instant::now();
            let level = u32::try_from(level).unwrap_or(u32::MAX);
            state.set_level(level);
            let mut stats = LevelStats {
                level,
                ..LevelStats::default()
            };

            // Matching: premises are judged against the state at level start
            let mut candidates = Vec::new();
            for (index, bindings) in matches.iter().enumerate() {
                let rule = &self.rules[index];
                for binding in bindings {
                    if !applied.contains(&(index, binding)) && verify(state, rule, binding) {
                        applied.insert((index, binding));
                        candidates.push((index, binding));
                    }
                }
            }
            stats.candidates = candidates.len();

            // Applying
            for (index, binding) in candidates {
                stats.rule_facts += self.apply(state, &self.rules[index], binding, level)?;
            }
            if state.is_proved(goal) {
                result.outcome = Outcome::Solved;
                self.finish_level(&mut result, stats, level_start, state);
                return Ok(result);
            }

            if self.config.use_algebra {
                let derived = derive_new_facts(state, level, self.config.max_pair_derivations);
                stats.algebra_facts += commit_derivations(state, &derived.cheap, level)?;
                if stats.algebra_facts == 0 && !state.is_proved(goal) {
                    stats.algebra_facts += commit_derivations(state, &derived.pairs, level)?;
                }
            }
            let solved = state.is_proved(goal);
            let progress = stats.new_facts() > 0;
            self.finish_level(&mut result, stats, level_start, state);

            if solved {
                result.outcome = Outcome::Solved;
                return Ok(result);
            }
            if !progress {
                info!(level, "saturated without reaching the goal");
                result.outcome = Outcome::Failed;
                return Ok(result);
            }
        }

        info!(max_levels = self.config.max_levels, "level budget exhausted");
        Ok(result)
    }

    fn finish_level(
        &self,
        result: &mut SearchResult,
        mut stats: LevelStats,
        level_start: Instant,
        state: &GeoState,
    ) {
        stats.elapsed_ms = elapsed_ms(level_start);
        info!(
            level = stats.level,
            candidates = stats.candidates,
            rule_facts = stats.rule_facts,
            algebra_facts = stats.algebra_facts,
            proved = state.proofs.num_proved(),
            "level complete"
        );
        result.levels.push(stats);
    }

    /// Commit the conclusions of one verified match, returning how many
    /// were new
    fn apply(
        &self,
        state: &mut GeoState,
        rule: &Rule,
        binding: &[EntityId],
        level: u32,
    ) -> DdarResult<usize> {
        let premises = rule.ground_premises(binding)?;
        let mut new = 0;
        for conclusion in rule.ground_conclusions(binding)? {
            if state.proofs.has(&conclusion) {
                continue;
            }
            debug!(rule = rule.id(), statement = %state.render(&conclusion), level, "rule fired");
            let dependency = Dependency::new(
                conclusion,
                Reason::Rule(rule.id().to_string()),
                premises.clone(),
                level,
            );
            if state.commit(dependency)?.is_some() {
                new += 1;
            }
        }
        Ok(new)
    }
}

/// Commit table derivations, certifying each one only now
fn commit_derivations(state: &mut GeoState, derived: &[Derivation], level: u32) -> DdarResult<usize> {
    let mut new = 0;
    for d in derived {
        if state.proofs.has(&d.statement) {
            continue;
        }
        let justification = match justify(state, &d.statement) {
            Ok(j) => j,
            Err(DdarError::NotTrue(s)) => {
                debug!(statement = %s, "derivation no longer certifiable");
                continue;
            }
            Err(e) => return Err(e),
        };
        debug!(
            statement = %state.render(&d.statement),
            table = ?d.table,
            level,
            "table derivation"
        );
        let dependency = Dependency::new(
            d.statement.clone(),
            justification.reason,
            justification.premises,
            level,
        );
        if state.commit(dependency)?.is_some() {
            new += 1;
        }
    }
    Ok(new)
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}
