use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::domain::{BookingRequest, ShelterLocation};

pub const DEFAULT_MATCH_THRESHOLD: i16 = 60;
pub const DEFAULT_UNMET_NEED_PENALTY: i16 = 15;

const BASE_SCORE: i16 = 100;

/// Tunable dials for the safety match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub match_threshold: i16,
    pub unmet_need_penalty: i16,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            unmet_need_penalty: DEFAULT_UNMET_NEED_PENALTY,
        }
    }
}

/// Verdict for one (request, location snapshot) pair. Derived data only;
/// never persisted or cached past the evaluation that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyMatchOutcome {
    pub is_match: bool,
    pub safety_score: i16,
    pub reasons: Vec<String>,
}

/// Stateless evaluator scoring how well a location covers a requester's needs.
#[derive(Debug, Clone)]
pub struct SafetyMatchEvaluator {
    config: MatchConfig,
}

impl SafetyMatchEvaluator {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Score starts at 100 and drops by a fixed penalty per unmet need; the
    /// capacity and placement gates override the score outright.
    pub fn evaluate(&self, request: &BookingRequest, location: &ShelterLocation) -> SafetyMatchOutcome {
        let mut score = BASE_SCORE;
        let mut reasons = Vec::new();

        let mut seen = BTreeSet::new();
        for need in &request.special_needs {
            if !seen.insert(*need) {
                continue;
            }
            if !location.resources.offers(*need) {
                score -= self.config.unmet_need_penalty;
                reasons.push(format!(
                    "{} support is not available at {}",
                    need.label(),
                    location.name
                ));
            }
        }

        for need in &request.accessibility_needs {
            if !location.supports_accessibility(need) {
                score -= self.config.unmet_need_penalty;
                reasons.push(format!(
                    "accessibility need '{need}' is not met at {}",
                    location.name
                ));
            }
        }

        let score = score.max(0);

        let mut placeable = true;
        if !location.accepting_placements {
            placeable = false;
            reasons.push(format!("{} is not accepting placements", location.name));
        }
        if location.capacity.available < request.number_of_guests {
            placeable = false;
            reasons.push(format!(
                "only {} of {} requested beds are available at {}",
                location.capacity.available, request.number_of_guests, location.name
            ));
        }

        SafetyMatchOutcome {
            is_match: placeable && score >= self.config.match_threshold,
            safety_score: score,
            reasons,
        }
    }
}
