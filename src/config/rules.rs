// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Missed-workout rule registry
//!
//! Maps each session kind to the status it takes when its date passes with
//! no matching activity, plus the rule IDs cited in the adaptation log.
//! The table is data: a built-in default, replaceable by a TOML file of
//! `[[rules]]` entries.

use crate::constants::rule_ids;
use crate::models::{SessionKind, SessionStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Problems found while loading a rule table
#[derive(Debug, thiserror::Error)]
pub enum RuleTableError {
    #[error("Failed to read rule table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse rule table {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Rule for {kind} must resolve to missed or skipped, not {status}")]
    InvalidStatus { kind: SessionKind, status: SessionStatus },

    #[error("Rule for {kind} lists no rule IDs")]
    EmptyRuleIds { kind: SessionKind },
}

/// Outcome of a missed session of one kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissedRule {
    pub kind: SessionKind,
    pub status: SessionStatus,
    pub rule_ids: Vec<String>,
    /// Human-readable guidance surfaced with the adaptation event
    #[serde(default)]
    pub citation: String,
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    rules: Vec<MissedRule>,
}

/// Kind-indexed missed-workout rules
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable {
    rules: BTreeMap<SessionKind, MissedRule>,
    fallback: MissedRule,
}

fn rule(kind: SessionKind, status: SessionStatus, rule_id: &str, citation: &str) -> MissedRule {
    MissedRule {
        kind,
        status,
        rule_ids: vec![rule_id.to_string()],
        citation: citation.to_string(),
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        use SessionKind::*;
        use SessionStatus::{Missed, Skipped};

        let entries = vec![
            rule(
                LongRun,
                Missed,
                rule_ids::LR_MISSED_SWAP_OR_SHORTEN,
                "Swap the long run onto the next free day this week, or shorten next week's long run instead of stacking volume",
            ),
            rule(
                Tempo,
                Missed,
                rule_ids::TEMPO_MISSED_DO_NOT_STACK,
                "Do not stack the missed tempo onto the next quality day; resume the plan",
            ),
            rule(
                Intervals,
                Missed,
                rule_ids::INTERVALS_MISSED_DROP_FIRST,
                "Intervals are the first session to drop; do not make them up",
            ),
            rule(
                MarathonPace,
                Missed,
                rule_ids::MP_MISSED_FOLD_INTO_LR,
                "Fold a short marathon-pace block into the next long run",
            ),
            rule(
                Strength,
                Missed,
                rule_ids::STRENGTH_MISSED_RESUME_ROTATION,
                "Resume the split rotation where it stopped; do not double up",
            ),
            rule(Cycling, Missed, rule_ids::BIKE_MISSED_NO_MAKEUP, "No make-up ride; continue the week"),
            rule(Bike, Missed, rule_ids::BIKE_MISSED_NO_MAKEUP, "No make-up ride; continue the week"),
            rule(Swim, Missed, rule_ids::SWIM_MISSED_NO_MAKEUP, "No make-up swim; continue the week"),
            rule(
                Brick,
                Missed,
                rule_ids::BRICK_MISSED_SPLIT_OR_DROP,
                "Split the brick into its easy component on a free day, or drop it",
            ),
            rule(Z2, Skipped, rule_ids::Z2_SKIPPED_NO_SWAP, "Easy aerobic work is not swapped"),
            rule(Easy, Skipped, rule_ids::Z2_SKIPPED_NO_SWAP, "Easy aerobic work is not swapped"),
            rule(Shakeout, Skipped, rule_ids::Z2_SKIPPED_NO_SWAP, "Easy aerobic work is not swapped"),
        ];

        Self::from_entries(entries)
    }
}

impl RuleTable {
    fn from_entries(entries: Vec<MissedRule>) -> Self {
        let rules = entries.into_iter().map(|rule| (rule.kind, rule)).collect();
        Self {
            rules,
            fallback: rule(
                SessionKind::Z2,
                SessionStatus::Skipped,
                rule_ids::UNTRACKED_SKIPPED,
                "Kind not covered by the rule table",
            ),
        }
    }

    /// Build from explicit entries, rejecting statuses other than missed/skipped
    pub fn from_rules(entries: Vec<MissedRule>) -> Result<Self, RuleTableError> {
        for entry in &entries {
            if !matches!(entry.status, SessionStatus::Missed | SessionStatus::Skipped) {
                return Err(RuleTableError::InvalidStatus {
                    kind: entry.kind,
                    status: entry.status,
                });
            }
            if entry.rule_ids.is_empty() {
                return Err(RuleTableError::EmptyRuleIds { kind: entry.kind });
            }
        }
        Ok(Self::from_entries(entries))
    }

    /// Load a `[[rules]]` TOML table
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, RuleTableError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| RuleTableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file: RuleFile = toml::from_str(&content).map_err(|source| RuleTableError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_rules(file.rules)
    }

    /// Rule for `kind`; kinds without an entry are skipped as untracked
    pub fn lookup(&self, kind: SessionKind) -> &MissedRule {
        self.rules.get(&kind).unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_table_matches_tracked_kinds() {
        let table = RuleTable::default();
        assert_eq!(table.len(), SessionKind::ALL.len());

        for kind in SessionKind::ALL {
            let expected = if kind.is_tracked() {
                SessionStatus::Missed
            } else {
                SessionStatus::Skipped
            };
            assert_eq!(table.lookup(kind).status, expected, "kind {}", kind);
        }

        assert_eq!(
            table.lookup(SessionKind::LongRun).rule_ids,
            vec![rule_ids::LR_MISSED_SWAP_OR_SHORTEN.to_string()]
        );
        assert_eq!(
            table.lookup(SessionKind::Intervals).rule_ids,
            vec![rule_ids::INTERVALS_MISSED_DROP_FIRST.to_string()]
        );
    }

    #[test]
    fn test_load_table_from_toml() -> anyhow::Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(
            temp_file,
            r#"
[[rules]]
kind = "LR"
status = "skipped"
rule_ids = ["LR_CUSTOM"]
citation = "Custom long-run policy"
"#
        )?;

        let table = RuleTable::load_from_file(temp_file.path())?;
        assert_eq!(table.lookup(SessionKind::LongRun).status, SessionStatus::Skipped);
        assert_eq!(
            table.lookup(SessionKind::Tempo).rule_ids,
            vec![rule_ids::UNTRACKED_SKIPPED.to_string()]
        );
        Ok(())
    }

    #[test]
    fn test_rejects_completed_status() {
        let result = RuleTable::from_rules(vec![rule(
            SessionKind::Tempo,
            SessionStatus::Completed,
            "X",
            "",
        )]);
        assert!(matches!(result, Err(RuleTableError::InvalidStatus { .. })));
    }
}
