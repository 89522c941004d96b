//! The keep/drop decision for a single test entry.

use crate::domain::MAX_REGRESSION_LEVEL;

/// Everything the filter needs to know about one test entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryState<'a> {
    /// The entry is marked for removal.
    pub removed: bool,
    /// The entry is marked to be kept.
    pub kept: bool,
    /// The entry's regression level: its own marker, else the inherited one.
    pub level: u8,
    /// The level inherited from the nearest ancestor carrying a marker.
    pub inherited: u8,
    /// Verification teams named by the entry's label.
    pub teams: Vec<&'a str>,
}

/// Decides whether a test entry belongs to the current test cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegressionFilter {
    /// The highest regression level run in this cycle.
    pub ceiling: u8,
    /// Verification teams this cycle is run for. Empty means every team.
    pub teams: Vec<String>,
}

impl Default for RegressionFilter {
    fn default() -> Self {
        Self::new(MAX_REGRESSION_LEVEL)
    }
}

impl RegressionFilter {
    /// A filter for every team, with `ceiling` clamped to
    /// [`MAX_REGRESSION_LEVEL`].
    #[must_use]
    pub fn new(ceiling: u8) -> Self {
        Self {
            ceiling: ceiling.min(MAX_REGRESSION_LEVEL),
            teams: Vec::new(),
        }
    }

    /// Restricts the filter to the given teams.
    #[must_use]
    pub fn with_teams(mut self, teams: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.teams = teams.into_iter().map(Into::into).collect();
        self
    }

    /// The highest level selected below an ancestor with level `inherited`.
    #[must_use]
    pub fn effective_cap(&self, inherited: u8) -> u8 {
        self.ceiling.min(inherited)
    }

    /// Whether `entry` is selected.
    ///
    /// A kept entry always is. Otherwise a removed entry never is; any other
    /// entry is when its level is within the effective cap and, if both the
    /// filter and the entry name teams, they share at least one.
    #[must_use]
    pub fn keeps(&self, entry: &EntryState<'_>) -> bool {
        if entry.kept {
            return true;
        }
        !entry.removed && entry.level <= self.effective_cap(entry.inherited) && self.covers_teams(&entry.teams)
    }

    fn covers_teams(&self, teams: &[&str]) -> bool {
        self.teams.is_empty()
            || teams.is_empty()
            || teams
                .iter()
                .any(|team| self.teams.iter().any(|wanted| wanted == team))
    }
}
