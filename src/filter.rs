use log::{debug, info, warn};
use regex::{Regex, RegexBuilder};

use crate::config::MatchMode;
use crate::error::FilterError;

/// Whether the source list has arrived yet.
#[derive(Debug, Clone, Default)]
pub enum SourceState {
    #[default]
    Unloaded,
    Ready(Vec<String>),
}

/// Outcome of a query change that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    /// The query was too short; results were cleared.
    Cleared,
    /// The query was matched; holds the number of matches.
    Matched(usize),
    /// The query did not compile as a pattern; treated as no matches.
    InvalidPattern(String),
}

/// Filters a source list that is loaded once against a changing query.
#[derive(Debug, Clone)]
pub struct FilterList {
    source: SourceState,
    min_query_len: usize,
    mode: MatchMode,
    matches: Vec<String>,
}

impl FilterList {
    pub fn new(min_query_len: usize, mode: MatchMode) -> Self {
        Self{source: SourceState::Unloaded, min_query_len, mode, matches: Vec::new()}
    }

    /// Moves from `Unloaded` to `Ready`. Only the first call succeeds.
    pub fn load(&mut self, source: Vec<String>) -> Result<(), FilterError> {
        match self.source {
            SourceState::Ready(_) => Err(FilterError::AlreadyLoaded),
            SourceState::Unloaded => {
                info!("source list ready with {} entries", source.len());
                self.source = SourceState::Ready(source);
                Ok(())
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.source, SourceState::Ready(_))
    }

    /// Recomputes the matches for `query` from scratch.
    ///
    /// Queries of `min_query_len` characters or fewer clear the matches whether or not the
    /// source is loaded. Longer queries against an unloaded source fail with
    /// [`FilterError::Unloaded`], leaving no matches behind.
    pub fn update(&mut self, query: &str) -> Result<Refresh, FilterError> {
        self.matches.clear();

        if query.chars().count() <= self.min_query_len {
            return Ok(Refresh::Cleared);
        }

        let source = match &self.source {
            SourceState::Ready(source) => source,
            SourceState::Unloaded => return Err(FilterError::Unloaded),
        };

        let re = match build_matcher(query, self.mode) {
            Ok(re) => re,
            Err(err) => {
                warn!("query {query:?} is not a valid pattern: {err}");
                return Ok(Refresh::InvalidPattern(err.to_string()));
            },
        };

        self.matches = source.iter().filter(|x| re.is_match(x)).cloned().collect();
        debug!("query {query:?} matched {} entries", self.matches.len());
        Ok(Refresh::Matched(self.matches.len()))
    }

    pub fn matches(&self) -> &[String] {
        &self.matches
    }
}

fn build_matcher(query: &str, mode: MatchMode) -> Result<Regex, regex::Error> {
    let pattern = match mode {
        MatchMode::Pattern => query.to_string(),
        MatchMode::Substring => regex::escape(query),
    };
    RegexBuilder::new(&pattern).case_insensitive(true).build()
}
