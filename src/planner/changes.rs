//! Plan output parsing.
//!
//! This module scrapes the human-readable change plan printed by the
//! provisioning tool and classifies every change record into new, in-place
//! changed, or destructive (relaunch) resources.

use std::borrow::Cow;
use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// ANSI SGR sequences such as `ESC[0m` or `ESC[1;32m`.
#[allow(clippy::expect_used)]
static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("static regex"));

/// `<prefix><whitespace><address>` at the start of a line.
#[allow(clippy::expect_used)]
static CHANGE_RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-/\+|\+/-|[-+~])\s+(\S+)").expect("static regex")
});

/// Resources with pending changes, as reported by the provisioning tool.
///
/// Categories are de-duplicated internally and keep first-seen order. The
/// same address may appear in more than one category on malformed input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    /// Resources that will be created.
    pub new: IndexSet<String>,
    /// Resources that will be changed in place.
    pub changed: IndexSet<String>,
    /// Resources that will be destroyed and/or recreated.
    pub relaunch: IndexSet<String>,
}

/// Classification of a single change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// `+`
    New,
    /// `~`
    Changed,
    /// Any prefix containing `-`.
    Relaunch,
}

impl ChangeKind {
    /// Classifies a change prefix. Destructive prefixes win.
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        if prefix.contains('-') {
            Some(Self::Relaunch)
        } else if prefix == "~" {
            Some(Self::Changed)
        } else if prefix == "+" {
            Some(Self::New)
        } else {
            None
        }
    }
}

impl ChangeSet {
    /// Returns true if no changes were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.changed.is_empty() && self.relaunch.is_empty()
    }

    /// Total number of change records across categories.
    #[must_use]
    pub fn total(&self) -> usize {
        self.new.len() + self.changed.len() + self.relaunch.len()
    }

    /// Records a change.
    pub fn insert(&mut self, kind: ChangeKind, address: impl Into<String>) {
        let address = address.into();
        match kind {
            ChangeKind::New => self.new.insert(address),
            ChangeKind::Changed => self.changed.insert(address),
            ChangeKind::Relaunch => self.relaunch.insert(address),
        };
    }
}

/// Removes ANSI color sequences from `text`.
#[must_use]
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ANSI_ESCAPE.replace_all(text, "")
}

/// Parses a single line into a change record, if it is one.
#[must_use]
pub fn parse_line(line: &str) -> Option<(ChangeKind, String)> {
    let line = strip_ansi(line);
    let captures = CHANGE_RECORD.captures(&line)?;
    let kind = ChangeKind::from_prefix(&captures[1])?;
    Some((kind, captures[2].to_string()))
}

/// Parses the full plan output.
///
/// Lines that are not change records (refresh progress, commentary, attribute
/// details, summaries) are ignored.
#[must_use]
pub fn parse_plan_output(text: &str) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for (kind, address) in text.lines().filter_map(parse_line) {
        changes.insert(kind, address);
    }

    debug!(
        "Parsed plan output: {} new, {} changed, {} relaunch",
        changes.new.len(),
        changes.changed.len(),
        changes.relaunch.len()
    );
    changes
}
