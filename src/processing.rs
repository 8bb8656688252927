use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use chrono::Weekday;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    ast::Log,
    observer::{Diagnostic, Observer, RefKind},
};

static PERSON_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(\w+)").expect("valid person ref regex"));
static PROJECT_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#(\w+)").expect("valid project ref regex"));
static DATE_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!(\d{4}-\d{2}-\d{2})").expect("valid date ref regex"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("undeclared references (people: [{}], projects: [{}])", join(.people), join(.projects))]
    Undeclared {
        people: BTreeSet<String>,
        projects: BTreeSet<String>,
    },
    #[error("undeclared dates referenced: [{}]", join(.0))]
    UndeclaredDates(BTreeSet<String>),
}

fn join(ids: &BTreeSet<String>) -> String {
    ids.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Checks that every `@person` and `#project` reference in the log's text
/// names a declared id.
///
/// Both kinds are checked before failing. Each undeclared id is reported to
/// `observer` (people first, then projects, each sorted) and the error
/// carries the complete sets.
pub fn check_references(log: &Log, observer: &mut dyn Observer) -> Result<(), ValidationError> {
    let people = undeclared(log, &PERSON_REF_RE, log.person_ids());
    let projects = undeclared(log, &PROJECT_REF_RE, log.project_ids());

    let reported = people
        .iter()
        .map(|id| (RefKind::Person, id))
        .chain(projects.iter().map(|id| (RefKind::Project, id)));
    for (kind, id) in reported {
        observer.observe(Diagnostic::Undeclared {
            kind,
            id: id.clone(),
        });
    }

    if people.is_empty() && projects.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Undeclared { people, projects })
    }
}

fn references(log: &Log, pattern: &Regex) -> BTreeSet<String> {
    log.texts()
        .flat_map(|text| pattern.captures_iter(text))
        .map(|captures| captures[1].to_string())
        .collect()
}

fn undeclared<'a>(
    log: &Log,
    pattern: &Regex,
    declared: impl Iterator<Item = &'a str>,
) -> BTreeSet<String> {
    let declared: BTreeSet<&str> = declared.collect();
    references(log, pattern)
        .into_iter()
        .filter(|id| !declared.contains(id.as_str()))
        .collect()
}

/// Declared date keys against `!YYYY-MM-DD` references found in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateReport {
    /// Date key to its weekday, when the key is a real calendar date.
    pub declared: BTreeMap<String, Option<Weekday>>,
    pub referenced: BTreeSet<String>,
}

impl DateReport {
    pub fn unmatched(&self) -> BTreeSet<&str> {
        self.referenced
            .iter()
            .map(String::as_str)
            .filter(|date| !self.declared.contains_key(*date))
            .collect()
    }

    /// Turns unmatched references into an error. Only used when strict date
    /// checking is configured.
    pub fn enforce(&self) -> Result<(), ValidationError> {
        let unmatched = self.unmatched();
        if unmatched.is_empty() {
            return Ok(());
        }
        Err(ValidationError::UndeclaredDates(
            unmatched.into_iter().map(str::to_string).collect(),
        ))
    }
}

impl fmt::Display for DateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let declared = self
            .declared
            .iter()
            .map(|(date, weekday)| match weekday {
                Some(weekday) => format!("{date} ({weekday})"),
                None => date.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ");
        let referenced = self
            .referenced
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("; ");
        let unmatched = self.unmatched().into_iter().collect::<Vec<_>>().join("; ");
        writeln!(f, "Date strs: {declared}")?;
        writeln!(f, "Date refs: {referenced}")?;
        writeln!(f, "Unmatched: {unmatched}")
    }
}

/// Collects date keys and date references for inspection. Never fails.
pub fn date_report(log: &Log) -> DateReport {
    DateReport {
        declared: log
            .dates
            .iter()
            .map(|date| (date.key.clone(), date.weekday()))
            .collect(),
        referenced: references(log, &DATE_REF_RE),
    }
}
