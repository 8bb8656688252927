use std::fmt;

/// Which kind of declared entity a sigil reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RefKind {
    Person,
    Project,
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefKind::Person => f.write_str("person"),
            RefKind::Project => f.write_str("project"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A top-level key seen while building a project record.
    ProjectKey(String),
    /// A sigil reference with no matching declaration.
    Undeclared { kind: RefKind, id: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ProjectKey(key) => write!(f, "Project key={key}"),
            Diagnostic::Undeclared { kind, id } => write!(f, "Undefined {kind}: {id}"),
        }
    }
}

/// Receives diagnostics from model construction and validation.
pub trait Observer {
    fn observe(&mut self, diagnostic: Diagnostic);
}

/// Records diagnostics in order.
impl Observer for Vec<Diagnostic> {
    fn observe(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Undeclared references go to stdout, everything else to the log.
#[derive(Debug, Default)]
pub struct ConsoleObserver;

impl Observer for ConsoleObserver {
    fn observe(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::ProjectKey(key) => tracing::info!(key = %key, "project key"),
            Diagnostic::Undeclared { .. } => println!("{diagnostic}"),
        }
    }
}
