use std::{collections::HashSet, fmt, fs::File, io::BufReader, path::Path};

use serde_yaml::{Mapping, Sequence, Value};

use crate::{
    ast::{Event, Log, Lunch, Person, Project, WorkDate},
    observer::{Diagnostic, Observer, RefKind},
    schema::Field,
};

pub type Result<T> = std::result::Result<T, ParseError>;

#[derive(Debug, thiserror::Error)]
#[error("{kind} (at {path})")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub path: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("expected {expected}, found {found}")]
    ShapeMismatch { expected: Shape, found: Shape },
    #[error("missing required field `{0}`")]
    MissingField(Field),
    #[error("duplicate {kind} id `{id}`")]
    DuplicateId { kind: RefKind, id: String },
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("cannot open input: {0}")]
    Io(#[from] std::io::Error),
}

/// Container kind of a YAML node, for shape errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Mapping,
    Sequence,
    Scalar,
    Null,
    Tagged,
}

impl Shape {
    fn of(value: &Value) -> Self {
        match value {
            Value::Mapping(_) => Shape::Mapping,
            Value::Sequence(_) => Shape::Sequence,
            Value::Null => Shape::Null,
            Value::Tagged(_) => Shape::Tagged,
            Value::Bool(_) | Value::Number(_) | Value::String(_) => Shape::Scalar,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Mapping => "a mapping",
            Shape::Sequence => "a sequence",
            Shape::Scalar => "a scalar",
            Shape::Null => "null",
            Shape::Tagged => "a tagged value",
        };
        f.write_str(name)
    }
}

/// Reads and parses a YAML document. The file is closed before returning.
pub fn load_file(path: &Path) -> Result<Value> {
    let at = path.display().to_string();
    let file = File::open(path).map_err(|e| ParseError::new(e.into(), at.clone()))?;
    serde_yaml::from_reader(BufReader::new(file)).map_err(|e| ParseError::new(e.into(), at))
}

#[cfg(test)]
pub fn parse_str(source: &str) -> Result<Value> {
    serde_yaml::from_str(source).map_err(|e| ParseError::new(e.into(), "$"))
}

/// Location of a node inside the document, e.g. `$.people[1].notes[0]`.
#[derive(Debug, Clone)]
struct Location(String);

impl Location {
    fn root() -> Self {
        Location("$".to_string())
    }

    fn field(&self, field: Field) -> Self {
        self.key(field.as_str())
    }

    fn key(&self, key: &str) -> Self {
        Location(format!("{}.{key}", self.0))
    }

    fn index(&self, index: usize) -> Self {
        Location(format!("{}[{index}]", self.0))
    }
}

/// Builds a [`Log`] from a parsed YAML tree.
///
/// Construction only checks shapes, required fields and id uniqueness;
/// references between entities are left to `processing::check_references`.
pub struct Parser<'o> {
    observer: &'o mut dyn Observer,
    unique_ids: bool,
}

impl<'o> Parser<'o> {
    pub fn new(observer: &'o mut dyn Observer) -> Self {
        Self {
            observer,
            unique_ids: true,
        }
    }

    pub fn unique_ids(mut self, enabled: bool) -> Self {
        self.unique_ids = enabled;
        self
    }

    pub fn parse_log(&mut self, root: &Value) -> Result<Log> {
        let mut log = Log::default();
        if root.is_null() {
            return Ok(log);
        }

        let at = Location::root();
        let map = expect_mapping(root, &at)?;

        if let Some(dates) = get(map, Field::Dates) {
            let at = at.field(Field::Dates);
            for (key, info) in expect_mapping(dates, &at)? {
                let key = scalar(key, &at)?;
                let date = self.parse_date(key, info, &at)?;
                log.dates.push(date);
            }
        }

        if let Some(people) = get(map, Field::People) {
            let at = at.field(Field::People);
            let mut seen = HashSet::new();
            for (i, info) in expect_sequence(people, &at)?.iter().enumerate() {
                let at = at.index(i);
                let person = self.parse_person(info, &at)?;
                self.claim_id(&mut seen, RefKind::Person, person.id.as_deref(), &at)?;
                log.people.push(person);
            }
        }

        if let Some(projects) = get(map, Field::Projects) {
            let at = at.field(Field::Projects);
            let mut seen = HashSet::new();
            for (i, info) in expect_sequence(projects, &at)?.iter().enumerate() {
                let at = at.index(i);
                let project = self.parse_project(info, &at)?;
                self.claim_id(&mut seen, RefKind::Project, project.id.as_deref(), &at)?;
                log.projects.push(project);
            }
        }

        tracing::debug!(
            dates = log.dates.len(),
            people = log.people.len(),
            projects = log.projects.len(),
            "built worklog"
        );
        Ok(log)
    }

    fn claim_id(
        &self,
        seen: &mut HashSet<String>,
        kind: RefKind,
        id: Option<&str>,
        at: &Location,
    ) -> Result<()> {
        let Some(id) = id.filter(|id| !id.is_empty()) else {
            return Ok(());
        };
        if self.unique_ids && !seen.insert(id.to_string()) {
            return Err(make_error(
                ParseErrorKind::DuplicateId {
                    kind,
                    id: id.to_string(),
                },
                &at.field(Field::Id),
            ));
        }
        Ok(())
    }

    fn parse_date(&mut self, key: String, info: &Value, at: &Location) -> Result<WorkDate> {
        let at = at.key(&key);
        let map = expect_mapping(info, &at)?;

        let lunch = match get(map, Field::Lunch) {
            Some(lunch) => Some(self.parse_lunch(lunch, &at.field(Field::Lunch))?),
            None => None,
        };
        let notes = entries(map, Field::Notes, Field::Note, &at)?;

        Ok(WorkDate { key, lunch, notes })
    }

    fn parse_lunch(&mut self, info: &Value, at: &Location) -> Result<Lunch> {
        let map = expect_mapping(info, at)?;
        Ok(Lunch {
            location: optional_scalar(map, Field::Where, at)?,
            people: entries(map, Field::People, Field::Person, at)?,
            notes: entries(map, Field::Notes, Field::Note, at)?,
        })
    }

    fn parse_event(&mut self, info: &Value, at: &Location) -> Result<Event> {
        let map = expect_mapping(info, at)?;
        Ok(Event {
            date: optional_scalar(map, Field::Date, at)?,
            text: optional_scalar(map, Field::Text, at)?,
        })
    }

    fn parse_events(&mut self, map: &Mapping, at: &Location) -> Result<Vec<Event>> {
        let Some(events) = get(map, Field::Events) else {
            return Ok(Vec::new());
        };
        let at = at.field(Field::Events);
        expect_sequence(events, &at)?
            .iter()
            .enumerate()
            .map(|(i, info)| self.parse_event(info, &at.index(i)))
            .collect()
    }

    fn parse_person(&mut self, info: &Value, at: &Location) -> Result<Person> {
        let map = expect_mapping(info, at)?;

        let id = optional_scalar(map, Field::Id, at)?;
        let name = optional_scalar(map, Field::Name, at)?;
        let events = self.parse_events(map, at)?;

        // A person always carries a notes list, even an empty one.
        let Some(notes) = map.get(Field::Notes.as_str()) else {
            return Err(make_error(ParseErrorKind::MissingField(Field::Notes), at));
        };
        expect_sequence(notes, &at.field(Field::Notes))?;
        let notes = entries(map, Field::Notes, Field::Note, at)?;

        Ok(Person {
            id,
            name,
            events,
            notes,
        })
    }

    fn parse_project(&mut self, info: &Value, at: &Location) -> Result<Project> {
        let map = expect_mapping(info, at)?;
        for key in map.keys() {
            let key = scalar(key, at)?;
            self.observer.observe(Diagnostic::ProjectKey(key));
        }

        Ok(Project {
            id: optional_scalar(map, Field::Id, at)?,
            name: optional_scalar(map, Field::Name, at)?,
            text: optional_scalar(map, Field::Text, at)?,
            events: self.parse_events(map, at)?,
            people: entries(map, Field::People, Field::Person, at)?,
            urls: entries(map, Field::Urls, Field::Url, at)?,
            notes: entries(map, Field::Notes, Field::Note, at)?,
        })
    }
}

#[must_use]
fn make_error(kind: ParseErrorKind, at: &Location) -> ParseError {
    ParseError::new(kind, at.0.clone())
}

fn shape_error(expected: Shape, found: &Value, at: &Location) -> ParseError {
    make_error(
        ParseErrorKind::ShapeMismatch {
            expected,
            found: Shape::of(found),
        },
        at,
    )
}

/// Looks up a field, treating an explicit null as absent.
fn get(map: &Mapping, field: Field) -> Option<&Value> {
    map.get(field.as_str()).filter(|value| !value.is_null())
}

fn expect_mapping<'v>(value: &'v Value, at: &Location) -> Result<&'v Mapping> {
    value
        .as_mapping()
        .ok_or_else(|| shape_error(Shape::Mapping, value, at))
}

fn expect_sequence<'v>(value: &'v Value, at: &Location) -> Result<&'v Sequence> {
    value
        .as_sequence()
        .ok_or_else(|| shape_error(Shape::Sequence, value, at))
}

fn scalar(value: &Value, at: &Location) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(shape_error(Shape::Scalar, value, at)),
    }
}

fn optional_scalar(map: &Mapping, field: Field, at: &Location) -> Result<Option<String>> {
    get(map, field)
        .map(|value| scalar(value, &at.field(field)))
        .transpose()
}

/// Reads a list of single-key records such as `notes: [{note: ...}]`.
fn entries(map: &Mapping, list: Field, item: Field, at: &Location) -> Result<Vec<String>> {
    let Some(values) = get(map, list) else {
        return Ok(Vec::new());
    };
    let at = at.field(list);
    expect_sequence(values, &at)?
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let at = at.index(i);
            let record = expect_mapping(entry, &at)?;
            let value = record
                .get(item.as_str())
                .ok_or_else(|| make_error(ParseErrorKind::MissingField(item), &at))?;
            scalar(value, &at.field(item))
        })
        .collect()
}
