//! Canonical text form of a [`Log`].
//!
//! The output is YAML in a fixed key order with two-space indentation, so
//! rendering the same log always gives the same bytes and a rendered log
//! with non-empty sections parses back to the same text.

use std::fmt::Write as _;

use crate::{
    ast::{Event, Log, Lunch, Person, Project, WorkDate},
    schema::{Field, NONE_MARKER, UNKNOWN_MARKER},
};

const INDENT: &str = "  ";

pub fn render(log: &Log) -> String {
    let mut out = Writer::default();
    out.raw("---");
    out.section(Field::Dates, &log.dates, Writer::date);
    out.section(Field::People, &log.people, Writer::person);
    out.section(Field::Projects, &log.projects, Writer::project);
    out.buf
}

#[derive(Default)]
struct Writer {
    buf: String,
}

impl Writer {
    fn raw(&mut self, text: &str) {
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    fn line(&mut self, depth: usize, text: std::fmt::Arguments<'_>) {
        for _ in 0..depth {
            self.buf.push_str(INDENT);
        }
        // Writing into a String cannot fail.
        let _ = self.buf.write_fmt(text);
        self.buf.push('\n');
    }

    fn section<T>(&mut self, field: Field, items: &[T], item_block: fn(&mut Self, &T)) {
        self.line(0, format_args!("{field}:"));
        if items.is_empty() {
            self.raw(NONE_MARKER);
        }
        for item in items {
            item_block(self, item);
        }
    }

    fn field(&mut self, depth: usize, field: Field, value: &str) {
        self.line(depth, format_args!("{field}: {}", scalar(value)));
    }

    fn optional(&mut self, depth: usize, field: Field, value: Option<&str>) {
        if let Some(value) = value {
            self.field(depth, field, value);
        }
    }

    fn entries(&mut self, depth: usize, list: Field, item: Field, values: &[String]) {
        if values.is_empty() {
            return;
        }
        self.line(depth, format_args!("{list}:"));
        for value in values {
            self.line(depth + 1, format_args!("- {item}: {}", scalar(value)));
        }
    }

    fn block(&mut self, depth: usize, field: Field, text: &str) {
        // Block scalars cannot carry these, so fall back to a quoted line.
        let unblockable = text.chars().all(|c| c == '\n')
            || text.chars().any(|c| c.is_control() && c != '\n');
        if unblockable {
            self.field(depth, field, text);
            return;
        }

        let chomp = if !text.ends_with('\n') {
            "-"
        } else if text.ends_with("\n\n") {
            "+"
        } else {
            ""
        };
        // Leading spaces on the first non-empty line would otherwise be read
        // as indentation.
        let first_content = text.split('\n').find(|line| !line.is_empty());
        let indicator = match first_content {
            Some(line) if line.starts_with(' ') => "2",
            _ => "",
        };
        self.line(depth, format_args!("{field}: |{indicator}{chomp}"));

        let body = text.strip_suffix('\n').unwrap_or(text);
        for line in body.split('\n') {
            if line.is_empty() {
                self.buf.push('\n');
            } else {
                self.line(depth + 1, format_args!("{line}"));
            }
        }
    }

    fn date(&mut self, date: &WorkDate) {
        let key = scalar(&date.key);
        let lunch = date.lunch.as_ref();
        if lunch.is_none() && date.notes.is_empty() {
            self.line(1, format_args!("{key}: {{}}"));
            return;
        }
        self.line(1, format_args!("{key}:"));
        if let Some(lunch) = lunch {
            self.lunch(lunch);
        }
        self.entries(2, Field::Notes, Field::Note, &date.notes);
    }

    fn lunch(&mut self, lunch: &Lunch) {
        if lunch.is_empty() {
            self.line(2, format_args!("{}: {{}}", Field::Lunch));
            return;
        }
        self.line(2, format_args!("{}:", Field::Lunch));
        self.optional(3, Field::Where, lunch.location.as_deref());
        self.entries(3, Field::People, Field::Person, &lunch.people);
        self.entries(3, Field::Notes, Field::Note, &lunch.notes);
    }

    fn events(&mut self, events: &[Event]) {
        if events.is_empty() {
            return;
        }
        self.line(2, format_args!("{}:", Field::Events));
        for event in events {
            self.line(3, format_args!("- {}:", Field::Event));
            self.field(4, Field::Date, event.date.as_deref().unwrap_or(UNKNOWN_MARKER));
            self.block(4, Field::Text, event.text.as_deref().unwrap_or(NONE_MARKER));
        }
    }

    fn person(&mut self, person: &Person) {
        self.line(1, format_args!("- {}:", Field::Person));
        self.optional(2, Field::Id, person.id.as_deref());
        self.field(2, Field::Name, person.name.as_deref().unwrap_or(NONE_MARKER));
        self.events(&person.events);
        // Notes are required on a person, so an empty list is still written.
        if person.notes.is_empty() {
            self.line(2, format_args!("{}: []", Field::Notes));
        }
        self.entries(2, Field::Notes, Field::Note, &person.notes);
    }

    fn project(&mut self, project: &Project) {
        self.line(1, format_args!("- {}:", Field::Project));
        self.optional(2, Field::Id, project.id.as_deref());
        self.field(2, Field::Name, project.name.as_deref().unwrap_or(NONE_MARKER));
        match project.text.as_deref() {
            Some(text) if text.contains('\n') => self.block(2, Field::Text, text),
            text => self.optional(2, Field::Text, text),
        }
        self.events(&project.events);
        self.entries(2, Field::People, Field::Person, &project.people);
        self.entries(2, Field::Urls, Field::Url, &project.urls);
        self.entries(2, Field::Notes, Field::Note, &project.notes);
    }
}

/// A scalar as it should appear after `key: `, quoted when a plain scalar
/// would read back as something else.
fn scalar(value: &str) -> String {
    if is_plain_safe(value) {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(quoted, "\\u{:04x}", c as u32);
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

fn is_plain_safe(value: &str) -> bool {
    let Some(first) = value.chars().next() else {
        return false;
    };
    if value.trim() != value || value.chars().any(char::is_control) {
        return false;
    }
    if "-?:,[]{}#&*!|>'\"%@`".contains(first) {
        return false;
    }
    if value.contains(": ") || value.contains(" #") || value.ends_with(':') {
        return false;
    }
    let lower = value.to_ascii_lowercase();
    let reserved = [
        "~", "null", "true", "false", "yes", "no", "on", "off", ".inf", "-.inf", "+.inf", ".nan",
    ];
    if reserved.contains(&lower.as_str()) {
        return false;
    }
    let unsigned = lower.trim_start_matches(['+', '-']);
    let radix_int = ["0x", "0o", "0b"]
        .iter()
        .any(|prefix| unsigned.starts_with(*prefix));
    !radix_int && value.parse::<f64>().is_err()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        observer::Diagnostic,
        parser::{parse_str, Parser},
        processing::check_references,
    };
    use pretty_assertions::assert_eq;

    fn build(source: &str) -> Log {
        let mut seen: Vec<Diagnostic> = Vec::new();
        let root = parse_str(source).unwrap();
        Parser::new(&mut seen).parse_log(&root).unwrap()
    }

    const FULL: &str = r#"
dates:
  2024-01-01:
    lunch:
      where: Noodle Bar
      people:
        - person: Bob
        - person: Carol
      notes:
        - note: "@alice picked the place"
    notes:
      - note: "release day: shipped #atlas"
  2024-01-02:
    lunch: {}
  2024-01-03: {}
people:
  - id: alice
    name: Alice
    events:
      - date: 2024-01-01
        text: |-
          joined #atlas
          second line
      - text: no date here
    notes:
      - note: likes tea
  - id: bob
    notes: []
projects:
  - id: atlas
    name: Atlas
    text: |
      maps
      and more maps
    events:
      - date: 2024-01-01
    people:
      - person: Alice
    urls:
      - url: https://example.com/atlas
    notes:
      - note: "true"
      - note: 42
"#;

    #[test]
    fn renders_canonical_form() {
        let log = build(FULL);
        let expected = "\
---
dates:
  2024-01-01:
    lunch:
      where: Noodle Bar
      people:
        - person: Bob
        - person: Carol
      notes:
        - note: \"@alice picked the place\"
    notes:
      - note: \"release day: shipped #atlas\"
  2024-01-02:
    lunch: {}
  2024-01-03: {}
people:
  - person:
    id: alice
    name: Alice
    events:
      - event:
        date: 2024-01-01
        text: |-
          joined #atlas
          second line
      - event:
        date: <Unknown>
        text: |-
          no date here
    notes:
      - note: likes tea
  - person:
    id: bob
    name: <None>
    notes: []
projects:
  - project:
    id: atlas
    name: Atlas
    text: |
      maps
      and more maps
    events:
      - event:
        date: 2024-01-01
        text: |-
          <None>
    people:
      - person: Alice
    urls:
      - url: https://example.com/atlas
    notes:
      - note: \"true\"
      - note: \"42\"
";
        assert_eq!(render(&log), expected);
    }

    #[test]
    fn rendering_is_deterministic() {
        let log = build(FULL);
        assert_eq!(render(&log), render(&log));
    }

    #[test]
    fn rendered_text_reparses_to_same_text() {
        let log = build(FULL);
        let first = render(&log);
        let again = build(&first);
        assert_eq!(render(&again), first);
    }

    #[test]
    fn round_trip_keeps_values() {
        let source = r#"
dates:
  2024-03-04:
    notes:
      - note: "  padded  "
      - note: "tab\there"
people:
  - id: dee
    name: "- dash"
    events:
      - date: 2024-03-04
        text: "  indented first line\nnext\n"
    notes:
      - note: "null"
projects:
  - id: p
    name: P
    text: "ends with colon:"
"#;
        let log = build(source);
        assert_eq!(build(&render(&log)), log);
    }

    #[test]
    fn empty_sections_use_marker() {
        assert_eq!(
            render(&Log::default()),
            "---\ndates:\n<None>\npeople:\n<None>\nprojects:\n<None>\n"
        );
    }

    #[test]
    fn log_without_people_omits_person_blocks() {
        let log = build("projects:\n  - id: p\n    name: P\n");
        let out = render(&log);
        assert!(out.contains("people:\n<None>\nprojects:\n"));
        assert!(!out.contains("- person:"));
    }

    #[test]
    fn absent_name_and_text_use_markers() {
        let log = build("people:\n  - id: x\n    events:\n      - date: 2024-01-01\n    notes: []\n");
        let out = render(&log);
        assert!(out.contains("    name: <None>\n"));
        assert!(out.contains("        text: |-\n          <None>\n"));
    }

    #[test]
    fn marker_text_stays_distinct_from_absence() {
        let log = build("people:\n  - name: <None>\n    notes: []\n");
        assert_eq!(log.people[0].name.as_deref(), Some("<None>"));
        assert_eq!(build("people:\n  - notes: []\n").people[0].name, None);
    }

    #[test]
    fn end_to_end_valid_log() {
        let log = build(
            r#"
dates:
  2024-01-01:
    notes:
      - note: saw @alice
people:
  - id: alice
    name: Alice
    notes: []
projects: []
"#,
        );
        let mut seen: Vec<Diagnostic> = Vec::new();
        check_references(&log, &mut seen).unwrap();
        assert!(seen.is_empty());
        assert_eq!(
            render(&log),
            "---\n\
             dates:\n  2024-01-01:\n    notes:\n      - note: saw @alice\n\
             people:\n  - person:\n    id: alice\n    name: Alice\n    notes: []\n\
             projects:\n<None>\n"
        );
    }

    #[test]
    fn plain_scalars_left_alone() {
        assert_eq!(scalar("saw @alice"), "saw @alice");
        assert_eq!(scalar("2024-01-01"), "2024-01-01");
        assert_eq!(scalar("<None>"), "<None>");
        assert_eq!(scalar("https://example.com/a#b"), "https://example.com/a#b");
    }

    #[test]
    fn ambiguous_scalars_quoted() {
        assert_eq!(scalar("#atlas"), "\"#atlas\"");
        assert_eq!(scalar("see #atlas"), "\"see #atlas\"");
        assert_eq!(scalar("1.5"), "\"1.5\"");
        assert_eq!(scalar("No"), "\"No\"");
        assert_eq!(scalar(""), "\"\"");
        assert_eq!(scalar("say \"hi\""), "say \"hi\"");
        assert_eq!(scalar("a\nb"), "\"a\\nb\"");
        assert_eq!(scalar("0b101"), "\"0b101\"");
        assert_eq!(scalar("+0x1F"), "\"+0x1F\"");
        assert_eq!(scalar("0B11"), "\"0B11\"");
        assert_eq!(scalar("0bvious"), "\"0bvious\"");
    }

    #[test]
    fn radix_looking_notes_survive_reparse() {
        let log = Log {
            projects: vec![Project {
                id: Some("p".into()),
                name: Some("P".into()),
                notes: vec!["0b101".into(), "0o17".into(), "-0x2a".into()],
                ..Project::default()
            }],
            ..Log::default()
        };
        let text = render(&log);
        assert_eq!(build(&text), log);
        assert_eq!(render(&build(&text)), text);
    }

    fn event_round_trip(text: &str) {
        let log = Log {
            people: vec![Person {
                id: Some("p".into()),
                events: vec![Event {
                    date: Some("2024-01-01".into()),
                    text: Some(text.to_string()),
                }],
                ..Person::default()
            }],
            ..Log::default()
        };
        let rendered = render(&log);
        let back = build(&rendered);
        assert_eq!(back.people[0].events[0].text.as_deref(), Some(text));
        assert_eq!(render(&back), rendered);
    }

    #[test]
    fn event_text_with_leading_tab() {
        event_round_trip("\tindented with a tab");
        event_round_trip("first\n\tsecond");
    }

    #[test]
    fn event_text_with_blank_first_line() {
        event_round_trip("\n  indented");
        event_round_trip("\n\nafter two blanks");
    }

    #[test]
    fn event_text_of_only_line_breaks() {
        event_round_trip("\n");
        event_round_trip("\n\n");
        event_round_trip("");
    }

    #[test]
    fn event_text_with_carriage_return() {
        event_round_trip("a\r\nb");
    }

    #[test]
    fn event_text_with_trailing_breaks() {
        event_round_trip("kept\n");
        event_round_trip("kept twice\n\n");
    }

    #[test]
    fn multiline_project_text_with_indent() {
        let log = Log {
            projects: vec![Project {
                id: Some("p".into()),
                name: Some("P".into()),
                text: Some("\n  code block\nplain".into()),
                ..Project::default()
            }],
            ..Log::default()
        };
        let rendered = render(&log);
        assert_eq!(build(&rendered), log);
    }
}
