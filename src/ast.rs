use chrono::{Datelike, NaiveDate, Weekday};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Log {
    pub dates: Vec<WorkDate>,
    pub people: Vec<Person>,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDate {
    /// `YYYY-MM-DD`, kept exactly as written in the document.
    pub key: String,
    pub lunch: Option<Lunch>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lunch {
    pub location: Option<String>,
    pub people: Vec<String>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    /// Display label only; not a link to a `WorkDate`.
    pub date: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Person {
    pub id: Option<String>,
    pub name: Option<String>,
    pub events: Vec<Event>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    pub id: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub events: Vec<Event>,
    pub people: Vec<String>,
    pub urls: Vec<String>,
    pub notes: Vec<String>,
}

impl Log {
    /// Every free-text field that may carry references, in document order:
    /// lunch notes then notes of each date, then event texts and notes of
    /// each person, then event texts and notes of each project.
    ///
    /// The iterator is lazy; call again to start over.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        let dates = self.dates.iter().flat_map(|date| {
            let lunch_notes = date.lunch.iter().flat_map(|lunch| strs(&lunch.notes));
            lunch_notes.chain(strs(&date.notes))
        });

        let people = self
            .people
            .iter()
            .flat_map(|person| event_texts(&person.events).chain(strs(&person.notes)));

        let projects = self
            .projects
            .iter()
            .flat_map(|project| event_texts(&project.events).chain(strs(&project.notes)));

        dates.chain(people).chain(projects)
    }

    pub fn person_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.people.iter().filter_map(|person| non_empty(person.id.as_deref()))
    }

    pub fn project_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.projects.iter().filter_map(|project| non_empty(project.id.as_deref()))
    }
}

impl WorkDate {
    /// Day of the week for the key, or `None` if the key is not a real date.
    pub fn weekday(&self) -> Option<Weekday> {
        NaiveDate::parse_from_str(&self.key, "%Y-%m-%d")
            .ok()
            .map(|date| date.weekday())
    }
}

impl Lunch {
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.people.is_empty() && self.notes.is_empty()
    }
}

fn event_texts(events: &[Event]) -> impl Iterator<Item = &str> {
    events.iter().filter_map(|event| event.text.as_deref())
}

fn strs(items: &[String]) -> impl Iterator<Item = &str> {
    items.iter().map(String::as_str)
}

fn non_empty(id: Option<&str>) -> Option<&str> {
    id.filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn event(text: &str) -> Event {
        Event {
            date: None,
            text: Some(text.to_string()),
        }
    }

    fn sample() -> Log {
        Log {
            dates: vec![
                WorkDate {
                    key: "2024-01-01".into(),
                    lunch: Some(Lunch {
                        location: Some("Cafe".into()),
                        people: vec!["Bob".into()],
                        notes: vec!["lunch one".into(), "lunch two".into()],
                    }),
                    notes: vec!["date note".into()],
                },
                WorkDate {
                    key: "2024-01-02".into(),
                    lunch: None,
                    notes: vec![],
                },
            ],
            people: vec![Person {
                id: Some("alice".into()),
                name: Some("Alice".into()),
                events: vec![event("person event"), Event::default()],
                notes: vec!["person note".into()],
            }],
            projects: vec![Project {
                id: Some("proj".into()),
                text: Some("blurb".into()),
                events: vec![event("project event")],
                notes: vec!["project note".into()],
                ..Project::default()
            }],
        }
    }

    #[test]
    fn texts_follow_document_order() {
        let log = sample();
        let texts: Vec<&str> = log.texts().collect();
        assert_eq!(
            texts,
            vec![
                "lunch one",
                "lunch two",
                "date note",
                "person event",
                "person note",
                "project event",
                "project note",
            ]
        );
    }

    #[test]
    fn texts_restart_from_the_beginning() {
        let log = sample();
        let first: Vec<&str> = log.texts().collect();
        let second: Vec<&str> = log.texts().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn ids_skip_absent_and_empty() {
        let mut log = sample();
        log.people.push(Person::default());
        log.people.push(Person {
            id: Some(String::new()),
            ..Person::default()
        });
        assert_eq!(log.person_ids().collect::<Vec<_>>(), vec!["alice"]);
        assert_eq!(log.project_ids().collect::<Vec<_>>(), vec!["proj"]);
    }

    #[test]
    fn weekday_of_date_key() {
        let date = WorkDate {
            key: "2024-01-01".into(),
            lunch: None,
            notes: vec![],
        };
        assert_eq!(date.weekday(), Some(Weekday::Mon));

        let bogus = WorkDate {
            key: "2024-02-30".into(),
            ..date
        };
        assert_eq!(bogus.weekday(), None);
    }
}
