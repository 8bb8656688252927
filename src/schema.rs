use std::fmt;

/// Every field name the worklog document uses.
///
/// Both the builder in `parser` and the renderer read their keys from here,
/// so a renamed field changes in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Date,
    Dates,
    Event,
    Events,
    Id,
    Lunch,
    Name,
    Note,
    Notes,
    People,
    Person,
    Project,
    Projects,
    Text,
    Url,
    Urls,
    Where,
}

impl Field {
    pub const fn as_str(self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Dates => "dates",
            Field::Event => "event",
            Field::Events => "events",
            Field::Id => "id",
            Field::Lunch => "lunch",
            Field::Name => "name",
            Field::Note => "note",
            Field::Notes => "notes",
            Field::People => "people",
            Field::Person => "person",
            Field::Project => "project",
            Field::Projects => "projects",
            Field::Text => "text",
            Field::Url => "url",
            Field::Urls => "urls",
            Field::Where => "where",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendered in place of an absent name or text.
pub const NONE_MARKER: &str = "<None>";
/// Rendered in place of an absent event date.
pub const UNKNOWN_MARKER: &str = "<Unknown>";
