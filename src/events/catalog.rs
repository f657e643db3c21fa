//! Known real-world events that a detected change point is compared against.
use chrono::NaiveDate;

/// One catalog entry. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    pub date: NaiveDate,
    pub name: String,
    pub description: String,
}

impl Event {
    pub fn new(date: NaiveDate, name: impl Into<String>, description: impl Into<String>) -> Self {
        Event { date, name: name.into(), description: description.into() }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}  {}", self.date, self.name)
        } else {
            write!(f, "{}  {}  {}", self.date, self.name, self.description)
        }
    }
}
