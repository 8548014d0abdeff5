use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Task keyword leading a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TodoState {
    Todo,
    Doing,
    Done,
    Later,
    Now,
    Canceled,
}

impl TodoState {
    pub const ALL: [TodoState; 6] = [
        TodoState::Todo,
        TodoState::Doing,
        TodoState::Done,
        TodoState::Later,
        TodoState::Now,
        TodoState::Canceled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TodoState::Todo => "TODO",
            TodoState::Doing => "DOING",
            TodoState::Done => "DONE",
            TodoState::Later => "LATER",
            TodoState::Now => "NOW",
            TodoState::Canceled => "CANCELED",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.as_str() == keyword)
    }
}

impl fmt::Display for TodoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    A,
    B,
    C,
}

impl Priority {
    fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "A" => Some(Priority::A),
            "B" => Some(Priority::B),
            "C" => Some(Priority::C),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckboxState {
    #[serde(rename = "[ ]")]
    Unchecked,
    #[serde(rename = "[x]")]
    Checked,
}

impl CheckboxState {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckboxState::Unchecked => "[ ]",
            CheckboxState::Checked => "[x]",
        }
    }
}

/// Block-level metadata derived from the start of a block's content.
///
/// A TODO keyword and a checkbox never both apply: only the leading prefix
/// is recognised, and anything after it stays in the body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BlockMarker {
    pub todo_state: Option<TodoState>,
    pub priority: Option<Priority>,
    pub checkbox_state: Option<CheckboxState>,
}

impl BlockMarker {
    pub fn is_task(&self) -> bool {
        self.todo_state.is_some() || self.checkbox_state.is_some()
    }
}

fn task_regex() -> &'static Regex {
    static TASK_REGEX: OnceLock<Regex> = OnceLock::new();
    TASK_REGEX.get_or_init(|| {
        // A priority may also end the content, so `LATER [#C]` alone keeps it
        Regex::new(r"^\s*(TODO|DOING|DONE|LATER|NOW|CANCELED)\s+(?:\[#([ABC])\](?:\s+|$))?")
            .expect("Invalid task marker regex")
    })
}

fn checkbox_regex() -> &'static Regex {
    static CHECKBOX_REGEX: OnceLock<Regex> = OnceLock::new();
    CHECKBOX_REGEX
        .get_or_init(|| Regex::new(r"^\s*\[([ xX])\]\s+").expect("Invalid checkbox regex"))
}

/// Splits a block's content into its marker and the remaining body text.
///
/// A keyword must be followed by whitespace: a bare `TODO` or `TODOs` is
/// ordinary text. A priority needs the `[#A]` form directly after the
/// keyword. When no prefix is recognised the body is the whole content.
pub fn parse_marker(content: &str) -> (BlockMarker, &str) {
    if let Some(caps) = task_regex().captures(content) {
        let marker = BlockMarker {
            todo_state: caps.get(1).and_then(|m| TodoState::from_keyword(m.as_str())),
            priority: caps.get(2).and_then(|m| Priority::from_letter(m.as_str())),
            checkbox_state: None,
        };
        let end = caps.get(0).map_or(0, |m| m.end());
        return (marker, &content[end..]);
    }

    if let Some(caps) = checkbox_regex().captures(content) {
        let checkbox_state = match caps.get(1).map(|m| m.as_str()) {
            Some(" ") => CheckboxState::Unchecked,
            _ => CheckboxState::Checked,
        };
        let marker = BlockMarker {
            checkbox_state: Some(checkbox_state),
            ..BlockMarker::default()
        };
        let end = caps.get(0).map_or(0, |m| m.end());
        return (marker, &content[end..]);
    }

    (BlockMarker::default(), content)
}
