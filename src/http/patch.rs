use std::convert::Infallible;

use axum::response::sse::{Event, Sse};
use futures::stream::{self, Stream};
use itertools::Itertools;
use serde_json::Value;

pub const PATCH_ELEMENTS_EVENT: &str = "datastar-patch-elements";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatchMode {
    /// Morphs the element with the same id. The client's default.
    #[default]
    Outer,
    Inner,
    Replace,
    Prepend,
    Append,
    Before,
    After,
    Remove,
}

impl PatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchMode::Outer => "outer",
            PatchMode::Inner => "inner",
            PatchMode::Replace => "replace",
            PatchMode::Prepend => "prepend",
            PatchMode::Append => "append",
            PatchMode::Before => "before",
            PatchMode::After => "after",
            PatchMode::Remove => "remove",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPatch {
    selector: Option<String>,
    mode: PatchMode,
    elements: String,
}

impl ElementPatch {
    pub fn new(elements: impl Into<String>) -> Self {
        Self {
            selector: None,
            mode: PatchMode::default(),
            elements: elements.into(),
        }
    }

    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn mode(mut self, mode: PatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// The `data:` payload lines of the event, without the `data: ` prefix.
    pub fn data_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(selector) = &self.selector {
            lines.push(format!("selector {selector}"));
        }
        if self.mode != PatchMode::Outer {
            lines.push(format!("mode {}", self.mode.as_str()));
        }
        lines.extend(
            self.elements
                .lines()
                .map(|line| format!("elements {}", line.replace('\r', ""))),
        );

        lines
    }

    pub fn to_event(&self) -> Event {
        Event::default()
            .event(PATCH_ELEMENTS_EVENT)
            .data(self.data_lines().join("\n"))
    }
}

pub fn patch_response(
    patches: Vec<ElementPatch>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = patches.iter().map(ElementPatch::to_event).collect_vec();

    Sse::new(stream::iter(events.into_iter().map(Ok::<Event, Infallible>)))
}

/// Client signals sent as a JSON object in the query string. Anything
/// unreadable counts as no signals at all.
pub fn read_signals(raw: Option<&str>) -> Value {
    raw.and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        .filter(Value::is_object)
        .unwrap_or(Value::Null)
}
