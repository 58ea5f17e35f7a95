// src/capture/extraction.rs
//! Text extraction from a page at capture time
//!
//! Sources are tried in a fixed order and the first non-empty trimmed text
//! wins. The direct clipboard read is not part of this chain; it is slower,
//! may be refused, and is scheduled separately by the agent.

use serde::{Deserialize, Serialize};

/// What the page exposes at the moment a capture runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Text of the active document selection
    pub selection: Option<String>,
    /// The element that currently has focus, if it holds text
    pub focused: Option<FocusedElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusedElement {
    /// `<input>` / `<textarea>` with a selection range in char offsets
    TextInput {
        value: String,
        selection_start: usize,
        selection_end: usize,
    },
    /// contenteditable element and the text selected inside it
    ContentEditable { selection: String },
}

impl FocusedElement {
    fn selected_text(&self) -> String {
        match self {
            FocusedElement::TextInput {
                value,
                selection_start,
                selection_end,
            } => {
                let len = value.chars().count();
                let end = (*selection_end).min(len);
                let start = (*selection_start).min(end);
                value.chars().skip(start).take(end - start).collect()
            }
            FocusedElement::ContentEditable { selection } => selection.clone(),
        }
    }
}

/// Where a captured string came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtractionSource {
    PageSelection,
    ClipboardEvent,
    InputSelection,
    EditableSelection,
    ClipboardRead,
}

/// A successful extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub source: ExtractionSource,
    pub text: String,
}

/// Run the immediate extraction chain.
///
/// `event_payload` is the plain-text payload of a copy event, when the
/// trigger carried one.
pub fn extract_text(event_payload: Option<&str>, page: &PageSnapshot) -> Option<Extracted> {
    let input_selection = match &page.focused {
        Some(el @ FocusedElement::TextInput { .. }) => Some(el.selected_text()),
        _ => None,
    };
    let editable_selection = match &page.focused {
        Some(el @ FocusedElement::ContentEditable { .. }) => Some(el.selected_text()),
        _ => None,
    };

    let candidates = [
        (ExtractionSource::PageSelection, page.selection.clone()),
        (ExtractionSource::ClipboardEvent, event_payload.map(str::to_string)),
        (ExtractionSource::InputSelection, input_selection),
        (ExtractionSource::EditableSelection, editable_selection),
    ];

    candidates.into_iter().find_map(|(source, candidate)| {
        let text = candidate?.trim().to_string();
        (!text.is_empty()).then_some(Extracted { source, text })
    })
}

/// Wrap text from the deferred clipboard read, if any is left after trimming
pub fn from_clipboard_read(raw: &str) -> Option<Extracted> {
    let text = raw.trim();
    (!text.is_empty()).then(|| Extracted {
        source: ExtractionSource::ClipboardRead,
        text: text.to_string(),
    })
}
