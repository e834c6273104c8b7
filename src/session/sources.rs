use crate::orchestrator::models::Source;

use super::{ChatSession, Message};

const SNIPPET_MAX_CHARS: usize = 280;

/// One evidence row as the terminal shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceView {
    pub title: String,
    pub snippet: String,
    pub location: Option<String>,
    pub category: Option<String>,
}

/// Derive the display rows for a message's evidence, in the order the
/// orchestrator attached them. Empty for user messages and answers without
/// sources.
pub fn source_views(message: &Message) -> Vec<SourceView> {
    message.sources.iter().map(view).collect()
}

impl ChatSession {
    /// Display rows for the currently opened sources panel, if any.
    pub fn open_source_views(&self) -> Vec<SourceView> {
        self.sources_selection()
            .map(source_views)
            .unwrap_or_default()
    }
}

fn view(source: &Source) -> SourceView {
    SourceView {
        title: source.title.clone(),
        snippet: snippet(&source.content),
        location: location(source),
        category: source.category.clone(),
    }
}

fn snippet(content: &str) -> String {
    let content = content.trim();
    if content.chars().count() <= SNIPPET_MAX_CHARS {
        return content.to_string();
    }
    let cut: String = content.chars().take(SNIPPET_MAX_CHARS).collect();
    format!("{}…", cut.trim_end())
}

fn location(source: &Source) -> Option<String> {
    if let Some(filepath) = &source.filepath {
        return Some(match source.page {
            Some(page) => format!("{}, page {}", filepath, page),
            None => filepath.clone(),
        });
    }
    source.url.clone()
}
