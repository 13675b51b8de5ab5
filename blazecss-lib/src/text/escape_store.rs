//! Per-call storage for text pulled out of the stylesheet before tokenizing.
//!
//! Every escaped fragment is replaced in the source by a placeholder of the
//! form `__ESCAPED_<KIND>_<index>(<lines>)__`, where `<lines>` counts the line
//! breaks the original text spanned.

use once_cell::sync::Lazy;
use regex::Regex;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"__ESCAPED_(COMMENT|SPECIAL_COMMENT|FREE_TEXT|URL|EXPRESSION|SOURCE|LITERAL)_(\d+)\((\d+)\)__")
        .expect("valid placeholder pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EscapeKind {
    Comment,
    SpecialComment,
    FreeText,
    Url,
    Expression,
    SourceMarker,
    /// Input text that already looks like a placeholder.
    Literal,
}

impl EscapeKind {
    fn tag(self) -> &'static str {
        match self {
            EscapeKind::Comment => "COMMENT",
            EscapeKind::SpecialComment => "SPECIAL_COMMENT",
            EscapeKind::FreeText => "FREE_TEXT",
            EscapeKind::Url => "URL",
            EscapeKind::Expression => "EXPRESSION",
            EscapeKind::SourceMarker => "SOURCE",
            EscapeKind::Literal => "LITERAL",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "COMMENT" => Some(EscapeKind::Comment),
            "SPECIAL_COMMENT" => Some(EscapeKind::SpecialComment),
            "FREE_TEXT" => Some(EscapeKind::FreeText),
            "URL" => Some(EscapeKind::Url),
            "EXPRESSION" => Some(EscapeKind::Expression),
            "SOURCE" => Some(EscapeKind::SourceMarker),
            "LITERAL" => Some(EscapeKind::Literal),
            _ => None,
        }
    }
}

/// Typed reference to one escaped entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EscapeHandle {
    pub kind: EscapeKind,
    pub index: usize,
    /// Line breaks swallowed by the escaped text.
    pub lines: usize,
}

impl EscapeHandle {
    pub fn placeholder(&self) -> String {
        format!("__ESCAPED_{}_{}({})__", self.kind.tag(), self.index, self.lines)
    }

    /// Parses a placeholder that makes up the whole of `text`.
    pub fn parse(text: &str) -> Option<Self> {
        let captures = PLACEHOLDER.captures(text)?;
        let whole = captures.get(0)?;
        if whole.start() != 0 || whole.end() != text.len() {
            return None;
        }
        Self::from_captures(&captures)
    }

    /// Parses a placeholder starting exactly at the beginning of `text`.
    pub fn parse_prefix(text: &str) -> Option<(Self, usize)> {
        if !text.starts_with("__ESCAPED_") {
            return None;
        }
        let captures = PLACEHOLDER.captures(text)?;
        let whole = captures.get(0)?;
        if whole.start() != 0 {
            return None;
        }
        Some((Self::from_captures(&captures)?, whole.end()))
    }

    fn from_captures(captures: &regex::Captures<'_>) -> Option<Self> {
        Some(EscapeHandle {
            kind: EscapeKind::from_tag(captures.get(1)?.as_str())?,
            index: captures.get(2)?.as_str().parse().ok()?,
            lines: captures.get(3)?.as_str().parse().ok()?,
        })
    }
}

/// All placeholders found in `text`, with their byte ranges.
pub fn find_placeholders(text: &str) -> Vec<(EscapeHandle, std::ops::Range<usize>)> {
    if !text.contains("__ESCAPED_") {
        return Vec::new();
    }
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|captures| {
            let range = captures.get(0)?.range();
            Some((EscapeHandle::from_captures(&captures)?, range))
        })
        .collect()
}

pub fn contains_placeholder(text: &str) -> bool {
    text.contains("__ESCAPED_")
}

/// One store per escape kind.
#[derive(Debug, Clone)]
pub struct EscapeStore {
    kind: EscapeKind,
    entries: Vec<(String, Option<String>)>,
}

impl EscapeStore {
    pub fn new(kind: EscapeKind) -> Self {
        EscapeStore {
            kind,
            entries: Vec::new(),
        }
    }

    /// Stores `original` and returns its handle.
    pub fn store(&mut self, original: String, metadata: Option<String>) -> EscapeHandle {
        let lines = original.matches('\n').count();
        self.entries.push((original, metadata));
        EscapeHandle {
            kind: self.kind,
            index: self.entries.len() - 1,
            lines,
        }
    }

    pub fn get(&self, handle: &EscapeHandle) -> Option<&str> {
        if handle.kind != self.kind {
            return None;
        }
        self.entries.get(handle.index).map(|(text, _)| text.as_str())
    }

    pub fn metadata(&self, handle: &EscapeHandle) -> Option<&str> {
        if handle.kind != self.kind {
            return None;
        }
        self.entries.get(handle.index).and_then(|(_, meta)| meta.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The complete set of stores for one minify call.
#[derive(Debug, Clone)]
pub struct EscapeStores {
    pub comments: EscapeStore,
    pub special_comments: EscapeStore,
    pub free_text: EscapeStore,
    pub urls: EscapeStore,
    pub expressions: EscapeStore,
    pub source_markers: EscapeStore,
    pub literals: EscapeStore,
}

impl Default for EscapeStores {
    fn default() -> Self {
        EscapeStores {
            comments: EscapeStore::new(EscapeKind::Comment),
            special_comments: EscapeStore::new(EscapeKind::SpecialComment),
            free_text: EscapeStore::new(EscapeKind::FreeText),
            urls: EscapeStore::new(EscapeKind::Url),
            expressions: EscapeStore::new(EscapeKind::Expression),
            source_markers: EscapeStore::new(EscapeKind::SourceMarker),
            literals: EscapeStore::new(EscapeKind::Literal),
        }
    }
}

impl EscapeStores {
    pub fn store_for(&self, kind: EscapeKind) -> &EscapeStore {
        match kind {
            EscapeKind::Comment => &self.comments,
            EscapeKind::SpecialComment => &self.special_comments,
            EscapeKind::FreeText => &self.free_text,
            EscapeKind::Url => &self.urls,
            EscapeKind::Expression => &self.expressions,
            EscapeKind::SourceMarker => &self.source_markers,
            EscapeKind::Literal => &self.literals,
        }
    }

    pub fn store_for_mut(&mut self, kind: EscapeKind) -> &mut EscapeStore {
        match kind {
            EscapeKind::Comment => &mut self.comments,
            EscapeKind::SpecialComment => &mut self.special_comments,
            EscapeKind::FreeText => &mut self.free_text,
            EscapeKind::Url => &mut self.urls,
            EscapeKind::Expression => &mut self.expressions,
            EscapeKind::SourceMarker => &mut self.source_markers,
            EscapeKind::Literal => &mut self.literals,
        }
    }

    pub fn get(&self, handle: &EscapeHandle) -> Option<&str> {
        self.store_for(handle.kind).get(handle)
    }
}
