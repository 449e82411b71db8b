/// How a file's body is treated when building a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    /// `.md` / `.markdown`: fetched and rendered to HTML.
    Markdown,
    /// `.txt`: fetched and inlined as is.
    Text,
    /// `.html`: fetched and inlined as is.
    Html,
    /// Anything else: not fetched, linked instead.
    Linked,
}

impl ContentClass {
    pub fn needs_content(&self) -> bool {
        !matches!(self, ContentClass::Linked)
    }

    /// Short extension tag: "md", "txt", "html" or "" for linked files.
    pub fn tag(&self) -> &'static str {
        match self {
            ContentClass::Markdown => "md",
            ContentClass::Text => "txt",
            ContentClass::Html => "html",
            ContentClass::Linked => "",
        }
    }
}

/// Decide from the path suffix whether a file's content must be fetched.
pub fn classify(path: &str) -> ContentClass {
    if path.ends_with(".md") || path.ends_with(".markdown") {
        ContentClass::Markdown
    } else if path.ends_with(".txt") {
        ContentClass::Text
    } else if path.ends_with(".html") {
        ContentClass::Html
    } else {
        ContentClass::Linked
    }
}
