use serde::Serialize;

/// What a link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Another page in the graph.
    Page,
    /// An external URL or file path from `[label](url)`.
    Url,
    /// A PDF document; viewers open these in the PDF sidebar.
    Pdf,
}

/// What an image embed points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    Plain,
    /// `![alt](file.pdf)` is image syntax pointing at a PDF.
    Pdf,
}

/// Classification of an inline segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "kind")]
pub enum SegmentKind {
    Text,
    Bold,
    Italic,
    Link(LinkKind),
    Image(ImageKind),
    Tag,
    BlockRef,
    Property,
    BlockId,
    Query,
    Embed,
    Strikethrough,
    Highlight,
}

/// A classified span of a block's content.
///
/// `content` holds the display text with delimiters stripped; `target` is
/// set for links, images, tags, block references and block ids; `alt` only
/// for images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    #[serde(flatten)]
    pub kind: SegmentKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl Segment {
    pub fn text(content: impl Into<String>) -> Self {
        Self::styled(SegmentKind::Text, content)
    }

    /// A segment with no target, e.g. bold or highlight.
    pub fn styled(kind: SegmentKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            target: None,
            alt: None,
        }
    }

    pub fn targeted(kind: SegmentKind, content: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            target: Some(target.into()),
            alt: None,
        }
    }

    pub fn image(kind: ImageKind, alt: impl Into<String>, target: impl Into<String>) -> Self {
        let alt = alt.into();
        Self {
            kind: SegmentKind::Image(kind),
            content: alt.clone(),
            target: Some(target.into()),
            alt: Some(alt),
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind == SegmentKind::Text
    }

    /// The page this segment links to, for `[[Page]]` and `[label]([[Page]])`.
    pub fn page_reference(&self) -> Option<&str> {
        match self.kind {
            SegmentKind::Link(LinkKind::Page) => self.target.as_deref(),
            _ => None,
        }
    }
}
