pub struct WikiLink;

impl WikiLink {
    pub const OPEN: &'static [u8; 2] = b"[[";
    pub const CLOSE: &'static [u8; 2] = b"]]";
}

/// `[label](target)`; the target may itself be a `[[Page]]` wikilink.
pub struct MarkdownLink;

impl MarkdownLink {
    pub const LABEL_OPEN: u8 = b'[';
    pub const LABEL_CLOSE: u8 = b']';
    pub const TARGET_OPEN: &'static [u8; 2] = b"](";
    pub const TARGET_CLOSE: u8 = b')';
}
