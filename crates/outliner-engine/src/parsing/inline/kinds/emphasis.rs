/// Paired delimiters wrapping styled text.
pub struct Emphasis;

impl Emphasis {
    pub const BOLD: &'static [u8; 2] = b"**";
    pub const ITALIC: u8 = b'*';
    pub const STRIKE: &'static [u8; 2] = b"~~";
    pub const HIGHLIGHT: &'static [u8; 2] = b"==";
    pub const HIGHLIGHT_ALT: &'static [u8; 2] = b"^^";
}
