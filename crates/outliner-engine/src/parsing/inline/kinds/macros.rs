/// `{{name …}}` macros. Only queries and embeds are recognised.
pub struct Macro;

impl Macro {
    pub const QUERY: &'static [u8; 7] = b"{{query";
    pub const EMBED: &'static [u8; 7] = b"{{embed";
    pub const CLOSE: &'static [u8; 2] = b"}}";
}
