pub struct Image;

impl Image {
    pub const OPEN: &'static [u8; 2] = b"![";
    pub const TARGET_OPEN: &'static [u8; 2] = b"](";
    pub const TARGET_CLOSE: &'static [u8; 1] = b")";
}
