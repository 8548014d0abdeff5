/// `((uuid))` block reference.
pub struct BlockRef;

impl BlockRef {
    pub const OPEN: &'static [u8; 2] = b"((";
    pub const CLOSE: &'static [u8; 2] = b"))";

    /// Characters allowed in a referenced block id.
    pub fn is_id_byte(b: u8) -> bool {
        b.is_ascii_hexdigit() || b == b'-'
    }
}

/// `#tag` page tag.
pub struct Tag;

impl Tag {
    pub const HASH: u8 = b'#';

    pub fn is_name_byte(b: u8) -> bool {
        b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'/')
    }
}

/// `key:: value` block property. The `id` key is special: it pins the block id.
pub struct Property;

impl Property {
    pub const SEPARATOR: &'static [u8; 2] = b"::";
    pub const ID_KEY: &'static [u8; 4] = b"id::";

    pub fn is_key_start(b: u8) -> bool {
        b.is_ascii_alphabetic()
    }

    pub fn is_key_byte(b: u8) -> bool {
        b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_')
    }
}
