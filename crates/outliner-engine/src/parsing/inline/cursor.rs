/// A cursor for byte-wise inline parsing with position tracking.
///
/// Every delimiter the inline grammar knows is ASCII, so scanning byte by byte
/// never lands a match boundary inside a multi-byte character.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The string being parsed.
    pub s: &'a str,
    /// Current byte index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a new cursor at the start of `s`.
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    /// Returns the current byte position.
    pub fn pos(&self) -> usize {
        self.i
    }

    /// Returns true if at end of string.
    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    /// Peeks at the current byte without advancing.
    pub fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    /// The byte just before the cursor, if any.
    pub fn prev(&self) -> Option<u8> {
        self.i
            .checked_sub(1)
            .and_then(|i| self.s.as_bytes().get(i).copied())
    }

    /// Checks if the remaining input starts with the given byte pattern.
    pub fn starts_with(&self, pat: &[u8]) -> bool {
        self.s
            .as_bytes()
            .get(self.i..)
            .is_some_and(|rest| rest.starts_with(pat))
    }

    /// Advances by one byte, returning the consumed byte.
    pub fn bump(&mut self) -> Option<u8> {
        let b = self.s.as_bytes().get(self.i).copied()?;
        self.i += 1;
        Some(b)
    }

    /// Advances by `n` bytes.
    pub fn bump_n(&mut self, n: usize) {
        self.i += n;
    }

    /// Consumes bytes while `pred` holds, returning how many were consumed.
    pub fn eat_while(&mut self, pred: impl Fn(u8) -> bool) -> usize {
        let start = self.i;
        while let Some(b) = self.peek() {
            if !pred(b) {
                break;
            }
            self.i += 1;
        }
        self.i - start
    }

    /// Advances to the first occurrence of `close`, leaving the cursor on it.
    ///
    /// Stops and returns `false` at end of input, or at a newline when
    /// `single_line` is set. The caller restores the cursor on failure.
    pub fn seek(&mut self, close: &[u8], single_line: bool) -> bool {
        while !self.eof() {
            if self.starts_with(close) {
                return true;
            }
            if single_line && self.peek() == Some(b'\n') {
                return false;
            }
            self.bump();
        }
        false
    }

    /// Slices the source between two byte positions.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.s[start..end]
    }
}
