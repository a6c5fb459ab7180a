//! Fixed-capacity reply text.
//!
//! The command surface writes its human-readable answers into a buffer
//! owned by the caller. Nothing is allocated; text that does not fit is
//! cut at a character boundary and the reply remembers it was truncated.
//!
//! # Examples
//!
//! ```ignore
//! use w5500_network::utils::Reply;
//!
//! let mut storage = [0u8; 64];
//! let mut reply = Reply::new(&mut storage);
//! reply.copy("Network is up");
//! reply.catf(format_args!(", IP address = {}", ip));
//! ```

use core::fmt;

/// Text buffer over a caller-supplied byte slice.
pub struct Reply<'a> {
    buf: &'a mut [u8],
    len: usize,
    truncated: bool,
}

impl<'a> Reply<'a> {
    /// Wrap `buf` as an empty reply.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            len: 0,
            truncated: false,
        }
    }

    /// Returns the buffer's capacity.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether any text was dropped because the buffer was full.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.truncated = false;
    }

    /// Replace the contents with `s`.
    pub fn copy(&mut self, s: &str) {
        self.clear();
        self.cat(s);
    }

    /// Append `s`.
    pub fn cat(&mut self, s: &str) {
        let available = self.buf.len() - self.len;
        let mut n = s.len().min(available);
        while !s.is_char_boundary(n) {
            n -= 1;
        }
        if n < s.len() {
            self.truncated = true;
        }
        self.buf[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.len += n;
    }

    /// Replace the contents with formatted text.
    pub fn printf(&mut self, args: fmt::Arguments<'_>) {
        self.clear();
        self.catf(args);
    }

    /// Append formatted text.
    pub fn catf(&mut self, args: fmt::Arguments<'_>) {
        // write_str never fails, truncation is tracked instead
        let _ = fmt::Write::write_fmt(self, args);
    }

    pub fn as_str(&self) -> &str {
        // Only whole characters are ever copied in
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }
}

impl fmt::Write for Reply<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.cat(s);
        Ok(())
    }
}

impl fmt::Display for Reply<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Reply<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply")
            .field("text", &self.as_str())
            .field("truncated", &self.truncated)
            .finish()
    }
}
