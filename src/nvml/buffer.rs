//! Text buffer marshaling
//!
//! Native text accessors write a null-terminated string into a
//! caller-owned, fixed-size buffer. [`TextBuffer`] owns that memory for
//! exactly one call and [`buffer_to_string`] converts it back.

use std::os::raw::{c_char, c_uint};

/// Zero-initialized native text buffer
///
/// Released when dropped, including on early error returns.
#[derive(Debug)]
pub struct TextBuffer {
    bytes: Vec<u8>,
}

impl TextBuffer {
    /// Allocate exactly `length` zeroed bytes
    pub fn new(length: u32) -> Self {
        Self {
            bytes: vec![0u8; length as usize],
        }
    }

    /// Length to pass alongside the pointer
    pub fn capacity(&self) -> c_uint {
        self.bytes.len() as c_uint
    }

    pub fn as_mut_ptr(&mut self) -> *mut c_char {
        self.bytes.as_mut_ptr().cast()
    }

    /// Decode the buffer contents up to the first null byte
    pub fn to_string_lossy(&self) -> String {
        buffer_to_string(&self.bytes, self.bytes.len())
    }
}

/// Convert a fixed-width native string into an owned `String`
///
/// Scans at most `length` bytes (clamped to the slice) for a null
/// terminator. Without one, all scanned bytes form the string.
pub fn buffer_to_string(buffer: &[u8], length: usize) -> String {
    let window = &buffer[..length.min(buffer.len())];
    let end = window.iter().position(|&b| b == 0).unwrap_or(window.len());
    String::from_utf8_lossy(&window[..end]).into_owned()
}

/// Same as [`buffer_to_string`] for `c_char` arrays embedded in native structs
pub fn c_chars_to_string(chars: &[c_char]) -> String {
    let bytes: Vec<u8> = chars.iter().map(|&c| c as u8).collect();
    buffer_to_string(&bytes, bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_at_first_null() {
        let raw = b"abc\0garbage";
        for length in 4..=raw.len() {
            assert_eq!(buffer_to_string(raw, length), "abc");
        }
    }

    #[test]
    fn test_full_buffer_without_terminator() {
        let raw = [b'x'; 16];
        let s = buffer_to_string(&raw, raw.len());
        assert_eq!(s.len(), 16);
    }

    #[test]
    fn test_never_reads_past_length() {
        let raw = b"testalongerstring";
        assert_eq!(buffer_to_string(raw, 4), "test");
        assert_eq!(buffer_to_string(raw, 100), "testalongerstring");
    }

    #[test]
    fn test_empty_when_first_byte_is_null() {
        assert_eq!(buffer_to_string(b"\0abc", 4), "");
        assert_eq!(buffer_to_string(b"abc", 0), "");
    }

    #[test]
    fn test_text_buffer_is_zeroed() {
        let buf = TextBuffer::new(32);
        assert_eq!(buf.capacity(), 32);
        assert_eq!(buf.to_string_lossy(), "");
    }

    #[test]
    fn test_c_chars_to_string() {
        let mut chars = [0 as c_char; 8];
        for (slot, b) in chars.iter_mut().zip(b"0000:01") {
            *slot = *b as c_char;
        }
        assert_eq!(c_chars_to_string(&chars), "0000:01");
    }
}
