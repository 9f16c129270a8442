//! Text decoding of raw memory for charset-aware searches
//!
//! Memory holds text in whatever encoding the target wrote it with, at
//! whatever alignment its allocator picked. Each [`Charset`] variant is one
//! (encoding, alignment) combination; [`next_text`] pulls the next run of
//! decodable characters out of a buffer and remembers where every character
//! came from, so a match in the decoded text can be mapped back to an address.

use crate::core::types::Address;
use encoding_rs::WINDOWS_1252;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Charset related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CharsetError {
    #[error("Unrecognized charset: {0}")]
    Unrecognized(String),
}

/// A text encoding together with the address alignment it is decoded at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Charset {
    /// Self-synchronizing, no alignment variants
    Utf8,
    /// UTF-16LE starting at even addresses
    Utf16EvenAligned,
    /// UTF-16LE starting at odd addresses
    Utf16OddAligned,
    /// UTF-32LE starting at addresses ≡ 0 (mod 4)
    Utf32Mod0Aligned,
    /// UTF-32LE starting at addresses ≡ 1 (mod 4)
    Utf32Mod1Aligned,
    /// UTF-32LE starting at addresses ≡ 2 (mod 4)
    Utf32Mod2Aligned,
    /// UTF-32LE starting at addresses ≡ 3 (mod 4)
    Utf32Mod3Aligned,
    /// Single-byte code page
    Windows1252,
}

impl Charset {
    /// Charsets searched when the caller names none
    pub const DEFAULT_SET: [Charset; 3] = [
        Charset::Utf8,
        Charset::Utf16EvenAligned,
        Charset::Utf16OddAligned,
    ];

    /// Every supported charset
    pub const ALL: [Charset; 8] = [
        Charset::Utf8,
        Charset::Utf16EvenAligned,
        Charset::Utf16OddAligned,
        Charset::Utf32Mod0Aligned,
        Charset::Utf32Mod1Aligned,
        Charset::Utf32Mod2Aligned,
        Charset::Utf32Mod3Aligned,
        Charset::Windows1252,
    ];

    /// Canonical tag accepted by [`FromStr`]
    pub fn tag(&self) -> &'static str {
        match self {
            Charset::Utf8 => "utf-8",
            Charset::Utf16EvenAligned => "utf-16-even",
            Charset::Utf16OddAligned => "utf-16-odd",
            Charset::Utf32Mod0Aligned => "utf-32-mod0",
            Charset::Utf32Mod1Aligned => "utf-32-mod1",
            Charset::Utf32Mod2Aligned => "utf-32-mod2",
            Charset::Utf32Mod3Aligned => "utf-32-mod3",
            Charset::Windows1252 => "windows-1252",
        }
    }

    /// Bytes to drop from a buffer starting at `address` so decoding begins
    /// on this charset's alignment
    fn alignment_skip(&self, address: Address) -> usize {
        let address = address.as_usize();
        match self {
            Charset::Utf8 | Charset::Windows1252 => 0,
            Charset::Utf16EvenAligned => address % 2,
            Charset::Utf16OddAligned => (address + 1) % 2,
            Charset::Utf32Mod0Aligned => (4 - address % 4) % 4,
            Charset::Utf32Mod1Aligned => (5 - address % 4) % 4,
            Charset::Utf32Mod2Aligned => (6 - address % 4) % 4,
            Charset::Utf32Mod3Aligned => (7 - address % 4) % 4,
        }
    }

    /// Decodes the character at the front of a non-empty buffer
    fn decode_unit(&self, buffer: &[u8]) -> Unit {
        match self {
            Charset::Utf8 => decode_utf8(buffer),
            Charset::Utf16EvenAligned | Charset::Utf16OddAligned => decode_utf16le(buffer),
            Charset::Utf32Mod0Aligned
            | Charset::Utf32Mod1Aligned
            | Charset::Utf32Mod2Aligned
            | Charset::Utf32Mod3Aligned => decode_utf32le(buffer),
            Charset::Windows1252 => decode_windows1252(buffer),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Charset {
    type Err = CharsetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        let charset = match tag.as_str() {
            "utf-8" | "utf8" => Charset::Utf8,
            "utf-16-even" | "utf-16le-even" => Charset::Utf16EvenAligned,
            "utf-16-odd" | "utf-16le-odd" => Charset::Utf16OddAligned,
            "utf-32-mod0" => Charset::Utf32Mod0Aligned,
            "utf-32-mod1" => Charset::Utf32Mod1Aligned,
            "utf-32-mod2" => Charset::Utf32Mod2Aligned,
            "utf-32-mod3" => Charset::Utf32Mod3Aligned,
            "windows-1252" | "cp1252" => Charset::Windows1252,
            _ => return Err(CharsetError::Unrecognized(s.to_string())),
        };
        Ok(charset)
    }
}

/// One decoding step: a character and its encoded width, or a number of
/// bytes that do not start a character. Widths are never zero and never
/// exceed the buffer.
enum Unit {
    Char(char, usize),
    Invalid(usize),
}

fn decode_utf8(buffer: &[u8]) -> Unit {
    for len in 1..=buffer.len().min(4) {
        match std::str::from_utf8(&buffer[..len]) {
            Ok(s) => {
                if let Some(c) = s.chars().next() {
                    return Unit::Char(c, len);
                }
            }
            // Incomplete sequence so far, try a longer prefix
            Err(e) if e.error_len().is_none() => continue,
            Err(_) => break,
        }
    }
    Unit::Invalid(1)
}

fn decode_utf16le(buffer: &[u8]) -> Unit {
    if buffer.len() < 2 {
        return Unit::Invalid(buffer.len().max(1));
    }
    let units = buffer
        .chunks_exact(2)
        .take(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));

    match char::decode_utf16(units).next() {
        Some(Ok(c)) => Unit::Char(c, c.len_utf16() * 2),
        _ => Unit::Invalid(2),
    }
}

fn decode_utf32le(buffer: &[u8]) -> Unit {
    if buffer.len() < 4 {
        return Unit::Invalid(buffer.len().max(1));
    }
    let value = u32::from_le_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]);
    match char::from_u32(value) {
        Some(c) => Unit::Char(c, 4),
        None => Unit::Invalid(4),
    }
}

fn decode_windows1252(buffer: &[u8]) -> Unit {
    // Every byte maps to a character in the WHATWG table
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(&buffer[..1]);
    match text.chars().next() {
        Some(c) => Unit::Char(c, 1),
        None => Unit::Invalid(1),
    }
}

/// A run of text decoded from memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    /// The decoded characters, possibly empty
    pub text: String,
    /// Address of the first byte of the run
    pub address: Address,
    /// Bytes of the input buffer used up, skipped bytes included
    pub consumed: usize,
    /// (byte offset in `text`, byte offset from `address`) per character
    char_offsets: Vec<(usize, usize)>,
}

impl DecodedText {
    /// Whether the run holds no characters
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Address of the encoded character that starts at byte `text_index` of
    /// `text`, or `None` if no character starts there
    pub fn source_address(&self, text_index: usize) -> Option<Address> {
        self.char_offsets
            .binary_search_by_key(&text_index, |&(text_offset, _)| text_offset)
            .ok()
            .map(|i| self.address.saturating_add(self.char_offsets[i].1))
    }
}

/// Finds the next run of text in `buffer`, which starts at `start_address`.
///
/// Bytes before the charset's alignment and bytes that do not decode are
/// skipped; the run then extends until the first undecodable unit or the end
/// of the buffer. When nothing decodes, the returned text is empty and the
/// whole buffer counts as consumed.
pub fn next_text(charset: Charset, buffer: &[u8], start_address: Address) -> DecodedText {
    let mut offset = charset.alignment_skip(start_address).min(buffer.len());

    while offset < buffer.len() {
        match charset.decode_unit(&buffer[offset..]) {
            Unit::Invalid(width) => offset += width,
            Unit::Char(..) => break,
        }
    }
    let run_start = offset;

    let mut text = String::new();
    let mut char_offsets = Vec::new();
    while offset < buffer.len() {
        match charset.decode_unit(&buffer[offset..]) {
            Unit::Char(c, width) => {
                char_offsets.push((text.len(), offset - run_start));
                text.push(c);
                offset += width;
            }
            Unit::Invalid(_) => break,
        }
    }

    DecodedText {
        text,
        address: start_address.saturating_add(run_start),
        consumed: offset,
        char_offsets,
    }
}

/// [`next_text`] for a charset named by tag
pub fn next_text_by_tag(
    tag: &str,
    buffer: &[u8],
    start_address: Address,
) -> Result<DecodedText, CharsetError> {
    let charset = tag.parse::<Charset>()?;
    Ok(next_text(charset, buffer, start_address))
}

/// Iterator over the non-empty text runs of a buffer, see [`text_runs`]
#[derive(Debug, Clone)]
pub struct TextRuns<'a> {
    charset: Charset,
    buffer: &'a [u8],
    start_address: Address,
    offset: usize,
}

impl Iterator for TextRuns<'_> {
    type Item = DecodedText;

    fn next(&mut self) -> Option<DecodedText> {
        while self.offset < self.buffer.len() {
            let run = next_text(
                self.charset,
                &self.buffer[self.offset..],
                self.start_address.saturating_add(self.offset),
            );
            if run.consumed == 0 {
                break;
            }
            self.offset += run.consumed;
            if !run.is_empty() {
                return Some(run);
            }
        }
        self.offset = self.buffer.len();
        None
    }
}

/// Splits `buffer` into its successive text runs for `charset`
pub fn text_runs(charset: Charset, buffer: &[u8], start_address: Address) -> TextRuns<'_> {
    TextRuns {
        charset,
        buffer,
        start_address,
        offset: 0,
    }
}
