//! Pull-based decoder over a harbor batch body.
//!
//! The body is a single JSON object mapping harbor codes to harbor records.
//! [`HarborDecoder`] walks the envelope one entry at a time and only ever
//! holds the bytes of the entry currently being decoded, so memory stays
//! bounded by [`MAX_ENTRY_BYTES`] however large the batch is.
//!
//! ```text
//! open()        '{'
//! next_entry()  "USLAX" : { ... }        -> Some(entry)
//! next_entry()  , "NLRTM" : { ... }      -> Some(entry)
//! next_entry()  '}' or end of stream     -> None
//! close()       '}'
//! ```

use std::fmt;
use std::io;

use futures_util::io::{AsyncBufRead, AsyncBufReadExt};

use super::payload::HarborPayload;
use crate::domain::Unloc;

/// Capacity of the buffered reader wrapped around the request body.
pub const BODY_BUFFER_CAPACITY: usize = 32 * 1024;

/// Largest key or record, in bytes, the decoder will hold in memory.
pub const MAX_ENTRY_BYTES: usize = 1024 * 1024;

/// Envelope delimiter the decoder was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// The `{` opening the batch.
    Open,
    /// The `}` closing the batch.
    Close,
}

impl Delimiter {
    /// The delimiter character.
    pub const fn as_char(self) -> char {
        match self {
            Self::Open => '{',
            Self::Close => '}',
        }
    }

    /// Message returned to clients when the delimiter is missing.
    pub const fn client_message(self) -> &'static str {
        match self {
            Self::Open => "invalid JSON: expected '{' at start",
            Self::Close => "invalid JSON: expected '}' at end",
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.as_char())
    }
}

/// Failures raised while decoding the batch body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The envelope delimiter was missing or unreadable.
    #[error("malformed envelope, expected {delimiter}: {detail}")]
    MalformedEnvelope { delimiter: Delimiter, detail: String },
    /// An entry key was not a non-empty JSON string.
    #[error("invalid harbor key: {detail}")]
    InvalidKey { detail: String },
    /// An entry value was not a harbor object.
    #[error("malformed harbor record: {detail}")]
    MalformedRecord { detail: String },
}

impl DecodeError {
    fn envelope(delimiter: Delimiter, detail: impl Into<String>) -> Self {
        Self::MalformedEnvelope {
            delimiter,
            detail: detail.into(),
        }
    }

    fn key(detail: impl Into<String>) -> Self {
        Self::InvalidKey {
            detail: detail.into(),
        }
    }

    fn record(detail: impl Into<String>) -> Self {
        Self::MalformedRecord {
            detail: detail.into(),
        }
    }
}

/// One decoded `code -> record` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct HarborEntry {
    /// The outer key.
    pub unloc: Unloc,
    /// The record body, not yet validated.
    pub payload: HarborPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    BeforeOpen,
    FirstEntry,
    NextEntry,
    Exhausted,
    Closed,
}

#[derive(Debug, thiserror::Error)]
enum CaptureError {
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
    #[error("unexpected end of body")]
    Truncated,
    #[error("exceeds {} bytes", MAX_ENTRY_BYTES)]
    TooLarge,
}

/// Tracks nesting while a JSON string or object is copied byte by byte.
#[derive(Debug, Clone, Copy)]
struct ValueScanner {
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl ValueScanner {
    /// Scanner positioned just after an opening quote.
    const fn string() -> Self {
        Self {
            depth: 0,
            in_string: true,
            escaped: false,
        }
    }

    /// Scanner positioned just after an opening brace.
    const fn object() -> Self {
        Self {
            depth: 1,
            in_string: false,
            escaped: false,
        }
    }

    /// Feed one byte; returns `true` when it completes the value.
    fn advance(&mut self, byte: u8) -> bool {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if byte == b'\\' {
                self.escaped = true;
            } else if byte == b'"' {
                self.in_string = false;
                return self.depth == 0;
            }
            return false;
        }

        match byte {
            b'"' => self.in_string = true,
            b'{' | b'[' => self.depth += 1,
            b'}' | b']' => {
                self.depth = self.depth.saturating_sub(1);
                return self.depth == 0;
            }
            _ => {}
        }
        false
    }
}

const fn is_json_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

fn describe(byte: u8) -> &'static str {
    match byte {
        b'{' => "an object",
        b'[' => "an array",
        b'"' => "a string",
        b't' | b'f' => "a boolean",
        b'n' => "null",
        b'-' | b'0'..=b'9' => "a number",
        b',' => "a comma",
        b':' => "a colon",
        b'}' | b']' => "a closing delimiter",
        _ => "an unexpected character",
    }
}

/// Lazy, single-pass decoder over a harbor batch.
///
/// Call [`open`](Self::open), then [`next_entry`](Self::next_entry) until it
/// yields `None`, then [`close`](Self::close). Calls out of order fail with
/// the error of the step that was skipped.
pub struct HarborDecoder<R> {
    reader: R,
    position: Position,
    scratch: Vec<u8>,
}

impl<R> HarborDecoder<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Wrap a buffered body reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            position: Position::BeforeOpen,
            scratch: Vec::new(),
        }
    }

    /// Consume the opening `{`.
    ///
    /// # Errors
    ///
    /// [`DecodeError::MalformedEnvelope`] when the first significant byte is
    /// anything else, the body is empty, or reading fails.
    pub async fn open(&mut self) -> Result<(), DecodeError> {
        if self.position != Position::BeforeOpen {
            return Err(DecodeError::envelope(Delimiter::Open, "envelope already opened"));
        }
        self.expect_delimiter(Delimiter::Open).await?;
        self.position = Position::FirstEntry;
        Ok(())
    }

    /// Decode the next entry, or `None` when the envelope has no more.
    ///
    /// # Errors
    ///
    /// [`DecodeError::InvalidKey`] for a missing comma, a trailing comma or a
    /// key that is not a non-empty string. [`DecodeError::MalformedRecord`]
    /// for a missing colon or a value that is not a harbor object.
    pub async fn next_entry(&mut self) -> Result<Option<HarborEntry>, DecodeError> {
        match self.position {
            Position::BeforeOpen => {
                return Err(DecodeError::envelope(Delimiter::Open, "envelope not opened"));
            }
            Position::Exhausted | Position::Closed => return Ok(None),
            Position::FirstEntry | Position::NextEntry => {}
        }

        let peeked = self
            .peek_significant()
            .await
            .map_err(|err| DecodeError::key(format!("read failed: {err}")))?;
        let Some(byte) = peeked.filter(|byte| !matches!(*byte, b'}' | b']')) else {
            self.position = Position::Exhausted;
            return Ok(None);
        };

        if self.position == Position::NextEntry {
            if byte != b',' {
                return Err(DecodeError::key(format!(
                    "expected ',' between entries, found {}",
                    describe(byte)
                )));
            }
            self.reader.consume_unpin(1);
        }

        let unloc = self.read_key().await?;
        self.expect_colon().await?;
        let payload = self.read_record().await?;
        self.position = Position::NextEntry;
        Ok(Some(HarborEntry { unloc, payload }))
    }

    /// Consume the closing `}`. Bytes after it are left unread.
    ///
    /// # Errors
    ///
    /// [`DecodeError::MalformedEnvelope`] when the next significant byte is
    /// anything else, the body ended, or reading fails.
    pub async fn close(&mut self) -> Result<(), DecodeError> {
        match self.position {
            Position::Closed => return Ok(()),
            Position::Exhausted => {}
            Position::BeforeOpen | Position::FirstEntry | Position::NextEntry => {
                return Err(DecodeError::envelope(
                    Delimiter::Close,
                    "entries remain undecoded",
                ));
            }
        }
        self.expect_delimiter(Delimiter::Close).await?;
        self.position = Position::Closed;
        Ok(())
    }

    async fn expect_delimiter(&mut self, delimiter: Delimiter) -> Result<(), DecodeError> {
        let peeked = self
            .peek_significant()
            .await
            .map_err(|err| DecodeError::envelope(delimiter, format!("read failed: {err}")))?;
        match peeked {
            Some(byte) if char::from(byte) == delimiter.as_char() => {
                self.reader.consume_unpin(1);
                Ok(())
            }
            Some(byte) => Err(DecodeError::envelope(
                delimiter,
                format!("found {}", describe(byte)),
            )),
            None => Err(DecodeError::envelope(delimiter, "unexpected end of body")),
        }
    }

    async fn read_key(&mut self) -> Result<Unloc, DecodeError> {
        let peeked = self
            .peek_significant()
            .await
            .map_err(|err| DecodeError::key(format!("read failed: {err}")))?;
        match peeked {
            Some(b'"') => {}
            Some(byte) => {
                return Err(DecodeError::key(format!(
                    "expected a string key, found {}",
                    describe(byte)
                )));
            }
            None => return Err(DecodeError::key("unexpected end of body")),
        }

        self.begin_capture(b'"');
        self.capture(ValueScanner::string())
            .await
            .map_err(|err| DecodeError::key(err.to_string()))?;
        let key: String = serde_json::from_slice(&self.scratch)
            .map_err(|err| DecodeError::key(err.to_string()))?;
        Unloc::new(key).map_err(|err| DecodeError::key(err.to_string()))
    }

    async fn expect_colon(&mut self) -> Result<(), DecodeError> {
        let peeked = self
            .peek_significant()
            .await
            .map_err(|err| DecodeError::record(format!("read failed: {err}")))?;
        match peeked {
            Some(b':') => {
                self.reader.consume_unpin(1);
                Ok(())
            }
            Some(byte) => Err(DecodeError::record(format!(
                "expected ':' after key, found {}",
                describe(byte)
            ))),
            None => Err(DecodeError::record("unexpected end of body")),
        }
    }

    async fn read_record(&mut self) -> Result<HarborPayload, DecodeError> {
        let peeked = self
            .peek_significant()
            .await
            .map_err(|err| DecodeError::record(format!("read failed: {err}")))?;
        match peeked {
            Some(b'{') => {}
            Some(byte) => {
                return Err(DecodeError::record(format!(
                    "expected a harbor object, found {}",
                    describe(byte)
                )));
            }
            None => return Err(DecodeError::record("unexpected end of body")),
        }

        self.begin_capture(b'{');
        self.capture(ValueScanner::object())
            .await
            .map_err(|err| DecodeError::record(err.to_string()))?;
        // Going through `Value` keeps the last of any repeated field.
        let record: serde_json::Value = serde_json::from_slice(&self.scratch)
            .map_err(|err| DecodeError::record(err.to_string()))?;
        serde_json::from_value(record).map_err(|err| DecodeError::record(err.to_string()))
    }

    /// Reset the scratch buffer and move the already-peeked opening byte
    /// into it.
    fn begin_capture(&mut self, opening: u8) {
        self.scratch.clear();
        self.scratch.push(opening);
        self.reader.consume_unpin(1);
    }

    /// Copy bytes into the scratch buffer until `scanner` reports the value
    /// complete.
    async fn capture(&mut self, mut scanner: ValueScanner) -> Result<(), CaptureError> {
        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Err(CaptureError::Truncated);
            }

            let end = buf
                .iter()
                .position(|byte| scanner.advance(*byte))
                .map(|index| index + 1);
            let taken = end.unwrap_or(buf.len());
            if self.scratch.len() + taken > MAX_ENTRY_BYTES {
                return Err(CaptureError::TooLarge);
            }
            self.scratch.extend_from_slice(buf.get(..taken).unwrap_or_default());
            self.reader.consume_unpin(taken);

            if end.is_some() {
                return Ok(());
            }
        }
    }

    /// Skip whitespace and return the next byte without consuming it.
    async fn peek_significant(&mut self) -> io::Result<Option<u8>> {
        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Ok(None);
            }

            let len = buf.len();
            let found = buf
                .iter()
                .enumerate()
                .find(|(_, byte)| !is_json_whitespace(**byte))
                .map(|(index, byte)| (index, *byte));
            match found {
                Some((index, byte)) => {
                    self.reader.consume_unpin(index);
                    return Ok(Some(byte));
                }
                None => self.reader.consume_unpin(len),
            }
        }
    }
}
