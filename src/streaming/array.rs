//! Streaming decoder for archives shaped as a single top-level JSON array.
//!
//! Timeline exports look like:
//! ```json
//! [
//!   {"id": "1", "created_at": "2024-01-01T10:00:00Z", "content": "<p>Hi</p>"},
//!   {"id": "2", "created_at": "2024-01-02T10:00:00Z", "content": "<p>Bye</p>"}
//! ]
//! ```
//!
//! The decoder scans the byte stream, cuts out one element at a time and
//! hands only that element to `serde_json`. Memory usage is bounded by the
//! largest single element, not by the file size.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::iter::FusedIterator;
use std::path::Path;

use serde_json::Value;

use crate::error::TootpackError;

use super::{RecordIterator, StreamingConfig, StreamingError, StreamingResult};

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Opens archives and turns them into [`JsonArrayStream`]s.
///
/// # Example
///
/// ```rust,no_run
/// use tootpack::streaming::ArchiveDecoder;
///
/// let decoder = ArchiveDecoder::new();
///
/// for result in decoder.open("outbox.json").unwrap() {
///     match result {
///         Ok(value) => println!("{}", value["id"]),
///         Err(e) => eprintln!("archive is malformed: {}", e),
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveDecoder {
    config: StreamingConfig,
}

impl ArchiveDecoder {
    /// Creates a decoder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a decoder with custom configuration.
    pub fn with_config(config: StreamingConfig) -> Self {
        Self { config }
    }

    /// Returns the decoder configuration.
    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// Opens a file and returns a stream over its array elements.
    ///
    /// # Errors
    ///
    /// Returns [`TootpackError::Read`] naming the path if the file cannot be opened.
    pub fn open(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<JsonArrayStream<BufReader<File>>, TootpackError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| TootpackError::read(path, err))?;
        let file_size = file
            .metadata()
            .map_err(|err| TootpackError::read(path, err))?
            .len();

        Ok(self.from_reader(file, path.display().to_string(), Some(file_size)))
    }

    /// Wraps any byte stream, tagged with a display name for diagnostics.
    pub fn from_reader<R: Read>(
        &self,
        reader: R,
        name: impl Into<String>,
        total_bytes: Option<u64>,
    ) -> JsonArrayStream<BufReader<R>> {
        // The BOM check needs at least three buffered bytes.
        let capacity = self.config.buffer_size.max(UTF8_BOM.len());
        JsonArrayStream::new(
            BufReader::with_capacity(capacity, reader),
            name,
            total_bytes,
            self.config,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    FirstElement,
    AfterElement,
    Done,
}

/// Lazy, non-restartable iterator over the elements of one archive.
///
/// Yields each element in document order. The first error ends the
/// iteration: subsequent calls to `next` return `None`.
pub struct JsonArrayStream<R: BufRead> {
    reader: R,
    name: String,
    total_bytes: Option<u64>,
    bytes_read: u64,
    config: StreamingConfig,
    buffer: Vec<u8>,
    state: State,
    elements: usize,
}

impl<R: BufRead> JsonArrayStream<R> {
    /// Creates a stream over an already-buffered reader.
    pub fn new(
        reader: R,
        name: impl Into<String>,
        total_bytes: Option<u64>,
        config: StreamingConfig,
    ) -> Self {
        Self {
            reader,
            name: name.into(),
            total_bytes,
            bytes_read: 0,
            config,
            buffer: Vec::new(),
            state: State::Start,
            elements: 0,
        }
    }

    /// Returns the display name of the archive.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns how many elements have been yielded so far.
    pub fn elements_read(&self) -> usize {
        self.elements
    }

    fn peek(&mut self) -> StreamingResult<Option<u8>> {
        let available = self.reader.fill_buf()?;
        Ok(available.first().copied())
    }

    fn bump(&mut self) {
        self.reader.consume(1);
        self.bytes_read += 1;
    }

    fn skip_whitespace(&mut self) -> StreamingResult<Option<u8>> {
        loop {
            match self.peek()? {
                Some(b' ' | b'\t' | b'\n' | b'\r') => self.bump(),
                other => return Ok(other),
            }
        }
    }

    fn skip_bom(&mut self) -> StreamingResult<()> {
        let available = self.reader.fill_buf()?;
        if available.starts_with(&UTF8_BOM) {
            self.reader.consume(UTF8_BOM.len());
            self.bytes_read += UTF8_BOM.len() as u64;
        }
        Ok(())
    }

    /// Moves the state machine forward by at most one element.
    fn advance(&mut self) -> StreamingResult<Option<Value>> {
        loop {
            match self.state {
                State::Start => {
                    self.skip_bom()?;
                    match self.skip_whitespace()? {
                        None => return Err(StreamingError::UnexpectedEof),
                        Some(b'[') => {
                            self.bump();
                            self.state = State::FirstElement;
                        }
                        Some(other) => {
                            return Err(StreamingError::NotAnArray {
                                found: char::from(other),
                            });
                        }
                    }
                }
                State::FirstElement => {
                    return match self.skip_whitespace()? {
                        None => Err(StreamingError::UnexpectedEof),
                        Some(b']') => {
                            self.bump();
                            self.finish()?;
                            Ok(None)
                        }
                        Some(_) => self.read_element().map(Some),
                    };
                }
                State::AfterElement => {
                    return match self.skip_whitespace()? {
                        None => Err(StreamingError::UnexpectedEof),
                        Some(b',') => {
                            self.bump();
                            match self.skip_whitespace()? {
                                None => Err(StreamingError::UnexpectedEof),
                                Some(b']') => Err(StreamingError::InvalidFormat(
                                    "trailing comma before the closing bracket".into(),
                                )),
                                Some(_) => self.read_element().map(Some),
                            }
                        }
                        Some(b']') => {
                            self.bump();
                            self.finish()?;
                            Ok(None)
                        }
                        Some(other) => Err(StreamingError::InvalidFormat(format!(
                            "expected ',' or ']' after element {}, found '{}'",
                            self.elements,
                            char::from(other)
                        ))),
                    };
                }
                State::Done => return Ok(None),
            }
        }
    }

    /// Only whitespace may follow the closing bracket.
    fn finish(&mut self) -> StreamingResult<()> {
        self.state = State::Done;
        match self.skip_whitespace()? {
            None => Ok(()),
            Some(other) => Err(StreamingError::InvalidFormat(format!(
                "unexpected '{}' after the closing bracket",
                char::from(other)
            ))),
        }
    }

    /// Cuts the next element out of the stream and parses it.
    fn read_element(&mut self) -> StreamingResult<Value> {
        self.buffer.clear();
        let mut scanner: Option<ElementScanner> = None;

        loop {
            let (consumed, complete) = {
                let available = self.reader.fill_buf()?;
                if available.is_empty() {
                    if scanner.is_some_and(|s| s.accepts_eof()) {
                        break;
                    }
                    return Err(StreamingError::UnexpectedEof);
                }

                let scanner = scanner.get_or_insert_with(|| ElementScanner::new(available[0]));
                let mut consumed = 0;
                let mut complete = false;
                for &byte in available {
                    match scanner.feed(byte) {
                        Step::Continue => consumed += 1,
                        Step::Inclusive => {
                            consumed += 1;
                            complete = true;
                            break;
                        }
                        Step::Exclusive => {
                            complete = true;
                            break;
                        }
                    }
                }
                self.buffer.extend_from_slice(&available[..consumed]);
                (consumed, complete)
            };

            self.reader.consume(consumed);
            self.bytes_read += consumed as u64;

            if self.buffer.len() > self.config.max_record_size {
                return Err(StreamingError::ElementTooLarge {
                    max_size: self.config.max_record_size,
                    actual_size: self.buffer.len(),
                });
            }
            if complete {
                break;
            }
        }

        if self.buffer.is_empty() {
            let found = self.peek()?.map(char::from).unwrap_or(' ');
            return Err(StreamingError::InvalidFormat(format!(
                "expected an element, found '{found}'"
            )));
        }

        let value = serde_json::from_slice(&self.buffer).map_err(|source| StreamingError::Json {
            index: self.elements,
            source,
        })?;
        self.state = State::AfterElement;
        Ok(value)
    }
}

impl<R: BufRead> Iterator for JsonArrayStream<R> {
    type Item = StreamingResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(Some(value)) => {
                self.elements += 1;
                Some(Ok(value))
            }
            Ok(None) => None,
            Err(e) => {
                self.state = State::Done;
                Some(Err(e))
            }
        }
    }
}

impl<R: BufRead> FusedIterator for JsonArrayStream<R> {}

impl<R: BufRead> RecordIterator for JsonArrayStream<R> {
    fn bytes_processed(&self) -> u64 {
        self.bytes_read
    }

    fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    /// Element ends with this byte.
    Inclusive,
    /// Element ended before this byte.
    Exclusive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementKind {
    Container,
    Text,
    Scalar,
}

/// Finds the end of one JSON value without parsing it.
#[derive(Debug, Clone, Copy)]
struct ElementScanner {
    kind: ElementKind,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl ElementScanner {
    fn new(first: u8) -> Self {
        let kind = match first {
            b'{' | b'[' => ElementKind::Container,
            b'"' => ElementKind::Text,
            _ => ElementKind::Scalar,
        };
        Self {
            kind,
            depth: 0,
            in_string: false,
            escaped: false,
        }
    }

    /// A bare scalar may legitimately be cut off by end of input.
    fn accepts_eof(self) -> bool {
        self.kind == ElementKind::Scalar
    }

    fn feed(&mut self, byte: u8) -> Step {
        if self.kind == ElementKind::Scalar {
            return match byte {
                b' ' | b'\t' | b'\n' | b'\r' | b',' | b']' | b'}' | b'[' | b'{' | b'"' => {
                    Step::Exclusive
                }
                _ => Step::Continue,
            };
        }

        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if byte == b'\\' {
                self.escaped = true;
            } else if byte == b'"' {
                self.in_string = false;
                if self.kind == ElementKind::Text {
                    return Step::Inclusive;
                }
            }
            return Step::Continue;
        }

        match byte {
            b'"' => self.in_string = true,
            b'{' | b'[' => self.depth += 1,
            b'}' | b']' => {
                self.depth = self.depth.saturating_sub(1);
                if self.depth == 0 {
                    return Step::Inclusive;
                }
            }
            _ => {}
        }
        Step::Continue
    }
}
