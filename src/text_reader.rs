use std::{io::Write, path::Path};

use tracing::instrument;

use crate::{util::utf8_char_len, Error, ErrorPolicy, MeanFormat, ReaderOptions, Result, TextInfo};

const FIELD_SEPARATOR: &str = ",";
const RECORD_TERMINATOR: &str = "\n";
const REPLACEMENT: &str = "\u{FFFD}";

/// Script of a recognized word, judged from its byte length per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// One byte per character, e.g. Latin text.
    SingleByte,
    /// Three bytes per character, e.g. CJK text.
    MultiByte,
    Mixed,
}

impl ScriptKind {
    pub fn classify(byte_len: usize, char_count: usize) -> Self {
        if byte_len == char_count {
            ScriptKind::SingleByte
        } else if byte_len == 3 * char_count {
            ScriptKind::MultiByte
        } else {
            ScriptKind::Mixed
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRecord {
    pub info: TextInfo,
    pub script: ScriptKind,
    /// 1-based line in the source file.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedText {
    pub byte_len: usize,
    pub records: Vec<TextRecord>,
}

impl DecodedText {
    pub fn into_text_infos(self) -> Vec<TextInfo> {
        self.records.into_iter().map(|record| record.info).collect()
    }
}

/// Characters collected for one field, with the raw byte count they came from.
#[derive(Debug, Default)]
struct Field {
    text: String,
    byte_len: usize,
    char_count: usize,
}

impl Field {
    fn push(&mut self, ch: &str, byte_len: usize) {
        self.text.push_str(ch);
        self.byte_len += byte_len;
        self.char_count += 1;
    }

    fn append(&mut self, other: Field) {
        self.text.push_str(&other.text);
        self.byte_len += other.byte_len;
        self.char_count += other.char_count;
    }

    fn script(&self) -> ScriptKind {
        ScriptKind::classify(self.byte_len, self.char_count)
    }
}

/// Reads `_mean` recognition files character by character, so multi-byte
/// words are never split inside a character.
#[derive(Debug, Clone, Default)]
pub struct TextReader {
    options: ReaderOptions,
}

impl TextReader {
    pub fn new(options: ReaderOptions) -> Self {
        Self { options }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn read(&self, path: &Path) -> Result<DecodedText> {
        let bytes = std::fs::read(path).map_err(|source| Error::io(path, source))?;
        let records = self.decode(&bytes, path)?;
        log::trace!(
            "Decoded {} records from {} bytes of {}",
            records.len(),
            bytes.len(),
            path.display()
        );
        Ok(DecodedText {
            byte_len: bytes.len(),
            records,
        })
    }

    /// Decodes an in-memory file; `path` is only used in diagnostics.
    #[instrument(level = "trace", skip(self, bytes))]
    pub fn decode(&self, bytes: &[u8], path: &Path) -> Result<Vec<TextRecord>> {
        let mut decoder = Decoder {
            options: &self.options,
            path,
            line: 1,
            word: None,
            field: Field::default(),
            records: Vec::new(),
        };

        let mut index = 0;
        while index < bytes.len() {
            let (ch, len) = match next_char(bytes, index) {
                Some(next) => next,
                None => match self.options.on_invalid_encoding {
                    ErrorPolicy::Abort => {
                        return Err(Error::Encoding {
                            path: path.to_path_buf(),
                            offset: index,
                        })
                    }
                    ErrorPolicy::Skip => {
                        log::warn!(
                            "{}:{}: invalid byte {:#04x} at offset {index}, replacing it",
                            path.display(),
                            decoder.line,
                            bytes[index]
                        );
                        (REPLACEMENT, 1)
                    }
                },
            };
            index += len;
            decoder.feed(ch, len)?;
        }
        decoder.finish()
    }
}

/// Next character starting at `index` and its byte length, or `None` when the
/// lead byte is invalid, the character runs past the buffer or the bytes are
/// not a valid sequence.
fn next_char(bytes: &[u8], index: usize) -> Option<(&str, usize)> {
    let len = utf8_char_len(bytes[index])?;
    let raw = bytes.get(index..index + len)?;
    let ch = std::str::from_utf8(raw).ok()?;
    Some((ch, len))
}

struct Decoder<'a> {
    options: &'a ReaderOptions,
    path: &'a Path,
    line: usize,
    word: Option<Field>,
    field: Field,
    records: Vec<TextRecord>,
}

impl Decoder<'_> {
    fn feed(&mut self, ch: &str, len: usize) -> Result<()> {
        match ch {
            RECORD_TERMINATOR => {
                self.close_record()?;
                self.line += 1;
            }
            FIELD_SEPARATOR if self.options.format == MeanFormat::Scored => self.close_word(),
            _ => self.field.push(ch, len),
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<TextRecord>> {
        // A last record without a trailing newline still counts.
        self.close_record()?;
        Ok(self.records)
    }

    fn close_word(&mut self) {
        let field = std::mem::take(&mut self.field);
        match &mut self.word {
            // Separators inside the word belong to it; the score follows the last one.
            Some(word) => {
                word.push(FIELD_SEPARATOR, 1);
                word.append(field);
            }
            None => self.word = Some(field),
        }
    }

    fn close_record(&mut self) -> Result<()> {
        let word = self.word.take();
        let field = std::mem::take(&mut self.field);
        match self.options.format {
            MeanFormat::Scored => self.close_scored(word, field),
            MeanFormat::WordsOnly => {
                if let Some(token) = field.text.split_whitespace().next() {
                    self.records.push(TextRecord {
                        info: TextInfo::unscored(token),
                        script: ScriptKind::classify(token.len(), token.chars().count()),
                        line: self.line,
                    });
                }
                Ok(())
            }
        }
    }

    fn close_scored(&mut self, word: Option<Field>, score: Field) -> Result<()> {
        let Some(word) = word else {
            if score.text.trim().is_empty() {
                return Ok(());
            }
            return self.reject(Error::MissingSeparator {
                path: self.path.to_path_buf(),
                line: self.line,
                content: score.text,
            });
        };

        match parse_score(&score.text) {
            Some(value) => {
                self.records.push(TextRecord {
                    script: word.script(),
                    info: TextInfo::new(word.text, value),
                    line: self.line,
                });
                Ok(())
            }
            None => self.reject(Error::Parse {
                path: self.path.to_path_buf(),
                line: self.line,
                field: score.text,
            }),
        }
    }

    fn reject(&self, err: Error) -> Result<()> {
        match self.options.on_bad_record {
            ErrorPolicy::Abort => Err(err),
            ErrorPolicy::Skip => {
                log::warn!("Skipping record: {err}");
                Ok(())
            }
        }
    }
}

fn parse_score(field: &str) -> Option<f64> {
    let score = field.trim().parse::<f64>().ok()?;
    (score.is_finite() && score >= 0.0).then_some(score)
}

/// Writes records in the `word,score` line format that [`TextReader`] reads.
pub fn write_records<'a, W: Write>(
    writer: &mut W,
    infos: impl IntoIterator<Item = &'a TextInfo>,
) -> std::io::Result<()> {
    for info in infos {
        writeln!(writer, "{}{FIELD_SEPARATOR}{}", info.word, info.score)?;
    }
    Ok(())
}
