//! Model files.
//!
//! ```text
//! "Pretree" "version=2"                        length-prefixed tags
//! low high number_marker node_marker eow      varints
//! reverse ignore_case                         one byte each
//! threshold                                   f64, little-endian
//! buffer                                      length-prefixed UTF-8
//! ```
//!
//! Loading checks the header and walks the whole buffer before handing out a
//! tree, which is always left in the flat form.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use memmap2::Mmap;
use tracing::info;

use crate::config::Config;
use crate::encoding::{decode_bytes, decode_varint, encode_bytes, encode_varint};
use crate::error::{PretreeError, Result};
use crate::tree::Pretree;

const FORMAT_TAG: &str = "Pretree";
const FORMAT_VERSION: &str = "version=2";

impl Pretree {
    /// Serializes the tree, freezing it first.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.freeze()?;
        let flat = self
            .flat()
            .ok_or_else(|| PretreeError::Format("tree is not frozen".into()))?;
        let text: String = flat.as_chars().iter().collect();
        let cfg = self.config();

        let mut out = Vec::with_capacity(text.len() + 64);
        encode_bytes(FORMAT_TAG.as_bytes(), &mut out);
        encode_bytes(FORMAT_VERSION.as_bytes(), &mut out);
        for code in [
            cfg.low_char,
            cfg.high_char,
            cfg.number_marker as u32,
            cfg.node_marker as u32,
            cfg.end_of_word as u32,
        ] {
            encode_varint(code as u64, &mut out);
        }
        out.push(cfg.reverse as u8);
        out.push(cfg.ignore_case as u8);
        out.extend_from_slice(&cfg.threshold.to_le_bytes());
        encode_bytes(text.as_bytes(), &mut out);
        Ok(out)
    }

    /// Writes the model to `writer`.
    pub fn write_to<W: Write>(&mut self, mut writer: W) -> Result<()> {
        let bytes = self.to_bytes()?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes the model to `path`, replacing any existing file.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&bytes)?;
        writer.flush()?;
        info!(path = %path.display(), bytes = bytes.len(), "saved model");
        Ok(())
    }

    /// Parses a model from its serialized bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cur = Cursor { buf: bytes, pos: 0 };
        let tag = cur.bytes()?;
        if tag != FORMAT_TAG.as_bytes() {
            return Err(PretreeError::Format(format!(
                "bad tag {:?}",
                String::from_utf8_lossy(tag)
            )));
        }
        let version = cur.bytes()?;
        if version != FORMAT_VERSION.as_bytes() {
            return Err(PretreeError::Format(format!(
                "unsupported {:?}",
                String::from_utf8_lossy(version)
            )));
        }

        let config = Config {
            low_char: cur.code()?,
            high_char: cur.code()?,
            number_marker: cur.char()?,
            node_marker: cur.char()?,
            end_of_word: cur.char()?,
            reverse: cur.flag()?,
            ignore_case: cur.flag()?,
            threshold: cur.f64()?,
        };
        let text = std::str::from_utf8(cur.bytes()?)
            .map_err(|e| PretreeError::Format(format!("buffer is not UTF-8: {e}")))?;
        if cur.pos != bytes.len() {
            return Err(PretreeError::Format(format!(
                "{} trailing bytes",
                bytes.len() - cur.pos
            )));
        }
        Pretree::from_flat(config, text.chars().collect())
    }

    /// Reads a model from `reader` to the end.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    /// Opens a model file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        // The map is only read while parsing and dropped before returning.
        let mmap = unsafe { Mmap::map(&file)? };
        let tree = Self::from_bytes(&mmap)?;
        info!(
            path = %path.display(),
            bytes = mmap.len(),
            chars = tree.flat().map_or(0, |f| f.len()),
            "loaded model"
        );
        Ok(tree)
    }

    /// Replaces this tree with the model at `path`. On error the tree is left
    /// as it was.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        *self = Self::open(path)?;
        Ok(())
    }
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn bytes(&mut self) -> Result<&'a [u8]> {
        let (data, used) = decode_bytes(self.rest())?;
        self.pos += used;
        Ok(data)
    }

    fn code(&mut self) -> Result<u32> {
        let (value, used) = decode_varint(self.rest())?;
        self.pos += used;
        u32::try_from(value).map_err(|_| PretreeError::Format(format!("code {value} out of range")))
    }

    fn char(&mut self) -> Result<char> {
        let code = self.code()?;
        char::from_u32(code).ok_or_else(|| PretreeError::Format(format!("invalid char code {code}")))
    }

    fn flag(&mut self) -> Result<bool> {
        let byte = *self
            .rest()
            .first()
            .ok_or_else(|| PretreeError::Format("truncated header".into()))?;
        self.pos += 1;
        match byte {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(PretreeError::Format(format!("invalid flag byte {b}"))),
        }
    }

    fn f64(&mut self) -> Result<f64> {
        let raw: [u8; 8] = self
            .rest()
            .get(..8)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| PretreeError::Format("truncated header".into()))?;
        self.pos += 8;
        Ok(f64::from_le_bytes(raw))
    }
}
