//! FASTQ record parsing and gzip-transparent file I/O.
//!
//! Not part of the trie's core; this is the ambient I/O layer the driver
//! (`dedup`) uses to turn files on disk into byte strings the trie can
//! index. There is no precedent for FASTQ parsing in the teacher crate —
//! the teacher only ever transforms already-loaded buffers — so this module
//! is hand-rolled, but keeps the teacher's habit of returning `Result<_,
//! crate::Error>` and using `BufRead`/`Write` trait objects rather than
//! concrete file types.

use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{Error, Result};

/// One FASTQ record: identifier line (without the leading `@`), sequence,
/// separator line (without the leading `+`), and quality string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub id: Vec<u8>,
    pub sequence: Vec<u8>,
    pub separator: Vec<u8>,
    pub quality: Vec<u8>,
}

/// Pulls records one at a time out of any `BufRead`.
pub struct Reader<R> {
    inner: R,
    line_buf: Vec<u8>,
}

impl<R: BufRead> Reader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line_buf: Vec::new(),
        }
    }

    fn read_line_stripped(&mut self) -> Result<Option<Vec<u8>>> {
        self.line_buf.clear();
        let n = self.inner.read_until(b'\n', &mut self.line_buf)?;
        if n == 0 {
            return Ok(None);
        }
        while matches!(self.line_buf.last(), Some(b'\n') | Some(b'\r')) {
            self.line_buf.pop();
        }
        Ok(Some(std::mem::take(&mut self.line_buf)))
    }

    /// Read the next record, or `None` at end of input.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let header = match self.read_line_stripped()? {
            None => return Ok(None),
            Some(line) => line,
        };
        if header.first() != Some(&b'@') {
            return Err(Error::BadInput);
        }
        let sequence = self
            .read_line_stripped()?
            .ok_or(Error::BadInput)?;
        let separator = self
            .read_line_stripped()?
            .ok_or(Error::BadInput)?;
        if separator.first() != Some(&b'+') {
            return Err(Error::BadInput);
        }
        let quality = self
            .read_line_stripped()?
            .ok_or(Error::BadInput)?;
        if quality.len() != sequence.len() {
            return Err(Error::BadInput);
        }
        Ok(Some(Record {
            id: header[1..].to_vec(),
            sequence,
            separator: separator[1..].to_vec(),
            quality,
        }))
    }
}

/// Write a single record in standard four-line FASTQ form.
pub fn write_record<W: Write>(out: &mut W, record: &Record) -> Result<()> {
    out.write_all(b"@")?;
    out.write_all(&record.id)?;
    out.write_all(b"\n")?;
    out.write_all(&record.sequence)?;
    out.write_all(b"\n+")?;
    out.write_all(&record.separator)?;
    out.write_all(b"\n")?;
    out.write_all(&record.quality)?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Open a FASTQ file, transparently decompressing if its name ends in
/// `.gz`. `MultiGzDecoder` is used rather than `GzDecoder` since
/// concatenated-member gzip FASTQ files are common in the wild.
pub fn open_reader(path: &Path) -> Result<Reader<BufReader<Box<dyn Read>>>> {
    let file = std::fs::File::open(path)?;
    let inner: Box<dyn Read> = if is_gzip_path(path) {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(Reader::new(BufReader::new(inner)))
}

/// Create a FASTQ file for writing, gzip-compressing if its name ends in
/// `.gz`.
pub fn create_writer(path: &Path) -> Result<Box<dyn Write>> {
    let file = std::fs::File::create(path)?;
    if is_gzip_path(path) {
        Ok(Box::new(GzEncoder::new(file, Compression::default())))
    } else {
        Ok(Box::new(file))
    }
}

pub fn is_gzip_path(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}
