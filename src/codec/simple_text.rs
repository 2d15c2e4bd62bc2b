//! Human-readable segment format, one record per line:
//!
//! ```text
//! lucidx-simpletext 1
//! segment _0
//! docs 3
//! fields 1
//! field a 3 3
//! norms 1 1 1
//! terms 2
//! term a 74 2 2
//! posting 0 1
//! posting 1 1
//! term a 741 1 1
//! posting 2 1
//! stored 3
//! doc 0 1
//! field a text 74
//! ...
//! checksum 1c291ca3
//! ```
//!
//! Names, term bytes and values are percent-escaped so that every token is
//! printable ASCII without spaces. The last line holds the CRC32 of
//! everything before it.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::str::FromStr;
use crate::codec::Codec;
use crate::core::error::{Error, Result};
use crate::core::types::FieldValue;
use crate::index::inverted::{Term, TermInfo};
use crate::index::posting::{Posting, PostingList};
use crate::storage::segment::{FieldStats, Segment, StoredField, TermEntry};

const HEADER: &str = "lucidx-simpletext";
const VERSION: u32 = 1;
const CHECKSUM: &str = "checksum";

#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTextCodec;

impl Codec for SimpleTextCodec {
    fn name(&self) -> &str {
        "SimpleText"
    }

    fn extension(&self) -> &str {
        "stx"
    }

    fn encode(&self, segment: &Segment) -> Result<Vec<u8>> {
        let mut out = String::new();
        writeln!(out, "{} {}", HEADER, VERSION).map_err(fmt_error)?;
        writeln!(out, "segment {}", escape(segment.name.as_bytes())).map_err(fmt_error)?;
        writeln!(out, "docs {}", segment.doc_count).map_err(fmt_error)?;

        writeln!(out, "fields {}", segment.fields.len()).map_err(fmt_error)?;
        for (name, stats) in &segment.fields {
            writeln!(out, "field {} {} {}", escape(name.as_bytes()), stats.doc_count, stats.sum_total_term_freq)
                .map_err(fmt_error)?;
            out.push_str("norms");
            for length in &stats.lengths {
                write!(out, " {}", length).map_err(fmt_error)?;
            }
            out.push('\n');
        }

        writeln!(out, "terms {}", segment.terms.len()).map_err(fmt_error)?;
        for (term, entry) in &segment.terms {
            writeln!(
                out, "term {} {} {} {}",
                escape(term.field.as_bytes()), escape(&term.bytes),
                entry.info.doc_freq, entry.info.total_term_freq
            ).map_err(fmt_error)?;
            for posting in entry.postings.iter() {
                writeln!(out, "posting {} {}", posting.doc_id, posting.term_freq).map_err(fmt_error)?;
            }
        }

        writeln!(out, "stored {}", segment.stored.len()).map_err(fmt_error)?;
        for (doc, fields) in segment.stored.iter().enumerate() {
            writeln!(out, "doc {} {}", doc, fields.len()).map_err(fmt_error)?;
            for field in fields {
                let (kind, bytes) = match &field.value {
                    FieldValue::Text(text) => ("text", text.as_bytes()),
                    FieldValue::Bytes(bytes) => ("bytes", bytes.as_slice()),
                };
                writeln!(out, "field {} {} {}", escape(field.name.as_bytes()), kind, escape(bytes))
                    .map_err(fmt_error)?;
            }
        }

        let checksum = crc32fast::hash(out.as_bytes());
        writeln!(out, "{} {:08x}", CHECKSUM, checksum).map_err(fmt_error)?;
        Ok(out.into_bytes())
    }

    fn decode(&self, data: &[u8]) -> Result<Segment> {
        let text = std::str::from_utf8(data)
            .map_err(|_| Error::corrupted("simple text segment is not UTF-8"))?;
        let body = verify_checksum(text)?;
        let mut lines = Records::new(body);

        let header = lines.next_record(HEADER)?;
        let version: u32 = parse_number(single(&header, HEADER)?, "version")?;
        if version != VERSION {
            return Err(Error::corrupted(format!("unsupported simple text version {}", version)));
        }

        let name = unescape_text(single(&lines.next_record("segment")?, "segment")?)?;
        let doc_count: u32 = parse_number(single(&lines.next_record("docs")?, "docs")?, "doc count")?;

        let field_count: usize = parse_number(single(&lines.next_record("fields")?, "fields")?, "field count")?;
        let mut fields = BTreeMap::new();
        for _ in 0..field_count {
            let record = lines.next_record("field")?;
            let [name, docs, sum] = fixed::<3>(&record, "field")?;
            let lengths = lines.next_record("norms")?
                .iter()
                .map(|l| parse_number(l, "norm"))
                .collect::<Result<Vec<u32>>>()?;
            let stats = FieldStats {
                doc_count: parse_number(docs, "field doc count")?,
                sum_total_term_freq: parse_number(sum, "field length sum")?,
                lengths,
            };
            if fields.insert(unescape_text(name)?, stats).is_some() {
                return Err(Error::corrupted("duplicate field statistics"));
            }
        }

        let term_count: usize = parse_number(single(&lines.next_record("terms")?, "terms")?, "term count")?;
        let mut terms = BTreeMap::new();
        for _ in 0..term_count {
            let record = lines.next_record("term")?;
            let [field, bytes, df, ttf] = fixed::<4>(&record, "term")?;
            let term = Term::new(unescape_text(field)?, unescape(bytes)?);
            let info = TermInfo {
                doc_freq: parse_number(df, "doc freq")?,
                total_term_freq: parse_number(ttf, "total term freq")?,
            };
            let mut postings = Vec::with_capacity(info.doc_freq as usize);
            for _ in 0..info.doc_freq {
                let record = lines.next_record("posting")?;
                let [doc, freq] = fixed::<2>(&record, "posting")?;
                postings.push(Posting::new(parse_number(doc, "doc")?, parse_number(freq, "freq")?));
            }
            let entry = TermEntry { info, postings: PostingList::from_postings(postings)? };
            if terms.insert(term, entry).is_some() {
                return Err(Error::corrupted("duplicate term in dictionary"));
            }
        }

        let stored_count: usize = parse_number(single(&lines.next_record("stored")?, "stored")?, "stored count")?;
        let mut stored = Vec::with_capacity(stored_count);
        for expected in 0..stored_count {
            let record = lines.next_record("doc")?;
            let [doc, count] = fixed::<2>(&record, "doc")?;
            if parse_number::<usize>(doc, "doc")? != expected {
                return Err(Error::corrupted(format!("stored documents out of order at {}", expected)));
            }
            let count: usize = parse_number(count, "stored field count")?;
            let mut doc_fields = Vec::with_capacity(count);
            for _ in 0..count {
                let record = lines.next_record("field")?;
                let [name, kind, value] = fixed::<3>(&record, "stored field")?;
                let value = match kind {
                    "text" => FieldValue::Text(unescape_text(value)?),
                    "bytes" => FieldValue::Bytes(unescape(value)?),
                    other => return Err(Error::corrupted(format!("unknown stored value kind '{}'", other))),
                };
                doc_fields.push(StoredField::new(unescape_text(name)?, value));
            }
            stored.push(doc_fields);
        }
        lines.expect_end()?;

        Ok(Segment { name, doc_count, fields, terms, stored })
    }
}

fn fmt_error(e: std::fmt::Error) -> Error {
    Error::corrupted(format!("formatting segment: {}", e))
}

/// Body without the checksum line, after verifying it
fn verify_checksum(text: &str) -> Result<&str> {
    let trimmed = text.strip_suffix('\n')
        .ok_or_else(|| Error::corrupted("simple text segment is truncated"))?;
    let footer_start = trimmed.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let (body, footer) = text.split_at(footer_start);
    let stored = footer.trim_end_matches('\n')
        .strip_prefix(CHECKSUM)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or_else(|| Error::corrupted("simple text segment has no checksum footer"))?;
    let expected = u32::from_str_radix(stored, 16)
        .map_err(|_| Error::corrupted(format!("invalid checksum '{}'", stored)))?;
    let actual = crc32fast::hash(body.as_bytes());
    if actual != expected {
        return Err(Error::corrupted(format!(
            "simple text checksum mismatch: stored {:08x}, computed {:08x}", expected, actual
        )));
    }
    Ok(body)
}

struct Records<'a> {
    lines: std::str::Lines<'a>,
    line_no: usize,
}

impl<'a> Records<'a> {
    fn new(body: &'a str) -> Self {
        Records { lines: body.lines(), line_no: 0 }
    }

    /// Tokens of the next line after checking its leading keyword
    fn next_record(&mut self, keyword: &str) -> Result<Vec<&'a str>> {
        self.line_no += 1;
        let line = self.lines.next().ok_or_else(|| {
            Error::corrupted(format!("line {}: expected '{}', found end of file", self.line_no, keyword))
        })?;
        let mut tokens = line.split(' ');
        match tokens.next() {
            Some(found) if found == keyword => Ok(tokens.collect()),
            found => Err(Error::corrupted(format!(
                "line {}: expected '{}', found '{}'", self.line_no, keyword, found.unwrap_or("")
            ))),
        }
    }

    fn expect_end(&mut self) -> Result<()> {
        match self.lines.next() {
            None => Ok(()),
            Some(line) => Err(Error::corrupted(format!("line {}: unexpected '{}'", self.line_no + 1, line))),
        }
    }
}

fn fixed<'r, 'a, const N: usize>(tokens: &'r [&'a str], record: &str) -> Result<[&'a str; N]> {
    <[&str; N]>::try_from(tokens).map_err(|_| {
        Error::corrupted(format!("'{}' record needs {} values, found {}", record, N, tokens.len()))
    })
}

fn single<'a>(tokens: &[&'a str], record: &str) -> Result<&'a str> {
    let [value] = fixed::<1>(tokens, record)?;
    Ok(value)
}

fn parse_number<T: FromStr>(token: &str, what: &str) -> Result<T> {
    token.parse()
        .map_err(|_| Error::corrupted(format!("invalid {} '{}'", what, token)))
}

fn escape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if b.is_ascii_graphic() && b != b'%' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

fn unescape(token: &str) -> Result<Vec<u8>> {
    let bytes = token.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = token.get(i + 1..i + 3)
                .filter(|h| h.bytes().all(|c| c.is_ascii_hexdigit()))
                .ok_or_else(|| Error::corrupted(format!("bad escape in '{}'", token)))?;
            out.push(u8::from_str_radix(hex, 16)
                .map_err(|_| Error::corrupted(format!("bad escape in '{}'", token)))?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

fn unescape_text(token: &str) -> Result<String> {
    String::from_utf8(unescape(token)?)
        .map_err(|_| Error::corrupted(format!("escaped text '{}' is not UTF-8", token)))
}
