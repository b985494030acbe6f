//! Binary decoder for allocation-tracker dumps.
//!
//! A dump is one big-endian message, laid out as:
//!
//! ```text
//! header:
//!   u8  message header len (total, including itself; fixed fields occupy 15)
//!   u8  entry header len   (>= 9)
//!   u8  stack frame len    (>= 8)
//!   u16 entry count
//!   u32 offset to string table, from start of message
//!   u16 class name count
//!   u16 method name count
//!   u16 source file name count
//! entries (entry count times):
//!   u32 total allocation size
//!   u16 thread id
//!   u16 allocated class name index
//!   u8  stack depth
//!   [entry header len - 9 padding bytes]
//!   stack frames (stack depth times):
//!     u16 class name index
//!     u16 method name index
//!     u16 source file index
//!     i16 line number (-2 native, -1 no source)
//!     [stack frame len - 8 padding bytes]
//! string table (at the declared offset): class names, then method names,
//! then file names; each string is a u32 length followed by that many
//! UTF-16 code units
//! ```
//!
//! Strings are raw VM type descriptors (`Landroid/os/Debug;`, `[I`, `I`)
//! and are converted to dotted display form while the table loads, so every
//! downstream consumer sees `android.os.Debug`, `int[]`, `int`.

use crate::record::{AllocationRecord, LineNumber, StackFrame};
use thiserror::Error;

/// Bytes occupied by the fixed header fields.
const MESSAGE_HEADER_LEN: usize = 15;
/// Fixed bytes of each entry header, before declared padding.
const ENTRY_FIXED_LEN: usize = 9;
/// Fixed bytes of each encoded stack frame, before declared padding.
const FRAME_FIXED_LEN: usize = 8;

/// Errors for dump decoding. All are fatal; no partial record set is
/// returned.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("dump truncated at offset {offset}: {needed} more bytes needed")]
    Truncated { offset: usize, needed: usize },

    #[error("inconsistent header: {field} is {value}, minimum is {minimum}")]
    InconsistentHeader {
        field: &'static str,
        value: usize,
        minimum: usize,
    },

    #[error("{table} index {index} out of range (table holds {len} strings)")]
    StringIndex {
        table: &'static str,
        index: u16,
        len: usize,
    },

    #[error("entry data ends at offset {entries_end}, overlapping the string table at {table_offset}")]
    StringTableOverlap {
        entries_end: usize,
        table_offset: usize,
    },
}

pub type Result<T> = std::result::Result<T, DecodeError>;

/// Decode a complete dump buffer into allocation records, in entry order.
///
/// Decoding is deterministic and single-pass over each region: the string
/// tables are read first (entries refer into them by index), then the
/// entries.
pub fn decode(data: &[u8]) -> Result<Vec<AllocationRecord>> {
    let mut cur = Cursor::new(data);

    let message_header_len = cur.read_u8()? as usize;
    let entry_header_len = cur.read_u8()? as usize;
    let stack_frame_len = cur.read_u8()? as usize;
    let entry_count = cur.read_u16()? as usize;
    let string_table_offset = cur.read_u32()? as usize;
    let class_name_count = cur.read_u16()? as usize;
    let method_name_count = cur.read_u16()? as usize;
    let file_name_count = cur.read_u16()? as usize;

    check_min("message header length", message_header_len, MESSAGE_HEADER_LEN)?;
    check_min("entry header length", entry_header_len, ENTRY_FIXED_LEN)?;
    check_min("stack frame length", stack_frame_len, FRAME_FIXED_LEN)?;

    cur.seek(string_table_offset)?;
    let class_names = read_string_table(&mut cur, class_name_count)?;
    let method_names = read_string_table(&mut cur, method_name_count)?;
    let file_names = read_string_table(&mut cur, file_name_count)?;

    // Back to just past the (possibly padded) header for the entries.
    cur.seek(message_header_len)?;
    let mut records = Vec::with_capacity(entry_count);
    for i in 0..entry_count {
        let size_bytes = cur.read_u32()?;
        let thread_id = cur.read_u16()? as i16;
        let class_idx = cur.read_u16()?;
        let depth = cur.read_u8()? as usize;
        cur.skip(entry_header_len - ENTRY_FIXED_LEN)?;

        let allocated_class = lookup(&class_names, "class name", class_idx)?.clone();

        let mut stack_trace = Vec::with_capacity(depth);
        for _ in 0..depth {
            let frame_class = cur.read_u16()?;
            let frame_method = cur.read_u16()?;
            let frame_file = cur.read_u16()?;
            let line = cur.read_i16()?;
            cur.skip(stack_frame_len - FRAME_FIXED_LEN)?;

            stack_trace.push(StackFrame {
                class_name: lookup(&class_names, "class name", frame_class)?.clone(),
                method_name: lookup(&method_names, "method name", frame_method)?.clone(),
                source_file: Some(lookup(&file_names, "source file", frame_file)?.clone()),
                line: LineNumber::from_wire(line),
            });
        }

        records.push(AllocationRecord {
            // Entries arrive most-recent-first, so the first entry gets the
            // highest id and the last gets 1.
            sequence_id: (entry_count - i) as u32,
            allocated_class,
            size_bytes,
            thread_id,
            stack_trace,
        });
    }

    if cur.position() > string_table_offset {
        return Err(DecodeError::StringTableOverlap {
            entries_end: cur.position(),
            table_offset: string_table_offset,
        });
    }

    tracing::debug!(
        "decoded {} allocation records ({} classes, {} methods, {} files)",
        records.len(),
        class_names.len(),
        method_names.len(),
        file_names.len()
    );
    Ok(records)
}

fn check_min(field: &'static str, value: usize, minimum: usize) -> Result<()> {
    if value < minimum {
        return Err(DecodeError::InconsistentHeader {
            field,
            value,
            minimum,
        });
    }
    Ok(())
}

fn lookup<'t>(table: &'t [String], name: &'static str, index: u16) -> Result<&'t String> {
    table.get(index as usize).ok_or(DecodeError::StringIndex {
        table: name,
        index,
        len: table.len(),
    })
}

fn read_string_table(cur: &mut Cursor<'_>, count: usize) -> Result<Vec<String>> {
    let mut table = Vec::with_capacity(count);
    for _ in 0..count {
        let descriptor = read_utf16_string(cur)?;
        table.push(descriptor_to_dot(&descriptor));
    }
    Ok(table)
}

/// Read one length-prefixed UTF-16 string. Unpaired surrogates decode to
/// the replacement character; the values are display strings, not keys the
/// producer guarantees to be well formed.
fn read_utf16_string(cur: &mut Cursor<'_>) -> Result<String> {
    let char_count = cur.read_u32()? as usize;
    let raw = cur.take(char_count.saturating_mul(2))?;
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    Ok(String::from_utf16_lossy(&units))
}

/// Convert a VM type descriptor to dotted display form:
/// `Landroid/os/Debug;` becomes `android.os.Debug`, primitive codes spell
/// out (`I` to `int`), and each leading `[` appends one trailing `[]`.
/// Anything unrecognized passes through unchanged.
fn descriptor_to_dot(descriptor: &str) -> String {
    let mut rest = descriptor;
    let mut array_depth = 0;
    while let Some(stripped) = rest.strip_prefix('[') {
        rest = stripped;
        array_depth += 1;
    }

    let mut name = if rest.len() >= 2 && rest.starts_with('L') && rest.ends_with(';') {
        rest[1..rest.len() - 1].replace('/', ".")
    } else {
        match rest {
            "C" => "char".to_string(),
            "B" => "byte".to_string(),
            "Z" => "boolean".to_string(),
            "S" => "short".to_string(),
            "I" => "int".to_string(),
            "J" => "long".to_string(),
            "F" => "float".to_string(),
            "D" => "double".to_string(),
            other => other.to_string(),
        }
    };

    for _ in 0..array_depth {
        name.push_str("[]");
    }
    name
}

/// Bounds-checked big-endian reader over the dump buffer.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.buf.len() {
            return Err(DecodeError::Truncated {
                offset: pos,
                needed: pos - self.buf.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(DecodeError::Truncated {
            offset: self.pos,
            needed: n,
        })?;
        if end > self.buf.len() {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed: end - self.buf.len(),
            });
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}
