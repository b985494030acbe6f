// Integration test utilities
//
// Helpers for building allocation-dump buffers in the wire format the
// decoder reads: big-endian header, entry region, then the three UTF-16
// string tables.
#![allow(dead_code)] // each test binary uses its own subset of helpers

/// Fixed header bytes: lengths (3 x u8), entry count (u16), string table
/// offset (u32), three table counts (3 x u16).
pub const MESSAGE_HEADER_LEN: usize = 15;
/// Fixed bytes per entry: size (u32), thread (u16), class (u16), depth (u8).
pub const ENTRY_HEADER_LEN: usize = 9;
/// Fixed bytes per frame: three indices (u16 each) and the line (i16).
pub const STACK_FRAME_LEN: usize = 8;

/// One entry of a dump under construction.
pub struct DumpEntry {
    pub size: u32,
    pub thread: u16,
    pub class_idx: u16,
    /// Per frame: class, method and file string-table indices, then the
    /// line number (-1 no source, -2 native).
    pub frames: Vec<(u16, u16, u16, i16)>,
}

impl DumpEntry {
    pub fn new(size: u32, thread: u16, class_idx: u16) -> Self {
        DumpEntry {
            size,
            thread,
            class_idx,
            frames: Vec::new(),
        }
    }

    pub fn frame(mut self, class: u16, method: u16, file: u16, line: i16) -> Self {
        self.frames.push((class, method, file, line));
        self
    }
}

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_string(buf: &mut Vec<u8>, s: &str) {
    let units: Vec<u16> = s.encode_utf16().collect();
    put_u32(buf, units.len() as u32);
    for unit in units {
        put_u16(buf, unit);
    }
}

/// Build a dump with explicit header/entry/frame lengths; lengths beyond
/// the fixed fields are written as zero padding.
pub fn build_dump_with_lens(
    entries: &[DumpEntry],
    classes: &[&str],
    methods: &[&str],
    files: &[&str],
    msg_len: usize,
    entry_len: usize,
    frame_len: usize,
) -> Vec<u8> {
    let mut buf = vec![msg_len as u8, entry_len as u8, frame_len as u8];
    put_u16(&mut buf, entries.len() as u16);
    let offset_pos = buf.len();
    put_u32(&mut buf, 0); // patched below
    put_u16(&mut buf, classes.len() as u16);
    put_u16(&mut buf, methods.len() as u16);
    put_u16(&mut buf, files.len() as u16);
    while buf.len() < msg_len {
        buf.push(0);
    }

    for entry in entries {
        put_u32(&mut buf, entry.size);
        put_u16(&mut buf, entry.thread);
        put_u16(&mut buf, entry.class_idx);
        buf.push(entry.frames.len() as u8);
        for _ in ENTRY_HEADER_LEN..entry_len {
            buf.push(0);
        }
        for &(class, method, file, line) in &entry.frames {
            put_u16(&mut buf, class);
            put_u16(&mut buf, method);
            put_u16(&mut buf, file);
            put_u16(&mut buf, line as u16);
            for _ in STACK_FRAME_LEN..frame_len {
                buf.push(0);
            }
        }
    }

    let table_offset = buf.len() as u32;
    buf[offset_pos..offset_pos + 4].copy_from_slice(&table_offset.to_be_bytes());
    for s in classes {
        put_string(&mut buf, s);
    }
    for s in methods {
        put_string(&mut buf, s);
    }
    for s in files {
        put_string(&mut buf, s);
    }
    buf
}

/// Build a dump with the standard fixed-field lengths.
pub fn build_dump(
    entries: &[DumpEntry],
    classes: &[&str],
    methods: &[&str],
    files: &[&str],
) -> Vec<u8> {
    build_dump_with_lens(
        entries,
        classes,
        methods,
        files,
        MESSAGE_HEADER_LEN,
        ENTRY_HEADER_LEN,
        STACK_FRAME_LEN,
    )
}

/// A small dump with three allocations across two classes and two threads.
///
/// Decodes to (most recent first):
/// - #3: java.lang.String, 100 bytes, thread 1,
///   [Main.allocate(Main.java:10), Main.run(Main.java:50)]
/// - #2: byte[], 4096 bytes, thread 2,
///   [Buffer.grow(Buffer.java:30), Main.run(Main.java:50)]
/// - #1: java.lang.String, 50 bytes, thread 1, [Main.allocate(Main.java:10)]
pub fn sample_dump() -> Vec<u8> {
    build_dump(
        &[
            DumpEntry::new(100, 1, 0).frame(2, 0, 0, 10).frame(2, 1, 0, 50),
            DumpEntry::new(4096, 2, 1).frame(3, 2, 1, 30).frame(2, 1, 0, 50),
            DumpEntry::new(50, 1, 0).frame(2, 0, 0, 10),
        ],
        &[
            "Ljava/lang/String;",
            "[B",
            "Lcom/example/app/Main;",
            "Lcom/example/io/Buffer;",
        ],
        &["allocate", "run", "grow"],
        &["Main.java", "Buffer.java"],
    )
}
