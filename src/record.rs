//! Allocation records and stack frames decoded from a tracker dump.
//!
//! These are the immutable units the whole pipeline operates on: the decoder
//! produces them, trace transforms build replacements, and the query engine
//! reads them through the column adapter in `table`.

use std::fmt;

/// Source line information carried by a stack frame.
///
/// The tracker emits a signed 16-bit line number where negative values are
/// sentinels: -2 marks a native method, -1 (and any other negative) means no
/// source line was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineNumber {
    /// A real line number (the tracker clips these to 32767).
    Known(u16),
    /// No line information was recorded.
    NoSource,
    /// Native method; file and line do not apply.
    Native,
}

impl LineNumber {
    /// Decode the wire sentinel encoding.
    pub fn from_wire(raw: i16) -> Self {
        if raw >= 0 {
            LineNumber::Known(raw as u16)
        } else if raw == -2 {
            LineNumber::Native
        } else {
            LineNumber::NoSource
        }
    }
}

/// One entry of a captured call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Declaring class in dotted form (e.g. `android.os.Debug`).
    pub class_name: String,
    /// Method name.
    pub method_name: String,
    /// Source file, when the tracker recorded one.
    pub source_file: Option<String>,
    pub line: LineNumber,
}

impl StackFrame {
    /// `class.method`, the form the `site*` frame predicates match against.
    pub fn site(&self) -> String {
        format!("{}.{}", self.class_name, self.method_name)
    }
}

impl fmt::Display for StackFrame {
    /// Renders like a JVM stack-trace line: `class.method(File.java:42)`,
    /// degrading to `(Native Method)`, `(File.java)` or `(Unknown Source)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class_name, self.method_name)?;
        match (&self.source_file, self.line) {
            (_, LineNumber::Native) => write!(f, "(Native Method)"),
            (Some(file), LineNumber::Known(line)) => write!(f, "({}:{})", file, line),
            (Some(file), LineNumber::NoSource) => write!(f, "({})", file),
            (None, _) => write!(f, "(Unknown Source)"),
        }
    }
}

/// One logged object-allocation event.
///
/// `stack_trace` is ordered innermost-first: index 0 is the allocation call
/// site. Records are never edited in place; transform stages that change a
/// trace construct a fresh record via [`AllocationRecord::with_trace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationRecord {
    /// Reverse allocation order as emitted by the tracker; 1 = most recent.
    pub sequence_id: u32,
    /// Allocated class in dotted form.
    pub allocated_class: String,
    /// Total allocation size in bytes.
    pub size_bytes: u32,
    /// Owning thread. The wire carries an unsigned 16-bit value but the
    /// tracker's ids are signed, so the bits are reinterpreted.
    pub thread_id: i16,
    pub stack_trace: Vec<StackFrame>,
}

impl AllocationRecord {
    /// The frame that performed the allocation (innermost), if any.
    pub fn allocator(&self) -> Option<&StackFrame> {
        self.stack_trace.first()
    }

    /// Copy of this record with a replacement stack trace.
    pub fn with_trace(&self, trace: Vec<StackFrame>) -> Self {
        AllocationRecord {
            sequence_id: self.sequence_id,
            allocated_class: self.allocated_class.clone(),
            size_bytes: self.size_bytes,
            thread_id: self.thread_id,
            stack_trace: trace,
        }
    }

    /// Canonical string form of the whole trace: `[frame1, frame2]`.
    ///
    /// This is what the `stackTrace` column exposes to filters, sorts and
    /// grouping, so its shape is part of the query surface.
    pub fn trace_string(&self) -> String {
        let mut out = String::from("[");
        for (i, frame) in self.stack_trace.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&frame.to_string());
        }
        out.push(']');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(class: &str, method: &str, file: Option<&str>, line: LineNumber) -> StackFrame {
        StackFrame {
            class_name: class.to_string(),
            method_name: method.to_string(),
            source_file: file.map(|f| f.to_string()),
            line,
        }
    }

    #[test]
    fn test_line_number_from_wire() {
        assert_eq!(LineNumber::from_wire(0), LineNumber::Known(0));
        assert_eq!(LineNumber::from_wire(42), LineNumber::Known(42));
        assert_eq!(LineNumber::from_wire(32767), LineNumber::Known(32767));
        assert_eq!(LineNumber::from_wire(-1), LineNumber::NoSource);
        assert_eq!(LineNumber::from_wire(-2), LineNumber::Native);
        assert_eq!(LineNumber::from_wire(-3), LineNumber::NoSource);
    }

    #[test]
    fn test_frame_display_with_file_and_line() {
        let f = frame("android.os.Debug", "startAllocCounting", Some("Debug.java"),
            LineNumber::Known(100));
        assert_eq!(f.to_string(), "android.os.Debug.startAllocCounting(Debug.java:100)");
    }

    #[test]
    fn test_frame_display_native() {
        let f = frame("java.lang.Object", "wait", Some("Object.java"), LineNumber::Native);
        assert_eq!(f.to_string(), "java.lang.Object.wait(Native Method)");
    }

    #[test]
    fn test_frame_display_file_without_line() {
        let f = frame("a.B", "run", Some("B.java"), LineNumber::NoSource);
        assert_eq!(f.to_string(), "a.B.run(B.java)");
    }

    #[test]
    fn test_frame_display_unknown_source() {
        let f = frame("a.B", "run", None, LineNumber::NoSource);
        assert_eq!(f.to_string(), "a.B.run(Unknown Source)");
        // A line with no file still counts as unknown source.
        let g = frame("a.B", "run", None, LineNumber::Known(7));
        assert_eq!(g.to_string(), "a.B.run(Unknown Source)");
    }

    #[test]
    fn test_site() {
        let f = frame("com.example.Widget", "draw", None, LineNumber::NoSource);
        assert_eq!(f.site(), "com.example.Widget.draw");
    }

    #[test]
    fn test_allocator_empty_and_nonempty() {
        let rec = AllocationRecord {
            sequence_id: 1,
            allocated_class: "byte[]".to_string(),
            size_bytes: 64,
            thread_id: 3,
            stack_trace: vec![],
        };
        assert!(rec.allocator().is_none());

        let rec = rec.with_trace(vec![
            frame("a.A", "alloc", None, LineNumber::NoSource),
            frame("a.B", "outer", None, LineNumber::NoSource),
        ]);
        assert_eq!(rec.allocator().map(|f| f.site()).as_deref(), Some("a.A.alloc"));
    }

    #[test]
    fn test_with_trace_preserves_fields() {
        let rec = AllocationRecord {
            sequence_id: 9,
            allocated_class: "java.lang.String".to_string(),
            size_bytes: 24,
            thread_id: -2,
            stack_trace: vec![frame("a.A", "m", None, LineNumber::NoSource)],
        };
        let replaced = rec.with_trace(vec![]);
        assert_eq!(replaced.sequence_id, 9);
        assert_eq!(replaced.allocated_class, "java.lang.String");
        assert_eq!(replaced.size_bytes, 24);
        assert_eq!(replaced.thread_id, -2);
        assert!(replaced.stack_trace.is_empty());
        // The original is untouched.
        assert_eq!(rec.stack_trace.len(), 1);
    }

    #[test]
    fn test_trace_string_shape() {
        let rec = AllocationRecord {
            sequence_id: 1,
            allocated_class: "c.C".to_string(),
            size_bytes: 1,
            thread_id: 1,
            stack_trace: vec![
                frame("a.A", "m", Some("A.java"), LineNumber::Known(1)),
                frame("b.B", "n", None, LineNumber::NoSource),
            ],
        };
        assert_eq!(rec.trace_string(), "[a.A.m(A.java:1), b.B.n(Unknown Source)]");
    }

    #[test]
    fn test_trace_string_empty() {
        let rec = AllocationRecord {
            sequence_id: 1,
            allocated_class: "c.C".to_string(),
            size_bytes: 1,
            thread_id: 1,
            stack_trace: vec![],
        };
        assert_eq!(rec.trace_string(), "[]");
    }
}
