//! JSON output format for query results.

use crate::query::QueryOutput;
use crate::record::{AllocationRecord, LineNumber, StackFrame};
use crate::table::Value;
use serde::{Deserialize, Serialize};

/// One stack frame of an allocation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonFrame {
    /// Declaring class in dotted form
    pub class: String,
    /// Method name
    pub method: String,
    /// Source file (omitted for native frames and unknown sources)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Source line (omitted when the tracker recorded none)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u16>,
    /// Whether this is a native method frame
    pub native: bool,
}

impl JsonFrame {
    fn from_frame(frame: &StackFrame) -> Self {
        match frame.line {
            LineNumber::Native => JsonFrame {
                class: frame.class_name.clone(),
                method: frame.method_name.clone(),
                file: None,
                line: None,
                native: true,
            },
            LineNumber::Known(line) => JsonFrame {
                class: frame.class_name.clone(),
                method: frame.method_name.clone(),
                file: frame.source_file.clone(),
                line: Some(line),
                native: false,
            },
            LineNumber::NoSource => JsonFrame {
                class: frame.class_name.clone(),
                method: frame.method_name.clone(),
                file: frame.source_file.clone(),
                line: None,
                native: false,
            },
        }
    }
}

/// A single allocation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonAlloc {
    /// Reverse allocation order; 1 = most recent
    pub id: u32,
    /// Allocated class in dotted form
    pub allocated_class: String,
    /// Allocation size in bytes
    pub size: u32,
    /// Owning thread id
    pub thread: i16,
    /// Call stack, innermost frame first
    pub stack_trace: Vec<JsonFrame>,
}

impl JsonAlloc {
    fn from_record(record: &AllocationRecord) -> Self {
        JsonAlloc {
            id: record.sequence_id,
            allocated_class: record.allocated_class.clone(),
            size: record.size_bytes,
            thread: record.thread_id,
            stack_trace: record.stack_trace.iter().map(JsonFrame::from_frame).collect(),
        }
    }
}

/// Group key, typed like the source grouping column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonGroupKey {
    Int(i64),
    Text(String),
}

/// One group produced by the aggregate stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonGroup {
    pub group: JsonGroupKey,
    pub weight: i64,
}

/// Summary statistics for the result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    /// Number of rows in the result
    pub rows: u64,
    /// Sum of allocation sizes (allocation results only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_size_bytes: Option<u64>,
}

/// Root JSON output structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    /// Allocation rows (absent for grouped results)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<JsonAlloc>>,
    /// Aggregate rows (absent for ungrouped results)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<JsonGroup>>,
    /// Summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the document for a query result.
    pub fn from_query(output: &QueryOutput) -> Self {
        match output {
            QueryOutput::Allocs(rows) => {
                let total: u64 = rows.iter().map(|r| u64::from(r.size_bytes)).sum();
                JsonOutput {
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    format: "desglose-json-v1".to_string(),
                    records: Some(rows.iter().map(JsonAlloc::from_record).collect()),
                    groups: None,
                    summary: JsonSummary {
                        rows: rows.len() as u64,
                        total_size_bytes: Some(total),
                    },
                }
            }
            QueryOutput::Aggregates { rows, .. } => JsonOutput {
                version: env!("CARGO_PKG_VERSION").to_string(),
                format: "desglose-json-v1".to_string(),
                records: None,
                groups: Some(
                    rows.iter()
                        .map(|row| JsonGroup {
                            group: match &row.group {
                                Value::Int(n) => JsonGroupKey::Int(*n),
                                Value::Text(s) => JsonGroupKey::Text(s.clone()),
                            },
                            weight: row.weight,
                        })
                        .collect(),
                ),
                summary: JsonSummary {
                    rows: rows.len() as u64,
                    total_size_bytes: None,
                },
            },
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregateRow;
    use crate::table::ColumnKind;

    fn sample_record() -> AllocationRecord {
        AllocationRecord {
            sequence_id: 1,
            allocated_class: "android.os.Debug".to_string(),
            size_bytes: 100,
            thread_id: 1,
            stack_trace: vec![
                StackFrame {
                    class_name: "android.os.Debug".to_string(),
                    method_name: "startAllocCounting".to_string(),
                    source_file: Some("Debug.java".to_string()),
                    line: LineNumber::Known(42),
                },
                StackFrame {
                    class_name: "java.lang.Object".to_string(),
                    method_name: "wait".to_string(),
                    source_file: Some("Object.java".to_string()),
                    line: LineNumber::Native,
                },
            ],
        }
    }

    #[test]
    fn test_json_output_for_allocs() {
        let output = QueryOutput::Allocs(vec![sample_record()]);
        let doc = JsonOutput::from_query(&output);
        assert_eq!(doc.format, "desglose-json-v1");
        assert_eq!(doc.summary.rows, 1);
        assert_eq!(doc.summary.total_size_bytes, Some(100));
        assert!(doc.groups.is_none());
        let records = doc.records.as_ref().unwrap();
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].stack_trace.len(), 2);
    }

    #[test]
    fn test_json_frame_native_suppresses_file_and_line() {
        let doc = JsonOutput::from_query(&QueryOutput::Allocs(vec![sample_record()]));
        let frames = &doc.records.as_ref().unwrap()[0].stack_trace;
        assert_eq!(frames[0].file.as_deref(), Some("Debug.java"));
        assert_eq!(frames[0].line, Some(42));
        assert!(!frames[0].native);
        assert!(frames[1].native);
        assert!(frames[1].file.is_none());
        assert!(frames[1].line.is_none());
    }

    #[test]
    fn test_json_serialization() {
        let doc = JsonOutput::from_query(&QueryOutput::Allocs(vec![sample_record()]));
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"format\": \"desglose-json-v1\""));
        assert!(json.contains("\"allocated_class\": \"android.os.Debug\""));
        assert!(json.contains("\"line\": 42"));
    }

    #[test]
    fn test_optional_fields_omitted() {
        let frame = JsonFrame {
            class: "a.A".to_string(),
            method: "m".to_string(),
            file: None,
            line: None,
            native: false,
        };
        let json = serde_json::to_string(&frame).unwrap();
        // Optional None fields should be omitted
        assert!(!json.contains("file"));
        assert!(!json.contains("line"));
    }

    #[test]
    fn test_json_output_for_groups() {
        let output = QueryOutput::Aggregates {
            rows: vec![
                AggregateRow {
                    weight: 4096,
                    group: Value::Text("byte[]".to_string()),
                },
                AggregateRow {
                    weight: 3,
                    group: Value::Int(7),
                },
            ],
            group_kind: ColumnKind::Text,
        };
        let doc = JsonOutput::from_query(&output);
        assert!(doc.records.is_none());
        assert_eq!(doc.summary.rows, 2);
        assert!(doc.summary.total_size_bytes.is_none());
        let groups = doc.groups.as_ref().unwrap();
        assert_eq!(groups[0].group, JsonGroupKey::Text("byte[]".to_string()));
        assert_eq!(groups[0].weight, 4096);

        // Typed group keys serialize untagged: text as string, int as number.
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"group\": \"byte[]\""));
        assert!(json.contains("\"group\": 7"));
    }
}
