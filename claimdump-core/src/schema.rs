//! Marker configuration describing how a dump lays out its tables.
//!
//! Dump layouts have drifted over time: older exports open each section with
//! a sentinel such as `NODES:|` followed by a header line, while newer ones
//! open a section with the header line itself. Neither layout is baked into
//! the engine; callers inject a [`DumpSchema`] instead.

use std::{collections::HashSet, fmt};

use crate::SchemaError;

/// Name of a relational table targeted by a dump section.
///
/// # Examples
/// ```
/// use claimdump_core::TableName;
///
/// let table = TableName::from("Node");
/// assert_eq!(table.as_str(), "Node");
/// assert_eq!(table.to_string(), "Node");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct TableName(String);

impl TableName {
    /// Wrap a table name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the table name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TableName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TableName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the column header for a table section comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum HeaderSpec {
    /// The first line after the marker names the columns.
    NextLine {
        /// Header text the dump must carry, if it is known in advance.
        #[cfg_attr(feature = "serde", serde(default))]
        expected: Option<String>,
    },
    /// The marker line is itself the pipe-delimited header.
    Inline,
}

impl Default for HeaderSpec {
    fn default() -> Self {
        Self::NextLine { expected: None }
    }
}

/// A sentinel line that activates a table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableMarker {
    /// Exact line text that opens the section.
    pub marker: String,
    /// Table receiving the section's records.
    pub table: TableName,
    /// How the section's header is obtained.
    #[cfg_attr(feature = "serde", serde(default))]
    pub header: HeaderSpec,
}

impl TableMarker {
    /// A marker whose header is the following line.
    pub fn new(marker: impl Into<String>, table: impl Into<TableName>) -> Self {
        Self {
            marker: marker.into(),
            table: table.into(),
            header: HeaderSpec::default(),
        }
    }

    /// A marker that doubles as the section header.
    pub fn inline(header: impl Into<String>, table: impl Into<TableName>) -> Self {
        Self {
            marker: header.into(),
            table: table.into(),
            header: HeaderSpec::Inline,
        }
    }

    /// Require the line following the marker to equal `header`.
    #[must_use]
    pub fn with_expected_header(mut self, header: impl Into<String>) -> Self {
        self.header = HeaderSpec::NextLine {
            expected: Some(header.into()),
        };
        self
    }
}

/// Ordered set of table markers, matched by exact line equality.
///
/// # Examples
/// ```
/// use claimdump_core::{DumpSchema, TableMarker};
///
/// let schema = DumpSchema::new([
///     TableMarker::new("NODES:|", "Node"),
///     TableMarker::new("EDGES:|", "Edge"),
/// ])?;
/// assert_eq!(schema.lookup("NODES:|").map(|m| m.table.as_str()), Some("Node"));
/// assert!(schema.lookup("NODES:| ").is_none());
/// # Ok::<(), claimdump_core::SchemaError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawSchema", into = "RawSchema")
)]
pub struct DumpSchema {
    markers: Vec<TableMarker>,
}

impl DumpSchema {
    /// Validate and build a schema.
    ///
    /// Marker text is trimmed, because dump lines are trimmed before they are
    /// compared. Blank and repeated markers are rejected.
    pub fn new<I>(markers: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = TableMarker>,
    {
        let mut seen = HashSet::new();
        let mut validated = Vec::new();
        for mut marker in markers {
            let trimmed = marker.marker.trim();
            if trimmed.is_empty() {
                return Err(SchemaError::EmptyMarker {
                    table: marker.table,
                });
            }
            if trimmed.len() != marker.marker.len() {
                marker.marker = trimmed.to_owned();
            }
            if !seen.insert(marker.marker.clone()) {
                return Err(SchemaError::DuplicateMarker {
                    marker: marker.marker,
                });
            }
            validated.push(marker);
        }
        if validated.is_empty() {
            return Err(SchemaError::Empty);
        }
        Ok(Self { markers: validated })
    }

    /// Section-sentinel layout: `NODES:|`, `EDGES:|` and `CLAIMS:|`, each
    /// followed by a header line.
    #[must_use]
    pub fn section_markers() -> Self {
        Self {
            markers: vec![
                TableMarker::new("NODES:|", "Node"),
                TableMarker::new("EDGES:|", "Edge"),
                TableMarker::new("CLAIMS:|", "Claim"),
            ],
        }
    }

    /// Header-sentinel layout, where each table's header line opens its
    /// section.
    #[must_use]
    pub fn header_markers() -> Self {
        Self {
            markers: vec![
                TableMarker::inline("id|nodeUri|name|entType|descrip", "Node"),
                TableMarker::inline("id|startNodeId|endNodeId|label|claimId", "Edge"),
                TableMarker::inline("id|subject|claim|object|statement", "Claim"),
            ],
        }
    }

    /// Find the marker whose text equals `line` exactly.
    #[must_use]
    pub fn lookup(&self, line: &str) -> Option<&TableMarker> {
        self.markers.iter().find(|marker| marker.marker == line)
    }

    /// Registered markers in declaration order.
    #[must_use]
    pub fn markers(&self) -> &[TableMarker] {
        &self.markers
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawSchema {
    markers: Vec<TableMarker>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawSchema> for DumpSchema {
    type Error = SchemaError;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        Self::new(raw.markers)
    }
}

#[cfg(feature = "serde")]
impl From<DumpSchema> for RawSchema {
    fn from(schema: DumpSchema) -> Self {
        Self {
            markers: schema.markers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn rejects_empty_schema() {
        assert_eq!(
            DumpSchema::new(Vec::<TableMarker>::new()),
            Err(SchemaError::Empty)
        );
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn rejects_blank_markers(#[case] marker: &str) {
        let err = DumpSchema::new([TableMarker::new(marker, "Node")])
            .expect_err("blank marker should be rejected");
        assert_eq!(
            err,
            SchemaError::EmptyMarker {
                table: TableName::from("Node")
            }
        );
    }

    #[rstest]
    fn rejects_duplicate_markers_after_trimming() {
        let err = DumpSchema::new([
            TableMarker::new("NODES:|", "Node"),
            TableMarker::new(" NODES:| ", "Edge"),
        ])
        .expect_err("duplicate marker should be rejected");
        assert_eq!(
            err,
            SchemaError::DuplicateMarker {
                marker: "NODES:|".into()
            }
        );
    }

    #[rstest]
    fn lookup_uses_exact_equality() {
        let schema = DumpSchema::section_markers();
        assert!(schema.lookup("NODES:|").is_some());
        assert!(schema.lookup("NODES:|x").is_none());
        assert!(schema.lookup("1|NODES:|").is_none());
        assert!(schema.lookup("nodes:|").is_none());
    }

    #[rstest]
    fn presets_cover_three_tables() {
        for schema in [DumpSchema::section_markers(), DumpSchema::header_markers()] {
            let tables: Vec<&str> = schema
                .markers()
                .iter()
                .map(|marker| marker.table.as_str())
                .collect();
            assert_eq!(tables, ["Node", "Edge", "Claim"]);
        }
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn deserialises_and_validates_json() {
        let json = r#"{
            "markers": [
                {"marker": "NODES:|", "table": "Node",
                 "header": {"kind": "next_line", "expected": "id|name"}},
                {"marker": "id|label", "table": "Edge", "header": {"kind": "inline"}},
                {"marker": "CLAIMS:|", "table": "Claim"}
            ]
        }"#;
        let schema: DumpSchema = serde_json::from_str(json).expect("schema should parse");
        let markers = schema.markers();
        assert_eq!(markers.len(), 3);
        assert_eq!(
            markers.first().map(|m| m.header.clone()),
            Some(HeaderSpec::NextLine {
                expected: Some("id|name".into())
            })
        );
        assert_eq!(markers.get(1).map(|m| m.header.clone()), Some(HeaderSpec::Inline));
        assert_eq!(markers.get(2).map(|m| m.header.clone()), Some(HeaderSpec::default()));

        let duplicate = r#"{"markers": [
            {"marker": "A", "table": "One"},
            {"marker": "A", "table": "Two"}
        ]}"#;
        assert!(serde_json::from_str::<DumpSchema>(duplicate).is_err());
    }
}
