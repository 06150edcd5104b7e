//! SQLite-backed relational sink.
#![forbid(unsafe_code)]

use camino::Utf8Path;
use claimdump_core::quote_identifier;
use claimdump_fs::ensure_parent_dir;
use rusqlite::{Connection, OptionalExtension, params_from_iter};

use super::{RelationalSink, Row, SinkError, SqlValue};

/// A [`RelationalSink`] writing into a SQLite database.
///
/// Each [`RelationalSink::insert_rows`] call runs in its own transaction, and
/// values are always bound as parameters. Relations that do not exist yet are
/// created with untyped columns.
///
/// # Examples
/// ```
/// use claimdump_data::{RelationalSink, SqlValue, SqliteSink};
///
/// # fn main() -> Result<(), claimdump_data::SinkError> {
/// let mut sink = SqliteSink::in_memory()?;
/// let columns = vec!["id".to_owned(), "name".to_owned()];
/// sink.ensure_relation("Node", &columns)?;
/// sink.insert_rows(
///     "Node",
///     &columns,
///     &[vec![SqlValue::Integer(1), SqlValue::Text("Acme".into())]],
/// )?;
/// let row = sink.fetch_one("Node", "name", &SqlValue::Text("Acme".into()))?;
/// assert_eq!(row, Some(vec![SqlValue::Integer(1), SqlValue::Text("Acme".into())]));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SqliteSink {
    connection: Connection,
}

impl SqliteSink {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open(path: &Utf8Path) -> Result<Self, SinkError> {
        ensure_parent_dir(path).map_err(|source| SinkError::CreateDirectory {
            path: path.to_owned(),
            source,
        })?;
        let connection =
            Connection::open(path.as_std_path()).map_err(|source| SinkError::Open {
                path: path.to_owned(),
                source,
            })?;
        Ok(Self::from_connection(connection))
    }

    /// Open a private in-memory database.
    pub fn in_memory() -> Result<Self, SinkError> {
        let connection = Connection::open_in_memory().map_err(|source| SinkError::Sqlite {
            operation: "open in-memory database",
            source,
        })?;
        Ok(Self::from_connection(connection))
    }

    /// Wrap an existing connection.
    #[must_use]
    pub const fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }

    /// Borrow the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Release the underlying connection.
    #[must_use]
    pub fn into_inner(self) -> Connection {
        self.connection
    }
}

fn column_list(relation: &str, columns: &[String]) -> Result<String, SinkError> {
    if columns.is_empty() {
        return Err(SinkError::NoColumns {
            relation: relation.to_owned(),
        });
    }
    Ok(columns
        .iter()
        .map(|column| quote_identifier(column))
        .collect::<Vec<_>>()
        .join(","))
}

impl RelationalSink for SqliteSink {
    fn ensure_relation(&mut self, relation: &str, columns: &[String]) -> Result<(), SinkError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_identifier(relation),
            column_list(relation, columns)?
        );
        self.connection
            .execute_batch(&sql)
            .map_err(|source| SinkError::Sqlite {
                operation: "create relation",
                source,
            })
    }

    fn insert_rows(
        &mut self,
        relation: &str,
        columns: &[String],
        rows: &[Row],
    ) -> Result<usize, SinkError> {
        let column_sql = column_list(relation, columns)?;
        if rows.is_empty() {
            return Ok(0);
        }
        let placeholders = (1..=columns.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!(
            "INSERT INTO {} ({column_sql}) VALUES ({placeholders})",
            quote_identifier(relation)
        );

        let transaction = self
            .connection
            .transaction()
            .map_err(|source| SinkError::Sqlite {
                operation: "begin insert transaction",
                source,
            })?;
        {
            let mut statement =
                transaction
                    .prepare_cached(&sql)
                    .map_err(|source| SinkError::Sqlite {
                        operation: "prepare insert",
                        source,
                    })?;
            for row in rows {
                if row.len() != columns.len() {
                    return Err(SinkError::ArityMismatch {
                        relation: relation.to_owned(),
                        expected: columns.len(),
                        actual: row.len(),
                    });
                }
                statement
                    .execute(params_from_iter(row.iter()))
                    .map_err(|source| SinkError::Sqlite {
                        operation: "insert row",
                        source,
                    })?;
            }
        }
        transaction.commit().map_err(|source| SinkError::Sqlite {
            operation: "commit insert transaction",
            source,
        })?;
        Ok(rows.len())
    }

    fn fetch_one(
        &self,
        relation: &str,
        column: &str,
        value: &SqlValue,
    ) -> Result<Option<Row>, SinkError> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1 LIMIT 1",
            quote_identifier(relation),
            quote_identifier(column)
        );
        let mut statement = self
            .connection
            .prepare_cached(&sql)
            .map_err(|source| SinkError::Sqlite {
                operation: "prepare lookup",
                source,
            })?;
        let width = statement.column_count();
        statement
            .query_row([value], |row| {
                (0..width)
                    .map(|index| row.get_ref(index).map(SqlValue::from))
                    .collect::<rusqlite::Result<Row>>()
            })
            .optional()
            .map_err(|source| SinkError::Sqlite {
                operation: "look up row",
                source,
            })
    }
}

/// Execute a generated SQL script against `connection`.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use claimdump_data::apply_script;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let connection = Connection::open_in_memory()?;
/// connection.execute_batch(r#"CREATE TABLE "Node" ("id", "name")"#)?;
/// apply_script(
///     &connection,
///     "BEGIN;\nINSERT INTO \"Node\" (\"id\",\"name\") VALUES (1,'Acme');\nCOMMIT;\n",
/// )?;
/// let name: String = connection.query_row(r#"SELECT "name" FROM "Node""#, [], |row| row.get(0))?;
/// assert_eq!(name, "Acme");
/// # Ok(())
/// # }
/// ```
pub fn apply_script(connection: &Connection, script: &str) -> Result<(), SinkError> {
    connection
        .execute_batch(script)
        .map_err(|source| SinkError::Sqlite {
            operation: "apply SQL script",
            source,
        })
}
