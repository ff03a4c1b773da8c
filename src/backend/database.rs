use super::{Backend, Capabilities};
use crate::config::DatabaseConfig;
use crate::core::{CorpusError, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::{debug, info, warn};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, OpenFlags, params};
use std::io::{Read, Write};

const MEMORY_URL: &str = ":memory:";

/// One row per document in a database table.
///
/// The connection is opened once and held until [`Backend::close`]. Exactly
/// two statements are prepared at open, fetch-by-name and update-by-name,
/// and live in the connection's statement cache for the backend's lifetime.
/// Rows are never inserted or deleted.
pub struct DatabaseBackend {
    conn: Option<Connection>,
    table_name: String,
    name_column: String,
    enumeration_sql: String,
    fetch_sql: String,
    update_sql: String,
    compression: bool,
    read_only: bool,
}

impl DatabaseBackend {
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        config.validate()?;

        let url = config.expanded_url()?;
        let (username, _password) = config.expanded_credentials()?;
        if !username.is_empty() {
            debug!("Driver '{}' ignores credentials for user '{}'", config.driver, username);
        }
        info!("Using database URL: {}", config.redacted_url()?);
        let conn = connect(&url, config.read_only)?;

        let backend = Self {
            conn: Some(conn),
            table_name: config.table_name.clone(),
            name_column: config.name_column.clone(),
            enumeration_sql: config.enumeration_query(),
            fetch_sql: config.fetch_sql(),
            update_sql: config.update_sql(),
            compression: config.compression,
            read_only: config.read_only,
        };
        backend.prepare_statements()?;
        Ok(backend)
    }

    fn prepare_statements(&self) -> Result<()> {
        let conn = self.connection()?;
        for sql in [&self.fetch_sql, &self.update_sql] {
            debug!("Preparing statement: {}", sql);
            conn.prepare_cached(sql).map_err(|e| {
                CorpusError::Configuration(format!("could not prepare '{}': {}", sql, e))
            })?;
        }
        Ok(())
    }

    fn connection(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| CorpusError::Connection(format!("connection to '{}' is closed", self.table_name)))
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn decode_content(&self, raw: ValueRef<'_>, name: &str) -> Result<Vec<u8>> {
        let bytes = match raw {
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => bytes.to_vec(),
            ValueRef::Null => {
                return Err(CorpusError::Codec(format!("content of '{}' is NULL", name)));
            }
            other => {
                return Err(CorpusError::Codec(format!(
                    "content of '{}' has non-text type {:?}",
                    name,
                    other.data_type()
                )));
            }
        };
        if !self.compression {
            return Ok(bytes);
        }
        let mut inflated = Vec::new();
        GzDecoder::new(bytes.as_slice())
            .read_to_end(&mut inflated)
            .map_err(|e| CorpusError::Codec(format!("gunzip content of '{}': {}", name, e)))?;
        Ok(inflated)
    }

    fn encode_content(&self, content: &[u8]) -> Result<Value> {
        if self.compression {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(content)?;
            return Ok(Value::Blob(encoder.finish()?));
        }
        // Text when the bytes allow it so the column stays readable by other tools
        Ok(match String::from_utf8(content.to_vec()) {
            Ok(text) => Value::Text(text),
            Err(e) => Value::Blob(e.into_bytes()),
        })
    }
}

impl Backend for DatabaseBackend {
    fn kind(&self) -> &'static str {
        "database"
    }

    fn list_names(&mut self) -> Result<Vec<String>> {
        let conn = self.connection()?;
        debug!("Enumerating documents: {}", self.enumeration_sql);
        let mut stmt = conn.prepare(&self.enumeration_sql).map_err(|e| {
            CorpusError::Configuration(format!(
                "could not run enumeration query '{}': {}",
                self.enumeration_sql, e
            ))
        })?;
        let column = stmt.column_index(&self.name_column).map_err(|e| {
            CorpusError::Configuration(format!(
                "enumeration query does not return column '{}': {}",
                self.name_column, e
            ))
        })?;

        let mut rows = stmt.query([])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            let name = match row.get_ref(column)? {
                ValueRef::Text(text) => String::from_utf8_lossy(text).into_owned(),
                ValueRef::Integer(id) => id.to_string(),
                other => {
                    return Err(CorpusError::Codec(format!(
                        "document name of type {:?} in column '{}'",
                        other.data_type(),
                        self.name_column
                    )));
                }
            };
            names.push(name);
        }
        Ok(names)
    }

    fn fetch(&mut self, name: &str) -> Result<Vec<u8>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare_cached(&self.fetch_sql)?;
        let mut rows = stmt.query(params![name])?;

        let content = match rows.next()? {
            Some(row) => self.decode_content(row.get_ref(0)?, name)?,
            None => return Err(CorpusError::NotFound(name.to_string())),
        };

        let mut matches = 1;
        while rows.next()?.is_some() {
            matches += 1;
        }
        if matches > 1 {
            return Err(CorpusError::Ambiguous {
                name: name.to_string(),
                matches,
            });
        }
        Ok(content)
    }

    fn persist(&mut self, name: &str, content: &[u8]) -> Result<()> {
        if self.read_only {
            return Ok(());
        }
        let value = self.encode_content(content)?;
        let conn = self.connection()?;
        let mut stmt = conn.prepare_cached(&self.update_sql)?;
        match stmt.execute(params![value, name])? {
            0 => Err(CorpusError::NotFound(name.to_string())),
            1 => {
                debug!("Updated row '{}' in {}", name, self.table_name);
                Ok(())
            }
            matches => Err(CorpusError::Ambiguous {
                name: name.to_string(),
                matches,
            }),
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            insert: false,
            delete: false,
            update: !self.read_only,
        }
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            conn.flush_prepared_statement_cache();
            if let Err((_, e)) = conn.close() {
                warn!("Ignoring error while closing connection for '{}': {}", self.table_name, e);
            }
        }
    }
}

impl Drop for DatabaseBackend {
    fn drop(&mut self) {
        self.close();
    }
}

/// Open `sqlite:<path>` or `sqlite::memory:`.
fn connect(url: &str, read_only: bool) -> Result<Connection> {
    let target = url.strip_prefix("sqlite:").ok_or_else(|| {
        CorpusError::Configuration(format!("URL '{}' does not start with 'sqlite:'", url))
    })?;
    let target = target.strip_prefix("//").unwrap_or(target);
    if target.is_empty() {
        return Err(CorpusError::Configuration(format!("URL '{}' names no database", url)));
    }

    let access = if read_only {
        OpenFlags::SQLITE_OPEN_READ_ONLY
    } else {
        OpenFlags::SQLITE_OPEN_READ_WRITE
    };
    let flags = access | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;

    let opened = if target == MEMORY_URL {
        Connection::open_in_memory()
    } else {
        Connection::open_with_flags(target, flags)
    };
    opened.map_err(|e| CorpusError::Connection(format!("could not connect to '{}': {}", url, e)))
}
