use super::vars;
use crate::core::{CorpusError, Encoding, Result};
use crate::document::DocumentFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_DRIVER: &str = "sqlite";
pub const DEFAULT_URL: &str = "sqlite:${dbdirectory}/corpus.db";
pub const DEFAULT_SELECT_SQL: &str = "SELECT ${documentNameField} FROM ${tableName}";

/// Open parameters for a collection mirroring one column of a database table.
///
/// The connection URL, user and password may contain `${dbdirectory}` and
/// `$env{NAME}` placeholders which are expanded right before connecting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Driver identifier (only `sqlite` is available)
    pub driver: String,

    /// Connection URL: `sqlite:<path>` or `sqlite::memory:`
    pub url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Replacement for `${dbdirectory}`; the working directory when unset
    #[serde(default)]
    pub db_directory: Option<PathBuf>,

    pub table_name: String,

    /// Unique column holding document names
    pub name_column: String,

    /// Column holding serialized document content
    pub content_column: String,

    /// Mime type of the content column; empty means the native JSON format
    #[serde(default)]
    pub mime_type: String,

    #[serde(default)]
    pub encoding: Encoding,

    /// Store content gzip-compressed
    #[serde(default)]
    pub compression: bool,

    /// Enumeration query; `${tableName}` and `${documentNameField}` are
    /// replaced literally
    pub select_sql: String,

    #[serde(default)]
    pub read_only: bool,
}

impl DatabaseConfig {
    /// Create a new database configuration
    pub fn new(url: &str, table_name: &str, name_column: &str, content_column: &str) -> Self {
        Self {
            driver: DEFAULT_DRIVER.to_string(),
            url: url.to_string(),
            username: String::new(),
            password: String::new(),
            db_directory: None,
            table_name: table_name.to_string(),
            name_column: name_column.to_string(),
            content_column: content_column.to_string(),
            mime_type: String::new(),
            encoding: Encoding::Utf8,
            compression: false,
            select_sql: DEFAULT_SELECT_SQL.to_string(),
            read_only: false,
        }
    }

    /// Set the driver
    pub fn driver(mut self, driver: &str) -> Self {
        self.driver = driver.to_string();
        self
    }

    /// Set the user and password
    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }

    /// Set the directory substituted for `${dbdirectory}`
    pub fn db_directory<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.db_directory = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set the mime type of the content column
    pub fn mime_type(mut self, mime_type: &str) -> Self {
        self.mime_type = mime_type.to_string();
        self
    }

    /// Set the text encoding
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set gzip compression of stored content
    pub fn compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }

    /// Set the enumeration query template
    pub fn select_sql(mut self, sql: &str) -> Self {
        self.select_sql = sql.to_string();
        self
    }

    /// Set read-only mode
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn format(&self) -> Result<DocumentFormat> {
        DocumentFormat::from_mime(&self.mime_type)
    }

    /// Named substitutions available to the URL and credentials.
    pub fn variables(&self) -> Result<HashMap<String, String>> {
        let dir = match &self.db_directory {
            Some(dir) => dir.clone(),
            None => PathBuf::from("."),
        };
        let dir = std::path::absolute(&dir).map_err(|e| {
            CorpusError::Configuration(format!(
                "cannot resolve database directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
        Ok(HashMap::from([(
            "dbdirectory".to_string(),
            dir.to_string_lossy().into_owned(),
        )]))
    }

    pub fn expanded_url(&self) -> Result<String> {
        vars::expand(&self.url, &self.variables()?)
    }

    pub fn expanded_credentials(&self) -> Result<(String, String)> {
        let vars = self.variables()?;
        Ok((
            vars::expand(&self.username, &vars)?,
            vars::expand(&self.password, &vars)?,
        ))
    }

    /// Expanded URL for log output, with the password masked
    pub fn redacted_url(&self) -> Result<String> {
        let url = self.expanded_url()?;
        if self.password.is_empty() {
            return Ok(url);
        }
        let (username, _) = self.expanded_credentials()?;
        Ok(format!("{} (user '{}', password ***)", url, username))
    }

    pub fn enumeration_query(&self) -> String {
        vars::substitute_literal(
            &self.select_sql,
            &[
                ("tableName", self.table_name.as_str()),
                ("documentNameField", self.name_column.as_str()),
            ],
        )
    }

    pub fn fetch_sql(&self) -> String {
        format!(
            "SELECT {} FROM {} WHERE {} = ?",
            self.content_column, self.table_name, self.name_column
        )
    }

    pub fn update_sql(&self) -> String {
        format!(
            "UPDATE {} SET {} = ? WHERE {} = ?",
            self.table_name, self.content_column, self.name_column
        )
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("table_name", &self.table_name),
            ("name_column", &self.name_column),
            ("content_column", &self.content_column),
            ("select_sql", &self.select_sql),
            ("url", &self.url),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CorpusError::Configuration(format!("{} must not be empty", field)));
            }
        }

        for placeholder in ["${tableName}", "${documentNameField}"] {
            if !self.select_sql.contains(placeholder) {
                return Err(CorpusError::Configuration(format!(
                    "select_sql must contain {}",
                    placeholder
                )));
            }
        }

        if !self.driver.eq_ignore_ascii_case(DEFAULT_DRIVER) {
            return Err(CorpusError::Configuration(format!(
                "unsupported driver '{}'",
                self.driver
            )));
        }

        self.format()?;
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL, "documents", "name", "content")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DatabaseConfig::default();
        assert_eq!(config.driver, "sqlite");
        assert_eq!(config.select_sql, DEFAULT_SELECT_SQL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generated_sql() {
        let config = DatabaseConfig::new("sqlite::memory:", "docs", "id", "body");
        assert_eq!(config.enumeration_query(), "SELECT id FROM docs");
        assert_eq!(config.fetch_sql(), "SELECT body FROM docs WHERE id = ?");
        assert_eq!(config.update_sql(), "UPDATE docs SET body = ? WHERE id = ?");
    }

    #[test]
    fn test_custom_select() {
        let config = DatabaseConfig::new("sqlite::memory:", "docs", "id", "body")
            .select_sql("SELECT ${documentNameField} FROM ${tableName} ORDER BY ${documentNameField} DESC");
        assert_eq!(config.enumeration_query(), "SELECT id FROM docs ORDER BY id DESC");
    }

    #[test]
    fn test_expanded_url() {
        let config = DatabaseConfig::new("sqlite:${dbdirectory}/c.db", "t", "n", "c")
            .db_directory("/var/lib/corpus");
        assert_eq!(config.expanded_url().unwrap(), "sqlite:/var/lib/corpus/c.db");
    }

    #[test]
    fn test_validate_empty_fields() {
        let base = DatabaseConfig::new("sqlite::memory:", "docs", "id", "body");
        assert!(base.validate().is_ok());

        let mut no_table = base.clone();
        no_table.table_name.clear();
        assert!(matches!(no_table.validate(), Err(CorpusError::Configuration(_))));

        let mut no_name = base.clone();
        no_name.name_column = "  ".into();
        assert!(no_name.validate().is_err());

        let mut no_content = base.clone();
        no_content.content_column.clear();
        assert!(no_content.validate().is_err());

        assert!(base.clone().select_sql("").validate().is_err());
        assert!(matches!(
            base.clone().select_sql("SELECT id FROM ${tableName}").validate(),
            Err(CorpusError::Configuration(_))
        ));
        assert!(matches!(
            base.clone().select_sql("SELECT ${documentNameField} FROM docs").validate(),
            Err(CorpusError::Configuration(_))
        ));
        assert!(base.clone().driver("mysql").validate().is_err());
        assert!(base.mime_type("text/html").validate().is_err());
    }

    #[test]
    fn test_redacted_url_hides_password() {
        let config = DatabaseConfig::default().credentials("alice", "secret123");
        let url = config.redacted_url().unwrap();
        assert!(!url.contains("secret123"));
        assert!(!url.contains("${dbdirectory}"));
        assert!(url.contains("alice"));
        assert!(url.contains("***"));
    }
}
