//! Dbfetch Client
//!
//! Synchronous entry retrieval from the EBI dbfetch service. There is no job
//! here: every call is one `GET`, and the body is the answer.
//!
//! - `{base}/dbfetch.databases?style=json` describes databases, their formats
//!   and the styles each format supports
//! - `{base}/{db}/{ids}/{format}?style={style}` returns entries

use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::types::{AppError, AppResult};
use crate::utils::http::{build_client, check_response};

pub const DEFAULT_FORMAT: &str = "default";
pub const DEFAULT_STYLE: &str = "raw";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseInfo {
    pub name: String,
    #[serde(default)]
    pub alias_list: Vec<String>,
    #[serde(default)]
    pub format_info_list: Vec<FormatInfo>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormatInfo {
    pub name: String,
    #[serde(default)]
    pub alias_list: Vec<String>,
    #[serde(default)]
    pub style_info_list: Vec<StyleInfo>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StyleInfo {
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

fn matches_name(wanted: &str, name: &str, aliases: &[String]) -> bool {
    name.eq_ignore_ascii_case(wanted) || aliases.iter().any(|a| a.eq_ignore_ascii_case(wanted))
}

impl DatabaseInfo {
    pub fn matches(&self, db: &str) -> bool {
        matches_name(db, &self.name, &self.alias_list)
    }

    pub fn format(&self, format: &str) -> Option<&FormatInfo> {
        self.format_info_list
            .iter()
            .find(|f| matches_name(format, &f.name, &f.alias_list))
    }

    pub fn format_names(&self) -> Vec<String> {
        self.format_info_list.iter().map(|f| f.name.clone()).collect()
    }
}

impl FormatInfo {
    pub fn style_names(&self) -> Vec<String> {
        self.style_info_list.iter().map(|s| s.name.clone()).collect()
    }
}

pub struct DbfetchClient {
    client: Client,
    base_url: String,
}

impl DbfetchClient {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: build_client("dbfetch", timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_text(&self, url: &str) -> AppResult<String> {
        debug!(url = %url, "GET");
        let response = check_response(self.client.get(url).send().await?).await?;
        Ok(response.text().await?)
    }

    /// All databases, sorted by key.
    pub async fn database_info(&self) -> AppResult<Vec<DatabaseInfo>> {
        let url = format!("{}/dbfetch.databases?style=json", self.base_url);
        let body = self.get_text(&url).await?;
        let doc: BTreeMap<String, DatabaseInfo> = serde_json::from_str(&body)?;
        Ok(doc.into_values().collect())
    }

    pub async fn supported_dbs(&self) -> AppResult<Vec<String>> {
        Ok(self
            .database_info()
            .await?
            .into_iter()
            .map(|db| db.name)
            .collect())
    }

    /// `name\tformat1,format2` per database.
    pub async fn supported_formats(&self) -> AppResult<Vec<String>> {
        Ok(self
            .database_info()
            .await?
            .iter()
            .map(|db| format!("{}\t{}", db.name, db.format_names().join(",")))
            .collect())
    }

    /// `name\tformat\tstyle1,style2` per database format.
    pub async fn supported_styles(&self) -> AppResult<Vec<String>> {
        let mut lines = Vec::new();
        for db in self.database_info().await? {
            for format in &db.format_info_list {
                lines.push(format!(
                    "{}\t{}\t{}",
                    db.name,
                    format.name,
                    format.style_names().join(",")
                ));
            }
        }
        Ok(lines)
    }

    /// Format names of one database; empty when the database is unknown.
    pub async fn db_formats(&self, db: &str) -> AppResult<Vec<String>> {
        Ok(self
            .database_info()
            .await?
            .iter()
            .find(|info| info.matches(db))
            .map(DatabaseInfo::format_names)
            .unwrap_or_default())
    }

    /// Style names of one database format; empty when either is unknown.
    pub async fn format_styles(&self, db: &str, format: &str) -> AppResult<Vec<String>> {
        Ok(self
            .database_info()
            .await?
            .iter()
            .find(|info| info.matches(db))
            .and_then(|info| info.format(format))
            .map(FormatInfo::style_names)
            .unwrap_or_default())
    }

    /// Fetch one `DB:ID` entry, or with `@path` every `DB:ID` listed in the
    /// file, concatenated in file order.
    pub async fn fetch_data(&self, query: &str, format: &str, style: &str) -> AppResult<String> {
        match query.strip_prefix('@') {
            Some(path) => {
                let list = read_id_file(Path::new(path)).await?;
                let mut out = String::new();
                for line in list.lines().map(str::trim).filter(|l| !l.is_empty()) {
                    out.push_str(&self.fetch_one(line, format, style).await?);
                }
                Ok(out)
            }
            None => self.fetch_one(query, format, style).await,
        }
    }

    async fn fetch_one(&self, query: &str, format: &str, style: &str) -> AppResult<String> {
        let url = format!(
            "{}/{}/{}?style={}",
            self.base_url,
            query.replace(':', "/"),
            format,
            style
        );
        let body = self.get_text(&url).await?;
        info!(query = %query, bytes = body.len(), "Fetched entry");
        Ok(body)
    }

    /// Fetch several entries of one database; `ids` is comma separated.
    pub async fn fetch_batch(
        &self,
        db: &str,
        ids: &str,
        format: &str,
        style: &str,
    ) -> AppResult<String> {
        if ids.trim().is_empty() {
            return Err(AppError::MissingArgument("ids"));
        }
        let url = format!("{}/{}/{}/{}?style={}", self.base_url, db, ids, format, style);
        self.get_text(&url).await
    }
}

async fn read_id_file(path: &Path) -> AppResult<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::Io(std::io::Error::new(
            e.kind(),
            format!("unable to open file {}: {}", path.display(), e),
        ))
    })
}
