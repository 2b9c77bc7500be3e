// `ebiws dbfetch`: database entry retrieval

use clap::{Args, Subcommand};

use crate::config::ClientConfig;
use crate::dbfetch::{DbfetchClient, DEFAULT_FORMAT, DEFAULT_STYLE};

#[derive(Args, Debug)]
pub struct DbfetchArgs {
    /// Dbfetch endpoint
    #[arg(long = "baseUrl", global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub method: DbfetchMethod,
}

#[derive(Subcommand, Debug)]
pub enum DbfetchMethod {
    /// List database names
    #[command(name = "getSupportedDBs")]
    SupportedDbs,
    /// List databases with their formats
    #[command(name = "getSupportedFormats")]
    SupportedFormats,
    /// List databases with their formats and styles
    #[command(name = "getSupportedStyles")]
    SupportedStyles,
    /// List the formats of a database
    #[command(name = "getDbFormats")]
    DbFormats { db: String },
    /// List the styles of a database format
    #[command(name = "getFormatStyles")]
    FormatStyles { db: String, format: String },
    /// Fetch an entry (DB:ID), or every entry listed in @file
    #[command(name = "fetchData")]
    FetchData {
        query: String,
        #[arg(default_value = DEFAULT_FORMAT)]
        format: String,
        #[arg(default_value = DEFAULT_STYLE)]
        style: String,
    },
    /// Fetch comma separated entries of one database
    #[command(name = "fetchBatch")]
    FetchBatch {
        db: String,
        ids: String,
        #[arg(default_value = DEFAULT_FORMAT)]
        format: String,
        #[arg(default_value = DEFAULT_STYLE)]
        style: String,
    },
}

fn print_lines(lines: &[String], empty_message: Option<&str>) {
    if let (true, Some(message)) = (lines.is_empty(), empty_message) {
        println!("{}", message);
    }
    for line in lines {
        println!("{}", line);
    }
}

pub async fn run(args: DbfetchArgs, config: &ClientConfig) -> anyhow::Result<()> {
    let base_url = args.base_url.as_deref().unwrap_or(&config.dbfetch_url);
    let client = DbfetchClient::new(base_url, config.http.timeout())?;

    match args.method {
        DbfetchMethod::SupportedDbs => print_lines(&client.supported_dbs().await?, None),
        DbfetchMethod::SupportedFormats => print_lines(&client.supported_formats().await?, None),
        DbfetchMethod::SupportedStyles => print_lines(&client.supported_styles().await?, None),
        DbfetchMethod::DbFormats { db } => {
            print_lines(&client.db_formats(&db).await?, Some("Database not found"))
        }
        DbfetchMethod::FormatStyles { db, format } => print_lines(
            &client.format_styles(&db, &format).await?,
            Some("Database and format not found"),
        ),
        DbfetchMethod::FetchData { query, format, style } => {
            print!("{}", client.fetch_data(&query, &format, &style).await?)
        }
        DbfetchMethod::FetchBatch { db, ids, format, style } => {
            print!("{}", client.fetch_batch(&db, &ids, &format, &style).await?)
        }
    }
    Ok(())
}
