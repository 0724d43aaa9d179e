//! Master schema and column-projected subsets
//!
//! The master schema is an ordered list of column declarations. Insertion
//! order is authoritative: it fixes both the INSERT column order used by
//! the batcher and the deterministic schema fingerprint.

use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;

/// SQL column type for a schema column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// TEXT column
    Text,
    /// INTEGER column
    Integer,
    /// BOOLEAN column
    Boolean,
    /// DATETIME column (ISO-8601 text in the SQLite dialect)
    DateTime,
}

impl ColumnType {
    /// SQL type keyword for DDL statements
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::Boolean => "BOOLEAN",
            Self::DateTime => "DATETIME",
        }
    }
}

/// A single column declaration in a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name (also the record field name)
    pub name: &'static str,
    /// SQL type
    pub column_type: ColumnType,
    /// Extra SQL constraints, e.g. `PRIMARY KEY`
    pub constraints: Option<&'static str>,
    /// Whether an `idx_<name>` index is created for this column
    pub indexed: bool,
}

impl ColumnSpec {
    const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            constraints: None,
            indexed: false,
        }
    }

    const fn primary_key(mut self) -> Self {
        self.constraints = Some("PRIMARY KEY");
        self
    }

    const fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }
}

/// Schema subset errors
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A requested column is not part of the master schema
    #[error("unknown column: {0}")]
    UnknownColumn(String),
}

/// An ordered column schema
///
/// Either the full master schema or a column projection of it. Subsets
/// always preserve master-schema order regardless of the order columns
/// were requested in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    /// The full master schema
    pub fn master() -> &'static Schema {
        &MASTER
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Whether a column with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Columns flagged for index creation
    pub fn indexed_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| c.indexed)
    }

    /// Project the schema onto a subset of columns
    ///
    /// The result preserves master-schema order. Unknown column names are
    /// rejected.
    pub fn subset(&self, names: &[String]) -> Result<Schema, SchemaError> {
        for name in names {
            if !self.contains(name) {
                return Err(SchemaError::UnknownColumn(name.clone()));
            }
        }

        let columns = self
            .columns
            .iter()
            .filter(|c| names.iter().any(|n| n == c.name))
            .copied()
            .collect();

        Ok(Schema { columns })
    }

    /// Deterministic 16-character fingerprint of the ordered columns
    ///
    /// Two schemas with the same columns in the same order produce the
    /// same fingerprint on every platform; any change to a column's name,
    /// type, constraints, or index flag changes it.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for col in &self.columns {
            hasher.update(col.name.as_bytes());
            hasher.update(b"|");
            hasher.update(col.column_type.as_sql().as_bytes());
            hasher.update(b"|");
            hasher.update(col.constraints.unwrap_or("").as_bytes());
            hasher.update(b"|");
            hasher.update(if col.indexed { b"1" } else { b"0" });
            hasher.update(b"\n");
        }
        let digest = hex::encode(hasher.finalize());
        digest[..16].to_string()
    }
}

/// Record field name constants
///
/// One constant per master-schema column so the assembler and tests never
/// spell a field name twice.
pub mod field {
    pub const LOG_ID: &str = "logId";
    pub const RAY_ID: &str = "rayId";
    pub const FP_ID: &str = "fpID";
    pub const DEVICE_HASH: &str = "deviceHash";
    pub const CONNECTION_HASH: &str = "connectionHash";
    pub const TLS_HASH: &str = "tlsHash";
    pub const REQUEST_TIME: &str = "requestTime";
    pub const RECEIVED_AT: &str = "receivedAt";
    pub const PROCESSED_AT: &str = "processedAt";
    pub const PROCESSING_DURATION_MS: &str = "processingDurationMs";
    pub const CLIENT_TCP_RTT: &str = "clientTcpRtt";
    pub const SAMPLE_10: &str = "sample10";
    pub const SAMPLE_100: &str = "sample100";
    pub const URL: &str = "url";
    pub const URL_HOST: &str = "urlHost";
    pub const URL_PATHNAME: &str = "urlPathname";
    pub const URL_SEARCH: &str = "urlSearch";
    pub const METHOD: &str = "method";
    pub const HEADERS: &str = "headers";
    pub const BODY: &str = "body";
    pub const BODY_TRUNCATED: &str = "bodyTruncated";
    pub const BODY_SIZE: &str = "bodySize";
    pub const MIME_TYPE: &str = "mimeType";
    pub const DEVICE_TYPE: &str = "deviceType";
    pub const C_ID: &str = "cId";
    pub const S_ID: &str = "sId";
    pub const E_ID: &str = "eId";
    pub const U_ID: &str = "uID";
    pub const EM_ID: &str = "emID";
    pub const EM_A: &str = "emA";
    pub const COOKIES: &str = "cookies";
    pub const ASN: &str = "asn";
    pub const COLO: &str = "colo";
    pub const COUNTRY: &str = "country";
    pub const CITY: &str = "city";
    pub const CONTINENT: &str = "continent";
    pub const REGION: &str = "region";
    pub const REGION_CODE: &str = "regionCode";
    pub const POSTAL_CODE: &str = "postalCode";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const TIMEZONE: &str = "timezone";
    pub const GEO_ID: &str = "geoId";
    pub const HTTP_PROTOCOL: &str = "httpProtocol";
    pub const TLS_CIPHER: &str = "tlsCipher";
    pub const TLS_VERSION: &str = "tlsVersion";
    pub const JA3: &str = "ja3";
    pub const THREAT_SCORE: &str = "threatScore";
    pub const VERIFIED_BOT: &str = "verifiedBot";
    pub const CORPORATE_PROXY: &str = "corporateProxy";
    pub const BOT_MANAGEMENT: &str = "botManagement";
    pub const TLS_CLIENT_AUTH: &str = "tlsClientAuth";
    pub const ENVIRONMENT: &str = "environment";
    pub const DATA: &str = "data";
    pub const CLIENT_IP: &str = "clientIp";
}

use field as f;
use ColumnType::{Boolean, DateTime, Integer, Text};

/// The master schema: every field the pipeline knows how to extract
static MASTER: Lazy<Schema> = Lazy::new(|| Schema {
    columns: vec![
        ColumnSpec::new(f::LOG_ID, Text).primary_key(),
        ColumnSpec::new(f::RAY_ID, Text).indexed(),
        ColumnSpec::new(f::FP_ID, Text).indexed(),
        ColumnSpec::new(f::DEVICE_HASH, Text),
        ColumnSpec::new(f::CONNECTION_HASH, Text).indexed(),
        ColumnSpec::new(f::TLS_HASH, Text),
        ColumnSpec::new(f::REQUEST_TIME, Integer),
        ColumnSpec::new(f::RECEIVED_AT, DateTime).indexed(),
        ColumnSpec::new(f::PROCESSED_AT, DateTime),
        ColumnSpec::new(f::PROCESSING_DURATION_MS, Integer),
        ColumnSpec::new(f::CLIENT_TCP_RTT, Integer),
        ColumnSpec::new(f::SAMPLE_10, Integer),
        ColumnSpec::new(f::SAMPLE_100, Integer),
        ColumnSpec::new(f::URL, Text),
        ColumnSpec::new(f::URL_HOST, Text),
        ColumnSpec::new(f::URL_PATHNAME, Text),
        ColumnSpec::new(f::URL_SEARCH, Text),
        ColumnSpec::new(f::METHOD, Text),
        ColumnSpec::new(f::HEADERS, Text),
        ColumnSpec::new(f::BODY, Text),
        ColumnSpec::new(f::BODY_TRUNCATED, Boolean),
        ColumnSpec::new(f::BODY_SIZE, Integer),
        ColumnSpec::new(f::MIME_TYPE, Text),
        ColumnSpec::new(f::DEVICE_TYPE, Text),
        ColumnSpec::new(f::C_ID, Text),
        ColumnSpec::new(f::S_ID, Text),
        ColumnSpec::new(f::E_ID, Text),
        ColumnSpec::new(f::U_ID, Text),
        ColumnSpec::new(f::EM_ID, Text),
        ColumnSpec::new(f::EM_A, Text),
        ColumnSpec::new(f::COOKIES, Text),
        ColumnSpec::new(f::ASN, Integer),
        ColumnSpec::new(f::COLO, Text),
        ColumnSpec::new(f::COUNTRY, Text),
        ColumnSpec::new(f::CITY, Text),
        ColumnSpec::new(f::CONTINENT, Text),
        ColumnSpec::new(f::REGION, Text),
        ColumnSpec::new(f::REGION_CODE, Text),
        ColumnSpec::new(f::POSTAL_CODE, Text),
        ColumnSpec::new(f::LATITUDE, Text),
        ColumnSpec::new(f::LONGITUDE, Text),
        ColumnSpec::new(f::TIMEZONE, Text),
        ColumnSpec::new(f::GEO_ID, Text).indexed(),
        ColumnSpec::new(f::HTTP_PROTOCOL, Text),
        ColumnSpec::new(f::TLS_CIPHER, Text),
        ColumnSpec::new(f::TLS_VERSION, Text),
        ColumnSpec::new(f::JA3, Text),
        ColumnSpec::new(f::THREAT_SCORE, Integer),
        ColumnSpec::new(f::VERIFIED_BOT, Boolean),
        ColumnSpec::new(f::CORPORATE_PROXY, Boolean),
        ColumnSpec::new(f::BOT_MANAGEMENT, Text),
        ColumnSpec::new(f::TLS_CLIENT_AUTH, Text),
        ColumnSpec::new(f::ENVIRONMENT, Text),
        ColumnSpec::new(f::DATA, Text),
        ColumnSpec::new(f::CLIENT_IP, Text),
    ],
});
