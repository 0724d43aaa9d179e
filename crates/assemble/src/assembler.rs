//! The assembler proper

use chrono::{DateTime, SecondsFormat, Utc};
use http::Method;
use loghose_protocol::{field, LogRecord, LogRequest, RequestView};
use ulid::Ulid;

use crate::device::classify_device;
use crate::geo::geo_id;
use crate::hashes::{crc32_decimal, sample_buckets};

#[cfg(test)]
#[path = "assembler_test.rs"]
mod tests;

/// Assembles log records from requests
///
/// One assembler is built per worker process; the sanitized environment
/// snapshot is computed once at construction.
#[derive(Debug, Clone)]
pub struct Assembler {
    max_body_size: usize,
    environment_json: Option<String>,
}

impl Assembler {
    /// Create an assembler with the given body truncation limit
    pub fn new(max_body_size: usize) -> Self {
        Self {
            max_body_size,
            environment_json: None,
        }
    }

    /// Attach an environment snapshot
    ///
    /// Only scalar entries (string, number, boolean) are kept; nested
    /// values and nulls are dropped before serialization.
    pub fn with_environment(mut self, environment: &serde_json::Map<String, serde_json::Value>) -> Self {
        let scalars: serde_json::Map<String, serde_json::Value> = environment
            .iter()
            .filter(|(_, v)| v.is_string() || v.is_number() || v.is_boolean())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.environment_json = serde_json::to_string(&scalars).ok();
        self
    }

    /// Assemble a record from a request view and optional caller data
    ///
    /// Total: always produces a record. The view's memoized URL and
    /// cookie parses are shared with filter evaluation.
    pub fn assemble(
        &self,
        view: &RequestView<'_>,
        data: Option<&serde_json::Value>,
    ) -> LogRecord {
        let started = Utc::now();
        let request = view.request();
        let mut record = LogRecord::new();

        // Identifiers
        record.set(field::LOG_ID, Ulid::from_datetime(started.into()).to_string());
        record.set(field::RAY_ID, request.header("cf-ray"));

        // Fingerprints
        let ua = request.header("user-agent");
        let ja3 = request
            .cf
            .bot_management
            .as_ref()
            .and_then(|b| b.ja3_hash.as_deref())
            .unwrap_or("");
        let tls_cipher = request.cf.tls_cipher.as_deref().unwrap_or("");
        let tls_client_random = request.cf.tls_client_random.as_deref().unwrap_or("");
        let client_ip = request.header("cf-connecting-ip");

        let tls_hash = crc32_decimal(&[ja3, tls_cipher, tls_client_random]);
        let device_hash = crc32_decimal(&[ua.unwrap_or(""), ja3, tls_cipher]);
        let connection_hash = crc32_decimal(&[
            client_ip.unwrap_or(""),
            ua.unwrap_or(""),
            ja3,
            tls_cipher,
        ]);

        let (sample10, sample100) = sample_buckets(&connection_hash);
        record.set(field::TLS_HASH, tls_hash);
        record.set(field::DEVICE_HASH, device_hash);
        record.set(field::CONNECTION_HASH, connection_hash);
        record.set(field::SAMPLE_10, sample10);
        record.set(field::SAMPLE_100, sample100);
        record.set(field::CLIENT_IP, client_ip);

        // Request line and URL parts
        record.set(field::METHOD, request.method.as_str());
        record.set(field::URL, request.url.as_str());
        record.set(field::URL_HOST, view.url().and_then(|u| u.host_str()));
        record.set(field::URL_PATHNAME, view.url().map(|u| u.path()));
        record.set(
            field::URL_SEARCH,
            view.url().and_then(|u| u.query()).map(|q| format!("?{q}")),
        );
        record.set(field::HEADERS, headers_json(request));
        record.set(field::MIME_TYPE, request.header("content-type"));

        // Body capture
        self.extract_body(request, &mut record);

        // Device classification
        record.set(field::DEVICE_TYPE, classify_device(ua));

        // Client and session cookies
        record.set(field::FP_ID, view.cookie("fpID"));
        record.set(field::C_ID, view.cookie("cId"));
        record.set(field::S_ID, view.cookie("sId"));
        record.set(field::E_ID, view.cookie("eId"));
        record.set(field::U_ID, view.cookie("uID"));
        record.set(field::EM_ID, view.cookie("emID"));
        record.set(field::EM_A, view.cookie("emA"));
        record.set(field::COOKIES, serde_json::to_string(view.cookies()).ok());

        // Edge annotations
        let cf = &request.cf;
        record.set(field::ASN, cf.asn);
        record.set(field::COLO, cf.colo.as_deref());
        record.set(field::COUNTRY, cf.country.as_deref());
        record.set(field::CITY, cf.city.as_deref());
        record.set(field::CONTINENT, cf.continent.as_deref());
        record.set(field::REGION, cf.region.as_deref());
        record.set(field::REGION_CODE, cf.region_code.as_deref());
        record.set(field::POSTAL_CODE, cf.postal_code.as_deref());
        record.set(field::LATITUDE, cf.latitude.as_deref());
        record.set(field::LONGITUDE, cf.longitude.as_deref());
        record.set(field::TIMEZONE, cf.timezone.as_deref());
        record.set(field::GEO_ID, geo_id(cf));
        record.set(field::HTTP_PROTOCOL, cf.http_protocol.as_deref());
        record.set(field::TLS_CIPHER, cf.tls_cipher.as_deref());
        record.set(field::TLS_VERSION, cf.tls_version.as_deref());
        record.set(field::CLIENT_TCP_RTT, cf.client_tcp_rtt);
        record.set(field::THREAT_SCORE, cf.threat_score);
        record.set(field::JA3, if ja3.is_empty() { None } else { Some(ja3) });
        record.set(
            field::VERIFIED_BOT,
            cf.bot_management.as_ref().and_then(|b| b.verified_bot),
        );
        record.set(
            field::CORPORATE_PROXY,
            cf.bot_management.as_ref().and_then(|b| b.corporate_proxy),
        );
        record.set(
            field::BOT_MANAGEMENT,
            cf.bot_management
                .as_ref()
                .and_then(|b| serde_json::to_string(b).ok()),
        );
        record.set(
            field::TLS_CLIENT_AUTH,
            cf.tls_client_auth
                .as_ref()
                .and_then(|v| serde_json::to_string(v).ok()),
        );

        // Environment and caller data
        record.set(field::ENVIRONMENT, self.environment_json.as_deref());
        record.set(field::DATA, serialize_caller_data(data));

        // Timing last, so the duration covers the extraction itself
        let processed = Utc::now();
        record.set(field::REQUEST_TIME, started.timestamp_millis());
        record.set(field::RECEIVED_AT, iso8601(&started));
        record.set(field::PROCESSED_AT, iso8601(&processed));
        record.set(
            field::PROCESSING_DURATION_MS,
            (processed - started).num_milliseconds(),
        );

        record
    }

    /// Capture the request body where one is expected
    ///
    /// GET/HEAD requests never carry one; everything else is read as
    /// text, sized in UTF-8 bytes, and truncated to the configured
    /// character limit. The caller's body handle is untouched.
    fn extract_body(&self, request: &LogRequest, record: &mut LogRecord) {
        if request.method == Method::GET || request.method == Method::HEAD {
            return;
        }
        let Some(body) = &request.body else {
            return;
        };

        let text = String::from_utf8_lossy(body);
        record.set(field::BODY_SIZE, text.len() as i64);

        let char_count = text.chars().count();
        if char_count > self.max_body_size {
            let truncated: String = text.chars().take(self.max_body_size).collect();
            record.set(field::BODY, truncated);
            record.set(field::BODY_TRUNCATED, true);
        } else {
            record.set(field::BODY, text.into_owned());
            record.set(field::BODY_TRUNCATED, false);
        }
    }
}

/// Serialize headers to a JSON object, joining repeated values
fn headers_json(request: &LogRequest) -> Option<String> {
    let mut map = serde_json::Map::new();
    for name in request.headers.keys() {
        let values: Vec<&str> = request
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        map.insert(
            name.as_str().to_string(),
            serde_json::Value::String(values.join(", ")),
        );
    }
    serde_json::to_string(&map).ok()
}

/// Serialize caller data, degrading to an error stub instead of failing
fn serialize_caller_data(data: Option<&serde_json::Value>) -> Option<String> {
    let data = data?;
    match serde_json::to_string(data) {
        Ok(json) => Some(json),
        Err(err) => {
            tracing::warn!(error = %err, "caller data failed to serialize");
            Some(
                serde_json::json!({
                    "error": "serialization_failed",
                    "message": err.to_string(),
                })
                .to_string(),
            )
        }
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix
fn iso8601(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
