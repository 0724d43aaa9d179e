//! Typed accessor table for filterable fields
//!
//! Each static field key declares its type and how to read it off the
//! request, so the compiler can reject unknown fields and mismatched
//! operators before a single request is evaluated.

use std::collections::HashMap;

use loghose_protocol::RequestView;
use once_cell::sync::Lazy;

/// Declared type of a filterable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// String-valued field
    Str,
    /// Numeric field (compared as f64)
    Num,
    /// Boolean field
    Bool,
}

impl FieldType {
    /// Human-readable name for error messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::Num => "number",
            Self::Bool => "boolean",
        }
    }
}

/// A field value read off a request during evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOperand {
    Str(String),
    Num(f64),
    Bool(bool),
}

/// Accessor function reading one field off a request
pub type Accessor = fn(&RequestView) -> Option<FilterOperand>;

/// A static field declaration
#[derive(Clone, Copy)]
pub struct FieldSpec {
    /// Declared type; operators are checked against it at compile time
    pub field_type: FieldType,
    /// Reader for the field
    pub accessor: Accessor,
}

/// Look up a static field by its dotted key
pub fn field_spec(key: &str) -> Option<&'static FieldSpec> {
    FIELDS.get(key)
}

fn text(value: Option<&str>) -> Option<FilterOperand> {
    value.map(|v| FilterOperand::Str(v.to_string()))
}

fn number(value: Option<i64>) -> Option<FilterOperand> {
    value.map(|v| FilterOperand::Num(v as f64))
}

fn boolean(value: Option<bool>) -> Option<FilterOperand> {
    value.map(FilterOperand::Bool)
}

static FIELDS: Lazy<HashMap<&'static str, FieldSpec>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, FieldSpec> = HashMap::new();

    let mut add = |key: &'static str, field_type: FieldType, accessor: Accessor| {
        m.insert(key, FieldSpec {
            field_type,
            accessor,
        });
    };

    add("request.method", FieldType::Str, |v| {
        Some(FilterOperand::Str(v.request().method.as_str().to_string()))
    });
    add("request.url", FieldType::Str, |v| {
        Some(FilterOperand::Str(v.request().url.clone()))
    });

    add("url.hostname", FieldType::Str, |v| {
        text(v.url().and_then(|u| u.host_str()))
    });
    add("url.pathname", FieldType::Str, |v| {
        text(v.url().map(|u| u.path()))
    });
    add("url.search", FieldType::Str, |v| {
        v.url()
            .and_then(|u| u.query())
            .map(|q| FilterOperand::Str(format!("?{q}")))
    });

    add("cf.asn", FieldType::Num, |v| number(v.request().cf.asn));
    add("cf.colo", FieldType::Str, |v| {
        text(v.request().cf.colo.as_deref())
    });
    add("cf.country", FieldType::Str, |v| {
        text(v.request().cf.country.as_deref())
    });
    add("cf.city", FieldType::Str, |v| {
        text(v.request().cf.city.as_deref())
    });
    add("cf.continent", FieldType::Str, |v| {
        text(v.request().cf.continent.as_deref())
    });
    add("cf.region", FieldType::Str, |v| {
        text(v.request().cf.region.as_deref())
    });
    add("cf.regionCode", FieldType::Str, |v| {
        text(v.request().cf.region_code.as_deref())
    });
    add("cf.postalCode", FieldType::Str, |v| {
        text(v.request().cf.postal_code.as_deref())
    });
    add("cf.timezone", FieldType::Str, |v| {
        text(v.request().cf.timezone.as_deref())
    });
    add("cf.httpProtocol", FieldType::Str, |v| {
        text(v.request().cf.http_protocol.as_deref())
    });
    add("cf.tlsCipher", FieldType::Str, |v| {
        text(v.request().cf.tls_cipher.as_deref())
    });
    add("cf.tlsVersion", FieldType::Str, |v| {
        text(v.request().cf.tls_version.as_deref())
    });
    add("cf.clientTcpRtt", FieldType::Num, |v| {
        number(v.request().cf.client_tcp_rtt)
    });
    add("cf.threatScore", FieldType::Num, |v| {
        number(v.request().cf.threat_score)
    });

    add("cf.botManagement.score", FieldType::Num, |v| {
        number(v.request().cf.bot_management.as_ref().and_then(|b| b.score))
    });
    add("cf.botManagement.verifiedBot", FieldType::Bool, |v| {
        boolean(
            v.request()
                .cf
                .bot_management
                .as_ref()
                .and_then(|b| b.verified_bot),
        )
    });
    add("cf.botManagement.ja3Hash", FieldType::Str, |v| {
        text(
            v.request()
                .cf
                .bot_management
                .as_ref()
                .and_then(|b| b.ja3_hash.as_deref()),
        )
    });
    add("cf.botManagement.corporateProxy", FieldType::Bool, |v| {
        boolean(
            v.request()
                .cf
                .bot_management
                .as_ref()
                .and_then(|b| b.corporate_proxy),
        )
    });

    m
});
