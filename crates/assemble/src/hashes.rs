//! Connection fingerprints and sampling buckets
//!
//! All fingerprints are CRC-32 (ISO-HDLC, polynomial 0xEDB88320) rendered
//! as the decimal form of the unsigned 32-bit value, matching what ends
//! up in the log store as text.

#[cfg(test)]
#[path = "hashes_test.rs"]
mod tests;

/// CRC-32 over the concatenation of the given parts, as a decimal string
///
/// Missing inputs are passed as empty strings by callers, so absent
/// request attributes still produce a stable fingerprint.
pub fn crc32_decimal(parts: &[&str]) -> String {
    let mut hasher = crc32fast::Hasher::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hasher.finalize().to_string()
}

/// Deterministic sampling buckets for a connection hash
///
/// Hashes the decimal connection hash once more and takes the last digit
/// (0-9) and last two digits (0-99) of the decimal rendering. Pure in
/// the connection hash, so the same client lands in the same buckets on
/// every request.
pub fn sample_buckets(connection_hash: &str) -> (i64, i64) {
    let bucket = crc32_decimal(&[connection_hash]);

    let sample10 = bucket
        .chars()
        .last()
        .and_then(|c| c.to_digit(10))
        .unwrap_or(0) as i64;

    let tail = &bucket[bucket.len().saturating_sub(2)..];
    let sample100 = tail.parse::<i64>().unwrap_or(0);

    (sample10, sample100)
}
