//! Composite geographic identifier

use loghose_protocol::CfProperties;

/// Build the composite geographic id for a request
///
/// Joins continent, country, region code, city, and postal code with
/// `-`, skipping empty components. All components empty yields `None`.
pub fn geo_id(cf: &CfProperties) -> Option<String> {
    let parts: Vec<&str> = [
        cf.continent.as_deref(),
        cf.country.as_deref(),
        cf.region_code.as_deref(),
        cf.city.as_deref(),
        cf.postal_code.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|p| !p.is_empty())
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("-"))
    }
}
