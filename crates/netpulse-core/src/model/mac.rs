/// Canonical MAC form used for lookups: lower-case, colon separated.
///
/// Controllers and URLs disagree on case and on `-` versus `:`; both sides
/// of every comparison go through this.
pub fn normalize_mac(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace('-', ":")
}

/// Whether two MAC strings name the same interface.
pub fn mac_eq(a: &str, b: &str) -> bool {
    normalize_mac(a) == normalize_mac(b)
}
