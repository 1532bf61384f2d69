//! Minimal UTC timestamp formatting, duplicated per-crate rather than
//! pulling in a dependency purely for clock formatting (teacher's
//! `structured_log.rs::now_utc` does the same rather than adding `chrono`
//! to the workspace).

/// Approximate ISO-8601-with-`Z` rendering of the current wall clock.
/// Precision to the millisecond; calendar math is approximate (good enough
/// for attestation timestamps, which are informational, not authoritative
/// time sources).
#[must_use]
pub fn now_utc() -> String {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        1970 + secs / 31_557_600,
        (secs % 31_557_600) / 2_629_800 + 1,
        (secs % 2_629_800) / 86400 + 1,
        (secs % 86400) / 3600,
        (secs % 3600) / 60,
        secs % 60,
        millis,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_ends_with_z() {
        assert!(now_utc().ends_with('Z'));
    }
}
