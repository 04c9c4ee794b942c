pub const INDEX_CONCURRENCY_ENV: &str = "CODECHAT_INDEX_CONCURRENCY";

pub const MAX_INDEX_CONCURRENCY: usize = 32;

/// Files indexed at once when nothing is configured: half the CPUs, between 1 and 8
pub fn default_index_concurrency() -> usize {
    let cpus = std::thread::available_parallelism().map_or(1, |n| n.get());
    (cpus / 2).clamp(1, 8)
}

/// Clamp a configured value into the supported range
pub fn clamp_index_concurrency(value: usize) -> usize {
    value.clamp(1, MAX_INDEX_CONCURRENCY)
}

/// Concurrency from `CODECHAT_INDEX_CONCURRENCY`, falling back to the host default
pub fn index_concurrency_from_env() -> usize {
    concurrency_or_default(std::env::var(INDEX_CONCURRENCY_ENV).ok().as_deref())
}

fn concurrency_or_default(raw: Option<&str>) -> usize {
    match raw.map(str::trim).map(str::parse::<usize>) {
        Some(Ok(value)) => clamp_index_concurrency(value),
        Some(Err(_)) | None => default_index_concurrency(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_values_are_clamped() {
        assert_eq!(concurrency_or_default(Some("3")), 3);
        assert_eq!(concurrency_or_default(Some(" 5 ")), 5);
        assert_eq!(concurrency_or_default(Some("0")), 1);
        assert_eq!(concurrency_or_default(Some("999")), MAX_INDEX_CONCURRENCY);
    }

    #[test]
    fn unusable_values_fall_back_to_the_host_default() {
        let fallback = default_index_concurrency();
        for raw in [None, Some(""), Some("  "), Some("many"), Some("-2")] {
            assert_eq!(concurrency_or_default(raw), fallback, "{raw:?}");
        }
        assert!((1..=8).contains(&fallback));
    }
}
