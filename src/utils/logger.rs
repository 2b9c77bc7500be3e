// Logger initialization

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive for a `--debugLevel` value. `RUST_LOG` takes precedence.
pub fn filter_for_debug_level(debug_level: u32) -> String {
    let level = match debug_level {
        0 => "warn",
        1..=10 => "debug",
        _ => "trace",
    };
    format!("ebi_webservices={level},ebiws={level}")
}

/// Install the global tracing subscriber, writing to stderr so stdout stays
/// clean for job ids and listings.
pub fn init_logger(debug_level: u32) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter_for_debug_level(debug_level).into());

    // A second initialisation (tests, embedding) is not an error worth reporting.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_level_mapping() {
        assert_eq!(filter_for_debug_level(0), "ebi_webservices=warn,ebiws=warn");
        assert_eq!(filter_for_debug_level(2), "ebi_webservices=debug,ebiws=debug");
        assert_eq!(filter_for_debug_level(11), "ebi_webservices=trace,ebiws=trace");
    }
}
