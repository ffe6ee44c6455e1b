//! Tracing bootstrap for presentation shells

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_DIRECTIVE: &str = "loudcheck=info";

/// Install a global `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive`
///
/// Returns `false` if a global subscriber was already installed, so shells
/// and tests may call this more than once.
pub fn init(default_directive: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        init(DEFAULT_DIRECTIVE);
        assert!(!init(DEFAULT_DIRECTIVE));
    }
}
