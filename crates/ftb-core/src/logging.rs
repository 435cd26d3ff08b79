use crate::{errors::Error, Result};

/// Initialize tracing for a service.
///
/// Default filter is `info` for everything plus our own crates; override it
/// with `RUST_LOG`. Calling this twice is an error.
pub fn init(service_name: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let crate_name = service_name.replace('-', "_");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("info,ftb_core=info,ftb_http=info,{crate_name}=info"))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .try_init()
        .map_err(|e| Error::Config(format!("logging already initialized: {e}")))
}
