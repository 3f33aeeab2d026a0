use tracing_subscriber::{fmt, EnvFilter};

/// `RUST_LOG` wins; otherwise info for this workspace, warn for the rest.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("warn,depth_view=info,depth_view_application=info,depth_view_adapters=info")
    });
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
