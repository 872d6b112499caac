//! One-call tracing setup shared by the binaries of this workspace.
//!
//! Events go to stderr so that stdout stays reserved for the
//! actual program output. The default level is WARN, raise it
//! with `RUST_LOG` when debugging.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;

/// Install the global subscriber. Call once, early in main.
#[ inline( always ) ]
pub fn init_tracing_subscriber() {
    let fmt_layer = fmt::layer()
        .compact()
        .without_time()
        .with_writer( std::io::stderr )
        .with_ansi( std::io::stderr().is_terminal() )
    ;

    let env_layer = EnvFilter::builder()
        .with_default_directive( LevelFilter::WARN.into() )
        .from_env_lossy()
    ;

    registry()
        .with( fmt_layer )
        .with( env_layer )
        .init();
}
