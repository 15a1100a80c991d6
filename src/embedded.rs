//! Frontend assets compiled into the binary.

use rust_embed::RustEmbed;

/// Static files from the built web UI under `ui/dist`.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/ui/dist"]
pub struct Assets;
