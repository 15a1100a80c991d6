//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module  | Commands handled |
//! |---------|------------------|
//! | `serve` | `Serve`, `Init`  |

pub mod serve;

pub use serve::{cmd_init, cmd_serve};
