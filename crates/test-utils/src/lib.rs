//! Shared test utilities for the climate-viz workspace.
//!
//! Grid generators, GeoTIFF fixtures written to scratch directories and
//! workspace path helpers. Pulled in as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;
