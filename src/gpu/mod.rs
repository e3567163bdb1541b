//! Upload layouts handed to the external renderer.
//!
//! The crate never touches a graphics API. Renderers take these byte views
//! and own buffer allocation, shaders and draw submission themselves.

mod types;

pub use types::{gaussian_bytes, index_bytes, GaussianGpu};
