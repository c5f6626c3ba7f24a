//! Feature preprocessing
//!
//! Numerical columns pass through unchanged; categorical columns are one-hot
//! encoded with an all-zero fallback for categories never seen while fitting.

pub mod encoder;
pub mod transformer;

pub use encoder::OneHotEncoder;
pub use transformer::{FeatureTransformer, UnseenCategory};
