//! Shared types for mdocx conversions.
//!
//! Both conversion directions report through the same envelope:
//!
//! - [`Conversion`]: successful output plus [`ConversionMetadata`] and any
//!   [`ConversionWarning`]s collected along the way
//! - [`ConversionError`]: hard failure with a machine-readable [`ErrorCode`]
//!
//! Recoverable problems never become errors. Builders push them into a
//! [`Warnings`] collector owned by the conversion session instead.

mod error;
mod metadata;
mod warning;

pub use error::{ConversionError, ErrorCode};
pub use metadata::{Conversion, ConversionMetadata, ExtractedImage};
pub use warning::{ConversionWarning, WarningCode, Warnings};
