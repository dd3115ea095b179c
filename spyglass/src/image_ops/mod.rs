//! Low-level raster operations for the preprocessing stage.
//!
//! All pixel math happens on `ndarray::Array2` using matrix indexing
//! `[row, col]`; conversions to and from `image` crate types live in
//! [`convert`] and are confined to the I/O boundary.
//!
//! # Module Organization
//!
//! - **convert**: grayscale conversion and Array2 <-> image-crate bridging
//! - **filter**: rank filters (median blur)
//! - **contrast**: contrast-limited adaptive histogram equalization
//! - **morphology**: grayscale morphology with disk structuring elements

pub mod contrast;
pub mod convert;
pub mod filter;
pub mod morphology;

pub use contrast::clahe;
pub use convert::{array_to_gray_image, rgb_to_gray};
pub use filter::median_blur;
pub use morphology::{disk_element, grayscale_open, top_hat};
