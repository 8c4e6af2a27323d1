//! Foundational primitives for line-defect inspection of multi-tap sensors.
//!
//! ## Image Views and Stride
//! Images use element stride (not byte stride). `stride` is the distance, in
//! elements, between adjacent row starts and may be greater than `width`.
//! This allows borrowed views over padded buffers and ROI subviews.
//!
//! ## Packed Samples
//! Sensor frames arrive as 16-bit containers. [`restore`] unpacks them into
//! natural-range values for the declared [`BitDepth`].
//!
//! ## Channels
//! A sensor with `n = s*s` taps produces `n` interleaved sub-grids. A
//! [`Channel`] is a strided view over the image; local index `i` maps to the
//! full-image line `i*s + offset`.

mod bitdepth;
mod channel;
mod error;
mod image;

pub use bitdepth::{BitDepth, restore, restore_in_place, restore_sample};
pub use channel::{Channel, ChannelLayout, decompose};
pub use error::Error;
pub use image::{Image, ImageView, widen_u8};
