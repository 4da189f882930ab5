//! Value-to-color engine.
//!
//! Turns a numeric metric value into a display color, either by continuous
//! interpolation between control points ([`Gradient`]) or by stepped
//! threshold bands ([`BandTable`]). Both sit behind the [`ColorPolicy`] trait.

pub mod banded;
pub mod gradient;
pub mod policy;
pub mod rgb;

pub use banded::{Band, BandTable, Comparison};
pub use gradient::{ControlPoint, Gradient};
pub use policy::{get_policy, ColorPolicy, ColorStrategy, Polarity};
pub use rgb::{lerp_color, RgbColor};
