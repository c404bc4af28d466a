//! # Unit and scalar normalization
//!
//! Pure conversions from raw vendor scalars into the canonical units of the
//! output schema: micrometres for lengths, nanometres for wavelengths and
//! seconds for time intervals. Every function accepts anything implementing
//! [`Numeric`] (strings, numbers, tree nodes, options of those) and returns a
//! [`Field`]; input that cannot be coerced yields [`Field::Missing`], never a
//! panic or an error.

use log::debug;

use crate::schema::{Field, Scalar};
use crate::tree::RawNode;

/// Sentinel rendered for any field whose value is unavailable.
pub const NOT_AVAILABLE: &str = "N/A";

/// Values that may be coerced to a finite `f64`.
pub trait Numeric {
    /// The finite numeric value, or `None` if the input is not a number.
    fn as_number(&self) -> Option<f64>;
}

impl Numeric for f64 {
    fn as_number(&self) -> Option<f64> {
        self.is_finite().then_some(*self)
    }
}

impl Numeric for i64 {
    fn as_number(&self) -> Option<f64> {
        Some(*self as f64)
    }
}

impl Numeric for u64 {
    fn as_number(&self) -> Option<f64> {
        Some(*self as f64)
    }
}

impl Numeric for usize {
    fn as_number(&self) -> Option<f64> {
        Some(*self as f64)
    }
}

impl Numeric for str {
    fn as_number(&self) -> Option<f64> {
        self.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

impl Numeric for String {
    fn as_number(&self) -> Option<f64> {
        self.as_str().as_number()
    }
}

impl Numeric for RawNode {
    fn as_number(&self) -> Option<f64> {
        self.as_f64()
    }
}

impl Numeric for Field {
    fn as_number(&self) -> Option<f64> {
        self.as_f64()
    }
}

impl<T: Numeric + ?Sized> Numeric for &T {
    fn as_number(&self) -> Option<f64> {
        (**self).as_number()
    }
}

impl<T: Numeric> Numeric for Option<T> {
    fn as_number(&self) -> Option<f64> {
        self.as_ref().and_then(Numeric::as_number)
    }
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Coerce to a number rounded to 3 decimals.
pub fn round_scalar<N: Numeric + ?Sized>(value: &N) -> Field {
    match value.as_number() {
        Some(v) => Field::float(round_to(v, 3)),
        None => Field::Missing,
    }
}

/// Convert metres to micrometres, rounded to 3 decimals.
pub fn meters_to_microns<N: Numeric + ?Sized>(value: &N) -> Field {
    match value.as_number() {
        Some(v) => round_scalar(&(v * 1e6)),
        None => Field::Missing,
    }
}

/// Like [`meters_to_microns`], but a zero value is a "not set" placeholder and
/// yields [`Field::Missing`].
pub fn nonzero_meters_to_microns<N: Numeric + ?Sized>(value: &N) -> Field {
    match value.as_number() {
        Some(v) if v != 0.0 => round_scalar(&(v * 1e6)),
        _ => Field::Missing,
    }
}

/// Convert metres to nanometres, rounded to 3 decimals.
pub fn meters_to_nanometers<N: Numeric + ?Sized>(value: &N) -> Field {
    match value.as_number() {
        Some(v) => round_scalar(&(v * 1e9)),
        None => Field::Missing,
    }
}

/// Seconds per unit of a vendor time-span unit.
///
/// Unknown units are taken as already being in seconds.
pub fn seconds_per_unit(unit: &str) -> f64 {
    match unit.trim() {
        "ms" => 1.0 / 1000.0,
        "s" => 1.0,
        "min" => 60.0,
        "h" => 3600.0,
        other => {
            debug!("Unknown time unit {:?}, assuming seconds", other);
            1.0
        }
    }
}

/// Convert a time interval to seconds, rounded to 6 decimals.
///
/// `unit` defaults to milliseconds when absent.
pub fn seconds_from_interval<N: Numeric + ?Sized>(value: &N, unit: Option<&str>) -> Field {
    match value.as_number() {
        Some(v) => Field::float(round_to(v * seconds_per_unit(unit.unwrap_or("ms")), 6)),
        None => Field::Missing,
    }
}

/// Coerce through a float and truncate to an integer.
pub fn to_int<N: Numeric + ?Sized>(value: &N) -> Field {
    match value.as_number() {
        Some(v) => Field::Present(Scalar::Int(v.trunc() as i64)),
        None => Field::Missing,
    }
}

/// Physical extent of an axis: pixel count times pixel size, rounded to 3
/// decimals. Missing when either input is missing.
pub fn image_extent(size: &Field, pixel_size: &Field) -> Field {
    match (size.as_f64(), pixel_size.as_f64()) {
        (Some(n), Some(px)) => round_scalar(&(n * px)),
        _ => Field::Missing,
    }
}

/// Immersion medium category implied by a refractive index.
pub fn immersion_from_refractive_index(refractive_index: f64) -> &'static str {
    if refractive_index < 1.1 {
        "Air"
    } else if refractive_index < 1.4 {
        "Water"
    } else if refractive_index > 1.5 {
        "Oil"
    } else {
        "Other"
    }
}

/// Render a float the way the documentation format always has: integral
/// values keep one decimal (`120.0`), others use the shortest exact form.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
