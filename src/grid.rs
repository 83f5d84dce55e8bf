// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Regular latitude/longitude grids covering a [BoundingBox].
//!
//! Grid arithmetic is done on integer multiples of 1e-7 degrees (the precision of
//! OpenStreetMap coordinates), so that snapping and stepping never accumulate
//! binary floating-point error. Coordinates are converted back to `f64` with a single
//! correctly-rounded division, which yields exactly the `f64` a decimal literal of
//! the same value would parse to.

use std::str::FromStr;

use crate::{BoundingBox, Error};

/// Number of grid units in one degree.
const UNITS_PER_DEGREE: i64 = 10_000_000;

/// Number of decimal digits of a single grid unit.
const UNIT_DECIMALS: u32 = 7;

/// Spacing between adjacent grid points, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridSize(i64);

impl GridSize {
    /// 0.0005°, roughly 55 meters of latitude.
    pub const DEFAULT: Self = Self(5000);

    /// Creates a grid size from a value in degrees, rounded to the nearest 1e-7°.
    pub fn new(degrees: f64) -> Result<Self, Error> {
        if !degrees.is_finite() || degrees <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "grid size must be positive, got {degrees}"
            )));
        }

        let units = (degrees * UNITS_PER_DEGREE as f64).round();
        if units < 1.0 || units > i32::MAX as f64 {
            return Err(Error::InvalidArgument(format!(
                "grid size {degrees} is out of range"
            )));
        }

        Ok(Self(units as i64))
    }

    /// Creates a grid size from a number of 1e-7° units.
    pub fn from_units(units: i64) -> Result<Self, Error> {
        if units > 0 {
            Ok(Self(units))
        } else {
            Err(Error::InvalidArgument(format!(
                "grid size must be positive, got {units}e-7"
            )))
        }
    }

    /// Returns the grid size in 1e-7° units.
    pub fn units(self) -> i64 {
        self.0
    }

    /// Returns the grid size in degrees.
    pub fn degrees(self) -> f64 {
        from_units(self.0)
    }

    /// Generates an ascending sequence of multiples of the grid size
    /// covering the `[min(a, b), max(a, b)]` range.
    ///
    /// The sequence starts at the largest multiple not greater than the lower bound,
    /// and ends at the multiple directly following the largest multiple not greater
    /// than the upper bound. The upper bound is thus always extended by a step,
    /// even when it is an exact multiple of the grid size.
    ///
    /// Returns [Error::InvalidArgument] if a bound is not finite, or too large
    /// to be represented in grid units.
    pub fn axis(self, a: f64, b: f64) -> Result<Vec<f64>, Error> {
        if !a.is_finite() || !b.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "axis bounds must be finite, got {a} and {b}"
            )));
        }

        let out_of_range =
            || Error::InvalidArgument(format!("axis bounds {a} and {b} are out of range"));

        let low = self.floor_multiple(a.min(b)).ok_or_else(out_of_range)?;
        let high = self
            .floor_multiple(a.max(b))
            .and_then(|units| units.checked_add(self.0))
            .ok_or_else(out_of_range)?;

        Ok((low..=high)
            .step_by(self.0 as usize)
            .map(from_units)
            .collect())
    }

    /// Returns the largest multiple of the grid size not greater than `x`, in grid units.
    fn floor_multiple(self, x: f64) -> Option<i64> {
        let mut quotient = to_units(x)?.div_euclid(self.0);

        // Rounding to whole units may push an input with more than 7 decimals
        // onto the next multiple.
        if from_units(quotient.checked_mul(self.0)?) > x {
            quotient -= 1;
        }

        quotient.checked_mul(self.0)
    }
}

impl FromStr for GridSize {
    type Err = Error;

    /// Parses a decimal number of degrees exactly, without going through `f64`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidArgument(format!("invalid grid size: {s:?}"));
        let s = s.trim();

        let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let frac_digits = frac_part.trim_end_matches('0');
        if frac_digits.len() > UNIT_DECIMALS as usize {
            return Err(Error::InvalidArgument(format!(
                "grid size {s} is finer than 1e-7 degrees"
            )));
        }

        let int_units = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse::<i64>()
                .ok()
                .and_then(|i| i.checked_mul(UNITS_PER_DEGREE))
                .ok_or_else(invalid)?
        };

        let frac_units = if frac_digits.is_empty() {
            0
        } else {
            let scale = 10_i64.pow(UNIT_DECIMALS - frac_digits.len() as u32);
            frac_digits.parse::<i64>().map_err(|_| invalid())? * scale
        };

        Self::from_units(int_units + frac_units)
    }
}

impl std::fmt::Display for GridSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.degrees())
    }
}

/// Largest magnitude of a coordinate accepted in grid units, leaving headroom
/// for snapping and stepping without overflow.
const MAX_UNITS: i64 = 1 << 62;

#[inline]
fn to_units(degrees: f64) -> Option<i64> {
    let units = (degrees * UNITS_PER_DEGREE as f64).round();
    if units.is_finite() && units.abs() < MAX_UNITS as f64 {
        Some(units as i64)
    } else {
        None
    }
}

#[inline]
fn from_units(units: i64) -> f64 {
    units as f64 / UNITS_PER_DEGREE as f64
}

/// Generates an ascending sequence of coordinates, evenly spaced by `step` degrees,
/// covering the range between `a` and `b`. See [GridSize::axis] for the exact rules.
///
/// Returns [Error::InvalidArgument] if `step` is not positive or any argument
/// is not finite.
pub fn build_axis(a: f64, b: f64, step: f64) -> Result<Vec<f64>, Error> {
    GridSize::new(step)?.axis(a, b)
}

/// Points of a regular grid covering a [BoundingBox].
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub size: GridSize,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
}

impl Grid {
    pub fn new(bbox: &BoundingBox, size: GridSize) -> Result<Self, Error> {
        Ok(Self {
            size,
            latitudes: size.axis(bbox.south, bbox.north)?,
            longitudes: size.axis(bbox.west, bbox.east)?,
        })
    }

    /// Returns the number of grid points.
    pub fn len(&self) -> usize {
        self.latitudes.len() * self.longitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over all grid points as `(lat, lon)` pairs,
    /// latitudes in the outer and longitudes in the inner loop.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.latitudes
            .iter()
            .flat_map(|&lat| self.longitudes.iter().map(move |&lon| (lat, lon)))
    }
}
