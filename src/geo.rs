//! Coordinate bridge: CRS normalization, reprojection between the canonical
//! geographic CRS and Web Mercator, and the host's pixel-inversion hook.
//!
//! Reprojection on placement paths is best-effort by design: a coordinate
//! that cannot be converted is stored as-is rather than losing the gesture.

#[cfg(test)]
#[path = "geo_test.rs"]
mod geo_test;

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::consts::{CANONICAL_CRS, EARTH_RADIUS_M, WEB_MERCATOR, WEB_MERCATOR_LEGACY};

/// Error returned by [`reproject`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoError {
    /// No conversion is known between the two CRSs.
    #[error("unsupported reprojection: {from} -> {to}")]
    UnsupportedCrs {
        /// Source CRS as given by the caller.
        from: String,
        /// Target CRS as given by the caller.
        to: String,
    },
    /// The conversion produced a non-finite value (e.g. a pole in Mercator).
    #[error("coordinate [{x}, {y}] is out of range for {crs}")]
    OutOfRange {
        /// Target CRS of the failed conversion.
        crs: String,
        /// Input x / longitude.
        x: f64,
        /// Input y / latitude.
        y: f64,
    },
}

/// Host hook inverting a screen pixel (relative to the map surface) into a
/// map coordinate. Returns `None` when the inversion fails; the gesture is
/// then dropped.
pub trait PixelToCoordinate {
    /// Convert `pixel` (`[x, y]` in CSS pixels) to `[lng, lat]`.
    fn pixel_to_coordinate(&self, pixel: [f64; 2]) -> Option<[f64; 2]>;
}

/// Collapse the legacy `EPSG:900913` alias onto `EPSG:3857`.
#[must_use]
pub fn normalize_crs(crs: &str) -> &str {
    if crs.eq_ignore_ascii_case(WEB_MERCATOR_LEGACY) {
        WEB_MERCATOR
    } else {
        crs
    }
}

/// Whether `crs` delivers projected meters rather than geographic degrees.
#[must_use]
pub fn is_projected(crs: &str) -> bool {
    normalize_crs(crs).eq_ignore_ascii_case(WEB_MERCATOR)
}

/// Reproject a point between two CRSs. Identity when the normalized CRSs
/// match; otherwise only the 4326 ↔ 3857 pair is supported.
///
/// # Errors
///
/// [`GeoError::UnsupportedCrs`] for any other pair, [`GeoError::OutOfRange`]
/// when the conversion leaves the finite plane.
pub fn reproject(point: [f64; 2], from_crs: &str, to_crs: &str) -> Result<[f64; 2], GeoError> {
    let from = normalize_crs(from_crs);
    let to = normalize_crs(to_crs);
    if from.eq_ignore_ascii_case(to) {
        return Ok(point);
    }
    let converted = if from.eq_ignore_ascii_case(CANONICAL_CRS) && to.eq_ignore_ascii_case(WEB_MERCATOR) {
        mercator_forward(point)
    } else if from.eq_ignore_ascii_case(WEB_MERCATOR) && to.eq_ignore_ascii_case(CANONICAL_CRS) {
        mercator_inverse(point)
    } else {
        return Err(GeoError::UnsupportedCrs { from: from_crs.to_string(), to: to_crs.to_string() });
    };
    if converted[0].is_finite() && converted[1].is_finite() {
        Ok(converted)
    } else {
        Err(GeoError::OutOfRange { crs: to.to_string(), x: point[0], y: point[1] })
    }
}

/// Best-effort conversion into the canonical CRS, used on every placement
/// path. On failure the original coordinate is kept so the placement
/// survives; the failure is only logged.
#[must_use]
pub fn to_canonical(point: [f64; 2], from_crs: &str) -> [f64; 2] {
    match reproject(point, from_crs, CANONICAL_CRS) {
        Ok(converted) => converted,
        Err(err) => {
            tracing::warn!(%err, from_crs, "reprojection failed, keeping original coordinate");
            point
        }
    }
}

fn mercator_forward([lng, lat]: [f64; 2]) -> [f64; 2] {
    let x = lng.to_radians() * EARTH_RADIUS_M;
    let y = (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS_M;
    [x, y]
}

fn mercator_inverse([x, y]: [f64; 2]) -> [f64; 2] {
    let lng = (x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - FRAC_PI_2).to_degrees();
    [lng, lat]
}
