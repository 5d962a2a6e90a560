//! Converting points between coordinate reference systems. A geofence describes its geometry in
//! whatever frame the sender used; the map lives in its own projected frame, described by its
//! georeference string.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::{LonLat, Pt2D};

/// Converts a single point from one coordinate reference system into another. Each point is
/// transformed independently.
pub trait CoordinateTransform {
    /// `pt` is (x, y, z) in the `from` frame. Height is accepted but the map is planar, so it's
    /// dropped.
    fn transform(&self, from: &str, to: &str, pt: [f64; 3]) -> Result<Pt2D>;
}

/// The parameters of a PROJ-style definition, like
/// `+proj=tmerc +lat_0=38.95 +lon_0=-77.15 +k=1 +x_0=0 +y_0=0 +datum=WGS84 +units=m`.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjString {
    params: BTreeMap<String, String>,
}

impl ProjString {
    pub fn parse(raw: &str) -> Result<ProjString> {
        let raw = raw.trim();
        let mut params = BTreeMap::new();
        // Shorthand for plain WGS84 lon/lat
        if raw.eq_ignore_ascii_case("EPSG:4326") || raw.eq_ignore_ascii_case("WGS84") {
            params.insert("proj".to_string(), "longlat".to_string());
            params.insert("datum".to_string(), "WGS84".to_string());
            return Ok(ProjString { params });
        }

        for token in raw.split_whitespace() {
            let token = match token.strip_prefix('+') {
                Some(t) => t,
                None => bail!("Unexpected token {} in projection {}", token, raw),
            };
            match token.split_once('=') {
                Some((key, value)) => {
                    params.insert(key.to_string(), value.to_string());
                }
                None => {
                    // Flags like +no_defs
                    params.insert(token.to_string(), String::new());
                }
            }
        }
        if !params.contains_key("proj") {
            bail!("Projection {} doesn't say +proj=", raw);
        }
        Ok(ProjString { params })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|x| x.as_str())
    }

    pub fn is_geodetic(&self) -> bool {
        matches!(self.get("proj"), Some("longlat") | Some("latlong") | Some("lonlat"))
    }

    fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        match self.get(key) {
            Some(raw) => match raw.parse::<f64>() {
                Ok(x) => Ok(Some(x)),
                Err(err) => bail!("Bad +{}={}: {}", key, raw, err),
            },
            None => Ok(None),
        }
    }

    /// The geodetic origin of a local projected frame.
    fn origin(&self) -> Result<LonLat> {
        match (self.get_f64("lon_0")?, self.get_f64("lat_0")?) {
            (Some(lon), Some(lat)) => Ok(LonLat::new(lon, lat)),
            _ => bail!("Projection needs +lat_0 and +lon_0 to define a local origin"),
        }
    }
}

/// Handles the transformations an on-vehicle map needs without linking against PROJ: identity
/// between identical frames, and geodetic lon/lat into a local tangent plane centered on the
/// target frame's `+lat_0`/`+lon_0`.
#[derive(Clone, Debug, Default)]
pub struct LocalProjection;

impl CoordinateTransform for LocalProjection {
    fn transform(&self, from: &str, to: &str, pt: [f64; 3]) -> Result<Pt2D> {
        if !pt.iter().all(|x| x.is_finite()) {
            bail!("Can't transform non-finite point {:?}", pt);
        }
        if from.trim() == to.trim() {
            return Ok(Pt2D::new(pt[0], pt[1]));
        }

        let src = ProjString::parse(from)?;
        let dst = ProjString::parse(to)?;
        if !src.is_geodetic() || dst.is_geodetic() {
            bail!(
                "Only geodetic to local projected transformations are supported, not {} to {}",
                from,
                to
            );
        }
        let origin = dst.origin()?;
        let (dx, dy) = LonLat::new(pt[0], pt[1]).offset_from(origin);
        let false_easting = dst.get_f64("x_0")?.unwrap_or(0.0);
        let false_northing = dst.get_f64("y_0")?.unwrap_or(0.0);
        Ok(Pt2D::new(dx + false_easting, dy + false_northing))
    }
}
