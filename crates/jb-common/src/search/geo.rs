/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Radius applied when the caller supplies an origin without a radius.
pub const DEFAULT_RADIUS_KM: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Rectangular over-approximation of a circle around an origin.
///
/// This is a cheap pre-filter, not a great-circle distance check:
/// points near the corners of the box may lie outside the true circle
/// and callers are expected to tolerate those false positives. Near the
/// poles `cos(lat)` vanishes and the longitude span covers the whole
/// circle, so the longitude bounds become unbounded (`None`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub lng_bounds: Option<(f64, f64)>,
}

impl BoundingBox {
    pub fn around(origin: GeoPoint, radius_km: f64) -> Self {
        let delta_lat = (radius_km / EARTH_RADIUS_KM).to_degrees();

        let cos_lat = origin.lat.to_radians().cos();
        let lng_bounds = if cos_lat.abs() < f64::EPSILON {
            None
        } else {
            let delta_lng = ((radius_km / EARTH_RADIUS_KM).asin() / cos_lat)
                .to_degrees()
                .abs();
            Some((origin.lng - delta_lng, origin.lng + delta_lng))
        };

        Self {
            min_lat: origin.lat - delta_lat,
            max_lat: origin.lat + delta_lat,
            lng_bounds,
        }
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        let lat_ok = point.lat >= self.min_lat && point.lat <= self.max_lat;
        let lng_ok = match self.lng_bounds {
            Some((min_lng, max_lng)) => point.lng >= min_lng && point.lng <= max_lng,
            None => true,
        };
        lat_ok && lng_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
        let d_lat = (b.lat - a.lat).to_radians();
        let d_lng = (b.lng - a.lng).to_radians();
        let h = (d_lat / 2.0).sin().powi(2)
            + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
    }

    #[test]
    fn box_contains_every_point_inside_the_circle() {
        let origin = GeoPoint {
            lat: 1.282903,
            lng: 103.850173,
        };
        let radius = 5.0;
        let bounds = BoundingBox::around(origin, radius);

        for step in 0..36 {
            let bearing = f64::from(step) * 10.0_f64.to_radians();
            for fraction in [0.1, 0.5, 0.9] {
                let dist = radius * fraction;
                let point = GeoPoint {
                    lat: origin.lat + (dist / EARTH_RADIUS_KM).to_degrees() * bearing.cos(),
                    lng: origin.lng
                        + (dist / EARTH_RADIUS_KM).to_degrees() * bearing.sin()
                            / origin.lat.to_radians().cos(),
                };
                assert!(
                    haversine_km(origin, point) < radius,
                    "sample point should be strictly inside the circle"
                );
                assert!(bounds.contains(point), "bounding box must contain {point:?}");
            }
        }
    }

    #[test]
    fn longitude_is_unbounded_at_the_poles() {
        let bounds = BoundingBox::around(GeoPoint { lat: 90.0, lng: 0.0 }, 1.0);
        assert!(bounds.lng_bounds.is_none());
        assert!(bounds.contains(GeoPoint {
            lat: 90.0,
            lng: 179.0
        }));
    }

    #[test]
    fn bounds_are_symmetric_around_the_origin() {
        let origin = GeoPoint {
            lat: 1.35,
            lng: 103.82,
        };
        let bounds = BoundingBox::around(origin, 2.0);
        assert!((bounds.max_lat - origin.lat - (origin.lat - bounds.min_lat)).abs() < 1e-12);
        let (min_lng, max_lng) = bounds.lng_bounds.unwrap();
        assert!((max_lng - origin.lng - (origin.lng - min_lng)).abs() < 1e-12);
    }
}
