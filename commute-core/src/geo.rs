use crate::model::Coordinate;

/// Representative point of a home/office trip.
///
/// Plain arithmetic mean of the latitudes and of the longitudes. This is a
/// known approximation: it is not the geodesic midpoint, and trips crossing
/// the antimeridian land on the wrong side of the globe.
pub fn midpoint(home: Coordinate, office: Coordinate) -> Coordinate {
    Coordinate {
        latitude: (home.latitude + office.latitude) / 2.0,
        longitude: (home.longitude + office.longitude) / 2.0,
    }
}
