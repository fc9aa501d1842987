//! Rein-mathematische Hilfsfunktionen für planare Polylinien.

use glam::DVec2;

/// Toleranz für Parameter-Vergleiche bei Schnittpunkten.
const PARAM_EPSILON: f64 = 1e-12;

/// Projektion eines Punktes auf eine Polylinie.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylineProjection {
    /// Nächster Punkt auf der Polylinie
    pub point: DVec2,
    /// Index des Segments (Start-Vertex)
    pub segment_index: usize,
    /// Parameter entlang des Segments (0.0 = Start, 1.0 = Ende)
    pub t: f64,
    /// Euklidische Distanz zum Anfragepunkt
    pub distance: f64,
}

impl PolylineProjection {
    /// Liefert den Vertex-Index, falls die Projektion auf einem Vertex liegt.
    pub fn vertex_index(&self) -> Option<usize> {
        if self.t <= PARAM_EPSILON {
            Some(self.segment_index)
        } else if self.t >= 1.0 - PARAM_EPSILON {
            Some(self.segment_index + 1)
        } else {
            None
        }
    }
}

/// Nächster Punkt auf dem Segment `a`–`b` samt Parameter `t`.
pub fn closest_point_on_segment(p: DVec2, a: DVec2, b: DVec2) -> (DVec2, f64) {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f64::EPSILON {
        return (a, 0.0);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t, t)
}

/// Distanz von `p` zum Segment `a`–`b`.
pub fn distance_to_segment(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let (closest, _) = closest_point_on_segment(p, a, b);
    closest.distance(p)
}

/// Projiziert `p` auf die Polylinie; bei Gleichstand gewinnt das erste Segment.
pub fn project_onto_polyline(p: DVec2, coordinates: &[DVec2]) -> Option<PolylineProjection> {
    let mut best: Option<PolylineProjection> = None;
    for (i, w) in coordinates.windows(2).enumerate() {
        let (point, t) = closest_point_on_segment(p, w[0], w[1]);
        let distance = point.distance(p);
        if best.map_or(true, |b| distance < b.distance) {
            best = Some(PolylineProjection {
                point,
                segment_index: i,
                t,
                distance,
            });
        }
    }
    best
}

/// Distanz von `p` zur Polylinie (`f64::INFINITY` bei weniger als 2 Vertices).
pub fn distance_to_polyline(p: DVec2, coordinates: &[DVec2]) -> f64 {
    project_onto_polyline(p, coordinates).map_or(f64::INFINITY, |proj| proj.distance)
}

/// Echter Schnittpunkt zweier Segmente.
///
/// Gibt `(Punkt, t, u)` zurück, wobei `t`/`u` die Parameter auf dem ersten
/// bzw. zweiten Segment sind. Kollineare Überlappungen liefern `None`.
pub fn segment_intersection(
    a1: DVec2,
    a2: DVec2,
    b1: DVec2,
    b2: DVec2,
) -> Option<(DVec2, f64, f64)> {
    let r = a2 - a1;
    let s = b2 - b1;
    let denom = r.perp_dot(s);
    if denom.abs() <= f64::EPSILON {
        return None;
    }
    let qp = b1 - a1;
    let t = qp.perp_dot(s) / denom;
    let u = qp.perp_dot(r) / denom;
    let range = -PARAM_EPSILON..=1.0 + PARAM_EPSILON;
    if range.contains(&t) && range.contains(&u) {
        Some((a1 + r * t.clamp(0.0, 1.0), t.clamp(0.0, 1.0), u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Gesamtlänge einer Polylinie.
pub fn polyline_length(coordinates: &[DVec2]) -> f64 {
    coordinates.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Achsenparalleles Begrenzungsrechteck einer Punktfolge.
pub fn bounds_of(points: &[DVec2]) -> Option<(DVec2, DVec2)> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p))),
    )
}

/// Punkt-in-Polygon-Test (Ray-Casting, Ring offen oder geschlossen).
pub fn point_in_ring(p: DVec2, ring: &[DVec2]) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}
