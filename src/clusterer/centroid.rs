use crate::clusterer::types::Coord;

/// Arithmetic mean of a set of coordinates, `None` for an empty set.
///
/// Each term is divided before summing so large finite inputs cannot
/// overflow to infinity.
pub fn compute_centroid(members: &[Coord]) -> Option<Coord> {
    if members.is_empty() {
        return None;
    }

    let n = members.len() as f64;
    let mut out = Coord::default();
    for m in members {
        out.x += m.x / n;
        out.y += m.y / n;
    }

    out.x = out.x.clamp(f64::MIN, f64::MAX);
    out.y = out.y.clamp(f64::MIN, f64::MAX);

    Some(out)
}
