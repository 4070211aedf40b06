//! Arc-length utilities over multi-contour paths.

use kurbo::{ParamCurve, ParamCurveArclen, PathEl, PathSeg};

use crate::foundation::core::{BezPath, Point};

const ARCLEN_ACCURACY: f64 = 1e-4;

/// Segments of `path` grouped by contour, with their arc lengths.
fn contours(path: &BezPath) -> Vec<Vec<(PathSeg, f64)>> {
    let mut out = Vec::new();
    let mut current = BezPath::new();
    for el in path.elements() {
        if matches!(el, PathEl::MoveTo(_)) && !current.elements().is_empty() {
            flush_contour(&mut current, &mut out);
        }
        current.push(*el);
    }
    flush_contour(&mut current, &mut out);
    out
}

fn flush_contour(current: &mut BezPath, out: &mut Vec<Vec<(PathSeg, f64)>>) {
    let segs: Vec<_> = current
        .segments()
        .map(|seg| (seg, seg.arclen(ARCLEN_ACCURACY)))
        .collect();
    if !segs.is_empty() {
        out.push(segs);
    }
    *current = BezPath::new();
}

/// Total arc length of every contour.
pub fn arc_length(path: &BezPath) -> f64 {
    contours(path)
        .iter()
        .flat_map(|c| c.iter().map(|(_, len)| *len))
        .sum()
}

/// The prefix of `path` covering `fraction` of its total arc length.
///
/// Contours are revealed in order; `fraction <= 0` yields an empty path and `fraction >= 1` the
/// path itself.
pub fn partial(path: &BezPath, fraction: f64) -> BezPath {
    if fraction <= 0.0 {
        return BezPath::new();
    }
    if fraction >= 1.0 {
        return path.clone();
    }

    let contours = contours(path);
    let total: f64 = contours
        .iter()
        .flat_map(|c| c.iter().map(|(_, len)| *len))
        .sum();
    let mut remaining = total * fraction;
    let mut out = BezPath::new();

    'outer: for contour in &contours {
        let mut started = false;
        for (seg, len) in contour {
            if remaining <= 0.0 {
                break 'outer;
            }
            let piece = if remaining >= *len {
                *seg
            } else {
                let t = seg.inv_arclen(remaining, ARCLEN_ACCURACY);
                seg.subsegment(0.0..t)
            };
            if !started {
                out.move_to(piece.start());
                started = true;
            }
            push_segment(&mut out, piece);
            remaining -= len;
        }
    }
    out
}

fn push_segment(out: &mut BezPath, seg: PathSeg) {
    match seg {
        PathSeg::Line(l) => out.line_to(l.p1),
        PathSeg::Quad(q) => out.quad_to(q.p1, q.p2),
        PathSeg::Cubic(c) => out.curve_to(c.p1, c.p2, c.p3),
    }
}

/// `count` points spaced evenly by arc length across all contours, in drawing order.
///
/// An empty path resamples to `count` copies of the origin.
pub fn resample(path: &BezPath, count: usize) -> Vec<Point> {
    let segs: Vec<(PathSeg, f64)> = contours(path).into_iter().flatten().collect();
    if segs.is_empty() || count == 0 {
        return vec![Point::ZERO; count];
    }
    let total: f64 = segs.iter().map(|(_, len)| *len).sum();
    if total <= 0.0 {
        return vec![segs[0].0.start(); count];
    }

    let mut points = Vec::with_capacity(count);
    let mut seg_idx = 0;
    let mut seg_start = 0.0;
    for i in 0..count {
        let target = if count == 1 {
            0.0
        } else {
            total * (i as f64) / ((count - 1) as f64)
        };
        while seg_idx + 1 < segs.len() && seg_start + segs[seg_idx].1 < target {
            seg_start += segs[seg_idx].1;
            seg_idx += 1;
        }
        let (seg, len) = segs[seg_idx];
        let local = (target - seg_start).clamp(0.0, len);
        let t = if len > 0.0 {
            seg.inv_arclen(local, ARCLEN_ACCURACY)
        } else {
            0.0
        };
        points.push(seg.eval(t));
    }
    points
}

/// `path` split at every move, keeping each contour's close. Contours without segments are
/// dropped.
pub fn subpaths(path: &BezPath) -> Vec<BezPath> {
    let mut out = Vec::new();
    let mut current = BezPath::new();
    for el in path.elements() {
        if matches!(el, PathEl::MoveTo(_)) && !current.elements().is_empty() {
            out.push(std::mem::take(&mut current));
        }
        current.push(*el);
    }
    out.push(current);
    out.retain(|c| c.segments().next().is_some());
    out
}

/// End point of the last segment.
pub fn last_point(path: &BezPath) -> Option<Point> {
    path.segments().last().map(|seg| seg.end())
}

/// Whether the last contour of `path` ends with an explicit close.
pub fn is_closed(path: &BezPath) -> bool {
    matches!(path.elements().last(), Some(PathEl::ClosePath))
}

/// Polyline through `points`, closed on request.
pub fn polyline(points: &[Point], closed: bool) -> BezPath {
    let mut out = BezPath::new();
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        out.move_to(*first);
        for p in iter {
            out.line_to(*p);
        }
        if closed {
            out.close_path();
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/animation/path.rs"]
mod tests;
