use super::{GridPoint, Point2};

/// Computes the signed area of a polygon (shoelace formula).
///
/// In image coordinates (`y` down) the area is positive for loops that run
/// clockwise on screen and negative for counter-clockwise loops.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Exact signed area of an integer grid loop, in whole pixels.
///
/// Crack loops always enclose an integer number of pixels, so twice the
/// shoelace sum is even.
#[must_use]
pub fn grid_signed_area(points: &[GridPoint]) -> i64 {
    let n = points.len();
    if n < 3 {
        return 0;
    }
    let mut sum: i64 = 0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += i64::from(points[i].x) * i64::from(points[j].y)
            - i64::from(points[j].x) * i64::from(points[i].y);
    }
    sum / 2
}

/// Winding number of the closed loop `points` around `p`.
///
/// Positive for loops that run clockwise on screen around `p`. Points on
/// the loop itself give an unspecified value.
#[must_use]
pub fn winding_number(points: &[Point2], p: Point2) -> i32 {
    let n = points.len();
    let mut winding = 0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let side = (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y);
        if a.y <= p.y {
            if b.y > p.y && side > 0.0 {
                winding += 1;
            }
        } else if b.y <= p.y && side < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// Returns `true` if `p` lies on the closed segment from `a` to `b`.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn on_segment(a: Point2, b: Point2, p: Point2) -> bool {
    let cross = (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y);
    cross == 0.0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

/// Returns `true` if some pixel center `(x + 0.5, y + 0.5)` lies on the
/// chord from the last point of `path` back to its first, or is enclosed by
/// the loop the chord closes.
///
/// Coordinates are expected on the half-pixel lattice, where every test is
/// exact.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn sweeps_pixel_center(path: &[Point2]) -> bool {
    let (Some(&first), Some(&last)) = (path.first(), path.last()) else {
        return false;
    };
    let (mut lo, mut hi) = (first, first);
    for p in path {
        lo = Point2::new(lo.x.min(p.x), lo.y.min(p.y));
        hi = Point2::new(hi.x.max(p.x), hi.y.max(p.y));
    }
    let xs = (lo.x - 0.5).ceil() as i32..=(hi.x - 0.5).floor() as i32;
    let ys = (lo.y - 0.5).ceil() as i32..=(hi.y - 0.5).floor() as i32;
    ys.flat_map(|y| xs.clone().map(move |x| (x, y))).any(|(x, y)| {
        let center = Point2::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
        on_segment(last, first, center) || winding_number(path, center) != 0
    })
}

/// Removes consecutive duplicate points in place, including a trailing point
/// equal to the first one when `closed` is set.
pub fn dedup_points(points: &mut Vec<Point2>, closed: bool) {
    points.dedup();
    if closed && points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
}
