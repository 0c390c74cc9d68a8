use tracing::trace;

use crate::contours::ContourPolygon;
use crate::error::{ArgumentError, Result};
use crate::math::Point2;
use crate::parallel::map_index;
use crate::volume::{SliceViewMut, VoxelLabel};

/// What an edge contributes where it meets a scanline.
///
/// Touches come from polygon vertices lying exactly on the scanline and say
/// on which side the other end of the edge is. The derived order breaks ties
/// between events at the same `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    Crossing,
    Above,
    Below,
}

#[derive(Debug, Clone, Copy)]
struct Event {
    x: f64,
    kind: EventKind,
}

/// Inclusive pixel run `[x0, x1]` on row `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    y: i32,
    x0: i32,
    x1: i32,
}

/// Collects the events of every edge against the scanline `yc`, sorted by `x`.
#[allow(clippy::float_cmp)]
fn row_events(points: &[Point2], yc: f64, events: &mut Vec<Event>) {
    events.clear();
    let n = points.len();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        if a.y == b.y {
            continue;
        }
        let touch = |x: f64, other_y: f64| Event {
            x,
            kind: if other_y < yc {
                EventKind::Above
            } else {
                EventKind::Below
            },
        };
        if a.y == yc {
            events.push(touch(a.x, b.y));
        } else if b.y == yc {
            events.push(touch(b.x, a.y));
        } else if (a.y < yc) != (b.y < yc) {
            events.push(Event {
                x: a.x + (yc - a.y) * (b.x - a.x) / (b.y - a.y),
                kind: EventKind::Crossing,
            });
        }
    }
    events.sort_by(|p, q| p.x.total_cmp(&q.x).then(p.kind.cmp(&q.kind)));
}

/// Pixel columns whose centers lie in `[a, b)` (`closed == false`) or
/// `[a, b]` (`closed == true`), clipped to the row.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn push_run(runs: &mut Vec<Run>, y: i32, a: f64, b: f64, closed: bool, dim_x: usize) {
    let first = (a - 0.5).ceil().max(0.0);
    let last = if closed {
        (b - 0.5).floor()
    } else {
        (b - 0.5).ceil() - 1.0
    };
    let last = last.min(dim_x as f64 - 1.0);
    if first <= last {
        runs.push(Run {
            y,
            x0: first as i32,
            x1: last as i32,
        });
    }
}

/// Scan state along one row.
#[derive(Debug, Clone, Copy)]
enum RowState {
    /// Outside the polygon.
    Background,
    /// Inside since `from`.
    Inside { from: f64 },
    /// On a horizontal boundary run entered at `from` by an edge coming from
    /// above. `inside` is the state the run was entered from.
    Top { from: f64, inside: bool },
    /// As `Top`, with the entering edge coming from below.
    Bottom { from: f64, inside: bool },
}

impl RowState {
    fn boundary(kind: EventKind, from: f64, inside: bool) -> Self {
        if kind == EventKind::Above {
            Self::Top { from, inside }
        } else {
            Self::Bottom { from, inside }
        }
    }

    /// State after a boundary run that ends at `x`. `crossed` is set when
    /// the entering and leaving edges lie on opposite sides of the row.
    fn after_boundary(inside: bool, crossed: bool, x: f64) -> Self {
        if inside == crossed {
            Self::Background
        } else {
            Self::Inside { from: x }
        }
    }
}

/// Walks the sorted events of one row through the [`RowState`] machine.
///
/// A crossing toggles between `Background` and `Inside`. Touches are
/// resolved in pairs: the first enters `Top` or `Bottom`, the second leaves
/// it. One from above and one from below make a crossing, two from the same
/// side are a tangent. Pixel centers on the boundary run between the two
/// touches are filled.
fn row_runs(events: &[Event], y: i32, dim_x: usize, runs: &mut Vec<Run>) {
    let mut state = RowState::Background;
    for event in events {
        let x = event.x;
        state = match (state, event.kind) {
            (RowState::Background, EventKind::Crossing) => RowState::Inside { from: x },
            (RowState::Inside { from }, EventKind::Crossing) => {
                push_run(runs, y, from, x, false, dim_x);
                RowState::Background
            }
            // Another edge through a boundary run; the run itself is filled.
            (RowState::Top { from, inside }, EventKind::Crossing) => RowState::Top {
                from,
                inside: !inside,
            },
            (RowState::Bottom { from, inside }, EventKind::Crossing) => RowState::Bottom {
                from,
                inside: !inside,
            },
            (RowState::Background, kind) => RowState::boundary(kind, x, false),
            (RowState::Inside { from }, kind) => {
                push_run(runs, y, from, x, false, dim_x);
                RowState::boundary(kind, x, true)
            }
            (RowState::Top { from, inside }, kind) => {
                push_run(runs, y, from, x, true, dim_x);
                RowState::after_boundary(inside, kind == EventKind::Below, x)
            }
            (RowState::Bottom { from, inside }, kind) => {
                push_run(runs, y, from, x, true, dim_x);
                RowState::after_boundary(inside, kind == EventKind::Above, x)
            }
        };
    }
}

/// Pixel runs covered by one polygon, sorted by row then column, with
/// overlapping runs of a row merged.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn polygon_runs(points: &[Point2], dim_x: usize, dim_y: usize) -> Vec<Run> {
    if points.len() < 2 || dim_x == 0 || dim_y == 0 {
        return Vec::new();
    }
    let (min_y, max_y) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        });
    let first_row = (min_y - 0.5).ceil().max(0.0);
    let last_row = (max_y - 0.5).floor().min(dim_y as f64 - 1.0);
    if first_row > last_row {
        return Vec::new();
    }

    let mut runs: Vec<Run> = Vec::new();
    let mut events: Vec<Event> = Vec::new();
    let mut row_buf: Vec<Run> = Vec::new();
    for y in first_row as i32..=last_row as i32 {
        row_events(points, f64::from(y) + 0.5, &mut events);
        row_buf.clear();
        row_runs(&events, y, dim_x, &mut row_buf);
        row_buf.sort_by_key(|r| r.x0);
        for run in row_buf.drain(..) {
            match runs.last_mut() {
                Some(prev) if prev.y == run.y && run.x0 <= prev.x1 + 1 => {
                    prev.x1 = prev.x1.max(run.x1);
                }
                _ => runs.push(run),
            }
        }
    }
    runs
}

/// Rejects polygons with a NaN or infinite coordinate. `index` in the error
/// is the position of the offending point within its polygon.
pub(crate) fn check_finite(polygons: &[ContourPolygon]) -> Result<()> {
    for polygon in polygons {
        if let Some(index) = polygon
            .points()
            .iter()
            .position(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(ArgumentError::NonFinitePoint { index }.into());
        }
    }
    Ok(())
}

/// Rasterizes polygons into a slice.
///
/// A pixel belongs to a polygon when its center `(x + 0.5, y + 0.5)` is
/// inside it; centers exactly on a horizontal boundary run count as inside.
/// Several polygons combine with even-odd parity: a pixel covered by an odd
/// number of polygons is set to the fill value, every other pixel is left
/// untouched. Outer rims and their holes can therefore be passed together.
#[derive(Debug, Clone, Copy)]
pub struct FillPolygon<T> {
    value: T,
    max_workers: Option<usize>,
}

impl<T: VoxelLabel> FillPolygon<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value,
            max_workers: None,
        }
    }

    /// Caps the number of polygons rasterized concurrently.
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = Some(max_workers);
        self
    }

    /// Fills `polygons` into `slice` and returns the number of pixels set.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentError::NonFinitePoint` if any coordinate is NaN or
    /// infinite, or `ExecutionError::WorkerPool` if the pool cannot be
    /// built. The slice is untouched on error.
    #[allow(clippy::cast_sign_loss)]
    pub fn execute(
        &self,
        slice: &mut SliceViewMut<'_, T>,
        polygons: &[ContourPolygon],
    ) -> Result<usize> {
        check_finite(polygons)?;

        let (dim_x, dim_y) = (slice.dim_x(), slice.dim_y());
        let per_polygon = map_index(polygons.len(), self.max_workers, |i| {
            polygon_runs(polygons[i].points(), dim_x, dim_y)
        })?;

        let mut parity = vec![false; dim_x * dim_y];
        for run in per_polygon.iter().flatten() {
            let row = run.y as usize * dim_x;
            for flag in &mut parity[row + run.x0 as usize..=row + run.x1 as usize] {
                *flag = !*flag;
            }
        }

        let mut written = 0;
        for (pixel, _) in slice
            .data_mut()
            .iter_mut()
            .zip(&parity)
            .filter(|(_, &odd)| odd)
        {
            *pixel = self.value;
            written += 1;
        }
        trace!(polygons = polygons.len(), pixels = written, "filled polygons");
        Ok(written)
    }

    /// Like [`FillPolygon::execute`] for a raw row-major buffer.
    ///
    /// # Errors
    ///
    /// Additionally returns `ArgumentError::SizeMismatch` if `buffer` does
    /// not hold exactly `dim_x * dim_y` pixels.
    pub fn execute_buffer(
        &self,
        buffer: &mut [T],
        dim_x: usize,
        dim_y: usize,
        polygons: &[ContourPolygon],
    ) -> Result<usize> {
        let mut slice = SliceViewMut::from_slice(dim_x, dim_y, buffer)?;
        self.execute(&mut slice, polygons)
    }
}
