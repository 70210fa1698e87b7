// Label de-overlapping for the rendered figure. Everything here works in
// pixel space on plain geometry, with no SVG dependency.

use std::collections::{HashMap, HashSet};

type Rect = (f32, f32, f32, f32);

/// Smallest displacement applied to an overlapping label per iteration, so
/// the halving pushes never stall on sub-pixel overlaps.
const MIN_PUSH: f32 = 0.5;

/// A label to place: the node position it belongs to and the size of its
/// text box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelBox {
    pub anchor: (f32, f32),
    pub width: f32,
    pub height: f32,
}

impl LabelBox {
    fn rect_at(&self, center: (f32, f32), expand: (f32, f32)) -> Rect {
        let w = self.width * expand.0;
        let h = self.height * expand.1;
        (center.0 - w / 2.0, center.1 - h / 2.0, w, h)
    }
}

/// Moves label boxes so they overlap each other and the node points as
/// little as possible.
pub trait LabelAdjuster {
    /// Returns one center per label, in input order. `obstacles` are the
    /// points labels should keep clear of; `bounds` is the figure size.
    fn adjust(
        &self,
        labels: &[LabelBox],
        obstacles: &[(f32, f32)],
        bounds: (f32, f32),
    ) -> Vec<(f32, f32)>;
}

/// Iterative repulsion in the spirit of adjustText: overlapping labels push
/// each other apart, points inside a label push it away, and every label
/// stays inside the figure.
#[derive(Debug, Clone)]
pub struct RepelAdjuster {
    pub iterations: usize,
    /// Share of a label/label overlap resolved per iteration.
    pub text_force: f32,
    /// Share of a point/label penetration resolved per iteration.
    pub point_force: f32,
    /// Box scale used when testing label/label overlap.
    pub expand_text: (f32, f32),
    /// Box scale used when testing point/label overlap.
    pub expand_points: (f32, f32),
}

impl Default for RepelAdjuster {
    fn default() -> Self {
        Self {
            iterations: 500,
            text_force: 0.5,
            point_force: 0.5,
            expand_text: (1.05, 1.2),
            expand_points: (1.05, 1.2),
        }
    }
}

impl LabelAdjuster for RepelAdjuster {
    fn adjust(
        &self,
        labels: &[LabelBox],
        obstacles: &[(f32, f32)],
        bounds: (f32, f32),
    ) -> Vec<(f32, f32)> {
        let mut centers: Vec<(f32, f32)> = labels
            .iter()
            .map(|label| clamp_center(label, label.anchor, bounds))
            .collect();
        if labels.is_empty() {
            return centers;
        }
        let cell = labels
            .iter()
            .map(|label| label.width.max(label.height))
            .fold(0.0, f32::max);
        let grid = PointGrid::new(cell, obstacles);

        for _ in 0..self.iterations {
            let mut moves = vec![(0.0f32, 0.0f32); labels.len()];
            let mut overlaps = 0usize;

            for i in 0..labels.len() {
                let a = labels[i].rect_at(centers[i], self.expand_text);
                for j in (i + 1)..labels.len() {
                    let b = labels[j].rect_at(centers[j], self.expand_text);
                    let Some((ox, oy)) = overlap_extent(&a, &b) else {
                        continue;
                    };
                    overlaps += 1;
                    let (sx, sy) = separation_sign(centers[i], centers[j]);
                    if ox < oy {
                        let push = (ox * self.text_force / 2.0).max(MIN_PUSH);
                        moves[i].0 -= sx * push;
                        moves[j].0 += sx * push;
                    } else {
                        let push = (oy * self.text_force / 2.0).max(MIN_PUSH);
                        moves[i].1 -= sy * push;
                        moves[j].1 += sy * push;
                    }
                }

                let rect = labels[i].rect_at(centers[i], self.expand_points);
                for k in grid.query(&rect) {
                    let point = obstacles[k];
                    if !point_inside_rect(point, &rect) {
                        continue;
                    }
                    overlaps += 1;
                    let px = rect.2 / 2.0 - (centers[i].0 - point.0).abs();
                    let py = rect.3 / 2.0 - (centers[i].1 - point.1).abs();
                    let (sx, sy) = separation_sign(point, centers[i]);
                    if px < py {
                        moves[i].0 += sx * (px * self.point_force).max(MIN_PUSH);
                    } else {
                        moves[i].1 += sy * (py * self.point_force).max(MIN_PUSH);
                    }
                }
            }

            if overlaps == 0 {
                break;
            }
            for (i, (mx, my)) in moves.into_iter().enumerate() {
                let moved = (centers[i].0 + mx, centers[i].1 + my);
                centers[i] = clamp_center(&labels[i], moved, bounds);
            }
        }
        centers
    }
}

/// Segment from the edge of a displaced label back to its anchor, or `None`
/// while the anchor is still covered by the label.
pub fn leader_line(label: &LabelBox, center: (f32, f32)) -> Option<((f32, f32), (f32, f32))> {
    let rect = label.rect_at(center, (1.0, 1.0));
    if point_inside_rect(label.anchor, &rect) {
        return None;
    }
    let (dx, dy) = (label.anchor.0 - center.0, label.anchor.1 - center.1);
    let tx = if dx.abs() > f32::EPSILON { (label.width / 2.0) / dx.abs() } else { f32::INFINITY };
    let ty = if dy.abs() > f32::EPSILON { (label.height / 2.0) / dy.abs() } else { f32::INFINITY };
    let t = tx.min(ty).min(1.0);
    Some(((center.0 + dx * t, center.1 + dy * t), label.anchor))
}

/// Direction pointing from `a` to `b` on each axis; coincident positions
/// separate towards positive coordinates.
fn separation_sign(a: (f32, f32), b: (f32, f32)) -> (f32, f32) {
    let sign = |d: f32| if d < 0.0 { -1.0 } else { 1.0 };
    (sign(b.0 - a.0), sign(b.1 - a.1))
}

fn clamp_center(label: &LabelBox, center: (f32, f32), bounds: (f32, f32)) -> (f32, f32) {
    let clamp_axis = |value: f32, half: f32, limit: f32| {
        if 2.0 * half >= limit {
            limit / 2.0
        } else {
            value.clamp(half, limit - half)
        }
    };
    (
        clamp_axis(center.0, label.width / 2.0, bounds.0),
        clamp_axis(center.1, label.height / 2.0, bounds.1),
    )
}

fn overlap_extent(a: &Rect, b: &Rect) -> Option<(f32, f32)> {
    let w = (a.0 + a.2).min(b.0 + b.2) - a.0.max(b.0);
    let h = (a.1 + a.3).min(b.1 + b.3) - a.1.max(b.1);
    (w > 0.0 && h > 0.0).then_some((w, h))
}

fn overlap_area(a: &Rect, b: &Rect) -> f32 {
    overlap_extent(a, b).map(|(w, h)| w * h).unwrap_or(0.0)
}

fn point_inside_rect(point: (f32, f32), rect: &Rect) -> bool {
    point.0 >= rect.0 && point.0 <= rect.0 + rect.2 && point.1 >= rect.1 && point.1 <= rect.1 + rect.3
}

/// Total area where labels placed at `centers` overlap one another.
pub fn total_label_overlap(labels: &[LabelBox], centers: &[(f32, f32)]) -> f32 {
    let rects: Vec<Rect> = labels
        .iter()
        .zip(centers)
        .map(|(label, center)| label.rect_at(*center, (1.0, 1.0)))
        .collect();
    let mut total = 0.0;
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            total += overlap_area(&rects[i], &rects[j]);
        }
    }
    total
}

/// Spatial hash over obstacle points for fast label queries.
struct PointGrid {
    cell: f32,
    /// Maps grid cell (ix, iy) to indices into the point list.
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl PointGrid {
    fn new(cell: f32, points: &[(f32, f32)]) -> Self {
        let cell = cell.max(16.0);
        let mut cells: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
        for (i, point) in points.iter().enumerate() {
            let key = ((point.0 / cell).floor() as i32, (point.1 / cell).floor() as i32);
            cells.entry(key).or_default().push(i);
        }
        Self { cell, cells }
    }

    /// Return indices of points that could lie inside `rect`.
    fn query(&self, rect: &Rect) -> impl Iterator<Item = usize> + '_ {
        let x0 = (rect.0 / self.cell).floor() as i32;
        let y0 = (rect.1 / self.cell).floor() as i32;
        let x1 = ((rect.0 + rect.2) / self.cell).floor() as i32;
        let y1 = ((rect.1 + rect.3) / self.cell).floor() as i32;
        let mut seen = HashSet::new();
        (x0..=x1)
            .flat_map(move |ix| (y0..=y1).map(move |iy| (ix, iy)))
            .flat_map(move |key| {
                self.cells
                    .get(&key)
                    .map(|v| v.as_slice())
                    .unwrap_or(&[])
                    .iter()
                    .copied()
            })
            .filter(move |idx| seen.insert(*idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(x: f32, y: f32) -> LabelBox {
        LabelBox {
            anchor: (x, y),
            width: 40.0,
            height: 10.0,
        }
    }

    #[test]
    fn overlap_area_no_overlap() {
        let a: Rect = (0.0, 0.0, 10.0, 10.0);
        let b: Rect = (20.0, 20.0, 10.0, 10.0);
        assert_eq!(overlap_area(&a, &b), 0.0);
    }

    #[test]
    fn overlap_area_partial_overlap() {
        let a: Rect = (0.0, 0.0, 10.0, 10.0);
        let b: Rect = (5.0, 5.0, 10.0, 10.0);
        assert_eq!(overlap_area(&a, &b), 25.0);
    }

    #[test]
    fn overlap_area_contained() {
        let a: Rect = (0.0, 0.0, 20.0, 20.0);
        let b: Rect = (5.0, 5.0, 5.0, 5.0);
        assert_eq!(overlap_area(&a, &b), 25.0);
    }

    #[test]
    fn stacked_labels_are_pulled_apart() {
        let labels = vec![label(100.0, 100.0), label(100.0, 100.0), label(102.0, 103.0)];
        let before = total_label_overlap(&labels, &[(100.0, 100.0), (100.0, 100.0), (102.0, 103.0)]);
        let centers = RepelAdjuster::default().adjust(&labels, &[], (400.0, 400.0));
        assert!(before > 0.0);
        assert_eq!(total_label_overlap(&labels, &centers), 0.0);
    }

    #[test]
    fn labels_leave_covered_points() {
        let labels = vec![label(100.0, 100.0)];
        let obstacles = vec![(100.0, 100.0)];
        let centers = RepelAdjuster::default().adjust(&labels, &obstacles, (400.0, 400.0));
        let rect = labels[0].rect_at(centers[0], (1.0, 1.0));
        assert!(!point_inside_rect(obstacles[0], &rect));
        assert!(leader_line(&labels[0], centers[0]).is_some());
    }

    #[test]
    fn clear_labels_do_not_move() {
        let labels = vec![label(50.0, 50.0), label(200.0, 200.0)];
        let centers = RepelAdjuster::default().adjust(&labels, &[(300.0, 300.0)], (400.0, 400.0));
        assert_eq!(centers, vec![(50.0, 50.0), (200.0, 200.0)]);
        assert!(leader_line(&labels[0], centers[0]).is_none());
    }

    #[test]
    fn labels_stay_inside_bounds() {
        let labels = vec![label(2.0, 2.0), label(399.0, 399.0)];
        let centers = RepelAdjuster::default().adjust(&labels, &[(2.0, 2.0)], (400.0, 400.0));
        for (label, center) in labels.iter().zip(&centers) {
            let rect = label.rect_at(*center, (1.0, 1.0));
            assert!(rect.0 >= 0.0 && rect.1 >= 0.0);
            assert!(rect.0 + rect.2 <= 400.0 && rect.1 + rect.3 <= 400.0);
        }
    }

    #[test]
    fn leader_line_starts_on_label_border() {
        let label = label(100.0, 100.0);
        let (start, end) = leader_line(&label, (100.0, 140.0)).unwrap();
        assert_eq!(end, (100.0, 100.0));
        assert!((start.0 - 100.0).abs() < 1e-4);
        assert!((start.1 - 135.0).abs() < 1e-4);
    }
}
