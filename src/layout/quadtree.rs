// Barnes-Hut quadtree used by the ForceAtlas2 repulsion pass.

const MAX_DEPTH: usize = 24;

#[derive(Debug)]
struct Region {
    mass: f64,
    cx: f64,
    cy: f64,
    /// Twice the largest distance from the mass center to a body inside.
    size: f64,
    children: Vec<usize>,
    bodies: Vec<usize>,
}

#[derive(Debug)]
pub(super) struct QuadTree {
    regions: Vec<Region>,
}

impl QuadTree {
    pub(super) fn build(xs: &[f64], ys: &[f64], masses: &[f64]) -> Self {
        let mut tree = Self {
            regions: Vec::new(),
        };
        if !xs.is_empty() {
            let all: Vec<usize> = (0..xs.len()).collect();
            tree.build_region(all, xs, ys, masses, 0);
        }
        tree
    }

    fn build_region(
        &mut self,
        bodies: Vec<usize>,
        xs: &[f64],
        ys: &[f64],
        masses: &[f64],
        depth: usize,
    ) -> usize {
        let mass: f64 = bodies.iter().map(|&i| masses[i]).sum();
        let (mut cx, mut cy) = (0.0, 0.0);
        for &i in &bodies {
            cx += xs[i] * masses[i];
            cy += ys[i] * masses[i];
        }
        if mass > 0.0 {
            cx /= mass;
            cy /= mass;
        }
        let size = bodies
            .iter()
            .map(|&i| 2.0 * ((xs[i] - cx).powi(2) + (ys[i] - cy).powi(2)).sqrt())
            .fold(0.0, f64::max);

        let idx = self.regions.len();
        self.regions.push(Region {
            mass,
            cx,
            cy,
            size,
            children: Vec::new(),
            bodies: Vec::new(),
        });

        if bodies.len() <= 1 || size <= 0.0 || depth >= MAX_DEPTH {
            self.regions[idx].bodies = bodies;
            return idx;
        }

        let mut quadrants: [Vec<usize>; 4] = Default::default();
        for &i in &bodies {
            let q = usize::from(xs[i] >= cx) + 2 * usize::from(ys[i] >= cy);
            quadrants[q].push(i);
        }
        if quadrants.iter().any(|q| q.len() == bodies.len()) {
            self.regions[idx].bodies = bodies;
            return idx;
        }

        let mut children = Vec::with_capacity(4);
        for quadrant in quadrants {
            if !quadrant.is_empty() {
                children.push(self.build_region(quadrant, xs, ys, masses, depth + 1));
            }
        }
        self.regions[idx].children = children;
        idx
    }

    /// Walks the tree from the point `(x, y)`. Regions far enough away,
    /// judged by `theta`, are reported whole through `on_region(mass, cx, cy)`;
    /// bodies in nearer leaves are reported one by one through `on_body`.
    pub(super) fn visit(
        &self,
        x: f64,
        y: f64,
        theta: f64,
        mut on_body: impl FnMut(usize),
        mut on_region: impl FnMut(f64, f64, f64),
    ) {
        if self.regions.is_empty() {
            return;
        }
        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            let region = &self.regions[idx];
            if region.children.is_empty() {
                region.bodies.iter().copied().for_each(&mut on_body);
                continue;
            }
            let distance = ((x - region.cx).powi(2) + (y - region.cy).powi(2)).sqrt();
            if distance * theta > region.size {
                on_region(region.mass, region.cx, region.cy);
            } else {
                stack.extend(region.children.iter().copied());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_theta_reports_every_body() {
        let xs = [0.0, 1.0, 5.0, 9.0, 9.5];
        let ys = [0.0, 2.0, 5.0, 1.0, 8.0];
        let masses = [1.0; 5];
        let tree = QuadTree::build(&xs, &ys, &masses);
        let mut seen = Vec::new();
        tree.visit(0.0, 0.0, 0.0, |i| seen.push(i), |_, _, _| panic!("approximated"));
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn distant_clusters_are_approximated() {
        let xs = [0.0, 0.1, 1000.0, 1000.1];
        let ys = [0.0, 0.1, 1000.0, 1000.1];
        let masses = [1.0, 1.0, 2.0, 2.0];
        let tree = QuadTree::build(&xs, &ys, &masses);
        let mut regions = Vec::new();
        let mut bodies = Vec::new();
        tree.visit(0.0, 0.0, 1.2, |i| bodies.push(i), |m, cx, cy| regions.push((m, cx, cy)));
        assert!(bodies.contains(&0) && bodies.contains(&1));
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].0, 4.0);
        assert!((regions[0].1 - 1000.05).abs() < 1e-9);
    }

    #[test]
    fn coincident_bodies_stay_in_one_leaf() {
        let xs = [3.0; 6];
        let ys = [3.0; 6];
        let masses = [1.0; 6];
        let tree = QuadTree::build(&xs, &ys, &masses);
        let mut count = 0;
        tree.visit(0.0, 0.0, 0.5, |_| count += 1, |_, _, _| {});
        assert_eq!(count, 6);
    }
}
