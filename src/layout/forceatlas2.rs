//! ForceAtlas2 (Jacomy et al., 2014).
//!
//! Node mass is degree + 1 and every node has size 1. Repulsion is
//! accumulated per node, so the single- and multi-threaded passes perform
//! the same arithmetic in the same order and give identical layouts.

use super::quadtree::QuadTree;
use super::{LayoutEngine, Point, Positions};
use crate::config::ForceAtlas2Config;
use crate::error::Result;
use crate::graph::UnGraph;
use petgraph::visit::EdgeRef;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

const NODE_SIZE: f64 = 1.0;
const OVERLAP_REPULSION_BOOST: f64 = 100.0;
const MIN_SPEED_EFFICIENCY: f64 = 0.05;
const MAX_SPEED: f64 = 1000.0;
const MAX_RISE: f64 = 0.5;
const MAX_JITTER: f64 = 10.0;
const MAX_OVERLAP_DISPLACEMENT: f64 = 10.0;

#[derive(Debug, Clone, Default)]
pub struct ForceAtlas2 {
    pub config: ForceAtlas2Config,
}

impl ForceAtlas2 {
    pub fn new(config: ForceAtlas2Config) -> Self {
        Self { config }
    }
}

impl LayoutEngine for ForceAtlas2 {
    fn layout(&self, graph: &UnGraph) -> Result<Positions> {
        let mut sim = Simulation::new(graph, &self.config);
        for _ in 0..self.config.iterations {
            sim.step(&self.config);
        }
        debug!(
            iterations = self.config.iterations,
            speed = sim.speed,
            "forceatlas2 finished"
        );
        Ok(graph
            .node_weights()
            .enumerate()
            .map(|(i, node)| (node.id.clone(), Point::new(sim.x[i] as f32, sim.y[i] as f32)))
            .collect())
    }
}

struct Simulation {
    x: Vec<f64>,
    y: Vec<f64>,
    mass: Vec<f64>,
    dx: Vec<f64>,
    dy: Vec<f64>,
    old_dx: Vec<f64>,
    old_dy: Vec<f64>,
    edges: Vec<(usize, usize, f64)>,
    speed: f64,
    speed_efficiency: f64,
}

impl Simulation {
    fn new(graph: &UnGraph, config: &ForceAtlas2Config) -> Self {
        let n = graph.node_count();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let x: Vec<f64> = (0..n).map(|_| rng.random::<f64>()).collect();
        let y: Vec<f64> = (0..n).map(|_| rng.random::<f64>()).collect();

        let mut mass = vec![1.0; n];
        let mut edges = Vec::with_capacity(graph.edge_count());
        for edge in graph.edge_references() {
            let (a, b) = (edge.source().index(), edge.target().index());
            if a == b {
                continue;
            }
            mass[a] += 1.0;
            mass[b] += 1.0;
            edges.push((a, b, edge.weight().weight));
        }

        Self {
            x,
            y,
            mass,
            dx: vec![0.0; n],
            dy: vec![0.0; n],
            old_dx: vec![0.0; n],
            old_dy: vec![0.0; n],
            edges,
            speed: 1.0,
            speed_efficiency: 1.0,
        }
    }

    fn len(&self) -> usize {
        self.x.len()
    }

    fn step(&mut self, config: &ForceAtlas2Config) {
        if self.len() == 0 {
            return;
        }
        std::mem::swap(&mut self.old_dx, &mut self.dx);
        std::mem::swap(&mut self.old_dy, &mut self.dy);

        let repulsion = self.repulsion(config);
        for (i, (fx, fy)) in repulsion.into_iter().enumerate() {
            self.dx[i] = fx;
            self.dy[i] = fy;
        }
        self.apply_gravity(config);
        self.apply_attraction(config);
        self.adjust_speed(config);
        self.apply_forces(config);
    }

    fn repulsion(&self, config: &ForceAtlas2Config) -> Vec<(f64, f64)> {
        let tree = config
            .barnes_hut_optimize
            .then(|| QuadTree::build(&self.x, &self.y, &self.mass));
        let force_on = |i: usize| self.repulsion_on(i, tree.as_ref(), config);

        if !config.multithread {
            return (0..self.len()).map(force_on).collect();
        }

        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let chunk = self.len().div_ceil(threads).max(1);
        let mut forces = vec![(0.0, 0.0); self.len()];
        let force_on = &force_on;
        std::thread::scope(|scope| {
            for (c, slots) in forces.chunks_mut(chunk).enumerate() {
                scope.spawn(move || {
                    for (k, slot) in slots.iter_mut().enumerate() {
                        *slot = force_on(c * chunk + k);
                    }
                });
            }
        });
        forces
    }

    fn repulsion_on(&self, i: usize, tree: Option<&QuadTree>, config: &ForceAtlas2Config) -> (f64, f64) {
        let kr = config.scaling_ratio;
        let (xi, yi, mi) = (self.x[i], self.y[i], self.mass[i]);
        let (mut fx, mut fy) = (0.0, 0.0);

        let mut body = |j: usize| {
            if j == i {
                return;
            }
            let (xd, yd) = (xi - self.x[j], yi - self.y[j]);
            let distance = (xd * xd + yd * yd).sqrt();
            let factor = if config.prevent_overlapping {
                let gap = distance - 2.0 * NODE_SIZE;
                if gap > 0.0 {
                    kr * mi * self.mass[j] / (gap * gap)
                } else if gap < 0.0 {
                    OVERLAP_REPULSION_BOOST * kr * mi * self.mass[j]
                } else {
                    0.0
                }
            } else if distance > 0.0 {
                kr * mi * self.mass[j] / (distance * distance)
            } else {
                0.0
            };
            fx += xd * factor;
            fy += yd * factor;
        };

        match tree {
            Some(tree) => {
                let mut region_force = (0.0, 0.0);
                tree.visit(xi, yi, config.barnes_hut_theta, &mut body, |mass, cx, cy| {
                    let (xd, yd) = (xi - cx, yi - cy);
                    let distance_sq = xd * xd + yd * yd;
                    if distance_sq > 0.0 {
                        let factor = kr * mi * mass / distance_sq;
                        region_force.0 += xd * factor;
                        region_force.1 += yd * factor;
                    }
                });
                (fx + region_force.0, fy + region_force.1)
            }
            None => {
                (0..self.len()).for_each(&mut body);
                (fx, fy)
            }
        }
    }

    fn apply_gravity(&mut self, config: &ForceAtlas2Config) {
        for i in 0..self.len() {
            let distance = (self.x[i] * self.x[i] + self.y[i] * self.y[i]).sqrt();
            let factor = if config.strong_gravity_mode {
                config.scaling_ratio * self.mass[i] * config.gravity
            } else if distance > 0.0 {
                self.mass[i] * config.gravity / distance
            } else {
                0.0
            };
            self.dx[i] -= self.x[i] * factor;
            self.dy[i] -= self.y[i] * factor;
        }
    }

    fn apply_attraction(&mut self, config: &ForceAtlas2Config) {
        let coefficient = if config.outbound_attraction_distribution {
            self.mass.iter().sum::<f64>() / self.len() as f64
        } else {
            1.0
        };
        let influence = config.edge_weight_influence;
        for &(a, b, weight) in &self.edges {
            let edge_weight = if influence == 0.0 {
                1.0
            } else if influence == 1.0 {
                weight
            } else {
                weight.powf(influence)
            };
            let (xd, yd) = (self.x[a] - self.x[b], self.y[a] - self.y[b]);
            let mut distance = (xd * xd + yd * yd).sqrt();
            if config.prevent_overlapping {
                distance -= 2.0 * NODE_SIZE;
            }
            let mut factor = if config.lin_log_mode {
                if distance > 0.0 {
                    -coefficient * edge_weight * (1.0 + distance).ln() / distance
                } else {
                    0.0
                }
            } else if config.prevent_overlapping && distance <= 0.0 {
                0.0
            } else {
                -coefficient * edge_weight
            };
            if config.outbound_attraction_distribution {
                factor /= self.mass[a];
            }
            self.dx[a] += xd * factor;
            self.dy[a] += yd * factor;
            self.dx[b] -= xd * factor;
            self.dy[b] -= yd * factor;
        }
    }

    fn adjust_speed(&mut self, config: &ForceAtlas2Config) {
        let n = self.len() as f64;
        let (mut swinging, mut traction) = (0.0, 0.0);
        for i in 0..self.len() {
            let swing = ((self.old_dx[i] - self.dx[i]).powi(2) + (self.old_dy[i] - self.dy[i]).powi(2)).sqrt();
            let tract = ((self.old_dx[i] + self.dx[i]).powi(2) + (self.old_dy[i] + self.dy[i]).powi(2)).sqrt();
            swinging += self.mass[i] * swing;
            traction += 0.5 * self.mass[i] * tract;
        }

        let estimated_jitter = 0.05 * n.sqrt();
        let min_jitter = estimated_jitter.sqrt();
        let mut jitter = config.jitter_tolerance
            * min_jitter.max(MAX_JITTER.min(estimated_jitter * traction / (n * n)));

        if traction > 0.0 && swinging / traction > 2.0 {
            if self.speed_efficiency > MIN_SPEED_EFFICIENCY {
                self.speed_efficiency *= 0.5;
            }
            jitter = jitter.max(config.jitter_tolerance);
        }

        let target_speed = if swinging > 0.0 {
            jitter * self.speed_efficiency * traction / swinging
        } else {
            f64::INFINITY
        };

        if swinging > jitter * traction {
            if self.speed_efficiency > MIN_SPEED_EFFICIENCY {
                self.speed_efficiency *= 0.7;
            }
        } else if self.speed < MAX_SPEED {
            self.speed_efficiency *= 1.3;
        }

        self.speed += (target_speed - self.speed).min(MAX_RISE * self.speed);
    }

    fn apply_forces(&mut self, config: &ForceAtlas2Config) {
        for i in 0..self.len() {
            let swinging = self.mass[i]
                * ((self.old_dx[i] - self.dx[i]).powi(2) + (self.old_dy[i] - self.dy[i]).powi(2)).sqrt();
            let mut factor = self.speed / (1.0 + (self.speed * swinging).sqrt());
            if config.prevent_overlapping {
                factor *= 0.1;
                let force = (self.dx[i] * self.dx[i] + self.dy[i] * self.dy[i]).sqrt();
                if force <= 0.0 {
                    continue;
                }
                factor = (factor * force).min(MAX_OVERLAP_DISPLACEMENT) / force;
            }
            self.x[i] += self.dx[i] * factor;
            self.y[i] += self.dy[i] * factor;
        }
    }
}
