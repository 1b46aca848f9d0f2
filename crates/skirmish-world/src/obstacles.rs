use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Footprint edge length of every generated obstacle.
pub const OBSTACLE_SIZE: f32 = 5.0;

/// Side length of the square area obstacles are scattered over.
const SCATTER_EXTENT: f64 = 150.0;

/// Deterministic linear-congruential generator shared with the web client.
///
/// Produces the same sequence as the renderer for the same seed, so both
/// sides place obstacles identically without sending the map over the wire.
#[derive(Debug, Clone)]
pub struct MapRng {
    state: u64,
}

impl MapRng {
    const MULTIPLIER: u64 = 9301;
    const INCREMENT: u64 = 49297;
    const MODULUS: u64 = 233_280;

    pub fn new(seed: u32) -> Self {
        Self {
            state: u64::from(seed),
        }
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * Self::MULTIPLIER + Self::INCREMENT) % Self::MODULUS;
        self.state as f64 / Self::MODULUS as f64
    }
}

/// Static axis-aligned box on the XZ plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f32,
    pub z: f32,
    pub width: f32,
    pub depth: f32,
    /// Rendered height. Ignored by sight checks.
    pub height: f32,
}

impl Obstacle {
    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }

    pub fn half_depth(&self) -> f32 {
        self.depth / 2.0
    }
}

/// Generate the obstacle layout for a map seed.
///
/// Each obstacle draws height, then x, then z from the generator.
pub fn generate_obstacles(seed: u32, count: usize) -> Vec<Obstacle> {
    let mut rng = MapRng::new(seed);
    (0..count)
        .map(|_| {
            let height = 5.0 + rng.next_f64() * 10.0;
            let x = (rng.next_f64() - 0.5) * SCATTER_EXTENT;
            let z = (rng.next_f64() - 0.5) * SCATTER_EXTENT;
            Obstacle {
                x: x as f32,
                z: z as f32,
                width: OBSTACLE_SIZE,
                depth: OBSTACLE_SIZE,
                height: height as f32,
            }
        })
        .collect()
}

/// Immutable obstacle set shared by every reader without locking.
#[derive(Debug, Clone)]
pub struct ObstacleField {
    obstacles: Arc<[Obstacle]>,
}

impl ObstacleField {
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self {
            obstacles: obstacles.into(),
        }
    }

    pub fn generate(seed: u32, count: usize) -> Self {
        Self::new(generate_obstacles(seed, count))
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcg_first_values_for_default_seed() {
        let mut rng = MapRng::new(12345);
        // (12345 * 9301 + 49297) % 233280 = 96382
        assert!((rng.next_f64() - 96_382.0 / 233_280.0).abs() < 1e-12);
        // (96382 * 9301 + 49297) % 233280 = 3239
        assert!((rng.next_f64() - 3_239.0 / 233_280.0).abs() < 1e-12);
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate_obstacles(12345, 40);
        let b = generate_obstacles(12345, 40);
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
        assert_ne!(a, generate_obstacles(54321, 40));
    }

    #[test]
    fn obstacles_stay_inside_scatter_area() {
        for o in generate_obstacles(12345, 40) {
            assert!(o.x.abs() <= 75.0 && o.z.abs() <= 75.0);
            assert!((5.0..15.0).contains(&o.height));
            assert_eq!(o.half_width(), 2.5);
            assert_eq!(o.half_depth(), 2.5);
        }
    }

    #[test]
    fn first_obstacle_uses_height_then_x_then_z() {
        let o = generate_obstacles(12345, 1)[0];
        let expected_h = 5.0 + (96_382.0 / 233_280.0) * 10.0;
        let expected_x = (3_239.0 / 233_280.0 - 0.5) * 150.0;
        assert!((o.height as f64 - expected_h).abs() < 1e-4);
        assert!((o.x as f64 - expected_x).abs() < 1e-3);
    }

    #[test]
    fn field_clones_share_storage() {
        let field = ObstacleField::generate(12345, 40);
        let copy = field.clone();
        assert!(std::ptr::eq(field.obstacles(), copy.obstacles()));
        assert_eq!(copy.len(), 40);
    }
}
