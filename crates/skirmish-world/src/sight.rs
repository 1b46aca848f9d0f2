use crate::obstacles::{Obstacle, ObstacleField};

impl ObstacleField {
    /// Whether the planar segment `(x1, z1) -> (x2, z2)` passes no obstacle.
    ///
    /// Each obstacle center is projected onto the segment. Obstacles whose
    /// projection falls outside the segment are skipped; otherwise the
    /// closest point is tested against the footprint. Heights are ignored.
    pub fn is_clear(&self, x1: f32, z1: f32, x2: f32, z2: f32) -> bool {
        let dx = x2 - x1;
        let dz = z2 - z1;
        let length = (dx * dx + dz * dz).sqrt();
        if length <= f32::EPSILON {
            return true;
        }
        let dir_x = dx / length;
        let dir_z = dz / length;

        !self
            .obstacles()
            .iter()
            .any(|o| occludes(o, x1, z1, dir_x, dir_z, length))
    }
}

fn occludes(o: &Obstacle, x1: f32, z1: f32, dir_x: f32, dir_z: f32, length: f32) -> bool {
    let along = (o.x - x1) * dir_x + (o.z - z1) * dir_z;
    if !(0.0..=length).contains(&along) {
        return false;
    }
    let closest_x = x1 + dir_x * along;
    let closest_z = z1 + dir_z * along;
    (closest_x - o.x).abs() < o.half_width() && (closest_z - o.z).abs() < o.half_depth()
}
