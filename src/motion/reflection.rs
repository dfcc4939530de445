use crate::motion::cube::{box_contains, reflect_into_box};
use motility_common::{SimParams, Vec3};

/// Generic reflective box container. Same reflection policy as the cube but
/// without surface adhesion; used as a fallback and testing mode.
#[derive(Debug, Clone)]
pub struct ReflectionMode {
    min: Vec3,
    max: Vec3,
}

impl ReflectionMode {
    pub fn new(params: &SimParams) -> Self {
        ReflectionMode {
            min: Vec3::new(params.x_min, params.y_min, params.z_min),
            max: Vec3::new(params.x_max, params.y_max, params.z_max),
        }
    }

    pub(crate) fn collide(&self, candidate: Vec3, heading: Vec3) -> (Vec3, Vec3, bool) {
        reflect_into_box(candidate, heading, self.min, self.max)
    }

    pub fn contains(&self, p: Vec3, tol: f32) -> bool {
        box_contains(p, self.min, self.max, tol)
    }
}
