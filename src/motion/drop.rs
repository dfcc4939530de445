use motility_common::{SimParams, Vec3};

/// Free-standing spherical droplet centered at the origin.
#[derive(Debug, Clone)]
pub struct DropMode {
    radius: f32,
}

impl DropMode {
    pub fn new(params: &SimParams) -> Self {
        DropMode {
            radius: params.drop_radius,
        }
    }

    /// Specular reflection about the outward normal at the impact point; the
    /// position is projected back onto the sphere surface.
    pub(crate) fn collide(&self, candidate: Vec3, heading: Vec3) -> (Vec3, Vec3, bool) {
        let dist = candidate.length();
        if dist > self.radius {
            let normal = candidate.scale(1.0 / dist);
            (normal.scale(self.radius), heading.reflect(normal), true)
        } else {
            (candidate, heading, false)
        }
    }

    pub fn contains(&self, p: Vec3, tol: f32) -> bool {
        p.length() <= self.radius + tol
    }
}
