use motility_common::{SimParams, Vec3};

/// Spherical-cap droplet resting on a flat surface.
///
/// Two boundary types: the flat base plane at `z = base_height` and the
/// curved cap surface of radius `radius` (sphere centered at the origin).
#[derive(Debug, Clone)]
pub struct SpotMode {
    radius: f32,
    base_height: f32,
    base_radius: f32,
}

impl SpotMode {
    pub fn new(params: &SimParams) -> Self {
        SpotMode {
            radius: params.spot_radius,
            base_height: params.spot_base_height,
            base_radius: params.spot_base_radius,
        }
    }

    pub(crate) fn collide(&self, mut p: Vec3, mut h: Vec3) -> (Vec3, Vec3, bool) {
        let mut contact = false;

        // Base plane first: flip the vertical heading component and clamp.
        if p.z < self.base_height {
            p.z = self.base_height;
            h.z = -h.z;
            contact = true;
        }

        // Curved cap surface, as in the free droplet.
        let dist = p.length();
        if dist > self.radius {
            let normal = p.scale(1.0 / dist);
            h = h.reflect(normal);
            p = normal.scale(self.radius);
            contact = true;

            // An impact below the contact line lands on the rim circle.
            if p.z < self.base_height {
                let r_xy = (p.x * p.x + p.y * p.y).sqrt();
                if r_xy > 1e-12 {
                    let s = self.base_radius / r_xy;
                    p.x *= s;
                    p.y *= s;
                } else {
                    p.x = self.base_radius;
                    p.y = 0.0;
                }
                p.z = self.base_height;
                if h.z < 0.0 {
                    h.z = -h.z;
                }
            }
        }

        (p, h, contact)
    }

    pub fn contains(&self, p: Vec3, tol: f32) -> bool {
        p.length() <= self.radius + tol && p.z >= self.base_height - tol
    }
}
