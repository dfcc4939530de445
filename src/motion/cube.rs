use motility_common::{SimParams, Vec3};

/// Axis-aligned box response shared by the cube and reflection containers:
/// a crossed face flips that heading component and clamps the coordinate to
/// the face.
pub(crate) fn reflect_into_box(mut p: Vec3, mut h: Vec3, min: Vec3, max: Vec3) -> (Vec3, Vec3, bool) {
    let mut contact = false;
    if p.x < min.x {
        p.x = min.x;
        h.x = -h.x;
        contact = true;
    } else if p.x > max.x {
        p.x = max.x;
        h.x = -h.x;
        contact = true;
    }
    if p.y < min.y {
        p.y = min.y;
        h.y = -h.y;
        contact = true;
    } else if p.y > max.y {
        p.y = max.y;
        h.y = -h.y;
        contact = true;
    }
    if p.z < min.z {
        p.z = min.z;
        h.z = -h.z;
        contact = true;
    } else if p.z > max.z {
        p.z = max.z;
        h.z = -h.z;
        contact = true;
    }
    (p, h, contact)
}

pub(crate) fn box_contains(p: Vec3, min: Vec3, max: Vec3, tol: f32) -> bool {
    p.x >= min.x - tol
        && p.x <= max.x + tol
        && p.y >= min.y - tol
        && p.y <= max.y + tol
        && p.z >= min.z - tol
        && p.z <= max.z + tol
}

/// Cubic vessel.
#[derive(Debug, Clone)]
pub struct CubeMode {
    min: Vec3,
    max: Vec3,
}

impl CubeMode {
    pub fn new(params: &SimParams) -> Self {
        CubeMode {
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
