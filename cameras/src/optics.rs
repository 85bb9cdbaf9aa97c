//! Geometric Optics

use lenscore::geometry::*;
use lenscore::pbrt::*;

/// Intersects a ray with a sphere and returns the hit point.
///
/// Which of the two roots is returned depends on the sign of `radius` so that
/// the vertex side of the surface is hit by a ray travelling along +z, from
/// the film out through the front of the lens. `reverse` selects the other
/// root, used when tracing from the scene back towards the film.
///
/// When `enforce` is false a ray that misses the sphere still returns a point
/// by taking the magnitude of the negative discriminant. Only paraxial
/// calibration rays use this.
///
/// * `ray`     - The ray. Its direction need not be normalized.
/// * `center`  - Center of the sphere.
/// * `radius`  - Signed radius of curvature.
/// * `reverse` - Select the root for a ray travelling along +z.
/// * `enforce` - Report a miss when the ray does not reach the sphere.
pub fn intersect_sphere(
    ray: &Ray,
    center: &Point3f,
    radius: Float,
    reverse: bool,
    enforce: bool,
) -> Option<Point3f> {
    let d = ray.d.normalize();
    let l = *center - ray.o;
    let tca = l.dot(&d);
    let d2 = l.dot(&l) - tca * tca;
    let radius2 = radius * radius;

    if enforce && d2 > radius2 {
        return None;
    }

    let thc = abs(radius2 - d2).sqrt();
    let t = if reverse {
        tca - thc * sgn(radius)
    } else {
        tca + thc * sgn(radius)
    };
    Some(ray.o + d * t)
}

/// Returns the unit normal of a spherical surface at a hit point, pointing
/// back into the medium the ray came from.
///
/// * `hit`    - Point on the sphere.
/// * `center` - Center of the sphere.
/// * `radius` - Signed radius of curvature.
pub fn surface_normal(hit: &Point3f, center: &Point3f, radius: Float) -> Vector3f {
    (*center - *hit).normalize() * sgn(radius)
}

/// Result of refracting a direction at an interface.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Refraction {
    /// The refracted direction.
    Transmitted(Vector3f),

    /// The ray was totally internally reflected.
    TotalInternalReflection,
}

/// Refracts a direction at an interface between two media with Snell's law.
///
/// An `ior2` of exactly 1 is treated as air and the ratio becomes `ior1`.
/// Total internal reflection is only reported when `enforce` is set and the
/// ray leaves a denser medium; otherwise the magnitude of the negative
/// radicand is used.
///
/// * `ior1`     - Index of refraction of the incident medium.
/// * `ior2`     - Index of refraction of the transmitted medium.
/// * `incident` - Incident direction.
/// * `normal`   - Surface normal facing the incident medium.
/// * `enforce`  - Report total internal reflection.
pub fn refract(
    ior1: Float,
    ior2: Float,
    incident: &Vector3f,
    normal: &Vector3f,
    enforce: bool,
) -> Refraction {
    let i = incident.normalize();
    let n = normal.normalize();

    let eta = if ior2 == 1.0 { ior1 } else { ior1 / ior2 };
    let cos_theta1 = -i.dot(&n);
    let sin2_theta2 = eta * eta * (1.0 - cos_theta1 * cos_theta1);

    if enforce && ior1 > ior2 && sin2_theta2 > 1.0 {
        return Refraction::TotalInternalReflection;
    }

    let cos_theta2 = abs(1.0 - sin2_theta2).sqrt();
    Refraction::Transmitted(i * eta + n * (eta * cos_theta1 - cos_theta2))
}

/// Intersects two lines in the y-z plane and returns the z-coordinate of the
/// crossing, or `None` for parallel lines. Each line is given by two points.
///
/// * `a0` - First point on line a.
/// * `a1` - Second point on line a.
/// * `b0` - First point on line b.
/// * `b1` - Second point on line b.
pub fn line_intersection_z(a0: &Point3f, a1: &Point3f, b0: &Point3f, b1: &Point3f) -> Option<Float> {
    // Lines as A z + B y = C with z as the first coordinate.
    let a_a = a1.y - a0.y;
    let b_a = a0.z - a1.z;
    let c_a = a_a * a0.z + b_a * a0.y;

    let a_b = b1.y - b0.y;
    let b_b = b0.z - b1.z;
    let c_b = a_b * b0.z + b_b * b0.y;

    let det = a_a * b_b - a_b * b_a;
    if det == 0.0 {
        None
    } else {
        Some((b_b * c_a - b_a * c_b) / det)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
