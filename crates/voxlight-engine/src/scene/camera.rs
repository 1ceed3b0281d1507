use glam::{Mat4, Quat, Vec3};

use super::volume::Bounds;

/// Perspective scene camera.
///
/// Conventions follow the usual medical-visualization camera: right-handed
/// world, the camera looks from `position` toward `focal_point`, angles are in
/// degrees and `view_angle` is the vertical field of view.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Vec3,
    focal_point: Vec3,
    view_up: Vec3,
    view_angle: f32,
    clipping_range: (f32, f32),
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 1.0),
            focal_point: Vec3::ZERO,
            view_up: Vec3::Y,
            view_angle: 30.0,
            clipping_range: (0.01, 1000.01),
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn focal_point(&self) -> Vec3 {
        self.focal_point
    }

    pub fn set_focal_point(&mut self, focal_point: Vec3) {
        self.focal_point = focal_point;
    }

    pub fn view_up(&self) -> Vec3 {
        self.view_up
    }

    pub fn set_view_up(&mut self, up: Vec3) {
        self.view_up = up.normalize_or(Vec3::Y);
    }

    pub fn view_angle(&self) -> f32 {
        self.view_angle
    }

    pub fn set_view_angle(&mut self, degrees: f32) {
        self.view_angle = degrees.clamp(0.00000001, 179.0);
    }

    /// Near/far clip distances along the view direction.
    pub fn clipping_range(&self) -> (f32, f32) {
        self.clipping_range
    }

    pub fn set_clipping_range(&mut self, near: f32, far: f32) {
        let near = near.max(1e-6);
        self.clipping_range = (near, far.max(near + 1e-6));
    }

    /// Unit vector from the position toward the focal point.
    pub fn direction(&self) -> Vec3 {
        (self.focal_point - self.position).normalize_or(Vec3::NEG_Z)
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.focal_point)
    }

    /// World-to-eye transform.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.focal_point, self.view_up)
    }

    /// Perspective transform whose depth maps `[near, far]` clip distances to
    /// `[nearz, farz]` instead of `[-1, 1]`.
    ///
    /// With `nearz = -1, farz = 1` this is the plain OpenGL projection.
    pub fn projection_transform(&self, aspect: f32, nearz: f32, farz: f32) -> Mat4 {
        let (near, far) = self.clipping_range;
        let mut m = Mat4::perspective_rh_gl(self.view_angle.to_radians(), aspect, near, far);

        if nearz != -1.0 || farz != 1.0 {
            // z' = s * z + t * w
            let s = (farz - nearz) * 0.5;
            let t = (farz + nearz) * 0.5;
            let row_z = m.row(2);
            let row_w = m.row(3);
            let adjusted = row_z * s + row_w * t;
            m.x_axis.z = adjusted.x;
            m.y_axis.z = adjusted.y;
            m.z_axis.z = adjusted.z;
            m.w_axis.z = adjusted.w;
        }
        m
    }

    /// Rotates the position around the view-up axis through the focal point.
    pub fn azimuth(&mut self, degrees: f32) {
        let rotation = Quat::from_axis_angle(self.view_up, degrees.to_radians());
        self.position = self.focal_point + rotation * (self.position - self.focal_point);
    }

    /// Rotates the position around the camera's right axis through the focal point.
    pub fn elevation(&mut self, degrees: f32) {
        let right = self.direction().cross(self.view_up);
        let Some(right) = right.try_normalize() else {
            return;
        };
        let rotation = Quat::from_axis_angle(right, -degrees.to_radians());
        self.position = self.focal_point + rotation * (self.position - self.focal_point);
        self.orthogonalize_view_up();
    }

    /// Moves toward the focal point; `factor > 1` moves closer.
    pub fn dolly(&mut self, factor: f32) {
        if factor <= 0.0 {
            return;
        }
        let offset = self.position - self.focal_point;
        self.position = self.focal_point + offset / factor;
    }

    /// Re-derives `view_up` so it is perpendicular to the view direction.
    pub fn orthogonalize_view_up(&mut self) {
        let dir = self.direction();
        let right = dir.cross(self.view_up);
        if let Some(right) = right.try_normalize() {
            self.view_up = right.cross(dir).normalize_or(Vec3::Y);
        }
    }

    /// Frames `bounds`: focuses on the center, backs off along the current
    /// view direction until the bounding sphere fits, then resets clipping.
    pub fn reset(&mut self, bounds: &Bounds) {
        let center = bounds.center();
        let radius = (bounds.diagonal() * 0.5).max(0.5);
        let distance = radius / (self.view_angle.to_radians() * 0.5).sin();

        let dir = self.direction();
        self.focal_point = center;
        self.position = center - dir * distance;
        self.orthogonalize_view_up();
        self.reset_clipping_range(bounds);
    }

    /// Tightens the clip distances around the box corners.
    pub fn reset_clipping_range(&mut self, bounds: &Bounds) {
        let dir = self.direction();
        let mut near = f32::INFINITY;
        let mut far = f32::NEG_INFINITY;
        for i in 0..8 {
            let d = (bounds.corner(i) - self.position).dot(dir);
            near = near.min(d);
            far = far.max(d);
        }

        // Small margin so the box faces are not clipped exactly at the planes.
        let margin = (far - near).max(1e-3) * 0.005;
        near -= margin;
        far += margin;

        let min_near = far * 0.001;
        self.set_clipping_range(near.max(min_near), far);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Bounds {
        Bounds {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        }
    }

    // ── motion ────────────────────────────────────────────────────────────

    #[test]
    fn azimuth_orbits_focal_point() {
        let mut cam = Camera::new();
        cam.set_position(Vec3::new(0.0, 0.0, 10.0));
        cam.azimuth(90.0);
        assert!(cam.position().abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), 1e-4));
        assert!((cam.distance() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn full_turn_returns_home() {
        let mut cam = Camera::new();
        cam.set_position(Vec3::new(3.0, 1.0, 7.0));
        let start = cam.position();
        for _ in 0..72 {
            cam.azimuth(5.0);
        }
        assert!(cam.position().abs_diff_eq(start, 1e-3));
    }

    #[test]
    fn dolly_scales_distance() {
        let mut cam = Camera::new();
        cam.set_position(Vec3::new(0.0, 0.0, 8.0));
        cam.dolly(2.0);
        assert!((cam.distance() - 4.0).abs() < 1e-5);
        cam.dolly(0.0);
        assert!((cam.distance() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn elevation_keeps_up_orthogonal() {
        let mut cam = Camera::new();
        cam.set_position(Vec3::new(0.0, 0.0, 5.0));
        cam.elevation(30.0);
        assert!(cam.view_up().dot(cam.direction()).abs() < 1e-5);
        assert!((cam.distance() - 5.0).abs() < 1e-4);
    }

    // ── framing ───────────────────────────────────────────────────────────

    #[test]
    fn reset_centers_and_clips_around_bounds() {
        let mut cam = Camera::new();
        let b = Bounds {
            min: Vec3::new(0.0, 0.0, 0.0),
            max: Vec3::new(100.0, 100.0, 50.0),
        };
        cam.reset(&b);

        assert!(cam.focal_point().abs_diff_eq(b.center(), 1e-4));
        let (near, far) = cam.clipping_range();
        assert!(near > 0.0);
        assert!(near < far);
        for i in 0..8 {
            let d = (b.corner(i) - cam.position()).dot(cam.direction());
            assert!(d >= near && d <= far);
        }
    }

    // ── projection ────────────────────────────────────────────────────────

    #[test]
    fn default_depth_range_is_plain_gl() {
        let mut cam = Camera::new();
        cam.set_clipping_range(1.0, 10.0);
        let expected = Mat4::perspective_rh_gl(30f32.to_radians(), 1.5, 1.0, 10.0);
        assert!(cam.projection_transform(1.5, -1.0, 1.0).abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn custom_depth_range_maps_clip_planes() {
        let mut cam = Camera::new();
        cam.reset(&unit_box());
        let (near, far) = cam.clipping_range();
        let m = cam.projection_transform(1.0, 0.0, 1.0);

        let at_near = m * glam::Vec4::new(0.0, 0.0, -near, 1.0);
        let at_far = m * glam::Vec4::new(0.0, 0.0, -far, 1.0);
        assert!((at_near.z / at_near.w).abs() < 1e-4);
        assert!((at_far.z / at_far.w - 1.0).abs() < 1e-4);
    }
}
