use cgmath::{InnerSpace, Matrix4, Point3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Uniform light with no direction
    Ambient,
    /// Parallel rays from `position` towards `target`
    Directional {
        position: Vector3<f32>,
        target: Vector3<f32>,
    },
    /// Omni light fading to zero at `range`
    Point { position: Vector3<f32>, range: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: [f32; 3],
    pub intensity: f32,
    pub cast_shadow: bool,
}

impl Light {
    pub fn ambient(color: [f32; 3], intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            color,
            intensity,
            cast_shadow: false,
        }
    }

    /// Directional light aimed at the world origin
    pub fn directional(color: [f32; 3], intensity: f32, position: Vector3<f32>) -> Self {
        Self {
            kind: LightKind::Directional {
                position,
                target: Vector3::new(0.0, 0.0, 0.0),
            },
            color,
            intensity,
            cast_shadow: false,
        }
    }

    pub fn point(color: [f32; 3], intensity: f32, range: f32, position: Vector3<f32>) -> Self {
        Self {
            kind: LightKind::Point { position, range },
            color,
            intensity,
            cast_shadow: false,
        }
    }

    pub fn with_shadows(mut self) -> Self {
        self.cast_shadow = true;
        self
    }

    /// Color premultiplied by intensity
    pub fn radiance(&self) -> [f32; 3] {
        [
            self.color[0] * self.intensity,
            self.color[1] * self.intensity,
            self.color[2] * self.intensity,
        ]
    }

    /// Unit vector the light travels along, for directional lights
    pub fn direction(&self) -> Option<Vector3<f32>> {
        match self.kind {
            LightKind::Directional { position, target } => Some((target - position).normalize()),
            _ => None,
        }
    }

    /// Orthographic view-projection covering a cube of `half_extent` around
    /// the target, seen along the light direction
    ///
    /// Used to render the shadow map of a directional light.
    pub fn shadow_view_proj(&self, half_extent: f32) -> Option<Matrix4<f32>> {
        let LightKind::Directional { target, .. } = self.kind else {
            return None;
        };
        let dir = self.direction()?;

        // Pull the eye back so casters on the far side of the light's
        // nominal position still land inside the depth range
        let eye = target - dir * half_extent * 2.0;
        let up = if dir.y.abs() > 0.99 {
            Vector3::unit_z()
        } else {
            Vector3::unit_y()
        };
        let view = Matrix4::look_at_rh(
            Point3::new(eye.x, eye.y, eye.z),
            Point3::new(target.x, target.y, target.z),
            up,
        );
        let proj = cgmath::ortho(
            -half_extent,
            half_extent,
            -half_extent,
            half_extent,
            0.1,
            half_extent * 4.0,
        );

        Some(crate::gfx::camera::OPENGL_TO_WGPU_MATRIX * proj * view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directional_light_points_at_origin() {
        let light = Light::directional([1.0; 3], 1.0, Vector3::new(0.0, 10.0, 0.0));
        let dir = light.direction().unwrap();
        assert!((dir - Vector3::new(0.0, -1.0, 0.0)).magnitude() < 1e-6);
        assert!(light.shadow_view_proj(50.0).is_some());
    }

    #[test]
    fn test_ambient_light_has_no_direction_or_shadow() {
        let light = Light::ambient([0.25; 3], 2.0);
        assert!(light.direction().is_none());
        assert!(light.shadow_view_proj(50.0).is_none());
        assert!(!light.cast_shadow);
        assert_eq!(light.radiance(), [0.5; 3]);
    }
}
