use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::math::EulerRot;
use bevy::prelude::*;

#[derive(Resource, Debug, Clone)]
pub struct OrbitCamera {
    pub focus_point: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl OrbitCamera {
    pub fn new(focus_point: Vec3, distance: f32) -> Self {
        Self {
            focus_point,
            distance,
            yaw: 0.6,
            pitch: -0.4,
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Eye position: `distance` behind the focus point along the view direction.
    pub fn eye_position(&self) -> Vec3 {
        self.focus_point + self.rotation() * Vec3::Z * self.distance
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.eye_position()).with_rotation(self.rotation())
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 30.0)
    }
}

pub fn orbit_camera_controller(
    mut camera_query: Query<&mut Transform, With<Camera3d>>,
    mut orbit: ResMut<OrbitCamera>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
) {
    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };

    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    if mouse_button.pressed(MouseButton::Right) && mouse_delta != Vec2::ZERO {
        orbit.yaw -= mouse_delta.x * 0.0035;
        orbit.pitch = (orbit.pitch - mouse_delta.y * 0.003).clamp(-1.55, 1.55);
    }

    let mut scroll_accum = 0.0;
    for ev in scroll_events.read() {
        scroll_accum += match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y * 0.05,
        };
    }
    if scroll_accum.abs() > f32::EPSILON {
        let zoom = (orbit.distance * 0.1).clamp(0.1, 50.0);
        orbit.distance = (orbit.distance - scroll_accum * zoom).max(0.5);
    }

    // WASD pans the focus point in the horizontal plane, Q/E move it vertically
    let mut move_input = Vec3::ZERO;
    if keyboard.pressed(KeyCode::KeyW) {
        move_input.z -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        move_input.z += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        move_input.x += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) {
        move_input.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyE) {
        move_input.y += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyQ) {
        move_input.y -= 1.0;
    }

    if move_input != Vec3::ZERO {
        let heading = Quat::from_rotation_y(orbit.yaw);
        let mut speed = (orbit.distance * 0.5).clamp(1.0, 100.0);
        if keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]) {
            speed *= 3.5;
        }
        let world_delta = heading * Vec3::new(move_input.x, 0.0, move_input.z) + Vec3::Y * move_input.y;
        orbit.focus_point += world_delta.normalize() * speed * time.delta_secs();
    }

    *camera_transform = orbit.transform();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_camera_sits_behind_focus() {
        let orbit = OrbitCamera {
            focus_point: Vec3::new(1.0, 2.0, 3.0),
            distance: 10.0,
            yaw: 0.0,
            pitch: 0.0,
        };
        assert!((orbit.eye_position() - Vec3::new(1.0, 2.0, 13.0)).length() < 1e-5);
    }

    #[test]
    fn camera_looks_at_focus() {
        let orbit = OrbitCamera::new(Vec3::new(-4.0, 1.0, 2.0), 25.0);
        let transform = orbit.transform();
        let to_focus = (orbit.focus_point - transform.translation).normalize();
        assert!(to_focus.dot(*transform.forward()) > 0.9999);
        assert!((transform.translation.distance(orbit.focus_point) - 25.0).abs() < 1e-4);
    }
}
