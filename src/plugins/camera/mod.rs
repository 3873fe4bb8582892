//! Field of view zoom for the first person camera.

use std::time::Duration;

use bevy::{app::AppExit, prelude::*, render::camera::Projection};
use leafwing_input_manager::prelude::*;

use crate::plugins::{
    config::GameplayConfig,
    first_person_controller::{FirstPersonController, FirstPersonLabels},
    input::Actions,
    lerp::{LerpJob, LerpTimer},
};

#[derive(Debug)]
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_system(
            toggle_zoom
                .label(CameraLabels::ToggleZoom)
                .after(FirstPersonLabels::ProcessInputs),
        )
        .add_system(animate_field_of_view.after(CameraLabels::ToggleZoom))
        .add_system(cancel_fov_transitions_on_exit);
    }
}

#[derive(Debug, SystemLabel)]
pub enum CameraLabels {
    ToggleZoom,
}

#[derive(Debug, Component)]
/// Animated field of view of a perspective camera, in radians.
pub struct FieldOfView {
    current: f32,
    zoomed: bool,
    transition: Option<LerpTimer<f32>>,
}

impl FieldOfView {
    pub fn new(fov: f32) -> FieldOfView {
        FieldOfView {
            current: fov,
            zoomed: false,
            transition: None,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoomed
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Animate from the current field of view to `target`, replacing any running transition.
    pub fn transition_to(&mut self, target: f32, duration: f32, steps: u32) {
        self.transition = Some(LerpTimer::new(LerpJob::with_timing(
            self.current,
            target,
            duration,
            steps,
        )));
    }

    /// Flip between the zoomed and default field of view.
    pub fn toggle_zoom(&mut self, default_fov: f32, zoom_fov: f32, duration: f32, steps: u32) {
        self.zoomed = !self.zoomed;
        let target = if self.zoomed { zoom_fov } else { default_fov };
        self.transition_to(target, duration, steps);
    }

    /// Advance the running transition, returning the new field of view when it changed. The
    /// transition is dropped once it reaches its target.
    pub fn advance(&mut self, delta: Duration) -> Option<f32> {
        let step = self.transition.as_mut()?.advance(delta)?;
        self.current = *step.value();
        if step.is_finished() {
            self.transition = None;
        }
        Some(self.current)
    }

    /// Stop the running transition, if any, leaving the field of view where it is.
    pub fn cancel(&mut self) {
        self.transition = None;
    }
}

fn toggle_zoom(
    config: Res<GameplayConfig>,
    players: Query<(&ActionState<Actions>, &FirstPersonController)>,
    mut cameras: Query<&mut FieldOfView>,
) {
    for (input_state, controller) in &players {
        if input_state.just_pressed(Actions::Zoom) {
            if let Ok(mut fov) = cameras.get_mut(controller.camera) {
                fov.toggle_zoom(
                    config.camera.default_fov_degrees.to_radians(),
                    config.camera.zoom_fov_degrees.to_radians(),
                    config.lerp.duration,
                    config.lerp.steps,
                );
                debug!(
                    "Zoom {} from {:.0} degrees",
                    if fov.is_zoomed() { "in" } else { "out" },
                    fov.current().to_degrees()
                );
            }
        }
    }
}

fn animate_field_of_view(
    time: Res<Time>,
    mut cameras: Query<(&mut FieldOfView, &mut Projection)>,
) {
    for (mut fov, mut projection) in &mut cameras {
        if !fov.is_animating() {
            continue;
        }
        if let Some(value) = fov.advance(time.delta()) {
            if let Projection::Perspective(perspective) = &mut *projection {
                perspective.fov = value;
            }
        }
    }
}

fn cancel_fov_transitions_on_exit(
    mut exit_events: EventReader<AppExit>,
    mut cameras: Query<&mut FieldOfView>,
) {
    if exit_events.iter().next().is_some() {
        for mut fov in &mut cameras {
            fov.cancel();
        }
    }
}
