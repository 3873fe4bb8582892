pub mod draw;

use bevy::{app::PluginGroupBuilder, prelude::*};
use bevy_editor_pls::prelude::EditorPlugin;
use bevy_inspector_egui_rapier::InspectableRapierPlugin;
use bevy_prototype_debug_lines::DebugLinesPlugin;

use draw::*;

#[derive(Debug)]
/// Development plugins intended for debug builds use.
pub struct DeveloperPlugins;

impl PluginGroup for DeveloperPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::start::<Self>()
            .add(EditorPlugin)
            .add(InspectableRapierPlugin)
            .add(DebugLinesPlugin::default())
            .add(DebugDrawPlugin)
    }
}

#[derive(Debug)]
/// Debug overlays for the portal walls.
pub struct DebugDrawPlugin;

impl Plugin for DebugDrawPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DebugDrawSettings>()
            .add_system(toggle_debug_draw)
            .add_system(draw_portal_bounds.after(toggle_debug_draw));
    }
}
