//! Single-click picking command

use super::{load_store, CameraArgs};
use crate::config::EmberConfig;
use anyhow::Result;
use ember_render::Camera;
use ember_scene::{Editor, EntityStore, PickResult, Selection};
use std::path::PathBuf;

pub struct PickArgs {
    pub scene: PathBuf,
    pub x: f32,
    pub y: f32,
    pub width: u32,
    pub height: u32,
    pub camera: CameraArgs,
}

pub fn run(args: PickArgs, config: &EmberConfig) -> Result<()> {
    let store = load_store(&args.scene, config)?;
    let width = args.width.max(1) as f32;
    let height = args.height.max(1) as f32;
    let camera = args.camera.build(width / height);

    let mut editor = Editor::new(store, config.picking);
    let result = click(&mut editor, &camera, args.x, args.y, width, height);

    println!("{}", describe(&editor.store, &result));
    Ok(())
}

/// Run one mouse-down through the editor at a pixel
pub fn click(editor: &mut Editor, camera: &Camera, x: f32, y: f32, width: f32, height: f32) -> PickResult {
    let ray = camera.ray_from_screen(x, y, width, height);
    let result = editor.mouse_down(&ray, camera.forward());
    editor.mouse_up();
    result
}

pub fn describe(store: &EntityStore, result: &PickResult) -> String {
    match result {
        PickResult::Axis(grab) => format!("Grabbed {:?} axis of entity {}", grab.axis, grab.entity),
        PickResult::Entity { id, distance } => {
            let name = store.entity(*id).map_or("?", |e| e.name.as_str());
            format!("Selected object '{}' at distance {:.3}", name, distance)
        }
        PickResult::Light { index, distance } => format!(
            "Selected {} at distance {:.3}",
            EntityStore::light_name(*index),
            distance
        ),
        PickResult::Nothing => match store.selection() {
            Selection::None => "Nothing hit; selection cleared".to_string(),
            other => format!("Nothing hit; selection {:?}", other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_scene::{MeshKind, PickConfig};

    fn front_camera() -> Camera {
        CameraArgs {
            distance: Some(10.0),
            yaw: Some(0.0),
            pitch: Some(0.0),
            target: Some([0.0, 0.0, 0.0]),
            fov: None,
        }
        .build(1.0)
    }

    #[test]
    fn center_click_selects_cube() {
        let mut store = EntityStore::new();
        store.add_entity_of_kind(MeshKind::Cube, "Box");
        let mut editor = Editor::new(store, PickConfig::default());

        let result = click(&mut editor, &front_camera(), 50.0, 50.0, 100.0, 100.0);
        assert!(matches!(result, PickResult::Entity { .. }));
        assert_eq!(editor.store.selected_entity().map(|e| e.name.as_str()), Some("Box"));
        assert!(describe(&editor.store, &result).contains("'Box'"));
    }

    #[test]
    fn corner_click_clears_selection() {
        let mut store = EntityStore::new();
        let id = store.add_entity_of_kind(MeshKind::Cube, "Box");
        store.select_entity(id);
        let mut editor = Editor::new(store, PickConfig::default());

        let result = click(&mut editor, &front_camera(), 0.0, 0.0, 100.0, 100.0);
        assert_eq!(result, PickResult::Nothing);
        assert_eq!(editor.store.selection(), Selection::None);
        assert_eq!(describe(&editor.store, &result), "Nothing hit; selection cleared");
    }
}
