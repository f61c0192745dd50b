//! End-to-end import of a glTF hierarchy: a meshless root with two mesh
//! children, backed by an external binary buffer.

use std::{env, fs, path::PathBuf};

use meshview::resources::{ImportOptions, import_scene};

fn fixture_dir(name: &str) -> PathBuf {
    let mut dir = env::temp_dir();
    dir.push(format!("meshview-gltf-{}-{}", std::process::id(), name));
    fs::create_dir_all(&dir).expect("Failed to create the fixture directory");
    dir
}

fn triangle_bin() -> Vec<u8> {
    let mut bin = Vec::new();
    for position in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        for component in position {
            bin.extend_from_slice(&component.to_le_bytes());
        }
    }
    for index in [0u32, 1, 2] {
        bin.extend_from_slice(&index.to_le_bytes());
    }
    bin
}

const TWO_CHILD_SCENE: &str = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [
    { "name": "root", "children": [1, 2] },
    { "name": "first", "mesh": 0 },
    { "name": "second", "mesh": 1 }
  ],
  "meshes": [
    { "name": "tri_a", "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }] },
    { "name": "tri_b", "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }] }
  ],
  "accessors": [
    { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
    { "bufferView": 1, "componentType": 5125, "count": 3, "type": "SCALAR" }
  ],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
    { "buffer": 0, "byteOffset": 36, "byteLength": 12 }
  ],
  "buffers": [{ "uri": "tri.bin", "byteLength": 48 }]
}"#;

#[test]
fn meshless_root_with_two_children_yields_two_records() {
    let dir = fixture_dir("two-children");
    let gltf_path = dir.join("scene.gltf");
    fs::write(&gltf_path, TWO_CHILD_SCENE).unwrap();
    fs::write(dir.join("tri.bin"), triangle_bin()).unwrap();

    let graph = import_scene(gltf_path.to_str().unwrap(), &ImportOptions::default())
        .expect("the glTF scene should import");

    assert_eq!(graph.meshes.len(), 2);
    assert_eq!(graph.root.name, "root");
    assert!(graph.root.mesh_indices.is_empty());
    assert_eq!(graph.root.children.len(), 2);
    assert_eq!(graph.root.children[0].name, "first");
    assert_eq!(graph.root.children[1].name, "second");

    // Child declaration order is the draw order.
    let order: Vec<&str> = graph.flatten().iter().map(|m| m.name.as_str()).collect();
    assert_eq!(order, ["tri_a", "tri_b"]);

    for record in graph.flatten() {
        assert_eq!(record.positions.len(), 3);
        assert_eq!(record.faces, vec![[0, 1, 2]]);
        // The file carries no normals, so smooth normals were generated;
        // the triangle lies in the z = 0 plane.
        assert_eq!(record.normals.len(), 3);
        for n in &record.normals {
            assert!((n[2].abs() - 1.0).abs() < 1e-5, "normal was {:?}", n);
        }
        let (vertices, indices) = record.build_geometry().unwrap();
        assert_eq!(vertices.len(), 3);
        assert_eq!(indices, vec![0, 1, 2]);
    }

    fs::remove_dir_all(dir).ok();
}

#[test]
fn gltf_with_missing_buffer_file_fails() {
    let dir = fixture_dir("missing-buffer");
    let gltf_path = dir.join("scene.gltf");
    fs::write(&gltf_path, TWO_CHILD_SCENE).unwrap();
    // tri.bin is deliberately absent.

    let result = import_scene(gltf_path.to_str().unwrap(), &ImportOptions::default());
    assert!(result.is_err());

    fs::remove_dir_all(dir).ok();
}

#[test]
fn unparsable_gltf_fails_without_panicking() {
    let dir = fixture_dir("garbage");
    let gltf_path = dir.join("scene.gltf");
    fs::write(&gltf_path, "this is not a scene description").unwrap();

    let result = import_scene(gltf_path.to_str().unwrap(), &ImportOptions::default());
    assert!(result.is_err());

    fs::remove_dir_all(dir).ok();
}
