//! Wavefront OBJ importer backend.
//!
//! OBJ files carry no node hierarchy, so every model in the file becomes
//! one child of a synthetic root node named after the file. Triangulation
//! and index unification are delegated to tobj's load options; the
//! remaining post-process steps run on the extracted records.

use std::path::Path;

use super::{ImportError, ImportOptions, MeshRecord, NodeRecord, SceneGraph, postprocess};

pub(crate) fn load_scene(path: &str, options: &ImportOptions) -> Result<SceneGraph, ImportError> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: options.triangulate,
            single_index: true,
            ..Default::default()
        },
    )?;

    let mut meshes = Vec::with_capacity(models.len());
    let mut children = Vec::with_capacity(models.len());

    for (i, m) in models.into_iter().enumerate() {
        let name = if m.name.is_empty() {
            format!("mesh_{}", i)
        } else {
            m.name.clone()
        };

        let positions = m
            .mesh
            .positions
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect::<Vec<_>>();
        let normals = m
            .mesh
            .normals
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect::<Vec<_>>();
        let texcoords = m
            .mesh
            .texcoords
            .chunks_exact(2)
            .map(|c| [c[0], c[1]])
            .collect::<Vec<_>>();
        let faces = m
            .mesh
            .indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect::<Vec<_>>();

        let mut record = MeshRecord {
            name: name.clone(),
            positions,
            normals,
            texcoords,
            tangents: Vec::new(),
            faces,
        };
        postprocess::apply(&mut record, options);

        children.push(NodeRecord {
            name,
            mesh_indices: vec![meshes.len()],
            children: Vec::new(),
        });
        meshes.push(record);
    }

    let root_name = Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string();

    Ok(SceneGraph {
        root: NodeRecord {
            name: root_name,
            mesh_indices: Vec::new(),
            children,
        },
        meshes,
    })
}
