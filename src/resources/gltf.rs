//! glTF importer backend.
//!
//! Produces one mesh record per triangle primitive and mirrors the file's
//! node hierarchy. Buffers referenced by URI are resolved relative to the
//! scene file; binary blobs come straight from the container.

use std::{
    collections::HashMap,
    io::{BufReader, Cursor},
    path::Path,
};

use gltf::Gltf;

use super::{ImportError, ImportOptions, MeshRecord, NodeRecord, SceneGraph, postprocess};

pub(crate) fn load_scene(path: &str, options: &ImportOptions) -> Result<SceneGraph, ImportError> {
    let bytes = std::fs::read(path).map_err(|source| ImportError::Io {
        path: path.to_string(),
        source,
    })?;
    let gltf = Gltf::from_reader(BufReader::new(Cursor::new(bytes)))?;

    let base_dir = Path::new(path).parent().unwrap_or_else(|| Path::new("."));
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                if let Some(blob) = gltf.blob.as_deref() {
                    buffer_data.push(blob.to_vec());
                }
            }
            gltf::buffer::Source::Uri(uri) => {
                let buffer_path = base_dir.join(uri);
                let bin = std::fs::read(&buffer_path).map_err(|source| ImportError::Io {
                    path: buffer_path.display().to_string(),
                    source,
                })?;
                buffer_data.push(bin);
            }
        }
    }

    // Records in document order; a (mesh, primitive) pair maps to its slot
    // in the record table so nodes can reference it.
    let mut meshes = Vec::new();
    let mut record_slots: HashMap<(usize, usize), usize> = HashMap::new();

    for mesh in gltf.meshes() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping non-triangle primitive {} of mesh {:?} in {}",
                    primitive.index(),
                    mesh.name(),
                    path
                );
                continue;
            }

            let reader = primitive.reader(|buffer| buffer_data.get(buffer.index()).map(|b| b.as_slice()));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .map(|iter| iter.collect())
                .unwrap_or_default();
            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|iter| iter.collect())
                .unwrap_or_default();
            let texcoords: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|iter| iter.into_f32().collect())
                .unwrap_or_default();
            // glTF tangents are vec4 with the bitangent sign in w.
            let tangents: Vec<[f32; 3]> = reader
                .read_tangents()
                .map(|iter| iter.map(|t| [t[0], t[1], t[2]]).collect())
                .unwrap_or_default();
            let indices: Vec<u32> = match reader.read_indices() {
                Some(raw) => raw.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            let faces = indices
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect::<Vec<_>>();

            let base_name = mesh
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
            let name = if mesh.primitives().len() > 1 {
                format!("{}/{}", base_name, primitive.index())
            } else {
                base_name
            };

            let mut record = MeshRecord {
                name,
                positions,
                normals,
                texcoords,
                tangents,
                faces,
            };
            postprocess::apply(&mut record, options);

            record_slots.insert((mesh.index(), primitive.index()), meshes.len());
            meshes.push(record);
        }
    }

    let scene = gltf.default_scene().or_else(|| gltf.scenes().next());
    let mut roots: Vec<NodeRecord> = scene
        .iter()
        .flat_map(|s| s.nodes())
        .map(|node| node_record(&node, &record_slots))
        .collect();

    let root = if roots.len() == 1 {
        roots.remove(0)
    } else {
        NodeRecord {
            name: Path::new(path)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(path)
                .to_string(),
            mesh_indices: Vec::new(),
            children: roots,
        }
    };

    Ok(SceneGraph { root, meshes })
}

fn node_record(node: &gltf::Node, record_slots: &HashMap<(usize, usize), usize>) -> NodeRecord {
    let mesh_indices = node
        .mesh()
        .map(|mesh| {
            mesh.primitives()
                .filter_map(|primitive| {
                    record_slots
                        .get(&(mesh.index(), primitive.index()))
                        .copied()
                })
                .collect()
        })
        .unwrap_or_default();

    NodeRecord {
        name: node.name().unwrap_or("").to_string(),
        mesh_indices,
        children: node
            .children()
            .map(|child| node_record(&child, record_slots))
            .collect(),
    }
}
