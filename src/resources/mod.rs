//! Loading of scene files into GPU-resident models.
//!
//! This module is the importer boundary: [`import_scene`] turns a model
//! file into a [`SceneGraph`] (a node hierarchy plus a flat mesh record
//! table), and [`load_model`] flattens that graph into a [`Model`] whose
//! meshes live on the GPU. Import failures degrade to an empty model and a
//! logged diagnostic; they never abort the caller.

use std::path::Path;

use crate::data_structures::model::{Mesh, Model, ModelVertex};

pub mod gltf;
pub mod obj;
pub mod postprocess;

/// The post-process steps the importer is instructed to perform.
///
/// The defaults are the fixed configuration every scene file is loaded
/// with: triangulated faces, smooth normals when the file carries none,
/// flipped texture V axis, a tangent basis and duplicate-vertex joining.
#[derive(Clone, Copy, Debug)]
pub struct ImportOptions {
    pub triangulate: bool,
    pub generate_normals: bool,
    pub flip_uvs: bool,
    pub compute_tangents: bool,
    pub join_identical_vertices: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            triangulate: true,
            generate_normals: true,
            flip_uvs: true,
            compute_tangents: true,
            join_identical_vertices: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported model format {extension:?} for {path}")]
    UnsupportedFormat { path: String, extension: String },
    #[error("failed to parse glTF: {0}")]
    Gltf(#[from] ::gltf::Error),
    #[error("failed to parse OBJ: {0}")]
    Obj(#[from] tobj::LoadError),
    #[error("mesh {name:?}: index {index} out of range for {vertex_count} vertices")]
    MalformedMesh {
        name: String,
        index: u32,
        vertex_count: usize,
    },
}

/// One indexed triangle group as exposed by an importer backend. Normals
/// and texture coordinates run parallel to `positions` (or are empty);
/// every face is a triangle of indices into `positions`.
#[derive(Clone, Debug, Default)]
pub struct MeshRecord {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    pub tangents: Vec<[f32; 3]>,
    pub faces: Vec<[u32; 3]>,
}

impl MeshRecord {
    pub fn has_faces(&self) -> bool {
        !self.faces.is_empty()
    }

    /// Interleave the record into upload-ready vertex and index arrays.
    ///
    /// A record without faces yields empty arrays (the inert-mesh case).
    /// Any face index outside the vertex table is rejected as
    /// [`ImportError::MalformedMesh`] instead of producing a mesh that
    /// would read out of bounds on the GPU.
    pub fn build_geometry(&self) -> Result<(Vec<ModelVertex>, Vec<u32>), ImportError> {
        if !self.has_faces() {
            return Ok((Vec::new(), Vec::new()));
        }

        let mut indices = Vec::with_capacity(self.faces.len() * 3);
        for face in &self.faces {
            for &index in face {
                if index as usize >= self.positions.len() {
                    return Err(ImportError::MalformedMesh {
                        name: self.name.clone(),
                        index,
                        vertex_count: self.positions.len(),
                    });
                }
                indices.push(index);
            }
        }

        let vertices = self
            .positions
            .iter()
            .enumerate()
            .map(|(i, &position)| ModelVertex {
                position,
                normal: self.normals.get(i).copied().unwrap_or_default(),
            })
            .collect();

        Ok((vertices, indices))
    }
}

/// One node of the imported hierarchy: mesh records it references (by
/// index into [`SceneGraph::meshes`]) and its child nodes, both in
/// declaration order.
#[derive(Clone, Debug, Default)]
pub struct NodeRecord {
    pub name: String,
    pub mesh_indices: Vec<usize>,
    pub children: Vec<NodeRecord>,
}

/// An imported scene file: the node hierarchy plus the flat mesh table it
/// points into. Node transforms are not represented; all geometry is
/// treated as sharing one local space.
#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    pub root: NodeRecord,
    pub meshes: Vec<MeshRecord>,
}

impl SceneGraph {
    /// Pre-order walk of the hierarchy: a node's own mesh records (in
    /// declaration order) come before its children's (in declaration
    /// order). The result is the definitive draw order of the scene.
    pub fn flatten(&self) -> Vec<&MeshRecord> {
        let mut ordered = Vec::with_capacity(self.meshes.len());
        self.walk(&self.root, &mut ordered);
        ordered
    }

    fn walk<'a>(&'a self, node: &'a NodeRecord, out: &mut Vec<&'a MeshRecord>) {
        for &index in &node.mesh_indices {
            match self.meshes.get(index) {
                Some(record) => out.push(record),
                None => log::warn!(
                    "Node {:?} references mesh {} but only {} meshes exist",
                    node.name,
                    index,
                    self.meshes.len()
                ),
            }
        }
        for child in &node.children {
            self.walk(child, out);
        }
    }
}

/// Import a scene file, dispatching on its extension.
pub fn import_scene(path: &str, options: &ImportOptions) -> Result<SceneGraph, ImportError> {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match extension.as_str() {
        "gltf" | "glb" => gltf::load_scene(path, options),
        "obj" => obj::load_scene(path, options),
        _ => Err(ImportError::UnsupportedFormat {
            path: path.to_string(),
            extension,
        }),
    }
}

/// Load a scene file into a GPU-resident model.
///
/// Never fails: an import error yields an empty model, a mesh with
/// out-of-range indices is skipped, and a mesh without faces stays in the
/// model as an inert entry. Every degradation is logged.
pub async fn load_model(path: &str, device: &wgpu::Device) -> Model {
    let options = ImportOptions::default();
    let graph = match import_scene(path, &options) {
        Ok(graph) => graph,
        Err(e) => {
            log::error!("Model import error for {}: {}", path, e);
            return Model::empty(path);
        }
    };

    let mut meshes = Vec::with_capacity(graph.meshes.len());
    for record in graph.flatten() {
        if !record.has_faces() {
            log::warn!("Mesh {:?} in {} has no faces", record.name, path);
        }
        match record.build_geometry() {
            Ok((vertices, indices)) => {
                meshes.push(Mesh::new(device, &record.name, &vertices, &indices));
            }
            Err(e) => log::warn!("Skipping mesh in {}: {}", path, e),
        }
    }

    let model = Model::new(path, meshes);
    model.log_summary();
    model
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_record(name: &str) -> MeshRecord {
        MeshRecord {
            name: name.to_string(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            faces: vec![[0, 1, 2]],
            ..Default::default()
        }
    }

    fn leaf(name: &str, mesh_indices: Vec<usize>) -> NodeRecord {
        NodeRecord {
            name: name.to_string(),
            mesh_indices,
            children: Vec::new(),
        }
    }

    #[test]
    fn flatten_is_preorder_with_declaration_order() {
        // root(m0) -> [a(m1, m2), b(m3) -> [c(m4)]]
        let graph = SceneGraph {
            root: NodeRecord {
                name: "root".into(),
                mesh_indices: vec![0],
                children: vec![
                    leaf("a", vec![1, 2]),
                    NodeRecord {
                        name: "b".into(),
                        mesh_indices: vec![3],
                        children: vec![leaf("c", vec![4])],
                    },
                ],
            },
            meshes: (0..5).map(|i| triangle_record(&format!("m{}", i))).collect(),
        };

        let order: Vec<&str> = graph.flatten().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(order, ["m0", "m1", "m2", "m3", "m4"]);
    }

    #[test]
    fn flatten_visits_meshless_root_children_in_order() {
        // A root without meshes and two children with one triangle each.
        let graph = SceneGraph {
            root: NodeRecord {
                name: "root".into(),
                mesh_indices: Vec::new(),
                children: vec![leaf("first", vec![0]), leaf("second", vec![1])],
            },
            meshes: vec![triangle_record("first"), triangle_record("second")],
        };

        let flattened = graph.flatten();
        assert_eq!(flattened.len(), 2);
        assert_eq!(flattened[0].name, "first");
        assert_eq!(flattened[1].name, "second");
        for record in flattened {
            let (vertices, indices) = record.build_geometry().unwrap();
            assert_eq!(vertices.len(), 3);
            assert_eq!(indices, vec![0, 1, 2]);
        }
    }

    #[test]
    fn flatten_skips_dangling_mesh_indices() {
        let graph = SceneGraph {
            root: leaf("root", vec![0, 7]),
            meshes: vec![triangle_record("only")],
        };
        assert_eq!(graph.flatten().len(), 1);
    }

    #[test]
    fn flatten_is_deterministic() {
        let graph = SceneGraph {
            root: NodeRecord {
                name: "root".into(),
                mesh_indices: vec![1],
                children: vec![leaf("a", vec![0]), leaf("b", vec![2])],
            },
            meshes: (0..3).map(|i| triangle_record(&format!("m{}", i))).collect(),
        };
        let first: Vec<&str> = graph.flatten().iter().map(|m| m.name.as_str()).collect();
        let second: Vec<&str> = graph.flatten().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(first, ["m1", "m0", "m2"]);
        assert_eq!(first, second);
    }

    #[test]
    fn faceless_record_builds_inert_geometry() {
        let record = MeshRecord {
            name: "empty".into(),
            positions: vec![[0.0; 3]; 4],
            ..Default::default()
        };
        let (vertices, indices) = record.build_geometry().unwrap();
        assert!(vertices.is_empty());
        assert!(indices.is_empty());
    }

    #[test]
    fn geometry_indices_are_triangles_in_range() {
        let record = triangle_record("tri");
        let (vertices, indices) = record.build_geometry().unwrap();
        assert_eq!(indices.len() % 3, 0);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn out_of_range_index_is_malformed() {
        let mut record = triangle_record("broken");
        record.faces = vec![[0, 1, 3]];
        match record.build_geometry() {
            Err(ImportError::MalformedMesh {
                index,
                vertex_count,
                ..
            }) => {
                assert_eq!(index, 3);
                assert_eq!(vertex_count, 3);
            }
            other => panic!("expected MalformedMesh, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = import_scene("scene.fbx", &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat { .. }));
    }

    #[test]
    fn missing_gltf_file_is_an_io_error() {
        let err = import_scene("does_not_exist.gltf", &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, ImportError::Io { .. }));
    }
}
