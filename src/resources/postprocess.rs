//! Geometry post-processing applied after import.
//!
//! Mirrors the fixed importer configuration: smooth normal generation when
//! the source file carries none, texture coordinate V flip, tangent basis
//! computation and duplicate-vertex joining. All functions operate on the
//! raw attribute arrays of a mesh record so they stay backend-agnostic.

use std::collections::HashMap;

use cgmath::InnerSpace;

use super::{ImportOptions, MeshRecord};

/// Run the configured post-process steps over a freshly imported record.
/// Tangents already present in the source file are kept as-is.
pub fn apply(record: &mut MeshRecord, options: &ImportOptions) {
    if options.generate_normals && record.normals.len() != record.positions.len() {
        record.normals = generate_smooth_normals(&record.positions, &record.faces);
    }
    if options.flip_uvs {
        flip_v(&mut record.texcoords);
    }
    if options.compute_tangents && record.tangents.is_empty() && !record.texcoords.is_empty() {
        record.tangents = compute_tangents(&record.positions, &record.texcoords, &record.faces);
    }
    if options.join_identical_vertices {
        join_identical_vertices(record);
    }
}

/// Smooth per-vertex normals from face geometry: every face's unnormalized
/// cross product accumulates onto its three corners (area weighting), then
/// each sum is normalized. Faces with out-of-range indices are ignored;
/// they are rejected later when the record is validated.
pub fn generate_smooth_normals(positions: &[[f32; 3]], faces: &[[u32; 3]]) -> Vec<[f32; 3]> {
    let mut normals = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); positions.len()];

    for face in faces {
        let [i0, i1, i2] = face.map(|i| i as usize);
        let (Some(&p0), Some(&p1), Some(&p2)) =
            (positions.get(i0), positions.get(i1), positions.get(i2))
        else {
            continue;
        };
        let p0 = cgmath::Vector3::from(p0);
        let face_normal = (cgmath::Vector3::from(p1) - p0).cross(cgmath::Vector3::from(p2) - p0);
        normals[i0] += face_normal;
        normals[i1] += face_normal;
        normals[i2] += face_normal;
    }

    normals
        .into_iter()
        .map(|n| {
            if n.magnitude2() > 0.0 {
                n.normalize().into()
            } else {
                [0.0, 0.0, 0.0]
            }
        })
        .collect()
}

/// Flip the V axis of every texture coordinate (image origin top-left vs
/// bottom-left).
pub fn flip_v(texcoords: &mut [[f32; 2]]) {
    for uv in texcoords.iter_mut() {
        uv[1] = 1.0 - uv[1];
    }
}

/// Per-vertex tangents from UV-space triangle edges, averaged over all
/// faces sharing a vertex. Requires one texture coordinate per position;
/// returns zero tangents otherwise. Degenerate UV triangles contribute
/// nothing.
pub fn compute_tangents(
    positions: &[[f32; 3]],
    texcoords: &[[f32; 2]],
    faces: &[[u32; 3]],
) -> Vec<[f32; 3]> {
    if texcoords.len() != positions.len() {
        return vec![[0.0; 3]; positions.len()];
    }

    let mut tangents = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); positions.len()];
    let mut triangles_included = vec![0u32; positions.len()];

    for face in faces {
        let [i0, i1, i2] = face.map(|i| i as usize);
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }

        let pos0: cgmath::Vector3<f32> = positions[i0].into();
        let pos1: cgmath::Vector3<f32> = positions[i1].into();
        let pos2: cgmath::Vector3<f32> = positions[i2].into();

        let uv0: cgmath::Vector2<f32> = texcoords[i0].into();
        let uv1: cgmath::Vector2<f32> = texcoords[i1].into();
        let uv2: cgmath::Vector2<f32> = texcoords[i2].into();

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        // Solving delta_pos = delta_uv.x * T + delta_uv.y * B for T.
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;

        for &i in &[i0, i1, i2] {
            tangents[i] += tangent;
            triangles_included[i] += 1;
        }
    }

    tangents
        .into_iter()
        .zip(triangles_included)
        .map(|(t, n)| {
            if n > 0 {
                (t / n as f32).into()
            } else {
                [0.0, 0.0, 0.0]
            }
        })
        .collect()
}

/// Merge vertices whose attributes are bit-identical and remap the face
/// indices accordingly. Surviving vertices keep their first-seen order, so
/// joining never reorders geometry.
pub fn join_identical_vertices(record: &mut MeshRecord) {
    #[derive(Hash, PartialEq, Eq)]
    struct Key {
        position: [u32; 3],
        normal: [u32; 3],
        texcoord: [u32; 2],
    }

    let key_of = |record: &MeshRecord, i: usize| Key {
        position: record.positions[i].map(f32::to_bits),
        normal: record
            .normals
            .get(i)
            .copied()
            .unwrap_or_default()
            .map(f32::to_bits),
        texcoord: record
            .texcoords
            .get(i)
            .copied()
            .unwrap_or_default()
            .map(f32::to_bits),
    };

    let mut seen: HashMap<Key, u32> = HashMap::new();
    let mut remap = Vec::with_capacity(record.positions.len());
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut texcoords = Vec::new();
    let mut tangents = Vec::new();

    for i in 0..record.positions.len() {
        let next = positions.len() as u32;
        let index = *seen.entry(key_of(record, i)).or_insert_with(|| {
            positions.push(record.positions[i]);
            if let Some(&n) = record.normals.get(i) {
                normals.push(n);
            }
            if let Some(&uv) = record.texcoords.get(i) {
                texcoords.push(uv);
            }
            if let Some(&t) = record.tangents.get(i) {
                tangents.push(t);
            }
            next
        });
        remap.push(index);
    }

    for face in record.faces.iter_mut() {
        for index in face.iter_mut() {
            if let Some(&mapped) = remap.get(*index as usize) {
                *index = mapped;
            }
        }
    }

    record.positions = positions;
    record.normals = normals;
    record.texcoords = texcoords;
    record.tangents = tangents;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> (Vec<[f32; 3]>, Vec<[u32; 3]>) {
        let positions = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 0.0, -1.0],
            [0.0, 0.0, -1.0],
        ];
        let faces = vec![[0, 1, 2], [0, 2, 3]];
        (positions, faces)
    }

    #[test]
    fn flat_quad_gets_up_normals() {
        let (positions, faces) = quad();
        let normals = generate_smooth_normals(&positions, &faces);
        assert_eq!(normals.len(), positions.len());
        for n in normals {
            assert!((n[0]).abs() < 1e-6);
            assert!((n[1] - 1.0).abs() < 1e-6);
            assert!((n[2]).abs() < 1e-6);
        }
    }

    #[test]
    fn generated_normals_are_unit_length() {
        let positions = vec![[0.0, 0.0, 0.0], [3.0, 0.0, 0.0], [0.0, 5.0, 0.0]];
        let faces = vec![[0, 1, 2]];
        for n in generate_smooth_normals(&positions, &faces) {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn out_of_range_faces_contribute_nothing() {
        let positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let normals = generate_smooth_normals(&positions, &[[0, 1, 9]]);
        assert_eq!(normals, vec![[0.0; 3]; 3]);
    }

    #[test]
    fn v_axis_flips() {
        let mut texcoords = vec![[0.25, 0.0], [0.5, 1.0], [1.0, 0.75]];
        flip_v(&mut texcoords);
        assert_eq!(texcoords, vec![[0.25, 1.0], [0.5, 0.0], [1.0, 0.25]]);
    }

    #[test]
    fn quad_tangent_follows_u_direction() {
        let (positions, faces) = quad();
        let texcoords = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let tangents = compute_tangents(&positions, &texcoords, &faces);
        for t in tangents {
            assert!((t[0] - 1.0).abs() < 1e-5, "tangent was {:?}", t);
            assert!(t[1].abs() < 1e-5);
            assert!(t[2].abs() < 1e-5);
        }
    }

    #[test]
    fn joining_merges_duplicates_and_remaps_faces() {
        let mut record = MeshRecord {
            name: "dedup".into(),
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                // Duplicates of vertices 1 and 2.
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [1.0, 1.0, 0.0],
            ],
            normals: vec![[0.0, 0.0, 1.0]; 6],
            texcoords: Vec::new(),
            tangents: Vec::new(),
            faces: vec![[0, 1, 2], [3, 5, 4]],
        };

        join_identical_vertices(&mut record);

        assert_eq!(record.positions.len(), 4);
        assert_eq!(record.normals.len(), 4);
        assert_eq!(record.faces, vec![[0, 1, 2], [1, 3, 2]]);
        // First-seen order is preserved.
        assert_eq!(record.positions[3], [1.0, 1.0, 0.0]);
    }

    #[test]
    fn joining_distinguishes_differing_normals() {
        let mut record = MeshRecord {
            name: "split-normals".into(),
            positions: vec![[0.0; 3], [0.0; 3]],
            normals: vec![[0.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
            texcoords: Vec::new(),
            tangents: Vec::new(),
            faces: Vec::new(),
        };
        join_identical_vertices(&mut record);
        assert_eq!(record.positions.len(), 2);
    }
}
