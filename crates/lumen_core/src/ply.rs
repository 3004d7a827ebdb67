//! Stanford PLY loading via `ply-rs`.
//!
//! Reads ASCII and binary files with a `vertex` element carrying `x y z`
//! (and optionally `nx ny nz`, `u v`) and a `face` element whose
//! `vertex_indices` lists are fan-triangulated.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use lumen_math::Vec3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Header, Property};

use crate::mesh::{Mesh, MeshError, MeshResult};

/// Load a PLY file as a single validated [`Mesh`].
///
/// Returns a `Vec` to match [`load_obj`](crate::load_obj); PLY files hold one
/// mesh.
pub fn load_ply(path: impl AsRef<Path>) -> MeshResult<Vec<Mesh>> {
    let path = path.as_ref();
    let start = Instant::now();
    let mut reader = BufReader::new(File::open(path)?);
    let meshes = load_ply_from_reader(&mut reader).map_err(|e| match e {
        MeshError::Empty(_) => MeshError::Empty(path.display().to_string()),
        other => other,
    })?;

    log::info!(
        "Loaded {} triangles from {} in {:.2?}",
        meshes[0].triangle_count(),
        path.display(),
        start.elapsed()
    );
    Ok(meshes)
}

/// Load PLY data from an in-memory reader.
pub fn load_ply_from_reader<R: BufRead>(reader: &mut R) -> MeshResult<Vec<Mesh>> {
    let parser = Parser::<DefaultElement>::new();
    let header = parser.read_header(reader)?;
    let index_key = check_header(&header)?;
    let payload = parser.read_payload(reader, &header)?;

    let vertices = payload.get("vertex").map(Vec::as_slice).unwrap_or_default();
    let faces = payload.get("face").map(Vec::as_slice).unwrap_or_default();

    let positions = vertices
        .iter()
        .map(|v| vec3(v, ["x", "y", "z"]))
        .collect::<MeshResult<Vec<_>>>()?;

    let has_normals = ["nx", "ny", "nz"].iter().all(|k| has_property(&header, "vertex", k));
    let normals = if has_normals {
        let normals = vertices
            .iter()
            .map(|v| vec3(v, ["nx", "ny", "nz"]))
            .collect::<MeshResult<Vec<_>>>()?;
        Some(normals)
    } else {
        None
    };

    let uv_keys = if has_property(&header, "vertex", "u") {
        Some(["u", "v"])
    } else if has_property(&header, "vertex", "s") {
        Some(["s", "t"])
    } else {
        None
    };
    let uvs = match uv_keys {
        Some([u, v]) => Some(
            vertices
                .iter()
                .map(|vertex| Ok([scalar(vertex, u)?, scalar(vertex, v)?]))
                .collect::<MeshResult<Vec<_>>>()?,
        ),
        None => None,
    };

    let mut indices = Vec::with_capacity(3 * faces.len());
    for (i, face) in faces.iter().enumerate() {
        let polygon = index_list(face, index_key)
            .ok_or_else(|| MeshError::Ply(format!("face {} has no '{}' list", i, index_key)))?;
        if polygon.len() < 3 {
            log::warn!("Skipping PLY face {} with {} vertices", i, polygon.len());
            continue;
        }
        for pair in polygon[1..].windows(2) {
            indices.extend_from_slice(&[polygon[0], pair[0], pair[1]]);
        }
    }

    if indices.is_empty() {
        return Err(MeshError::Empty("<reader>".to_string()));
    }

    let mesh = Mesh::new_with_uvs(positions, indices, normals, uvs);
    mesh.validate()?;
    log::debug!(
        "PLY: {} vertices, {} faces, {} triangles",
        mesh.vertex_count(),
        faces.len(),
        mesh.triangle_count()
    );
    Ok(vec![mesh])
}

/// Require `vertex` with `x y z` and `face` with an index list. Returns the
/// name of the index list, which files spell two ways.
fn check_header(header: &Header) -> MeshResult<&'static str> {
    for name in header.elements.keys() {
        if name != "vertex" && name != "face" {
            log::debug!("PLY: Ignoring element '{}'", name);
        }
    }

    for key in ["x", "y", "z"] {
        if !has_property(header, "vertex", key) {
            return Err(MeshError::Ply(format!("element 'vertex' is missing '{}'", key)));
        }
    }

    ["vertex_indices", "vertex_index"]
        .into_iter()
        .find(|key| has_property(header, "face", key))
        .ok_or_else(|| {
            MeshError::Ply("element 'face' needs 'vertex_indices' or 'vertex_index'".to_string())
        })
}

fn has_property(header: &Header, element: &str, key: &str) -> bool {
    header
        .elements
        .get(element)
        .is_some_and(|e| e.properties.contains_key(key))
}

fn scalar(element: &DefaultElement, key: &str) -> MeshResult<f32> {
    let value = match element.get(key) {
        Some(Property::Float(v)) => *v,
        Some(Property::Double(v)) => *v as f32,
        Some(Property::Char(v)) => *v as f32,
        Some(Property::UChar(v)) => *v as f32,
        Some(Property::Short(v)) => *v as f32,
        Some(Property::UShort(v)) => *v as f32,
        Some(Property::Int(v)) => *v as f32,
        Some(Property::UInt(v)) => *v as f32,
        _ => return Err(MeshError::Ply(format!("property '{}' is not a scalar", key))),
    };
    Ok(value)
}

fn vec3(element: &DefaultElement, keys: [&str; 3]) -> MeshResult<Vec3> {
    Ok(Vec3::new(
        scalar(element, keys[0])?,
        scalar(element, keys[1])?,
        scalar(element, keys[2])?,
    ))
}

/// Face indices as `u32`, whatever integer type the file declared. Negative
/// indices wrap to huge values and fail validation.
fn index_list(element: &DefaultElement, key: &str) -> Option<Vec<u32>> {
    let list = match element.get(key)? {
        Property::ListChar(v) => v.iter().map(|&i| i as u32).collect(),
        Property::ListUChar(v) => v.iter().map(|&i| i as u32).collect(),
        Property::ListShort(v) => v.iter().map(|&i| i as u32).collect(),
        Property::ListUShort(v) => v.iter().map(|&i| i as u32).collect(),
        Property::ListInt(v) => v.iter().map(|&i| i as u32).collect(),
        Property::ListUInt(v) => v.clone(),
        _ => return None,
    };
    Some(list)
}
