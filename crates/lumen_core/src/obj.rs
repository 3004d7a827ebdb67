//! Wavefront OBJ loading via `tobj`.

use std::io::BufRead;
use std::path::Path;

use lumen_math::Vec3;

use crate::mesh::{Mesh, MeshError, MeshResult};

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ..Default::default()
    }
}

/// Load every model in an OBJ file as a validated [`Mesh`].
pub fn load_obj(path: impl AsRef<Path>) -> MeshResult<Vec<Mesh>> {
    let path = path.as_ref();
    let (models, _materials) = tobj::load_obj(path, &load_options())?;
    let meshes = meshes_from_models(models)?;
    if meshes.is_empty() {
        return Err(MeshError::Empty(path.display().to_string()));
    }

    log::info!(
        "Loaded {} mesh(es), {} triangles from {}",
        meshes.len(),
        meshes.iter().map(Mesh::triangle_count).sum::<usize>(),
        path.display()
    );
    Ok(meshes)
}

/// Load OBJ data from an in-memory reader. Material libraries are ignored.
pub fn load_obj_from_reader<R: BufRead>(reader: &mut R) -> MeshResult<Vec<Mesh>> {
    let (models, _materials) =
        tobj::load_obj_buf(reader, &load_options(), |_| Err(tobj::LoadError::OpenFileFailed))?;
    let meshes = meshes_from_models(models)?;
    if meshes.is_empty() {
        return Err(MeshError::Empty("<reader>".to_string()));
    }
    Ok(meshes)
}

fn meshes_from_models(models: Vec<tobj::Model>) -> MeshResult<Vec<Mesh>> {
    models
        .into_iter()
        .filter(|model| !model.mesh.indices.is_empty())
        .map(|model| {
            let mesh = &model.mesh;
            let positions = to_vec3s(&mesh.positions);

            let normals = if mesh.normals.is_empty() {
                None
            } else {
                Some(to_vec3s(&mesh.normals))
            };

            let uvs = if mesh.texcoords.is_empty() {
                None
            } else {
                Some(mesh.texcoords.chunks_exact(2).map(|uv| [uv[0], uv[1]]).collect())
            };

            // Without file normals, triangles shade with their geometric normal
            let out = Mesh::new_with_uvs(positions, mesh.indices.clone(), normals, uvs);
            out.validate()?;
            log::debug!(
                "OBJ model '{}': {} triangles, normals {}",
                model.name,
                out.triangle_count(),
                if out.has_normals() { "from file" } else { "geometric" }
            );
            Ok(out)
        })
        .collect()
}

fn to_vec3s(flat: &[f32]) -> Vec<Vec3> {
    flat.chunks_exact(3)
        .map(|c| Vec3::new(c[0], c[1], c[2]))
        .collect()
}
