use crate::error::ParseError;
use crate::scanner::{directives, Directive, Token};

/// A triangle with 0-based indices into [`ObjDocument::positions`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [u32; 3],
    /// Index into [`ObjDocument::material_names`] of the `usemtl` active when
    /// the face was read.
    pub material: Option<usize>,
}

/// Geometry read from an `.obj` source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjDocument {
    /// `v` lines in file order. A fourth `w` component is ignored.
    pub positions: Vec<[f32; 3]>,
    /// `vn` lines in file order.
    pub normals: Vec<[f32; 3]>,
    /// Faces, fan-triangulated when they have more than three corners.
    pub triangles: Vec<Triangle>,
    /// File names from `mtllib` lines.
    pub material_libraries: Vec<String>,
    /// Material names in order of first `usemtl`.
    pub material_names: Vec<String>,
    /// Number of `vt` lines seen. Texture coordinates are not kept.
    pub texcoord_count: usize,
}

impl ObjDocument {
    /// Index of `name` in [`material_names`](Self::material_names).
    pub fn material_index(&self, name: &str) -> Option<usize> {
        self.material_names.iter().position(|n| n == name)
    }
}

// ── Public parse entry point ──────────────────────────────────────────────

/// Parses an `.obj` source.
///
/// Recognised directives: `v`, `vn`, `vt`, `f`, `mtllib`, `usemtl`. Anything
/// else (`o`, `g`, `s`, unknown keywords) is skipped.
///
/// Face corners may be written `a`, `a/t`, `a//n` or `a/t/n`; only the
/// position index `a` is used. Indices are 1-based, negative values count back
/// from the latest vertex, and every index must refer to a vertex declared
/// earlier in the file.
pub fn parse_obj(src: &str) -> Result<ObjDocument, ParseError> {
    let mut doc = ObjDocument::default();
    let mut current_material: Option<usize> = None;

    for d in directives(src) {
        match d.keyword.text {
            "v" => doc.positions.push(d.float3()?),
            "vn" => doc.normals.push(d.float3()?),
            "vt" => doc.texcoord_count += 1,
            "f" => parse_face(&d, &mut doc, current_material)?,
            "mtllib" => {
                if d.args.is_empty() {
                    return Err(d.err("`mtllib` expects a file name"));
                }
                doc.material_libraries
                    .extend(d.args.iter().map(|t| t.text.to_string()));
            }
            "usemtl" => {
                let name = d.rest();
                if name.is_empty() {
                    return Err(d.err("`usemtl` expects a material name"));
                }
                let idx = match doc.material_index(&name) {
                    Some(idx) => idx,
                    None => {
                        doc.material_names.push(name);
                        doc.material_names.len() - 1
                    }
                };
                current_material = Some(idx);
            }
            _ => {}
        }
    }

    Ok(doc)
}

// ── Faces ─────────────────────────────────────────────────────────────────

fn parse_face(
    d: &Directive<'_>,
    doc: &mut ObjDocument,
    material: Option<usize>,
) -> Result<(), ParseError> {
    if d.args.len() < 3 {
        return Err(d.err("a face needs at least three vertices"));
    }

    let corners = d
        .args
        .iter()
        .map(|tok| resolve_index(d, *tok, doc.positions.len()))
        .collect::<Result<Vec<_>, _>>()?;

    for i in 1..corners.len() - 1 {
        doc.triangles.push(Triangle {
            vertices: [corners[0], corners[i], corners[i + 1]],
            material,
        });
    }
    Ok(())
}

fn resolve_index(d: &Directive<'_>, tok: Token<'_>, count: usize) -> Result<u32, ParseError> {
    let head = match tok.text.split_once('/') {
        Some((head, _)) => head,
        None => tok.text,
    };

    let raw: i64 = head
        .parse()
        .map_err(|_| d.err_at(tok, format!("expected a vertex index, found `{}`", tok.text)))?;

    let resolved = match raw {
        0 => return Err(d.err_at(tok, "vertex indices start at 1")),
        r if r > 0 => r - 1,
        r => count as i64 + r,
    };

    if resolved < 0 || resolved >= count as i64 {
        return Err(d.err_at(
            tok,
            format!("vertex index {raw} out of range ({count} vertices so far)"),
        ));
    }
    Ok(resolved as u32)
}
