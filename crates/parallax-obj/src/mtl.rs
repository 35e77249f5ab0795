use crate::error::ParseError;
use crate::scanner::directives;

/// A `newmtl` block from an `.mtl` source.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    /// `Ka`
    pub ambient: [f32; 3],
    /// `Kd`
    pub diffuse: [f32; 3],
    /// `Ks`
    pub specular: [f32; 3],
    /// `Ns`
    pub shininess: f32,
}

impl Material {
    /// A material with the given name and neutral colours (white diffuse, no
    /// ambient or specular).
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ambient: [0.0; 3],
            diffuse: [1.0; 3],
            specular: [0.0; 3],
            shininess: 0.0,
        }
    }
}

/// Parses an `.mtl` source into its materials, in declaration order.
///
/// Recognised directives: `newmtl`, `Ka`, `Kd`, `Ks`, `Ns`. Other directives
/// (texture maps, illumination models, transparency) are skipped.
pub fn parse_mtl(src: &str) -> Result<Vec<Material>, ParseError> {
    let mut materials: Vec<Material> = Vec::new();

    for d in directives(src) {
        let keyword = d.keyword.text;
        if keyword == "newmtl" {
            let name = d.rest();
            if name.is_empty() {
                return Err(d.err("`newmtl` expects a material name"));
            }
            materials.push(Material::named(name));
            continue;
        }

        if !matches!(keyword, "Ka" | "Kd" | "Ks" | "Ns") {
            continue;
        }
        let Some(current) = materials.last_mut() else {
            return Err(d.err(format!("`{keyword}` appears before any `newmtl`")));
        };
        match keyword {
            "Ka" => current.ambient = d.float3()?,
            "Kd" => current.diffuse = d.float3()?,
            "Ks" => current.specular = d.float3()?,
            _ => current.shininess = d.float(0)?,
        }
    }

    Ok(materials)
}
