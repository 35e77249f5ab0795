//! Line scanner for **Wavefront OBJ** geometry and **MTL** material files.
//!
//! This crate is intentionally dependency-free so it can be consumed by
//! asset tooling and converters without pulling in any engine or GPU code.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`obj`] | `ObjDocument`, `Triangle`, `parse_obj` |
//! | [`mtl`] | `Material`, `parse_mtl` |
//! | [`error`] | `ParseError` |
//!
//! # Quick start
//!
//! ```rust
//! use parallax_obj::parse_obj;
//!
//! let src = "
//!     v 0 0 0
//!     v 1 0 0
//!     v 0 1 0
//!     f 1 2 3
//! ";
//!
//! let doc = parse_obj(src).unwrap();
//! assert_eq!(doc.triangles[0].vertices, [0, 1, 2]);
//! ```

pub mod error;
pub mod mtl;
pub mod obj;
mod scanner;

pub use error::ParseError;
pub use mtl::{parse_mtl, Material};
pub use obj::{parse_obj, ObjDocument, Triangle};

#[cfg(test)]
mod parse_tests {
    use super::*;

    fn ok(src: &str) { parse_obj(src).unwrap(); }
    fn err(src: &str) { parse_obj(src).unwrap_err(); }

    #[test] fn empty_source() { ok(""); }
    #[test] fn comments_only() { ok("# exported\n# by hand\n"); }
    #[test] fn crlf_lines() { ok("v 0 0 0\r\nv 1 0 0\r\nv 0 1 0\r\nf 1 2 3\r\n"); }
    #[test] fn tabs_between_values() { ok("v\t0\t0\t0\n"); }
    #[test] fn exponent_numbers() { ok("v 1e-3 -2.5E2 0\n"); }
    #[test] fn material_library_list() { ok("mtllib a.mtl b.mtl\n"); }
    #[test] fn err_face_before_vertices() { err("f 1 2 3\n"); }
    #[test] fn err_bad_number() { err("vn 0 zero 1\n"); }
    #[test] fn err_bad_index() { err("v 0 0 0\nf a b c\n"); }
    #[test] fn err_empty_usemtl() { err("usemtl\n"); }
    #[test] fn err_empty_mtllib() { err("mtllib\n"); }
}
