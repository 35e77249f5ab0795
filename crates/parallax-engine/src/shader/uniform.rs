use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};

/// Resolved handle of a uniform, or [`NOT_FOUND`](Self::NOT_FOUND).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation(pub(crate) i32);

impl UniformLocation {
    pub const NOT_FOUND: Self = Self(-1);

    #[inline]
    pub fn is_found(self) -> bool {
        self.0 >= 0
    }

    #[inline]
    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

/// Vertex input slot (`@location`), or [`NOT_FOUND`](Self::NOT_FOUND).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AttributeLocation(pub(crate) i32);

impl AttributeLocation {
    pub const NOT_FOUND: Self = Self(-1);

    #[inline]
    pub fn is_found(self) -> bool {
        self.0 >= 0
    }

    /// The shader location, when found.
    #[inline]
    pub fn slot(self) -> Option<u32> {
        u32::try_from(self.0).ok()
    }
}

/// Host-settable uniform types.
///
/// Matrices are `cols x rows`, column-major, `f32` components.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformType {
    F32,
    I32,
    U32,
    Vec(u8),
    Mat { cols: u8, rows: u8 },
}

impl UniformType {
    /// Bytes occupied in a uniform block, including column padding.
    pub fn size(self) -> usize {
        match self {
            UniformType::F32 | UniformType::I32 | UniformType::U32 => 4,
            UniformType::Vec(n) => 4 * n as usize,
            UniformType::Mat { cols, rows } => cols as usize * column_stride(rows),
        }
    }
}

// Uniform-space matrix columns are aligned like vecN<f32>: vec3 rounds up to 16.
fn column_stride(rows: u8) -> usize {
    if rows == 2 { 8 } else { 16 }
}

/// A value for [`ShaderProgram::set_uniform`](super::ShaderProgram::set_uniform).
///
/// Each variant matches exactly one [`UniformType`]; there is no conversion
/// between arities.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    F32(f32),
    I32(i32),
    U32(u32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4(Mat4),
    Mat2x3([[f32; 3]; 2]),
    Mat2x4([[f32; 4]; 2]),
    Mat3x2([[f32; 2]; 3]),
    Mat3x4([[f32; 4]; 3]),
    Mat4x2([[f32; 2]; 4]),
    Mat4x3([[f32; 3]; 4]),
}

impl UniformValue {
    pub fn ty(&self) -> UniformType {
        use UniformValue::*;
        let mat = |cols, rows| UniformType::Mat { cols, rows };
        match self {
            F32(_) => UniformType::F32,
            I32(_) => UniformType::I32,
            U32(_) => UniformType::U32,
            Vec2(_) => UniformType::Vec(2),
            Vec3(_) => UniformType::Vec(3),
            Vec4(_) => UniformType::Vec(4),
            Mat2(_) => mat(2, 2),
            Mat3(_) => mat(3, 3),
            Mat4(_) => mat(4, 4),
            Mat2x3(_) => mat(2, 3),
            Mat2x4(_) => mat(2, 4),
            Mat3x2(_) => mat(3, 2),
            Mat3x4(_) => mat(3, 4),
            Mat4x2(_) => mat(4, 2),
            Mat4x3(_) => mat(4, 3),
        }
    }

    /// Writes the value at the start of `dst` using uniform-block layout.
    /// Scalars are little-endian whatever the host order.
    ///
    /// `dst` must hold at least `self.ty().size()` bytes.
    pub(crate) fn write_to(&self, dst: &mut [u8]) {
        use UniformValue::*;
        match self {
            F32(v) => dst[..4].copy_from_slice(&v.to_le_bytes()),
            I32(v) => dst[..4].copy_from_slice(&v.to_le_bytes()),
            U32(v) => dst[..4].copy_from_slice(&v.to_le_bytes()),
            Vec2(v) => put_f32s(dst, 0, &v.to_array()),
            Vec3(v) => put_f32s(dst, 0, &v.to_array()),
            Vec4(v) => put_f32s(dst, 0, &v.to_array()),
            Mat2(m) => put_columns(dst, 2, &m.to_cols_array()),
            Mat3(m) => put_columns(dst, 3, &m.to_cols_array()),
            Mat4(m) => put_columns(dst, 4, &m.to_cols_array()),
            Mat2x3(c) => put_columns(dst, 3, c.as_flattened()),
            Mat2x4(c) => put_columns(dst, 4, c.as_flattened()),
            Mat3x2(c) => put_columns(dst, 2, c.as_flattened()),
            Mat3x4(c) => put_columns(dst, 4, c.as_flattened()),
            Mat4x2(c) => put_columns(dst, 2, c.as_flattened()),
            Mat4x3(c) => put_columns(dst, 3, c.as_flattened()),
        }
    }

    /// Decodes a value of type `ty` from the start of `src`.
    pub(crate) fn read_from(ty: UniformType, src: &[u8]) -> Option<Self> {
        if src.len() < ty.size() {
            return None;
        }
        let word = |o: usize| -> [u8; 4] { [src[o], src[o + 1], src[o + 2], src[o + 3]] };
        let f = |o: usize| f32::from_le_bytes(word(o));

        let value = match ty {
            UniformType::F32 => UniformValue::F32(f(0)),
            UniformType::I32 => UniformValue::I32(i32::from_le_bytes(word(0))),
            UniformType::U32 => UniformValue::U32(u32::from_le_bytes(word(0))),
            UniformType::Vec(2) => UniformValue::Vec2(Vec2::new(f(0), f(4))),
            UniformType::Vec(3) => UniformValue::Vec3(Vec3::new(f(0), f(4), f(8))),
            UniformType::Vec(4) => UniformValue::Vec4(Vec4::new(f(0), f(4), f(8), f(12))),
            UniformType::Mat { cols, rows } => {
                let rows_n = rows as usize;
                let mut packed = [0.0f32; 16];
                for c in 0..cols as usize {
                    for r in 0..rows_n {
                        packed[c * rows_n + r] = f(c * column_stride(rows) + 4 * r);
                    }
                }
                matrix_from_packed(cols, rows, &packed)?
            }
            UniformType::Vec(_) => return None,
        };
        Some(value)
    }
}

fn matrix_from_packed(cols: u8, rows: u8, p: &[f32; 16]) -> Option<UniformValue> {
    fn cols_of<const C: usize, const R: usize>(p: &[f32; 16]) -> [[f32; R]; C] {
        std::array::from_fn(|c| std::array::from_fn(|r| p[c * R + r]))
    }

    let v = match (cols, rows) {
        (2, 2) => UniformValue::Mat2(Mat2::from_cols_slice(&p[..4])),
        (3, 3) => UniformValue::Mat3(Mat3::from_cols_slice(&p[..9])),
        (4, 4) => UniformValue::Mat4(Mat4::from_cols_slice(&p[..16])),
        (2, 3) => UniformValue::Mat2x3(cols_of::<2, 3>(p)),
        (2, 4) => UniformValue::Mat2x4(cols_of::<2, 4>(p)),
        (3, 2) => UniformValue::Mat3x2(cols_of::<3, 2>(p)),
        (3, 4) => UniformValue::Mat3x4(cols_of::<3, 4>(p)),
        (4, 2) => UniformValue::Mat4x2(cols_of::<4, 2>(p)),
        (4, 3) => UniformValue::Mat4x3(cols_of::<4, 3>(p)),
        _ => return None,
    };
    Some(v)
}

fn put_f32s(dst: &mut [u8], offset: usize, values: &[f32]) {
    let dst = &mut dst[offset..offset + 4 * values.len()];
    for (chunk, v) in dst.chunks_exact_mut(4).zip(values) {
        chunk.copy_from_slice(&v.to_le_bytes());
    }
}

fn put_columns(dst: &mut [u8], rows: usize, packed: &[f32]) {
    let stride = column_stride(rows as u8);
    for (c, column) in packed.chunks_exact(rows).enumerate() {
        put_f32s(dst, c * stride, column);
    }
}

macro_rules! impl_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(impl From<$t> for UniformValue {
            fn from(v: $t) -> Self { UniformValue::$variant(v) }
        })*
    };
}

impl_from! {
    f32 => F32,
    i32 => I32,
    u32 => U32,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    Mat2 => Mat2,
    Mat3 => Mat3,
    Mat4 => Mat4,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(v: UniformValue) -> Vec<u8> {
        let mut buf = vec![0u8; v.ty().size()];
        v.write_to(&mut buf);
        buf
    }

    fn f32_at(buf: &[u8], offset: usize) -> f32 {
        f32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
    }

    // ── layout ────────────────────────────────────────────────────────────

    #[test]
    fn sizes_follow_uniform_layout() {
        assert_eq!(UniformType::F32.size(), 4);
        assert_eq!(UniformType::Vec(3).size(), 12);
        assert_eq!(UniformType::Mat { cols: 2, rows: 2 }.size(), 16);
        assert_eq!(UniformType::Mat { cols: 3, rows: 3 }.size(), 48);
        assert_eq!(UniformType::Mat { cols: 4, rows: 4 }.size(), 64);
        assert_eq!(UniformType::Mat { cols: 4, rows: 2 }.size(), 32);
    }

    #[test]
    fn mat3_columns_are_padded() {
        let m = Mat3::from_cols(Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0), Vec3::new(7.0, 8.0, 9.0));
        let buf = write(m.into());
        assert_eq!(f32_at(&buf, 0), 1.0);
        assert_eq!(f32_at(&buf, 16), 4.0);
        assert_eq!(f32_at(&buf, 40), 9.0);
    }

    #[test]
    fn non_square_matrix_is_column_major() {
        let buf = write(UniformValue::Mat3x2([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]));
        assert_eq!(f32_at(&buf, 8), 3.0);
        assert_eq!(f32_at(&buf, 20), 6.0);
    }

    #[test]
    fn scalars_and_vectors_are_little_endian() {
        assert_eq!(write(UniformValue::F32(1.0)), [0x00, 0x00, 0x80, 0x3f]);
        assert_eq!(write(UniformValue::I32(-2)), [0xfe, 0xff, 0xff, 0xff]);
        assert_eq!(write(UniformValue::U32(0x0102_0304)), [0x04, 0x03, 0x02, 0x01]);
        assert_eq!(
            write(Vec2::new(1.0, -2.0).into()),
            [0x00, 0x00, 0x80, 0x3f, 0x00, 0x00, 0x00, 0xc0]
        );
    }

    #[test]
    fn matrix_columns_are_little_endian() {
        let buf = write(Mat2::from_cols(Vec2::new(2.0, 0.0), Vec2::new(0.0, 0.5)).into());
        assert_eq!(buf[..4], [0x00, 0x00, 0x00, 0x40]);
        assert_eq!(buf[12..16], [0x00, 0x00, 0x00, 0x3f]);
    }

    // ── read back ─────────────────────────────────────────────────────────

    #[test]
    fn integers_read_back_from_little_endian_bytes() {
        assert_eq!(UniformValue::read_from(UniformType::I32, &[0xfe, 0xff, 0xff, 0xff]), Some(UniformValue::I32(-2)));
        assert_eq!(
            UniformValue::read_from(UniformType::U32, &[0x04, 0x03, 0x02, 0x01]),
            Some(UniformValue::U32(0x0102_0304))
        );
    }

    #[test]
    fn padded_matrix_reads_back() {
        let v = UniformValue::Mat4x3([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0], [10.0, 11.0, 12.0]]);
        assert_eq!(UniformValue::read_from(v.ty(), &write(v)), Some(v));
    }

    #[test]
    fn read_rejects_short_source() {
        assert_eq!(UniformValue::read_from(UniformType::Vec(4), &[0u8; 8]), None);
    }

    // ── locations ─────────────────────────────────────────────────────────

    #[test]
    fn not_found_sentinels() {
        assert!(!UniformLocation::NOT_FOUND.is_found());
        assert_eq!(UniformLocation::NOT_FOUND.index(), None);
        assert_eq!(AttributeLocation::NOT_FOUND.slot(), None);
        assert_eq!(AttributeLocation(5).slot(), Some(5));
    }
}
