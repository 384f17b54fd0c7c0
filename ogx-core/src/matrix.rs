// Matrix and projection translation.
//
// Matrices are kept in the GX convention: row-major, indexed [row][col], with
// model-view matrices stored as 3x4 affine transforms and the projection as a
// full 4x4. GL hands matrices over column-major, so they are transposed at the
// API boundary and nowhere else.
//
// GL clip space maps depth to [-1, 1]; GX expects [-1, 0]. The projection is
// therefore rebuilt before upload: near and far are recovered from the two
// depth entries of the GL matrix and the depth row is recomputed the way the
// GX construction helpers would have produced it.

use serde::Serialize;

/// 3x4 affine matrix (position/normal/texture matrices).
pub type Mtx = [[f32; 4]; 3];
/// 4x4 matrix (projection).
pub type Mtx44 = [[f32; 4]; 4];

pub const IDENTITY: Mtx = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
];

pub const IDENTITY44: Mtx44 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Polygon offset units are scaled by this before being folded into the
/// projection's depth translation.
pub const POLYGON_OFFSET_SCALE: f32 = 0.00001;

// ---------------------------------------------------------------------------
// GL boundary conversion
// ---------------------------------------------------------------------------

/// Column-major GL matrix to a GX 4x4.
pub fn from_gl44(m: &[f32; 16]) -> Mtx44 {
    let mut out = [[0.0; 4]; 4];
    for (row, out_row) in out.iter_mut().enumerate() {
        for (col, value) in out_row.iter_mut().enumerate() {
            *value = m[col * 4 + row];
        }
    }
    out
}

/// Column-major GL matrix to a GX 3x4. The bottom row is dropped.
pub fn from_gl(m: &[f32; 16]) -> Mtx {
    let full = from_gl44(m);
    [full[0], full[1], full[2]]
}

pub fn to_gl44(m: &Mtx44) -> [f32; 16] {
    let mut out = [0.0; 16];
    for (row, m_row) in m.iter().enumerate() {
        for (col, value) in m_row.iter().enumerate() {
            out[col * 4 + row] = *value;
        }
    }
    out
}

pub fn to_gl(m: &Mtx) -> [f32; 16] {
    to_gl44(&extend(m))
}

/// Pad a 3x4 affine matrix to 4x4.
pub fn extend(m: &Mtx) -> Mtx44 {
    [m[0], m[1], m[2], [0.0, 0.0, 0.0, 1.0]]
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

/// `a * b` for 4x4 matrices.
pub fn concat44(a: &Mtx44, b: &Mtx44) -> Mtx44 {
    let mut out = [[0.0; 4]; 4];
    for (row, out_row) in out.iter_mut().enumerate() {
        for (col, value) in out_row.iter_mut().enumerate() {
            *value = (0..4).map(|k| a[row][k] * b[k][col]).sum();
        }
    }
    out
}

/// `a * b` where `b` is affine. Works for both 3x4 and 4x4 left operands.
pub fn concat_affine<const R: usize>(a: &[[f32; 4]; R], b: &Mtx) -> [[f32; 4]; R] {
    let mut out = [[0.0; 4]; R];
    for (row, out_row) in out.iter_mut().enumerate() {
        for col in 0..4 {
            let mut sum: f32 = (0..3).map(|k| a[row][k] * b[k][col]).sum();
            if col == 3 {
                sum += a[row][3];
            }
            out_row[col] = sum;
        }
    }
    out
}

/// `a * b` for 3x4 affine matrices.
pub fn concat(a: &Mtx, b: &Mtx) -> Mtx {
    concat_affine(a, b)
}

/// Post-multiply by a scale: `m * S(x, y, z)`.
pub fn apply_scale<const R: usize>(m: &mut [[f32; 4]; R], x: f32, y: f32, z: f32) {
    for row in m.iter_mut() {
        row[0] *= x;
        row[1] *= y;
        row[2] *= z;
    }
}

/// Post-multiply by a translation: `m * T(x, y, z)`.
pub fn apply_translation<const R: usize>(m: &mut [[f32; 4]; R], x: f32, y: f32, z: f32) {
    for row in m.iter_mut() {
        row[3] += row[0] * x + row[1] * y + row[2] * z;
    }
}

/// Rotation of `angle` degrees around `axis`. A zero axis gives identity.
pub fn rotation_deg(axis: [f32; 3], angle: f32) -> Mtx {
    let Some([x, y, z]) = try_normalize(axis) else {
        return IDENTITY;
    };
    let (s, c) = angle.to_radians().sin_cos();
    let t = 1.0 - c;
    [
        [t * x * x + c, t * x * y - s * z, t * x * z + s * y, 0.0],
        [t * x * y + s * z, t * y * y + c, t * y * z - s * x, 0.0],
        [t * x * z - s * y, t * y * z + s * x, t * z * z + c, 0.0],
    ]
}

/// Inverse of an affine matrix, or `None` if it is singular.
pub fn inverse(m: &Mtx) -> Option<Mtx> {
    let det = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
    if det == 0.0 {
        return None;
    }
    let inv_det = 1.0 / det;

    let mut out = [[0.0; 4]; 3];
    out[0][0] = (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det;
    out[0][1] = -(m[0][1] * m[2][2] - m[0][2] * m[2][1]) * inv_det;
    out[0][2] = (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det;
    out[1][0] = -(m[1][0] * m[2][2] - m[1][2] * m[2][0]) * inv_det;
    out[1][1] = (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det;
    out[1][2] = -(m[0][0] * m[1][2] - m[0][2] * m[1][0]) * inv_det;
    out[2][0] = (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det;
    out[2][1] = -(m[0][0] * m[2][1] - m[0][1] * m[2][0]) * inv_det;
    out[2][2] = (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det;

    // translation: -R^-1 * t
    for row in 0..3 {
        out[row][3] = -(out[row][0] * m[0][3] + out[row][1] * m[1][3] + out[row][2] * m[2][3]);
    }
    Some(out)
}

/// Transpose of the 3x3 part; the translation column is zeroed.
pub fn transpose(m: &Mtx) -> Mtx {
    let mut out = [[0.0; 4]; 3];
    for (row, out_row) in out.iter_mut().enumerate() {
        for (col, value) in out_row.iter_mut().take(3).enumerate() {
            *value = m[col][row];
        }
    }
    out
}

/// Normal matrix for a model-view: transpose of its inverse. Singular
/// model-views fall back to identity.
pub fn normal_matrix(modelview: &Mtx) -> Mtx {
    inverse(modelview)
        .map(|inv| transpose(&inv))
        .unwrap_or(IDENTITY)
}

/// Transform a point (translation included).
pub fn transform_point(m: &Mtx, v: [f32; 3]) -> [f32; 3] {
    let mut out = [0.0; 3];
    for (row, value) in out.iter_mut().enumerate() {
        *value = m[row][0] * v[0] + m[row][1] * v[1] + m[row][2] * v[2] + m[row][3];
    }
    out
}

fn try_normalize(v: [f32; 3]) -> Option<[f32; 3]> {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len == 0.0 {
        None
    } else {
        Some([v[0] / len, v[1] / len, v[2] / len])
    }
}

/// Unit vector in the direction of `v`; zero stays zero.
pub fn normalize(v: [f32; 3]) -> [f32; 3] {
    try_normalize(v).unwrap_or([0.0; 3])
}

// ---------------------------------------------------------------------------
// Construction entry points
// ---------------------------------------------------------------------------

/// GL `glFrustum` matrix.
pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mtx44 {
    let mut m = [[0.0; 4]; 4];
    let tmp = 1.0 / (right - left);
    m[0][0] = 2.0 * near * tmp;
    m[0][2] = (right + left) * tmp;
    let tmp = 1.0 / (top - bottom);
    m[1][1] = 2.0 * near * tmp;
    m[1][2] = (top + bottom) * tmp;
    let tmp = 1.0 / (far - near);
    m[2][2] = -(far + near) * tmp;
    m[2][3] = -2.0 * far * near * tmp;
    m[3][2] = -1.0;
    m
}

/// GL `glOrtho` matrix.
pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mtx44 {
    let mut m = [[0.0; 4]; 4];
    m[0][0] = 2.0 / (right - left);
    m[0][3] = (left + right) / (left - right);
    m[1][1] = 2.0 / (top - bottom);
    m[1][3] = (bottom + top) / (bottom - top);
    m[2][2] = 2.0 / (near - far);
    m[2][3] = (near + far) / (near - far);
    m[3][3] = 1.0;
    m
}

/// GX-convention orthographic matrix (depth mapped to [-1, 0]), used for
/// screen-space quads.
pub fn gx_ortho(top: f32, bottom: f32, left: f32, right: f32, near: f32, far: f32) -> Mtx44 {
    let mut m = [[0.0; 4]; 4];
    let tmp = 1.0 / (right - left);
    m[0][0] = 2.0 * tmp;
    m[0][3] = -(right + left) * tmp;
    let tmp = 1.0 / (top - bottom);
    m[1][1] = 2.0 * tmp;
    m[1][3] = -(top + bottom) * tmp;
    let tmp = 1.0 / (far - near);
    m[2][2] = -tmp;
    m[2][3] = -far * tmp;
    m[3][3] = 1.0;
    m
}

// ---------------------------------------------------------------------------
// Projection recovery
// ---------------------------------------------------------------------------

/// Projection type understood by the GX transform unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProjectionKind {
    Perspective,
    Orthographic,
}

/// Near/far planes recovered from a projection matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionInfo {
    pub kind: ProjectionKind,
    pub near: f32,
    pub far: f32,
}

/// Classify `m` and recover its clip planes.
///
/// Only exact for matrices built by [`frustum`], [`ortho`] or loaded
/// verbatim from one of those; hand-built matrices give meaningless planes.
pub fn projection_info(m: &Mtx44) -> ProjectionInfo {
    let a = m[2][2];
    let b = m[2][3];

    if m[3][3] == 0.0 {
        let near = b / (a - 1.0);
        // far plane at infinity
        let far = if a != -1.0 { b / (a + 1.0) } else { 1.0 };
        ProjectionInfo {
            kind: ProjectionKind::Perspective,
            near,
            far,
        }
    } else {
        ProjectionInfo {
            kind: ProjectionKind::Orthographic,
            near: (b + 1.0) / a,
            far: (b - 1.0) / a,
        }
    }
}

/// Rebuild `m` for the GX depth range. `z_offset` is added to the depth
/// translation (polygon offset).
pub fn update_projection(m: &Mtx44, z_offset: f32) -> (Mtx44, ProjectionKind) {
    let info = projection_info(m);
    let mut proj = *m;
    let tmp = 1.0 / (info.far - info.near);
    match info.kind {
        ProjectionKind::Orthographic => {
            proj[2][2] = -tmp;
            proj[2][3] = -info.far * tmp + z_offset;
        }
        ProjectionKind::Perspective => {
            proj[2][2] = -info.near * tmp;
            proj[2][3] = -info.near * info.far * tmp + z_offset;
        }
    }
    (proj, info.kind)
}
