// Public drawing API.
//
// A `Context` owns the graphics state, the GX backend and the collaborators.
// State-mutation calls only update the state store and mark dirty bits;
// failures land in the sticky error slot. Draw calls run the pipeline:
// stencil pass, stage synthesis, dirty-state application, geometry walk.

pub mod caps;
pub mod params;

use std::rc::Rc;

use smallvec::{smallvec, SmallVec};

use self::caps::Toggles;
use self::params::{
    Capability, ClearMask, FogParam, GlBlendFactor, IntegerQuery, InterleavedFormat, MatrixTarget, TexGenPlane,
};
use crate::apply;
use crate::config::Config;
use crate::draw::{self, DrawMode, Indices, PrimitiveMode, VertexLayout, VertexSource};
use crate::emulation::{ClipPlaneEmulation, NoClipPlanes, NoStencil, StencilEmulation};
use crate::error::GlError;
use crate::gx::state::CompareFunction;
use crate::gx::{GxBackend, GxColor, GxCommand};
use crate::matrix::{self, Mtx44, IDENTITY, IDENTITY44};
use crate::ogx_warn;
use crate::stages;
use crate::state::arrays::{ArrayBinding, ArrayBindings, ArrayReader, ClientArray, ClientArrayKind, ElementType};
use crate::state::immediate::{ImmediateArray, ImmediateAttribute, VertexRecord};
use crate::state::lighting::{ColorMaterialMode, LightParam, MaterialParam, MAX_LIGHTS};
use crate::state::{
    CullFace, DirtyFlags, FrontFace, GraphicsState, MatrixMode, Rect, TexCoordAxis, TexEnvMode, TexGenMode,
    MAX_CLIP_PLANES,
};
use crate::texture::{TextureTable, MAX_TEXTURE_SIZE};

/// One rendering context on top of a GX backend.
pub struct Context<B: GxBackend> {
    gx: B,
    state: GraphicsState,
    textures: TextureTable,
    stencil: Box<dyn StencilEmulation>,
    clip: Box<dyn ClipPlaneEmulation>,
}

impl<B: GxBackend> Context<B> {
    /// Create a context whose diagnostics follow `OPENGX_DEBUG`.
    pub fn new(gx: B) -> Self {
        Self::with_config(gx, Config::from_env())
    }

    pub fn with_config(gx: B, config: Config) -> Self {
        let mut ctx = Self {
            gx,
            state: GraphicsState::new(config),
            textures: TextureTable::new(),
            stencil: Box::new(NoStencil),
            clip: Box::new(NoClipPlanes),
        };
        ctx.init_hardware();
        ctx
    }

    /// Replace the stencil and clip-plane collaborators.
    pub fn with_emulation(mut self, stencil: Box<dyn StencilEmulation>, clip: Box<dyn ClipPlaneEmulation>) -> Self {
        self.stencil = stencil;
        self.clip = clip;
        self
    }

    fn init_hardware(&mut self) {
        // One modulation color, as set by the color calls.
        self.gx.submit(GxCommand::SetNumChans(1));
        self.gx.submit(GxCommand::LoadPosMtx {
            slot: apply::IDENTITY_SLOT,
            mtx: IDENTITY,
        });
        draw::load_array_formats(&mut self.gx);
    }

    pub fn state(&self) -> &GraphicsState {
        &self.state
    }

    pub fn gx(&self) -> &B {
        &self.gx
    }

    pub fn gx_mut(&mut self) -> &mut B {
        &mut self.gx
    }

    /// Tear the context down, handing back the backend.
    pub fn into_backend(self) -> B {
        self.gx
    }

    pub fn draw_count(&self) -> u64 {
        self.state.draw_count
    }

    fn fail(&mut self, error: GlError) {
        self.state.error.record(error);
    }

    // -----------------------------------------------------------------------
    // Capabilities
    // -----------------------------------------------------------------------

    pub fn enable(&mut self, cap: Capability) {
        self.set_capability(cap, true);
    }

    pub fn disable(&mut self, cap: Capability) {
        self.set_capability(cap, false);
    }

    fn set_capability(&mut self, cap: Capability, on: bool) {
        let (handler, arg) = cap.handler();
        if arg >= handler.limit {
            ogx_warn!(self.state.config, "Ignoring out-of-range capability {:?}", cap);
            return;
        }
        let mut toggles = Toggles {
            state: &mut self.state,
            stencil: self.stencil.as_mut(),
            clip: self.clip.as_mut(),
        };
        (handler.set)(&mut toggles, arg, on);
        self.state.mark(handler.dirty);
    }

    pub fn is_enabled(&self, cap: Capability) -> bool {
        let (handler, arg) = cap.handler();
        arg < handler.limit && (handler.get)(&self.state, arg)
    }

    // -----------------------------------------------------------------------
    // Client arrays
    // -----------------------------------------------------------------------

    pub fn enable_client_state(&mut self, kind: ClientArrayKind) {
        self.state.arrays.get_mut(kind).enabled = true;
    }

    pub fn disable_client_state(&mut self, kind: ClientArrayKind) {
        self.state.arrays.get_mut(kind).enabled = false;
    }

    fn bind_array(&mut self, kind: ClientArrayKind, reader: Rc<dyn ArrayReader>) {
        self.state.arrays.get_mut(kind).reader = Some(reader);
    }

    pub fn vertex_pointer(&mut self, reader: Rc<dyn ArrayReader>) {
        self.bind_array(ClientArrayKind::Vertex, reader);
    }

    pub fn normal_pointer(&mut self, reader: Rc<dyn ArrayReader>) {
        self.bind_array(ClientArrayKind::Normal, reader);
    }

    pub fn color_pointer(&mut self, reader: Rc<dyn ArrayReader>) {
        self.bind_array(ClientArrayKind::Color, reader);
    }

    pub fn tex_coord_pointer(&mut self, reader: Rc<dyn ArrayReader>) {
        self.bind_array(ClientArrayKind::TexCoord, reader);
    }

    /// Bind all arrays from one interleaved float buffer and enable exactly
    /// the ones present in `format`. `stride` is in bytes; 0 means packed.
    pub fn interleaved_arrays(&mut self, format: InterleavedFormat, stride: usize, data: Rc<[u8]>) {
        let Some(layout) = format.layout() else {
            ogx_warn!(self.state.config, "Unsupported interleaved format {:?}", format);
            return;
        };

        let float = ElementType::F32.size();
        let stride = if stride == 0 { layout.floats * float } else { stride };
        let binding = |offset: usize, components: u8| ArrayBinding {
            enabled: true,
            reader: Some(Rc::new(
                ClientArray::new(data.clone(), ElementType::F32, components, stride).with_offset(offset * float),
            )),
        };

        let arrays = &mut self.state.arrays;
        arrays.disable_all();
        arrays.vertex = binding(layout.vertex.0, layout.vertex.1);
        if let Some(offset) = layout.normal {
            arrays.normal = binding(offset, 3);
        }
        if let Some((offset, components)) = layout.color {
            arrays.color = binding(offset, components);
        }
        if let Some(offset) = layout.tex_coord {
            arrays.tex_coord = binding(offset, 2);
        }
    }

    // -----------------------------------------------------------------------
    // Matrices
    // -----------------------------------------------------------------------

    pub fn matrix_mode(&mut self, mode: MatrixMode) {
        self.state.matrix_mode = mode;
    }

    pub fn load_identity(&mut self) {
        match self.state.matrix_mode {
            MatrixMode::Projection => self.state.projection = IDENTITY44,
            MatrixMode::Modelview => self.state.modelview = IDENTITY,
            MatrixMode::None => return,
        }
        self.state.mark(DirtyFlags::MATRICES);
    }

    /// Replace the current matrix with a column-major one.
    pub fn load_matrix(&mut self, m: &[f32; 16]) {
        match self.state.matrix_mode {
            MatrixMode::Projection => self.state.projection = matrix::from_gl44(m),
            MatrixMode::Modelview => self.state.modelview = matrix::from_gl(m),
            MatrixMode::None => return,
        }
        self.state.mark(DirtyFlags::MATRICES);
    }

    /// Post-multiply the current matrix by a column-major one.
    pub fn mult_matrix(&mut self, m: &[f32; 16]) {
        self.mult_current(&matrix::from_gl44(m));
    }

    fn mult_current(&mut self, m: &Mtx44) {
        match self.state.matrix_mode {
            MatrixMode::Projection => self.state.projection = matrix::concat44(&self.state.projection, m),
            MatrixMode::Modelview => {
                let full = matrix::concat44(&matrix::extend(&self.state.modelview), m);
                self.state.modelview = [full[0], full[1], full[2]];
            }
            MatrixMode::None => return,
        }
        self.state.mark(DirtyFlags::MATRICES);
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        match self.state.matrix_mode {
            MatrixMode::Projection => matrix::apply_translation(&mut self.state.projection, x, y, z),
            MatrixMode::Modelview => matrix::apply_translation(&mut self.state.modelview, x, y, z),
            MatrixMode::None => return,
        }
        self.state.mark(DirtyFlags::MATRICES);
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        match self.state.matrix_mode {
            MatrixMode::Projection => matrix::apply_scale(&mut self.state.projection, x, y, z),
            MatrixMode::Modelview => matrix::apply_scale(&mut self.state.modelview, x, y, z),
            MatrixMode::None => return,
        }
        self.state.mark(DirtyFlags::MATRICES);
    }

    /// Rotate by `angle` degrees around `(x, y, z)`.
    pub fn rotate(&mut self, angle: f32, x: f32, y: f32, z: f32) {
        let rotation = matrix::rotation_deg([x, y, z], angle);
        match self.state.matrix_mode {
            MatrixMode::Projection => {
                self.state.projection = matrix::concat_affine(&self.state.projection, &rotation);
            }
            MatrixMode::Modelview => self.state.modelview = matrix::concat(&self.state.modelview, &rotation),
            MatrixMode::None => return,
        }
        self.state.mark(DirtyFlags::MATRICES);
    }

    pub fn frustum(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        self.mult_current(&matrix::frustum(left, right, bottom, top, near, far));
    }

    pub fn ortho(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        self.mult_current(&matrix::ortho(left, right, bottom, top, near, far));
    }

    pub fn push_matrix(&mut self) {
        let state = &mut self.state;
        let result = match state.matrix_mode {
            MatrixMode::Projection => state.projection_stack.push(&state.projection),
            MatrixMode::Modelview => state.modelview_stack.push(&state.modelview),
            MatrixMode::None => return,
        };
        state.record(result);
    }

    /// Restore the current mode's matrix. Only that mode's stack is popped.
    pub fn pop_matrix(&mut self) {
        let state = &mut self.state;
        let result = match state.matrix_mode {
            MatrixMode::Projection => state.projection_stack.pop().map(|m| state.projection = m),
            MatrixMode::Modelview => state.modelview_stack.pop().map(|m| state.modelview = m),
            MatrixMode::None => return,
        };
        if state.record(result).is_some() {
            state.mark(DirtyFlags::MATRICES);
        }
    }

    // -----------------------------------------------------------------------
    // Lighting
    // -----------------------------------------------------------------------

    pub fn light(&mut self, index: u8, param: LightParam) {
        let modelview = self.state.modelview;
        let Some(light) = self.state.lighting.lights.get_mut(index as usize) else {
            ogx_warn!(self.state.config, "Ignoring light {} (max is {})", index, MAX_LIGHTS);
            return;
        };
        param.apply(light, &modelview);
        self.state.mark(param.dirty());
    }

    pub fn material(&mut self, param: MaterialParam) {
        param.apply(&mut self.state.lighting.material);
        self.state.mark(param.dirty());
    }

    pub fn light_model_ambient(&mut self, rgba: [f32; 4]) {
        self.state.lighting.global_ambient = rgba;
        self.state.mark(DirtyFlags::MATERIAL);
    }

    pub fn color_material(&mut self, mode: ColorMaterialMode) {
        self.state.lighting.color_material_mode = mode;
        self.state.mark(DirtyFlags::MATERIAL);
    }

    // -----------------------------------------------------------------------
    // Fog and rasterizer
    // -----------------------------------------------------------------------

    pub fn fog(&mut self, param: FogParam) {
        let fog = &mut self.state.fog;
        match param {
            FogParam::Mode(mode) => fog.mode = mode,
            FogParam::Density(density) => fog.density = density,
            FogParam::Start(start) => fog.start = start,
            FogParam::End(end) => fog.end = end,
            FogParam::Color(color) => fog.color = color,
        }
    }

    pub fn cull_face(&mut self, face: CullFace) {
        self.state.raster.cull_face = face;
        self.state.mark(DirtyFlags::CULL);
    }

    pub fn front_face(&mut self, face: FrontFace) {
        if self.state.raster.front_face != face {
            self.state.raster.front_face = face;
            self.state.mark(DirtyFlags::CULL);
        }
    }

    pub fn depth_func(&mut self, func: CompareFunction) {
        self.state.raster.depth_func = func;
        self.state.mark(DirtyFlags::Z);
    }

    pub fn depth_mask(&mut self, write: bool) {
        self.state.raster.depth_write = write;
        self.state.mark(DirtyFlags::Z);
    }

    /// `reference` is clamped to [0, 1].
    pub fn alpha_func(&mut self, func: CompareFunction, reference: f32) {
        self.state.raster.alpha_func = func;
        self.state.raster.alpha_ref = (reference.clamp(0.0, 1.0) * 255.0) as u8;
        self.state.mark(DirtyFlags::ALPHA_TEST);
    }

    /// Factors the blender cannot express leave the previous factor in place.
    pub fn blend_func(&mut self, src: GlBlendFactor, dst: GlBlendFactor) {
        match src.to_gx() {
            Some(factor) => self.state.raster.blend_src = factor,
            None => ogx_warn!(self.state.config, "Unsupported source blend factor {:?}", src),
        }
        match dst.to_gx() {
            Some(factor) => self.state.raster.blend_dst = factor,
            None => ogx_warn!(self.state.config, "Unsupported destination blend factor {:?}", dst),
        }
        self.state.mark(DirtyFlags::BLEND);
    }

    /// GX masks color writes as a whole: any enabled channel enables all.
    pub fn color_mask(&mut self, red: bool, green: bool, blue: bool, alpha: bool) {
        self.state.raster.color_update = red || green || blue || alpha;
        self.state.mark(DirtyFlags::COLOR_UPDATE);
    }

    pub fn polygon_offset(&mut self, factor: f32, units: f32) {
        self.state.raster.polygon_offset_factor = factor;
        self.state.raster.polygon_offset_units = units;
        self.state.mark(DirtyFlags::MATRICES);
    }

    pub fn point_size(&mut self, size: f32) {
        self.state.raster.point_size = sixteenths(size);
        self.state.mark(DirtyFlags::RASTER_SIZE);
    }

    pub fn line_width(&mut self, width: f32) {
        self.state.raster.line_width = sixteenths(width);
        self.state.mark(DirtyFlags::RASTER_SIZE);
    }

    /// Set the viewport. The scissor box is reset to match it.
    pub fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if width < 0 || height < 0 {
            self.fail(GlError::InvalidValue);
            return;
        }
        let rect = Rect { x, y, width, height };
        self.state.viewport = rect;
        self.state.scissor = rect;
        self.state.mark(DirtyFlags::VIEWPORT | DirtyFlags::SCISSOR);
    }

    pub fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if width < 0 || height < 0 {
            self.fail(GlError::InvalidValue);
            return;
        }
        self.state.scissor = Rect { x, y, width, height };
        self.state.mark(DirtyFlags::SCISSOR);
    }

    // -----------------------------------------------------------------------
    // Texturing
    // -----------------------------------------------------------------------

    pub fn bind_texture(&mut self, handle: u32) {
        self.state.texture.bound = handle;
    }

    pub fn tex_env_mode(&mut self, mode: TexEnvMode) {
        if mode == TexEnvMode::Decal {
            ogx_warn!(self.state.config, "Unsupported texture environment mode {:?}", mode);
            return;
        }
        self.state.texture.env_mode = mode;
    }

    pub fn tex_gen_mode(&mut self, axis: TexCoordAxis, mode: TexGenMode) {
        self.state.texture.gen_mode[axis as usize] = mode;
        self.state.mark(DirtyFlags::TEXTURE_GEN);
    }

    pub fn tex_gen_plane(&mut self, axis: TexCoordAxis, plane: TexGenPlane, coefficients: [f32; 4]) {
        let planes = match plane {
            TexGenPlane::Object => &mut self.state.texture.object_planes,
            TexGenPlane::Eye => &mut self.state.texture.eye_planes,
        };
        planes[axis as usize] = coefficients;
        self.state.mark(DirtyFlags::TEXTURE_GEN);
    }

    pub fn textures(&self) -> &TextureTable {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut TextureTable {
        &mut self.textures
    }

    // -----------------------------------------------------------------------
    // Clearing
    // -----------------------------------------------------------------------

    pub fn clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.state.clear_color = GxColor::from_f32([red, green, blue, alpha]);
    }

    pub fn clear_depth(&mut self, depth: f32) {
        let depth = depth.clamp(0.0, 1.0);
        if depth != self.state.clear_depth {
            self.state.clear_depth = depth;
            self.state.mark(DirtyFlags::CLEAR_Z);
        }
    }

    pub fn clear(&mut self, mask: ClearMask) {
        apply::apply_clear(&mut self.state, self.stencil.as_mut(), mask, &mut self.gx);
    }

    // -----------------------------------------------------------------------
    // Immediate mode
    // -----------------------------------------------------------------------

    pub fn begin(&mut self, mode: PrimitiveMode) {
        let result = self.state.immediate.begin(mode);
        self.state.record(result);
    }

    pub fn vertex2f(&mut self, x: f32, y: f32) {
        self.vertex3f(x, y, 0.0);
    }

    pub fn vertex3f(&mut self, x: f32, y: f32, z: f32) {
        let result = self.state.immediate.push_vertex([x, y, z]);
        self.state.record(result);
    }

    pub fn normal3f(&mut self, x: f32, y: f32, z: f32) {
        self.state.immediate.current_normal = [x, y, z];
    }

    pub fn color3f(&mut self, red: f32, green: f32, blue: f32) {
        self.color4f(red, green, blue, 1.0);
    }

    pub fn color4f(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.state.immediate.set_color([red, green, blue, alpha]);
    }

    pub fn color4ub(&mut self, red: u8, green: u8, blue: u8, alpha: u8) {
        self.state.immediate.set_color(GxColor::new(red, green, blue, alpha).to_f32());
    }

    pub fn tex_coord2f(&mut self, s: f32, t: f32) {
        self.state.immediate.current_tex_coord = [s, t];
    }

    /// Close the begin/end pair and draw the collected vertices through the
    /// array path. The caller's array bindings are restored afterwards.
    pub fn end(&mut self) {
        let records = match self.state.immediate.finish() {
            Ok(records) => records,
            Err(error) => return self.fail(error),
        };
        let mode = self.state.immediate.mode;
        let count = records.len();
        let bindings = immediate_bindings(records, self.state.immediate.has_color);

        let saved = std::mem::replace(&mut self.state.arrays, bindings);
        self.draw(mode, VertexSource::Range { first: 0, count });
        self.state.arrays = saved;
    }

    /// Feed element `index` of the enabled arrays through the immediate-mode
    /// attribute calls.
    pub fn array_element(&mut self, index: usize) {
        let arrays = &self.state.arrays;
        let normal = arrays.normal.active().map(|r| r.read_float3(index));
        let tex_coord = arrays.tex_coord.active().map(|r| r.read_tex2(index));
        let color = arrays.color.active().map(|r| r.read_color(index));
        let position = arrays.vertex.active().map(|r| r.read_float3(index));

        if let Some([x, y, z]) = normal {
            self.normal3f(x, y, z);
        }
        if let Some([s, t]) = tex_coord {
            self.tex_coord2f(s, t);
        }
        if let Some(c) = color {
            self.color4ub(c.r, c.g, c.b, c.a);
        }
        if let Some([x, y, z]) = position {
            if self.state.immediate.active {
                self.vertex3f(x, y, z);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Draws
    // -----------------------------------------------------------------------

    pub fn draw_arrays(&mut self, mode: PrimitiveMode, first: usize, count: usize) {
        self.draw(mode, VertexSource::Range { first, count });
    }

    pub fn draw_elements(&mut self, mode: PrimitiveMode, indices: Indices<'_>) {
        self.draw(mode, VertexSource::Indexed(indices));
    }

    fn draw(&mut self, mode: PrimitiveMode, source: VertexSource<'_>) {
        if self.state.immediate.active {
            return self.fail(GlError::InvalidOperation);
        }
        let mode = DrawMode::from(mode);
        let count = source.count();
        if count == 0 {
            return;
        }
        if let Err(error) = draw::emitted_count(mode, count) {
            return self.fail(error);
        }
        if !self.state.arrays.vertex.is_active() {
            ogx_warn!(self.state.config, "Draw without an enabled vertex array");
            return;
        }

        if self.state.stencil_enabled {
            let arrays = &self.state.arrays;
            self.stencil.draw_pass(&mut self.gx, &mut |gx: &mut dyn GxBackend| {
                draw::walk(arrays, mode, &source, VertexLayout::FLAT, gx)
            });
        }

        let budget = stages::synthesize(
            &mut self.state,
            &self.textures,
            self.stencil.as_mut(),
            self.clip.as_mut(),
            &mut self.gx,
        );
        apply::apply_state(&mut self.state, &mut self.gx);
        if budget.is_none() {
            return;
        }

        let layout = VertexLayout::for_state(&self.state);
        draw::walk(&self.state.arrays, mode, &source, layout, &mut self.gx);
        self.state.draw_count += 1;
    }

    // -----------------------------------------------------------------------
    // Queries and sync
    // -----------------------------------------------------------------------

    /// Take the sticky error, `None` meaning no error.
    pub fn get_error(&mut self) -> Option<GlError> {
        self.state.error.take()
    }

    /// Column-major copy of a matrix.
    pub fn get_matrix(&self, target: MatrixTarget) -> [f32; 16] {
        match target {
            MatrixTarget::Modelview => matrix::to_gl(&self.state.modelview),
            MatrixTarget::Projection => matrix::to_gl44(&self.state.projection),
        }
    }

    /// Stack depths count the current matrix.
    pub fn get_integer(&self, query: IntegerQuery) -> SmallVec<[i32; 4]> {
        let state = &self.state;
        let depth = |n: usize| n as i32 + 1;
        match query {
            IntegerQuery::MaxLights => smallvec![MAX_LIGHTS as i32],
            IntegerQuery::MaxModelviewStackDepth => smallvec![depth(state.modelview_stack.capacity())],
            IntegerQuery::MaxProjectionStackDepth => smallvec![depth(state.projection_stack.capacity())],
            IntegerQuery::ModelviewStackDepth => smallvec![depth(state.modelview_stack.len())],
            IntegerQuery::ProjectionStackDepth => smallvec![depth(state.projection_stack.len())],
            IntegerQuery::MaxTextureSize => smallvec![MAX_TEXTURE_SIZE as i32],
            IntegerQuery::MaxClipPlanes => smallvec![MAX_CLIP_PLANES as i32],
            IntegerQuery::Viewport => {
                let vp = state.viewport;
                smallvec![vp.x, vp.y, vp.width, vp.height]
            }
        }
    }

    /// Commands go straight to the backend; nothing to flush.
    pub fn flush(&mut self) {}

    /// Block until the backend has retired every command.
    pub fn finish(&mut self) {
        self.gx.draw_done();
    }
}

/// Point size and line width in the hardware's 1/16 pixel units.
fn sixteenths(size: f32) -> u8 {
    (size * 16.0).clamp(0.0, u8::MAX as f32) as u8
}

/// Array bindings reading from a finished immediate-mode buffer.
fn immediate_bindings(records: Rc<[VertexRecord]>, has_color: bool) -> ArrayBindings {
    let binding = |attribute, enabled| ArrayBinding {
        enabled,
        reader: Some(Rc::new(ImmediateArray::new(records.clone(), attribute)) as Rc<dyn ArrayReader>),
    };
    ArrayBindings {
        vertex: binding(ImmediateAttribute::Position, true),
        normal: binding(ImmediateAttribute::Normal, true),
        color: binding(ImmediateAttribute::Color, has_color),
        tex_coord: binding(ImmediateAttribute::TexCoord, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gx::recorder::GxRecorder;

    fn context() -> Context<GxRecorder> {
        Context::with_config(GxRecorder::new(), Config::default())
    }

    #[test]
    fn init_pushes_power_on_state() {
        let ctx = context();
        assert_eq!(ctx.gx().regs.num_chans, 1);
        assert_eq!(ctx.gx().regs.pos_matrices[0], IDENTITY);
        assert_eq!(ctx.state().dirty, DirtyFlags::all());
        assert_eq!(ctx.draw_count(), 0);
    }

    #[test]
    fn matrix_calls_ignored_without_target() {
        let mut ctx = context();
        ctx.matrix_mode(MatrixMode::None);
        ctx.translate(1.0, 2.0, 3.0);
        ctx.push_matrix();
        assert_eq!(ctx.state().modelview, IDENTITY);
        assert_eq!(ctx.get_error(), None);
        assert_eq!(ctx.get_integer(IntegerQuery::ModelviewStackDepth).as_slice(), &[1]);
    }

    #[test]
    fn pop_only_touches_current_stack() {
        let mut ctx = context();
        ctx.matrix_mode(MatrixMode::Modelview);
        ctx.push_matrix();
        ctx.matrix_mode(MatrixMode::Projection);
        ctx.pop_matrix();
        assert_eq!(ctx.get_error(), Some(GlError::StackUnderflow));
        assert_eq!(ctx.get_integer(IntegerQuery::ModelviewStackDepth).as_slice(), &[2]);
    }

    #[test]
    fn blend_func_keeps_supported_half() {
        let mut ctx = context();
        ctx.blend_func(GlBlendFactor::SrcAlphaSaturate, GlBlendFactor::OneMinusSrcAlpha);
        let raster = &ctx.state().raster;
        assert_eq!(raster.blend_src, crate::gx::state::BlendFactor::One);
        assert_eq!(raster.blend_dst, crate::gx::state::BlendFactor::InvSrcAlpha);
    }

    #[test]
    fn decal_is_ignored() {
        let mut ctx = context();
        ctx.tex_env_mode(TexEnvMode::Replace);
        ctx.tex_env_mode(TexEnvMode::Decal);
        assert_eq!(ctx.state().texture.env_mode, TexEnvMode::Replace);
    }

    #[test]
    fn out_of_range_light_is_ignored() {
        let mut ctx = context();
        ctx.enable(Capability::Light(9));
        ctx.light(12, LightParam::SpotCutoff(10.0));
        assert!(!ctx.is_enabled(Capability::Light(9)));
        assert_eq!(ctx.get_error(), None);
    }

    #[test]
    fn clear_depth_marks_only_on_change() {
        let mut ctx = context();
        ctx.state.dirty = DirtyFlags::empty();
        ctx.clear_depth(1.0);
        assert!(!ctx.state().is_dirty(DirtyFlags::CLEAR_Z));
        ctx.clear_depth(2.0);
        assert!(!ctx.state().is_dirty(DirtyFlags::CLEAR_Z));
        ctx.clear_depth(0.5);
        assert!(ctx.state().is_dirty(DirtyFlags::CLEAR_Z));
    }

    #[test]
    fn viewport_resets_scissor() {
        let mut ctx = context();
        ctx.scissor(10, 10, 20, 20);
        ctx.viewport(0, 0, 320, 240);
        assert_eq!(ctx.state().scissor, ctx.state().viewport);
        assert_eq!(ctx.get_integer(IntegerQuery::Viewport).as_slice(), &[0, 0, 320, 240]);
        ctx.viewport(0, 0, -1, 5);
        assert_eq!(ctx.get_error(), Some(GlError::InvalidValue));
    }

    #[test]
    fn raster_sizes_in_sixteenths() {
        let mut ctx = context();
        ctx.point_size(2.5);
        ctx.line_width(100.0);
        assert_eq!(ctx.state().raster.point_size, 40);
        assert_eq!(ctx.state().raster.line_width, 255);
    }

    #[test]
    fn interleaved_enables_present_arrays() {
        let mut ctx = context();
        ctx.enable_client_state(ClientArrayKind::Color);
        let data = crate::state::arrays::f32_bytes(&[0.5, 0.25, 1.0, 2.0, 3.0]);
        ctx.interleaved_arrays(InterleavedFormat::T2fV3f, 0, data);

        let arrays = &ctx.state().arrays;
        assert!(arrays.vertex.is_active() && arrays.tex_coord.is_active());
        assert!(!arrays.color.enabled && !arrays.normal.enabled);
        let vertex = arrays.vertex.active().expect("bound");
        assert_eq!(vertex.read_float3(0), [1.0, 2.0, 3.0]);
        let tex = arrays.tex_coord.active().expect("bound");
        assert_eq!(tex.read_tex2(0), [0.5, 0.25]);
    }

    /// Stencil stand-in that runs its pass and then rejects every draw.
    #[derive(Default)]
    struct RejectAll {
        passes: usize,
    }

    impl StencilEmulation for RejectAll {
        fn set_enabled(&mut self, enabled: bool) -> bool {
            enabled
        }

        fn setup_stages(
            &mut self,
            _state: &GraphicsState,
            _budget: &mut crate::emulation::StageBudget,
            _gx: &mut dyn GxBackend,
        ) -> bool {
            false
        }

        fn draw_pass(&mut self, gx: &mut dyn GxBackend, draw: &mut dyn FnMut(&mut dyn GxBackend)) {
            self.passes += 1;
            draw(gx);
        }

        fn clear(&mut self, _gx: &mut dyn GxBackend) {}
    }

    #[test]
    fn stencil_veto_skips_the_walk() {
        let mut ctx = context().with_emulation(Box::<RejectAll>::default(), Box::new(NoClipPlanes));
        ctx.enable(Capability::StencilTest);
        assert!(ctx.is_enabled(Capability::StencilTest));
        ctx.vertex_pointer(Rc::new(ClientArray::from_f32(&[0.0; 9], 3)));
        ctx.enable_client_state(ClientArrayKind::Vertex);
        ctx.draw_arrays(PrimitiveMode::Triangles, 0, 3);

        // only the flat stencil pass reached the hardware
        assert_eq!(ctx.gx().draws().len(), 1);
        assert_eq!(ctx.draw_count(), 0);
        // pending state still gets pushed for the next call
        assert!(!ctx.state().is_dirty(DirtyFlags::Z));
    }

    #[test]
    fn array_element_sets_attributes_before_vertex() {
        let mut ctx = context();
        ctx.vertex_pointer(Rc::new(ClientArray::from_f32(&[1.0, 2.0, 3.0], 3)));
        ctx.color_pointer(Rc::new(ClientArray::from_u8(&[0, 255, 0, 255], 4)));
        ctx.enable_client_state(ClientArrayKind::Vertex);
        ctx.enable_client_state(ClientArrayKind::Color);

        ctx.begin(PrimitiveMode::Points);
        ctx.array_element(0);
        ctx.end();

        let draw = ctx.gx().last_draw().expect("one draw");
        assert_eq!(draw.vertices[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(draw.vertices[0].colors[0], Some(GxColor::new(0, 255, 0, 255)));
        // the caller's arrays are back
        assert!(ctx.state().arrays.color.is_active());
    }
}
