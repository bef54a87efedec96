use crate::gfx::resources::GpuHandle;

/// How a texture is projected when sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureMapping {
    #[default]
    Uv,
    /// Equirectangular panorama used for reflections and image-based lighting
    EquirectangularReflection,
}

/// High dynamic range RGBA image used as the scene environment
#[derive(Debug, Clone)]
pub struct EnvironmentTexture {
    pub width: u32,
    pub height: u32,
    /// Row-major linear RGBA texels
    pub data: Vec<[f32; 4]>,
    pub mapping: TextureMapping,
    pub gpu: GpuHandle,
}

impl EnvironmentTexture {
    pub fn new(width: u32, height: u32, data: Vec<[f32; 4]>) -> Self {
        Self {
            width,
            height,
            data,
            mapping: TextureMapping::Uv,
            gpu: GpuHandle::default(),
        }
    }

    /// Mean RGB over all texels, the diffuse term the renderer uses for image-based light.
    ///
    /// Non-finite texels are ignored.
    pub fn average_radiance(&self) -> [f32; 3] {
        let mut sum = [0.0_f64; 3];
        let mut n = 0usize;
        for texel in &self.data {
            if texel[..3].iter().all(|c| c.is_finite()) {
                for (acc, c) in sum.iter_mut().zip(texel) {
                    *acc += f64::from(*c);
                }
                n += 1;
            }
        }
        if n == 0 {
            return [0.0; 3];
        }
        let n = n as f64;
        [(sum[0] / n) as f32, (sum[1] / n) as f32, (sum[2] / n) as f32]
    }
}
