use voxport_quad::TextureId;

/// Companion maps a shader pack pairs with a base texture.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaterialMaps {
    pub normal: Option<TextureId>,
    pub specular: Option<TextureId>,
}

impl MaterialMaps {
    pub fn is_empty(&self) -> bool {
        self.normal.is_none() && self.specular.is_none()
    }
}

/// Optional shader-pack integration, supplied when the session is built.
pub trait MaterialExtension: Send + Sync {
    fn material_maps(&self, texture: &TextureId) -> Option<MaterialMaps>;
}

/// Derives companion names from a suffix convention (`stone` -> `stone_n`, `stone_s`).
#[derive(Clone, Debug)]
pub struct SuffixMaps {
    pub normal_suffix: String,
    pub specular_suffix: String,
}

impl Default for SuffixMaps {
    fn default() -> Self {
        Self {
            normal_suffix: "_n".to_string(),
            specular_suffix: "_s".to_string(),
        }
    }
}

impl MaterialExtension for SuffixMaps {
    fn material_maps(&self, texture: &TextureId) -> Option<MaterialMaps> {
        let name = texture.as_str();
        Some(MaterialMaps {
            normal: Some(TextureId::from(format!("{name}{}", self.normal_suffix))),
            specular: Some(TextureId::from(format!("{name}{}", self.specular_suffix))),
        })
    }
}
