use std::fmt;
use std::sync::Arc;

use crate::uv::UvBounds;

/// Engine resource identifier (texture or atlas), cheap to clone.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(Arc<str>);

impl TextureId {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextureId({})", self.0)
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TextureId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TextureId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A resolved atlas slot: logical texture name, footprint inside the atlas and pixel size.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteRef {
    pub id: TextureId,
    pub footprint: UvBounds,
    pub width: u32,
    pub height: u32,
}
