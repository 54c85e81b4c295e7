/// What an attribute means to the decoder. Everything it does not interpret is `Other`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeRole {
    Position,
    Color,
    /// Texture coordinate into the bound resource.
    UvPrimary,
    /// Light-map coordinate.
    UvSecondary,
    Other,
}

/// Scalar encoding of an attribute's components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    F32,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
}

impl ElementType {
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            ElementType::U8 | ElementType::I8 => 1,
            ElementType::U16 | ElementType::I16 => 2,
            ElementType::F32 | ElementType::U32 | ElementType::I32 => 4,
        }
    }
}

/// One interleaved field: role, element encoding and the bytes it occupies per vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    pub role: AttributeRole,
    pub element: ElementType,
    pub byte_size: usize,
}

impl VertexAttribute {
    #[inline]
    pub const fn new(role: AttributeRole, element: ElementType, components: usize) -> Self {
        Self {
            role,
            element,
            byte_size: element.size() * components,
        }
    }

    /// Raw byte field with no interpretation (padding, normals, overlay data).
    #[inline]
    pub const fn padding(byte_size: usize) -> Self {
        Self {
            role: AttributeRole::Other,
            element: ElementType::U8,
            byte_size,
        }
    }
}

/// Ordered attribute list of a tightly packed interleaved vertex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    stride: usize,
}

impl VertexLayout {
    pub fn new(attributes: Vec<VertexAttribute>) -> Self {
        let stride = attributes.iter().map(|a| a.byte_size).sum();
        Self { attributes, stride }
    }

    #[inline]
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn has_role(&self, role: AttributeRole) -> bool {
        self.attributes.iter().any(|a| a.role == role)
    }

    /// Layout can produce quads: positions plus either texture coordinates or colors.
    pub fn is_capturable(&self) -> bool {
        self.has_role(AttributeRole::Position)
            && (self.has_role(AttributeRole::UvPrimary) || self.has_role(AttributeRole::Color))
    }

    /// Block geometry: position, color, uv, light-map uv, packed normal, one pad byte.
    pub fn block() -> Self {
        use AttributeRole::*;
        Self::new(vec![
            VertexAttribute::new(Position, ElementType::F32, 3),
            VertexAttribute::new(Color, ElementType::U8, 4),
            VertexAttribute::new(UvPrimary, ElementType::F32, 2),
            VertexAttribute::new(UvSecondary, ElementType::I16, 2),
            VertexAttribute::new(Other, ElementType::I8, 3),
            VertexAttribute::padding(1),
        ])
    }

    /// Entity geometry: like [`VertexLayout::block`] with an overlay coordinate before the
    /// light map.
    pub fn entity() -> Self {
        use AttributeRole::*;
        Self::new(vec![
            VertexAttribute::new(Position, ElementType::F32, 3),
            VertexAttribute::new(Color, ElementType::U8, 4),
            VertexAttribute::new(UvPrimary, ElementType::F32, 2),
            VertexAttribute::new(Other, ElementType::I16, 2),
            VertexAttribute::new(UvSecondary, ElementType::I16, 2),
            VertexAttribute::new(Other, ElementType::I8, 3),
            VertexAttribute::padding(1),
        ])
    }
}

/// Primitive assembly mode of a captured draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topology {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
}
