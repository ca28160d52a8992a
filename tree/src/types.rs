/// Basic scalar types
#[derive(PartialEq, Eq, Hash, Copy, Clone)]
pub enum ScalarType {
    Bool,
    Int,
    UInt,
    Half,
    Float,
}

/// Memory order for matrix types
#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone)]
pub enum RowOrder {
    Row,
    Column,
}

/// Modifiers that can apply to any type
#[derive(PartialEq, Eq, Hash, Copy, Clone)]
pub struct TypeModifier {
    /// If the type has the const modifier
    pub is_const: bool,

    /// Declared matrix memory order
    /// Only meaningful on matrix types during type checking but carried on any layout in the tree
    pub row_order: RowOrder,
}

/// Opaque resource types bound from outside the shader
#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone)]
pub enum ObjectType {
    Texture2D,
    Texture2DArray,
    Texture3D,
    TextureCube,
    SamplerState,
    SamplerComparisonState,
}

#[derive(PartialEq, Clone)]
pub enum TypeLayout {
    Void,
    Scalar(ScalarType),
    Vector(ScalarType, u32),
    Matrix(ScalarType, u32, u32),
    Struct(String),
    Object(ObjectType),
}

#[derive(PartialEq, Clone)]
pub struct Type(pub TypeLayout, pub TypeModifier);

impl TypeModifier {
    /// Create the default type modifier set
    pub const fn new() -> TypeModifier {
        TypeModifier {
            is_const: false,
            row_order: RowOrder::Column,
        }
    }

    /// Create a modifier which is const
    pub const fn const_only() -> TypeModifier {
        TypeModifier {
            is_const: true,
            row_order: RowOrder::Column,
        }
    }
}

impl Default for TypeModifier {
    fn default() -> TypeModifier {
        TypeModifier::new()
    }
}

impl TypeLayout {
    pub const fn from_scalar(scalar: ScalarType) -> TypeLayout {
        TypeLayout::Scalar(scalar)
    }
    pub const fn from_vector(scalar: ScalarType, x: u32) -> TypeLayout {
        TypeLayout::Vector(scalar, x)
    }

    pub const fn bool() -> TypeLayout {
        TypeLayout::from_scalar(ScalarType::Bool)
    }
    pub const fn int() -> TypeLayout {
        TypeLayout::from_scalar(ScalarType::Int)
    }
    pub const fn uint() -> TypeLayout {
        TypeLayout::from_scalar(ScalarType::UInt)
    }
    pub const fn half() -> TypeLayout {
        TypeLayout::from_scalar(ScalarType::Half)
    }
    pub const fn float() -> TypeLayout {
        TypeLayout::from_scalar(ScalarType::Float)
    }
    pub const fn floatn(x: u32) -> TypeLayout {
        TypeLayout::from_vector(ScalarType::Float, x)
    }
    pub const fn float3x3() -> TypeLayout {
        TypeLayout::Matrix(ScalarType::Float, 3, 3)
    }
    pub const fn float4x4() -> TypeLayout {
        TypeLayout::Matrix(ScalarType::Float, 4, 4)
    }

    /// Test if the layout is a texture or sampler object
    pub const fn is_object(&self) -> bool {
        matches!(self, TypeLayout::Object(_))
    }

    /// Test if the layout is a sampler object
    pub const fn is_sampler(&self) -> bool {
        matches!(
            self,
            TypeLayout::Object(ObjectType::SamplerState)
                | TypeLayout::Object(ObjectType::SamplerComparisonState)
        )
    }
}

impl Type {
    pub const fn void() -> Type {
        Type::from_layout(TypeLayout::Void)
    }
    pub const fn from_layout(layout: TypeLayout) -> Type {
        Type(layout, TypeModifier::new())
    }
    pub const fn from_scalar(scalar: ScalarType) -> Type {
        Type::from_layout(TypeLayout::from_scalar(scalar))
    }
    pub const fn from_vector(scalar: ScalarType, x: u32) -> Type {
        Type::from_layout(TypeLayout::from_vector(scalar, x))
    }
    pub const fn from_object(object: ObjectType) -> Type {
        Type::from_layout(TypeLayout::Object(object))
    }

    pub const fn bool() -> Type {
        Type::from_layout(TypeLayout::bool())
    }
    pub const fn int() -> Type {
        Type::from_layout(TypeLayout::int())
    }
    pub const fn uint() -> Type {
        Type::from_layout(TypeLayout::uint())
    }
    pub const fn half() -> Type {
        Type::from_layout(TypeLayout::half())
    }
    pub const fn float() -> Type {
        Type::from_layout(TypeLayout::float())
    }
    pub const fn floatn(x: u32) -> Type {
        Type::from_layout(TypeLayout::floatn(x))
    }
    pub const fn float3x3() -> Type {
        Type::from_layout(TypeLayout::float3x3())
    }
    pub const fn float4x4() -> Type {
        Type::from_layout(TypeLayout::float4x4())
    }
    pub fn from_struct(name: &str) -> Type {
        Type::from_layout(TypeLayout::Struct(name.to_string()))
    }

    /// Return the same type with the const modifier set
    pub fn as_const(mut self) -> Type {
        self.1.is_const = true;
        self
    }

    /// Return the same type with row major memory order
    pub fn as_row_major(mut self) -> Type {
        self.1.row_order = RowOrder::Row;
        self
    }
}

impl std::fmt::Debug for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ScalarType::Bool => write!(f, "bool"),
            ScalarType::Int => write!(f, "int"),
            ScalarType::UInt => write!(f, "uint"),
            ScalarType::Half => write!(f, "half"),
            ScalarType::Float => write!(f, "float"),
        }
    }
}

impl std::fmt::Debug for TypeLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TypeLayout::Void => write!(f, "void"),
            TypeLayout::Scalar(st) => write!(f, "{:?}", st),
            TypeLayout::Vector(st, x) => write!(f, "{:?}{}", st, x),
            TypeLayout::Matrix(st, x, y) => write!(f, "{:?}{}x{}", st, x, y),
            TypeLayout::Struct(name) => write!(f, "{}", name),
            TypeLayout::Object(ot) => write!(f, "{:?}", ot),
        }
    }
}

impl std::fmt::Debug for TypeModifier {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.row_order == RowOrder::Row {
            write!(f, "row_major ")?;
        }
        if self.is_const {
            write!(f, "const ")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}{:?}", self.1, self.0)
    }
}
