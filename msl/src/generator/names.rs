use hlsl2msl_tree as tree;

use super::{Options, Target};

/// Map a scalar to its MSL type name, honouring the precision options
pub(crate) fn scalar_name(scalar: tree::ScalarType, options: &Options) -> &'static str {
    match scalar {
        tree::ScalarType::Bool => "bool",
        tree::ScalarType::Int => {
            if options.use_16bit_integers {
                "short"
            } else {
                "int"
            }
        }
        tree::ScalarType::UInt => {
            if options.use_16bit_integers {
                "ushort"
            } else {
                "uint"
            }
        }
        tree::ScalarType::Half => {
            if options.treat_half_as_float {
                "float"
            } else {
                "half"
            }
        }
        tree::ScalarType::Float => "float",
    }
}

/// Map a type layout to its MSL name
///
/// Metal matrix types order columns before rows, so a column major HLSL
/// floatRxC emits as metal::floatCxR. A row major source matrix keeps its
/// declared order, which preserves element access semantics through the
/// dimension swap.
pub(crate) fn type_layout_name(ty: &tree::Type, options: &Options) -> String {
    match &ty.0 {
        tree::TypeLayout::Void => String::from("void"),
        tree::TypeLayout::Scalar(scalar) => scalar_name(*scalar, options).to_string(),
        tree::TypeLayout::Vector(scalar, 1) => scalar_name(*scalar, options).to_string(),
        tree::TypeLayout::Vector(scalar, x) => format!("{}{}", scalar_name(*scalar, options), x),
        tree::TypeLayout::Matrix(scalar, rows, cols) => {
            let row_major =
                ty.1.row_order == tree::RowOrder::Row || options.pack_matrix_row_major;
            let (x, y) = if row_major {
                (*rows, *cols)
            } else {
                (*cols, *rows)
            };
            format!("metal::{}{}x{}", scalar_name(*scalar, options), x, y)
        }
        tree::TypeLayout::Struct(name) => name.clone(),
        tree::TypeLayout::Object(object) => object_name(*object).to_string(),
    }
}

/// Conversion syntax for a target type, used for casts and constructors
pub(crate) fn cast_prefix(ty: &tree::Type, options: &Options) -> String {
    type_layout_name(ty, options)
}

/// Map an opaque resource type to its MSL name
pub(crate) fn object_name(object: tree::ObjectType) -> &'static str {
    match object {
        tree::ObjectType::Texture2D => "metal::texture2d<float>",
        tree::ObjectType::Texture2DArray => "metal::texture2d_array<float>",
        tree::ObjectType::Texture3D => "metal::texture3d<float>",
        tree::ObjectType::TextureCube => "metal::texturecube<float>",
        tree::ObjectType::SamplerState => "metal::sampler",
        tree::ObjectType::SamplerComparisonState => "metal::sampler",
    }
}

/// How a recognized input semantic binds in the entry point interface
pub(crate) enum InputSemantic {
    /// Vertex stream member bound by attribute index
    Attribute,
    /// Built in value
    Builtin(&'static str),
    /// Interpolant received from the previous stage
    User(String),
}

/// Translate an input semantic for the stage, or None when unrecognized
pub(crate) fn translate_input_semantic(semantic: &str, target: Target) -> Option<InputSemantic> {
    let (base, index) = split_semantic(semantic);
    match target {
        Target::VertexShader => match base.as_str() {
            "SV_VERTEXID" => Some(InputSemantic::Builtin("vertex_id")),
            "SV_INSTANCEID" => Some(InputSemantic::Builtin("instance_id")),
            "POSITION" | "NORMAL" | "TANGENT" | "BINORMAL" | "TEXCOORD" | "COLOR"
            | "BLENDWEIGHT" | "BLENDINDICES" => Some(InputSemantic::Attribute),
            _ => None,
        },
        Target::FragmentShader => match base.as_str() {
            "SV_POSITION" => Some(InputSemantic::Builtin("position")),
            "VFACE" | "SV_ISFRONTFACE" => Some(InputSemantic::Builtin("front_facing")),
            "TEXCOORD" | "COLOR" | "NORMAL" | "TANGENT" | "BINORMAL" | "FOG" => {
                Some(InputSemantic::User(format!("user({})", user_name(&base, index))))
            }
            _ => None,
        },
    }
}

/// Translate an output semantic for the stage into attribute text, or None
/// when unrecognized
pub(crate) fn translate_output_semantic(semantic: &str, target: Target) -> Option<String> {
    let (base, index) = split_semantic(semantic);
    match target {
        Target::VertexShader => match base.as_str() {
            "SV_POSITION" | "POSITION" => Some(String::from("position")),
            "PSIZE" => Some(String::from("point_size")),
            "TEXCOORD" | "COLOR" | "NORMAL" | "TANGENT" | "BINORMAL" | "FOG" => {
                Some(format!("user({})", user_name(&base, index)))
            }
            _ => None,
        },
        Target::FragmentShader => match base.as_str() {
            "SV_TARGET" | "COLOR" => Some(format!("color({})", index.unwrap_or(0))),
            "SV_DEPTH" | "DEPTH" => Some(String::from("depth(any)")),
            _ => None,
        },
    }
}

/// Split a semantic string into its upper case base name and trailing index
fn split_semantic(semantic: &str) -> (String, Option<u32>) {
    let upper = semantic.to_ascii_uppercase();
    let trimmed = upper.trim_end_matches(|c: char| c.is_ascii_digit());
    if trimmed.len() == upper.len() {
        (upper, None)
    } else {
        let index = upper[trimmed.len()..].parse().ok();
        (trimmed.to_string(), index)
    }
}

/// Interpolants link between stages by name, so both sides use the same
/// lower case form
fn user_name(base: &str, index: Option<u32>) -> String {
    let mut name = base.to_ascii_lowercase();
    if let Some(index) = index {
        name.push_str(&index.to_string());
    }
    name
}

/// How an intrinsic call is emitted
pub(crate) enum IntrinsicForm {
    /// Function in the metal namespace
    Metal(&'static str),
    /// HLSL mul maps to the operator product with reversed operands
    MulReversed,
}

/// Intrinsics that keep their name in the metal namespace
const PASSTHROUGH_INTRINSICS: &[&str] = &[
    "abs",
    "acos",
    "asin",
    "atan",
    "atan2",
    "ceil",
    "clamp",
    "cos",
    "cosh",
    "cross",
    "distance",
    "dot",
    "exp",
    "exp2",
    "floor",
    "fma",
    "fmod",
    "length",
    "log",
    "log2",
    "max",
    "min",
    "normalize",
    "pow",
    "reflect",
    "refract",
    "round",
    "rsqrt",
    "saturate",
    "sign",
    "sin",
    "sinh",
    "smoothstep",
    "sqrt",
    "step",
    "tan",
    "tanh",
    "trunc",
];

/// Translate an HLSL intrinsic name, or None when it is not an intrinsic
pub(crate) fn intrinsic_form(name: &str) -> Option<IntrinsicForm> {
    let renamed = match name {
        "mul" => return Some(IntrinsicForm::MulReversed),
        "lerp" => "mix",
        "frac" => "fract",
        "ddx" => "dfdx",
        "ddy" => "dfdy",
        "mad" => "fma",
        _ => {
            return PASSTHROUGH_INTRINSICS
                .iter()
                .find(|n| **n == name)
                .map(|n| IntrinsicForm::Metal(*n));
        }
    };
    Some(IntrinsicForm::Metal(renamed))
}

/// How a texture method call is emitted
pub(crate) enum MethodForm {
    Sample,
    SampleLevel,
    SampleCompare,
    Read,
}

/// Translate an object method name, or None when it is not recognized
pub(crate) fn method_form(name: &str) -> Option<MethodForm> {
    match name {
        "Sample" => Some(MethodForm::Sample),
        "SampleLevel" => Some(MethodForm::SampleLevel),
        "SampleCmp" => Some(MethodForm::SampleCompare),
        "Load" => Some(MethodForm::Read),
        _ => None,
    }
}
