use hlsl2msl_tree as tree;

use super::Options;

/// Whether converting between two types needs an explicit conversion under
/// Metal's implicit conversion rules
///
/// The policy is conservative: a redundant cast is a style nit while a
/// missing one is a compile or semantic bug in the generated shader, so any
/// numeric pair that is not layout identical converts explicitly.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub(crate) enum CastRequirement {
    NotNeeded,
    Cast,
    Invalid,
}

/// Numeric shape with single element vectors folded into scalars, which is
/// how the type names are emitted
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
enum NumericDimension {
    Scalar,
    Vector(u32),
    Matrix(u32, u32),
}

fn decompose(layout: &tree::TypeLayout) -> Option<(tree::ScalarType, NumericDimension)> {
    match layout {
        tree::TypeLayout::Scalar(s) => Some((*s, NumericDimension::Scalar)),
        tree::TypeLayout::Vector(s, 1) => Some((*s, NumericDimension::Scalar)),
        tree::TypeLayout::Vector(s, x) => Some((*s, NumericDimension::Vector(*x))),
        tree::TypeLayout::Matrix(s, x, y) => Some((*s, NumericDimension::Matrix(*x, *y))),
        _ => None,
    }
}

/// The scalar actually emitted after precision widening
fn effective_scalar(scalar: tree::ScalarType, options: &Options) -> tree::ScalarType {
    if scalar == tree::ScalarType::Half && options.treat_half_as_float {
        tree::ScalarType::Float
    } else {
        scalar
    }
}

/// Classify the conversion from `source` to `dest`
pub(crate) fn classify(
    dest: &tree::Type,
    source: &tree::Type,
    options: &Options,
) -> CastRequirement {
    match (&dest.0, &source.0) {
        (tree::TypeLayout::Void, tree::TypeLayout::Void) => CastRequirement::NotNeeded,
        (tree::TypeLayout::Struct(a), tree::TypeLayout::Struct(b)) => {
            if a == b {
                CastRequirement::NotNeeded
            } else {
                CastRequirement::Invalid
            }
        }
        (tree::TypeLayout::Object(a), tree::TypeLayout::Object(b)) => {
            if a == b {
                CastRequirement::NotNeeded
            } else {
                CastRequirement::Invalid
            }
        }
        (dl, sl) => {
            let (ds, ddim) = match decompose(dl) {
                Some(d) => d,
                None => return CastRequirement::Invalid,
            };
            let (ss, sdim) = match decompose(sl) {
                Some(s) => s,
                None => return CastRequirement::Invalid,
            };

            let same_scalar = effective_scalar(ds, options) == effective_scalar(ss, options);

            match (ddim, sdim) {
                (NumericDimension::Scalar, NumericDimension::Scalar) => {
                    if same_scalar {
                        CastRequirement::NotNeeded
                    } else {
                        CastRequirement::Cast
                    }
                }
                // Truncate a vector down to its first component
                (NumericDimension::Scalar, NumericDimension::Vector(_)) => CastRequirement::Cast,
                // Splat a scalar across a vector
                (NumericDimension::Vector(_), NumericDimension::Scalar) => CastRequirement::Cast,
                (NumericDimension::Vector(x), NumericDimension::Vector(y)) => {
                    if x == y {
                        if same_scalar {
                            CastRequirement::NotNeeded
                        } else {
                            CastRequirement::Cast
                        }
                    } else if x < y {
                        // Cull the later elements of the source
                        CastRequirement::Cast
                    } else {
                        CastRequirement::Invalid
                    }
                }
                (NumericDimension::Matrix(x1, y1), NumericDimension::Matrix(x2, y2)) => {
                    if x1 == x2 && y1 == y2 {
                        if same_scalar {
                            CastRequirement::NotNeeded
                        } else {
                            CastRequirement::Cast
                        }
                    } else {
                        CastRequirement::Invalid
                    }
                }
                _ => CastRequirement::Invalid,
            }
        }
    }
}

/// Swizzle needed to shrink the source down to the destination's component
/// count before the conversion constructor applies
pub(crate) fn contraction_swizzle(
    dest: &tree::Type,
    source: &tree::Type,
) -> Option<&'static str> {
    let (_, ddim) = decompose(&dest.0)?;
    let (_, sdim) = decompose(&source.0)?;
    match (ddim, sdim) {
        (NumericDimension::Scalar, NumericDimension::Vector(_)) => Some(".x"),
        (NumericDimension::Vector(x), NumericDimension::Vector(y)) if x < y => match x {
            1 => Some(".x"),
            2 => Some(".xy"),
            3 => Some(".xyz"),
            _ => None,
        },
        _ => None,
    }
}

/// Match the multiply-add shape `a * b + c` on float values
///
/// Used when precise fma rewriting is requested, so source and target
/// arithmetic do not diverge through separate rounding.
pub(crate) fn as_fma_shape<'e>(
    op: tree::BinOp,
    left: &'e tree::Expression,
    right: &'e tree::Expression,
    result_type: &tree::Type,
) -> Option<(&'e tree::Expression, &'e tree::Expression, &'e tree::Expression)> {
    if op != tree::BinOp::Add {
        return None;
    }
    let is_float = matches!(
        result_type.0,
        tree::TypeLayout::Scalar(tree::ScalarType::Float | tree::ScalarType::Half)
            | tree::TypeLayout::Vector(tree::ScalarType::Float | tree::ScalarType::Half, _)
    );
    if !is_float {
        return None;
    }
    if let tree::ExpressionKind::BinaryOperation(tree::BinOp::Multiply, a, b) = &left.kind {
        return Some((a, b, right));
    }
    None
}
