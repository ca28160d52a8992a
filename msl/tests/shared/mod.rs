use hlsl2msl_msl::{GenerateError, MslGenerator, Options, Target};
use hlsl2msl_tree as tree;

use pretty_assertions::assert_eq;

/// Generate MSL for a tree and compare it against the expected text
#[track_caller]
pub fn check(
    shader: &tree::Tree,
    target: Target,
    entry_name: &str,
    options: &Options,
    expected_msl: &str,
) {
    let mut generator = MslGenerator::new();
    let success = generator.generate(shader, target, entry_name, options);
    if let Some(err) = generator.last_error() {
        panic!("{}", err);
    }
    assert!(success);

    let output_msl = generator.result();
    let output_msl_lines = output_msl.lines();
    let expected_msl_lines = expected_msl.lines();
    for (output_msl_line, expected_msl_line) in output_msl_lines.zip(expected_msl_lines) {
        assert_eq!(output_msl_line, expected_msl_line);
    }
    assert_eq!(output_msl, expected_msl);
}

/// Ensure that generation reports failure with the given first error
#[track_caller]
pub fn expect_generate_fail(
    shader: &tree::Tree,
    target: Target,
    entry_name: &str,
    options: &Options,
    expected_err: GenerateError,
) {
    let mut generator = MslGenerator::new();
    let success = generator.generate(shader, target, entry_name, options);
    assert!(!success, "Expected generation to fail");
    assert_eq!(generator.last_error(), Some(&expected_err));
}

/// Declare a file scope 2d texture
pub fn texture2d(name: &str, slot: u32) -> tree::RootDefinition {
    tree::RootDefinition::GlobalVariable(tree::GlobalVariable {
        ty: tree::Type::from_object(tree::ObjectType::Texture2D),
        name: name.to_string(),
        register_index: Some(slot),
    })
}

/// Declare a file scope sampler
pub fn sampler(name: &str, slot: u32) -> tree::RootDefinition {
    tree::RootDefinition::GlobalVariable(tree::GlobalVariable {
        ty: tree::Type::from_object(tree::ObjectType::SamplerState),
        name: name.to_string(),
        register_index: Some(slot),
    })
}

/// Declare a file scope comparison sampler
pub fn comparison_sampler(name: &str, slot: u32) -> tree::RootDefinition {
    tree::RootDefinition::GlobalVariable(tree::GlobalVariable {
        ty: tree::Type::from_object(tree::ObjectType::SamplerComparisonState),
        name: name.to_string(),
        register_index: Some(slot),
    })
}

/// Declare a file scope constant buffer
pub fn cbuffer(name: &str, slot: u32, members: Vec<tree::BufferMember>) -> tree::RootDefinition {
    tree::RootDefinition::Buffer(tree::Buffer {
        name: name.to_string(),
        register_index: Some(slot),
        members,
    })
}

/// Make a function parameter
pub fn param(name: &str, ty: tree::Type, semantic: Option<&str>) -> tree::FunctionParam {
    tree::FunctionParam {
        name: name.to_string(),
        param_type: ty,
        semantic: semantic.map(str::to_string),
    }
}

/// Define a function with no return semantic
pub fn function(
    name: &str,
    return_type: tree::Type,
    params: Vec<tree::FunctionParam>,
    body: Vec<tree::Statement>,
) -> tree::RootDefinition {
    tree::RootDefinition::Function(tree::FunctionDefinition {
        name: name.to_string(),
        returntype: return_type.into(),
        params,
        body,
    })
}

/// Define an entry function with a semantic on its return value
pub fn entry_function(
    name: &str,
    return_type: tree::Type,
    return_semantic: &str,
    params: Vec<tree::FunctionParam>,
    body: Vec<tree::Statement>,
) -> tree::RootDefinition {
    tree::RootDefinition::Function(tree::FunctionDefinition {
        name: name.to_string(),
        returntype: tree::FunctionReturn {
            return_type,
            semantic: Some(return_semantic.to_string()),
        },
        params,
        body,
    })
}
