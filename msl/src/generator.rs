use std::fmt::Write;

use hlsl2msl_tree as tree;
use thiserror::Error;
use tracing::debug;

mod casting;
mod names;
mod prepass;

use casting::CastRequirement;
use names::{InputSemantic, IntrinsicForm, MethodForm};
use prepass::{Prepass, ResourceKind};

/// Pipeline stage to generate an entry point for
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum Target {
    VertexShader,
    FragmentShader,
}

/// Behaviour settings for a single generation run
///
/// The options are fixed for the duration of one [MslGenerator::generate]
/// call and are never mutated by the generator.
pub struct Options {
    /// Emit comparison samplers as immutable constexpr declarations instead
    /// of bound arguments
    pub const_shadow_sampler: bool,

    /// Flip the default matrix storage convention to row major
    pub pack_matrix_row_major: bool,

    /// Suppress attribute index annotations on vertex input members
    pub no_index_attribute: bool,

    /// Added to every resource's computed binding index
    pub buffer_register_offset: u32,

    /// Maps a vertex attribute semantic name and ordinal index to a binding
    /// index, letting the host define its own attribute layout
    pub attribute_remap: Option<Box<dyn Fn(&str, u32) -> u32>>,

    /// Widen half precision to float at the type level
    pub treat_half_as_float: bool,

    /// Force half precision everywhere - not supported, rejected at
    /// generation time
    pub force_half_precision: bool,

    /// Rewrite multiply-add shaped arithmetic into an explicit fma call
    pub use_precise_fma: bool,

    /// Use narrow integer type names
    pub use_16bit_integers: bool,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            const_shadow_sampler: false,
            pack_matrix_row_major: false,
            no_index_attribute: false,
            buffer_register_offset: 0,
            attribute_remap: None,
            treat_half_as_float: true,
            force_half_precision: false,
            use_precise_fma: false,
            use_16bit_integers: false,
        }
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("const_shadow_sampler", &self.const_shadow_sampler)
            .field("pack_matrix_row_major", &self.pack_matrix_row_major)
            .field("no_index_attribute", &self.no_index_attribute)
            .field("buffer_register_offset", &self.buffer_register_offset)
            .field("attribute_remap", &self.attribute_remap.is_some())
            .field("treat_half_as_float", &self.treat_half_as_float)
            .field("force_half_precision", &self.force_half_precision)
            .field("use_precise_fma", &self.use_precise_fma)
            .field("use_16bit_integers", &self.use_16bit_integers)
            .finish()
    }
}

/// Error result when generating MSL fails
///
/// The first error is kept and the flag is sticky: generation continues best
/// effort so later structural errors are not masked, but the run reports
/// failure and the accumulated text must not be handed to a downstream
/// compiler.
#[derive(PartialEq, Debug, Error)]
pub enum GenerateError {
    /// The requested entry point does not exist in the tree
    #[error("entry point '{0}' is not defined in the tree")]
    EntryPointNotFound(String),

    /// An input semantic string has no mapping for the stage
    #[error("unrecognized input semantic '{0}'")]
    UnknownInputSemantic(String),

    /// An output semantic string has no mapping for the stage
    #[error("unrecognized output semantic '{0}'")]
    UnknownOutputSemantic(String),

    /// A call expression names a function that is neither defined in the
    /// tree nor a known intrinsic
    #[error("call to unknown function '{0}'")]
    UnknownFunction(String),

    /// An object method is not a known texture intrinsic
    #[error("call to unknown method '{0}'")]
    UnknownMethod(String),

    /// The types have no valid conversion between them
    #[error("no conversion from '{from}' to '{to}'")]
    InvalidCast { from: String, to: String },

    /// Forced half precision is declared but not implemented end to end
    #[error("forced half precision is not supported")]
    UnsupportedForceHalfPrecision,

    /// A call site references a function the reachability prepass never
    /// visited, which breaks the forwarding guarantee
    #[error("function '{0}' was reached during emission but not by the prepass")]
    NotReachedByPrepass(String),
}

/// Generates MSL source from a resolved HLSL tree
///
/// An instance may be reused for sequential generate calls: all per call
/// bookkeeping is rebuilt from scratch on each invocation.
#[derive(Default)]
pub struct MslGenerator {
    output: String,
    error: Option<GenerateError>,
}

impl MslGenerator {
    pub fn new() -> MslGenerator {
        MslGenerator {
            output: String::new(),
            error: None,
        }
    }

    /// Run generation for the entry point named in `entry_name`
    ///
    /// Returns true on success. On failure the first recorded error is
    /// available from [MslGenerator::last_error] and the partial text from
    /// [MslGenerator::result] is not valid MSL.
    pub fn generate(
        &mut self,
        tree: &tree::Tree,
        target: Target,
        entry_name: &str,
        options: &Options,
    ) -> bool {
        // Drop all state from any previous invocation
        self.output = String::new();
        self.error = None;

        let (output, error) = generate_tree(tree, target, entry_name, options);
        self.output = output;
        self.error = error;

        if let Some(err) = &self.error {
            debug!(error = %err, entry_name, "msl generation failed");
        }

        self.error.is_none()
    }

    /// Text accumulated by the most recent generate call
    pub fn result(&self) -> &str {
        &self.output
    }

    /// First error recorded by the most recent generate call
    pub fn last_error(&self) -> Option<&GenerateError> {
        self.error.as_ref()
    }
}

/// Contextual state threaded through one generation run
struct GenerateContext<'t> {
    tree: &'t tree::Tree,
    target: Target,
    options: &'t Options,

    prepass: Prepass,
    current_function: Option<&'t tree::FunctionDefinition>,

    /// Struct types the entry point consumes as stage input
    entry_input_structs: Vec<String>,
    /// Struct type the entry point returns as stage output
    entry_output_struct: Option<String>,
    /// Name of the synthesized resource aggregate
    aggregate_name: String,

    indent: u32,
    error: Option<GenerateError>,
}

impl<'t> GenerateContext<'t> {
    fn new(tree: &'t tree::Tree, target: Target, entry_name: &str, options: &'t Options) -> Self {
        GenerateContext {
            tree,
            target,
            options,
            prepass: Prepass::default(),
            current_function: None,
            entry_input_structs: Vec::new(),
            entry_output_struct: None,
            aggregate_name: format!("{}_Resources", entry_name),
            indent: 0,
            error: None,
        }
    }

    /// Record a failure and keep generating best effort
    fn error(&mut self, err: GenerateError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn has_resources(&self) -> bool {
        !self.prepass.resource_arguments.is_empty()
    }

    /// Increase indentation
    fn push_indent(&mut self) {
        self.indent += 1;
    }

    /// Decrease indentation
    fn pop_indent(&mut self) {
        self.indent -= 1;
    }

    /// Begin a new line and indent up to the current level of indentation
    fn new_line(&self, output: &mut String) {
        // Skip new lines when we are starting the file as there is nothing before us to separate from
        if output.is_empty() {
            return;
        }

        // Remove previous indentation on empty lines - or trailing whitespace
        let trimmed = output.trim_end_matches(' ');
        if output.len() != trimmed.len() {
            output.truncate(trimmed.len());
        }

        output.push('\n');
        for _ in 0..self.indent {
            output.push_str("    ");
        }
    }
}

/// Generate MSL text for a tree and return the first recorded error
fn generate_tree(
    tree: &tree::Tree,
    target: Target,
    entry_name: &str,
    options: &Options,
) -> (String, Option<GenerateError>) {
    let mut context = GenerateContext::new(tree, target, entry_name, options);
    let mut output = String::new();

    if options.force_half_precision {
        context.error(GenerateError::UnsupportedForceHalfPrecision);
    }

    let entry = match tree.find_function(entry_name) {
        Some(entry) => entry,
        None => {
            // Fail before any text is produced
            context.error(GenerateError::EntryPointNotFound(entry_name.to_string()));
            return (output, context.error);
        }
    };

    context.prepass = prepass::run(tree, entry, options);
    debug!(
        resources = context.prepass.resource_arguments.len(),
        functions = context.prepass.visited_count(),
        "reachability prepass complete"
    );

    for param in &entry.params {
        if let tree::TypeLayout::Struct(name) = &param.param_type.0 {
            context.entry_input_structs.push(name.clone());
        }
    }
    if let tree::TypeLayout::Struct(name) = &entry.returntype.return_type.0 {
        context.entry_output_struct = Some(name.clone());
    }

    generate_declarations(&mut output, &mut context);
    generate_functions(entry_name, &mut output, &mut context);

    context.new_line(&mut output);

    (output, context.error)
}

/// Emit the declaration prelude: structs, used buffers, constexpr samplers
/// and the synthesized resource aggregate
fn generate_declarations(output: &mut String, context: &mut GenerateContext) {
    let tree_ref = context.tree;

    for def in &tree_ref.root_definitions {
        if let tree::RootDefinition::Struct(sd) = def {
            start_root_definition(output, context);
            generate_struct(sd, output, context);
        }
    }

    // Only buffers the prepass discovered have a binding to declare
    for def in &tree_ref.root_definitions {
        if let tree::RootDefinition::Buffer(buffer) = def {
            if !context.prepass.has_resource(&buffer.name) {
                continue;
            }
            start_root_definition(output, context);
            generate_buffer(buffer, output, context);
        }
    }

    let constexpr_samplers = context.prepass.constexpr_samplers.clone();
    for (i, name) in constexpr_samplers.iter().enumerate() {
        if i == 0 {
            start_root_definition(output, context);
        } else {
            context.new_line(output);
        }
        write!(
            output,
            "constexpr metal::sampler {}(metal::compare_func::less);",
            name
        )
        .unwrap();
    }

    if context.has_resources() {
        start_root_definition(output, context);
        generate_resource_aggregate(output, context);
    }
}

/// Start a top level definition on its own line with a separating blank line
fn start_root_definition(output: &mut String, context: &mut GenerateContext) {
    context.new_line(output);
    context.new_line(output);
}

/// Role a struct plays in the entry point's stage interface
#[derive(PartialEq, Eq, Copy, Clone)]
enum StructRole {
    None,
    Input,
    Output,
}

/// Emit a struct declaration with translated member types
///
/// Member semantics become stage attributes only when the struct is part of
/// the entry point interface; the input role wins if a struct somehow serves
/// as both input and output.
fn generate_struct(sd: &tree::StructDefinition, output: &mut String, context: &mut GenerateContext) {
    let role = if context.entry_input_structs.contains(&sd.name) {
        StructRole::Input
    } else if context.entry_output_struct.as_deref() == Some(&sd.name) {
        StructRole::Output
    } else {
        StructRole::None
    };

    output.push_str("struct ");
    output.push_str(&sd.name);
    context.new_line(output);
    output.push('{');
    context.push_indent();

    let mut attribute_index = 0;
    for member in &sd.members {
        context.new_line(output);
        generate_type(&member.ty, output, context);
        output.push(' ');
        output.push_str(&member.name);
        generate_variable_bind(&member.bind, output, context);

        match (role, &member.semantic) {
            (StructRole::Input, Some(semantic)) => {
                generate_input_attribute(semantic, &mut attribute_index, output, context);
            }
            (StructRole::Output, Some(semantic)) => {
                generate_output_attribute(semantic, output, context);
            }
            _ => {}
        }

        output.push(';');
    }

    context.pop_indent();
    context.new_line(output);
    output.push_str("};");
}

/// Emit the stage input attribute for a semantic
fn generate_input_attribute(
    semantic: &str,
    attribute_index: &mut u32,
    output: &mut String,
    context: &mut GenerateContext,
) {
    match names::translate_input_semantic(semantic, context.target) {
        Some(InputSemantic::Attribute) => {
            let ordinal = *attribute_index;
            *attribute_index += 1;
            if context.options.no_index_attribute {
                return;
            }
            let index = match &context.options.attribute_remap {
                Some(remap) => remap(semantic, ordinal),
                None => ordinal,
            };
            write!(output, " [[attribute({})]]", index).unwrap();
        }
        Some(InputSemantic::Builtin(attr)) => {
            write!(output, " [[{}]]", attr).unwrap();
        }
        Some(InputSemantic::User(attr)) => {
            write!(output, " [[{}]]", attr).unwrap();
        }
        None => {
            context.error(GenerateError::UnknownInputSemantic(semantic.to_string()));
        }
    }
}

/// Emit the stage output attribute for a semantic
fn generate_output_attribute(semantic: &str, output: &mut String, context: &mut GenerateContext) {
    match names::translate_output_semantic(semantic, context.target) {
        Some(attr) => {
            write!(output, " [[{}]]", attr).unwrap();
        }
        None => {
            context.error(GenerateError::UnknownOutputSemantic(semantic.to_string()));
        }
    }
}

/// Emit a constant buffer as a plain struct holding its fields
fn generate_buffer(buffer: &tree::Buffer, output: &mut String, context: &mut GenerateContext) {
    output.push_str("struct ");
    output.push_str(&buffer.name);
    output.push_str("_Constants");
    context.new_line(output);
    output.push('{');
    context.push_indent();

    for member in &buffer.members {
        context.new_line(output);
        generate_type(&member.ty, output, context);
        output.push(' ');
        output.push_str(&member.name);
        generate_variable_bind(&member.bind, output, context);
        output.push(';');
    }

    context.pop_indent();
    context.new_line(output);
    output.push_str("};");
}

/// Emit the synthesized aggregate gathering every resource argument
///
/// This is the structural answer to the source language's implicit global
/// resource model: Metal receives the whole set as one argument buffer.
fn generate_resource_aggregate(output: &mut String, context: &mut GenerateContext) {
    output.push_str("struct ");
    output.push_str(&context.aggregate_name.clone());
    context.new_line(output);
    output.push('{');
    context.push_indent();

    let arguments = context.prepass.resource_arguments.clone();
    for argument in &arguments {
        context.new_line(output);
        match argument.kind {
            ResourceKind::ConstantBuffer => {
                write!(output, "constant {}_Constants& {}", argument.name, argument.name)
                    .unwrap();
            }
            ResourceKind::Texture(object) => {
                write!(output, "{} {}", names::object_name(object), argument.name).unwrap();
            }
            ResourceKind::Sampler => {
                write!(output, "metal::sampler {}", argument.name).unwrap();
            }
        }
        write!(output, " [[id({})]];", argument.binding).unwrap();
    }

    context.pop_indent();
    context.new_line(output);
    output.push_str("};");
}

/// Emit every function the prepass reached, in tree order
fn generate_functions(entry_name: &str, output: &mut String, context: &mut GenerateContext) {
    let tree_ref = context.tree;
    for def in &tree_ref.root_definitions {
        if let tree::RootDefinition::Function(fd) = def {
            if !context.prepass.is_visited(&fd.name) {
                continue;
            }
            start_root_definition(output, context);
            if fd.name == entry_name {
                generate_entry_function(fd, output, context);
            } else {
                generate_function(fd, output, context);
            }
        }
    }
}

/// Emit a helper function, with the resource aggregate appended to the
/// formals when the prepass marked the function for forwarding
fn generate_function<'t>(
    fd: &'t tree::FunctionDefinition,
    output: &mut String,
    context: &mut GenerateContext<'t>,
) {
    context.current_function = Some(fd);

    generate_type(&fd.returntype.return_type, output, context);
    output.push(' ');
    output.push_str(&fd.name);
    output.push('(');

    let mut first = true;
    for param in &fd.params {
        if !first {
            output.push_str(", ");
        }
        first = false;
        generate_type(&param.param_type, output, context);
        output.push(' ');
        output.push_str(&param.name);
    }

    if context.prepass.requires_forwarding(&fd.name) {
        if !first {
            output.push_str(", ");
        }
        write!(output, "constant {}& resources", context.aggregate_name).unwrap();
    }

    output.push(')');
    generate_function_body(&fd.body, output, context);

    context.current_function = None;
}

/// Emit the entry function in its stage form
fn generate_entry_function<'t>(
    fd: &'t tree::FunctionDefinition,
    output: &mut String,
    context: &mut GenerateContext<'t>,
) {
    context.current_function = Some(fd);

    output.push_str(match context.target {
        Target::VertexShader => "vertex ",
        Target::FragmentShader => "fragment ",
    });

    // A plain return type with a semantic relies on the stage default
    // binding, but the semantic still has to be recognized
    if !matches!(fd.returntype.return_type.0, tree::TypeLayout::Struct(_)) {
        if let Some(semantic) = &fd.returntype.semantic {
            if names::translate_output_semantic(semantic, context.target).is_none() {
                context.error(GenerateError::UnknownOutputSemantic(semantic.clone()));
            }
        }
    }

    generate_type(&fd.returntype.return_type, output, context);
    output.push(' ');
    output.push_str(&fd.name);
    output.push('(');

    let mut first = true;
    let mut attribute_index = 0;
    for param in &fd.params {
        if !first {
            output.push_str(", ");
        }
        first = false;

        if let tree::TypeLayout::Struct(name) = &param.param_type.0 {
            write!(output, "{} {} [[stage_in]]", name, param.name).unwrap();
            continue;
        }

        generate_type(&param.param_type, output, context);
        output.push(' ');
        output.push_str(&param.name);
        if let Some(semantic) = &param.semantic {
            let semantic = semantic.clone();
            generate_input_attribute(&semantic, &mut attribute_index, output, context);
        }
    }

    if context.has_resources() {
        if !first {
            output.push_str(", ");
        }
        write!(
            output,
            "constant {}& resources [[buffer(0)]]",
            context.aggregate_name
        )
        .unwrap();
    }

    output.push(')');
    generate_function_body(&fd.body, output, context);

    context.current_function = None;
}

/// Emit a function body block
fn generate_function_body(
    body: &[tree::Statement],
    output: &mut String,
    context: &mut GenerateContext,
) {
    output.push_str(" {");
    context.push_indent();
    for statement in body {
        generate_statement(statement, output, context);
    }
    context.pop_indent();
    if !body.is_empty() {
        context.new_line(output);
    }
    output.push('}');
}

/// Emit a statement
fn generate_statement(
    statement: &tree::Statement,
    output: &mut String,
    context: &mut GenerateContext,
) {
    context.new_line(output);

    match statement {
        tree::Statement::Expression(expr) => {
            generate_expression(expr, output, context);
            output.push(';');
        }
        tree::Statement::Var(def) => {
            generate_var_def(def, output, context);
            output.push(';');
        }
        tree::Statement::Block(block) => {
            output.push('{');
            context.push_indent();
            for statement in block {
                generate_statement(statement, output, context);
            }
            context.pop_indent();
            context.new_line(output);
            output.push('}');
        }
        tree::Statement::If(cond, block) => {
            output.push_str("if (");
            generate_expression(cond, output, context);
            output.push(')');
            generate_statement(block, output, context);
        }
        tree::Statement::IfElse(cond, block_true, block_false) => {
            output.push_str("if (");
            generate_expression(cond, output, context);
            output.push(')');
            generate_statement(block_true, output, context);

            context.new_line(output);
            output.push_str("else");
            generate_statement(block_false, output, context);
        }
        tree::Statement::For(init, cond, inc, block) => {
            output.push_str("for (");
            match init {
                tree::InitStatement::Empty => {}
                tree::InitStatement::Expression(expr) => generate_expression(expr, output, context),
                tree::InitStatement::Declaration(def) => generate_var_def(def, output, context),
            }
            output.push(';');
            if let Some(cond) = cond {
                output.push(' ');
                generate_expression(cond, output, context);
            }
            output.push(';');
            if let Some(inc) = inc {
                output.push(' ');
                generate_expression(inc, output, context);
            }
            output.push(')');

            generate_statement(block, output, context);
        }
        tree::Statement::While(cond, block) => {
            output.push_str("while (");
            generate_expression(cond, output, context);
            output.push(')');

            generate_statement(block, output, context);
        }
        tree::Statement::Break => output.push_str("break;"),
        tree::Statement::Continue => output.push_str("continue;"),
        tree::Statement::Discard => output.push_str("metal::discard_fragment();"),
        tree::Statement::Return(expr_opt) => {
            output.push_str("return");
            if let Some(expr) = expr_opt {
                output.push(' ');
                match context.current_function {
                    Some(fd) => {
                        let return_type = fd.returntype.return_type.clone();
                        generate_typed_expression(&return_type, expr, output, context);
                    }
                    None => generate_expression(expr, output, context),
                }
            }
            output.push(';');
        }
    }
}

/// Emit a local variable definition
fn generate_var_def(def: &tree::VarDef, output: &mut String, context: &mut GenerateContext) {
    generate_type(&def.local_type, output, context);

    let mut first = true;
    for entry in &def.defs {
        if !first {
            output.push(',');
        }
        first = false;

        output.push(' ');
        output.push_str(&entry.name);
        generate_variable_bind(&entry.bind, output, context);

        if let Some(init) = &entry.init {
            output.push_str(" = ");
            generate_initializer(init, &def.local_type, output, context);
        }
    }
}

/// Emit an array suffix for a declarator
fn generate_variable_bind(
    bind: &tree::VariableBind,
    output: &mut String,
    context: &mut GenerateContext,
) {
    if let tree::VariableBind::Array(size) = bind {
        output.push('[');
        if let Some(expr) = size {
            generate_expression(expr, output, context);
        }
        output.push(']');
    }
}

/// Emit an initializer against the declared type
fn generate_initializer(
    init: &tree::Initializer,
    declared_type: &tree::Type,
    output: &mut String,
    context: &mut GenerateContext,
) {
    match init {
        tree::Initializer::Expression(expr) => {
            generate_typed_expression(declared_type, expr, output, context);
        }
        tree::Initializer::Aggregate(entries) => {
            // Struct aggregates check each entry against the member type,
            // everything else checks against the declared base type
            let member_types: Option<Vec<tree::Type>> = match &declared_type.0 {
                tree::TypeLayout::Struct(name) => context
                    .tree
                    .find_struct(name)
                    .map(|sd| sd.members.iter().map(|m| m.ty.clone()).collect()),
                _ => None,
            };

            output.push_str("{ ");
            let mut first = true;
            for (i, entry) in entries.iter().enumerate() {
                if !first {
                    output.push_str(", ");
                }
                first = false;

                let entry_type = match &member_types {
                    Some(types) => types.get(i).cloned().unwrap_or_else(|| declared_type.clone()),
                    None => declared_type.clone(),
                };
                generate_initializer(entry, &entry_type, output, context);
            }
            output.push_str(" }");
        }
    }
}

/// Emit a type with its modifiers
fn generate_type(ty: &tree::Type, output: &mut String, context: &mut GenerateContext) {
    if ty.1.is_const {
        output.push_str("const ");
    }
    output.push_str(&names::type_layout_name(ty, context.options));
}

/// Emit an expression, converting to the target type where Metal's implicit
/// conversion rules demand it
fn generate_typed_expression(
    target: &tree::Type,
    expr: &tree::Expression,
    output: &mut String,
    context: &mut GenerateContext,
) {
    match casting::classify(target, &expr.ty, context.options) {
        CastRequirement::NotNeeded => generate_expression(expr, output, context),
        CastRequirement::Cast => {
            output.push_str(&names::cast_prefix(target, context.options));
            output.push('(');
            match casting::contraction_swizzle(target, &expr.ty) {
                Some(swizzle) => {
                    output.push('(');
                    generate_expression(expr, output, context);
                    output.push(')');
                    output.push_str(swizzle);
                }
                None => generate_expression(expr, output, context),
            }
            output.push(')');
        }
        CastRequirement::Invalid => {
            context.error(GenerateError::InvalidCast {
                from: format!("{:?}", expr.ty),
                to: format!("{:?}", target),
            });
            generate_expression(expr, output, context);
        }
    }
}

/// Emit an expression
fn generate_expression(expr: &tree::Expression, output: &mut String, context: &mut GenerateContext) {
    match &expr.kind {
        tree::ExpressionKind::Literal(literal) => generate_literal(literal, output, context),
        tree::ExpressionKind::Variable(name) => generate_variable_ref(name, output, context),
        tree::ExpressionKind::UnaryOperation(op, inner) => {
            let postfix = matches!(
                op,
                tree::UnaryOp::PostfixIncrement | tree::UnaryOp::PostfixDecrement
            );
            if postfix {
                generate_operand(inner, output, context);
                output.push_str(unary_op_text(*op));
            } else {
                output.push_str(unary_op_text(*op));
                generate_operand(inner, output, context);
            }
        }
        tree::ExpressionKind::BinaryOperation(op, left, right) => {
            if context.options.use_precise_fma {
                if let Some((a, b, c)) = casting::as_fma_shape(*op, left, right, &expr.ty) {
                    output.push_str("metal::fma(");
                    generate_expression(a, output, context);
                    output.push_str(", ");
                    generate_expression(b, output, context);
                    output.push_str(", ");
                    generate_expression(c, output, context);
                    output.push(')');
                    return;
                }
            }

            generate_operand(left, output, context);
            output.push(' ');
            output.push_str(bin_op_text(*op));
            output.push(' ');
            if is_assignment_op(*op) {
                // The right hand side converts against the assigned type
                let left_type = left.ty.clone();
                generate_typed_expression(&left_type, right, output, context);
            } else {
                generate_operand(right, output, context);
            }
        }
        tree::ExpressionKind::TernaryConditional(cond, expr_true, expr_false) => {
            generate_operand(cond, output, context);
            output.push_str(" ? ");
            generate_operand(expr_true, output, context);
            output.push_str(" : ");
            generate_operand(expr_false, output, context);
        }
        tree::ExpressionKind::ArraySubscript(object, index) => {
            generate_operand(object, output, context);
            output.push('[');
            generate_expression(index, output, context);
            output.push(']');
        }
        tree::ExpressionKind::Member(object, name) => {
            generate_operand(object, output, context);
            output.push('.');
            output.push_str(name);
        }
        tree::ExpressionKind::Call(name, args) => {
            generate_call(name, args, output, context);
        }
        tree::ExpressionKind::Method(object, name, args) => {
            generate_method(object, name, args, output, context);
        }
        tree::ExpressionKind::NumericConstructor(args) => {
            let ty = expr.ty.clone();
            output.push_str(&names::cast_prefix(&ty, context.options));
            output.push('(');
            let mut first = true;
            for arg in args {
                if !first {
                    output.push_str(", ");
                }
                first = false;
                // Each slot converts to the constructed scalar type while
                // keeping the argument's own dimension
                match constructor_slot_type(&ty, &arg.ty) {
                    Some(slot_type) => generate_typed_expression(&slot_type, arg, output, context),
                    None => generate_expression(arg, output, context),
                }
            }
            output.push(')');
        }
        tree::ExpressionKind::Cast(inner) => {
            output.push_str(&names::cast_prefix(&expr.ty, context.options));
            output.push('(');
            generate_expression(inner, output, context);
            output.push(')');
        }
    }
}

/// Emit a sub expression, parenthesizing conservatively: any operand that is
/// itself an operator expression keeps explicit parentheses rather than
/// relying on the precedence rules matching between languages
fn generate_operand(expr: &tree::Expression, output: &mut String, context: &mut GenerateContext) {
    let needs_parens = matches!(
        expr.kind,
        tree::ExpressionKind::UnaryOperation(..)
            | tree::ExpressionKind::BinaryOperation(..)
            | tree::ExpressionKind::TernaryConditional(..)
            | tree::ExpressionKind::Cast(..)
    );
    if needs_parens {
        output.push('(');
        generate_expression(expr, output, context);
        output.push(')');
    } else {
        generate_expression(expr, output, context);
    }
}

/// Emit a reference to a named value, routing globals through the resource
/// aggregate
fn generate_variable_ref(name: &str, output: &mut String, context: &mut GenerateContext) {
    if context.prepass.is_constexpr_sampler(name) {
        output.push_str(name);
        return;
    }
    if context.prepass.has_resource(name) {
        output.push_str("resources.");
        output.push_str(name);
        return;
    }
    if let Some(buffer) = context.tree.find_buffer_for_field(name) {
        if context.prepass.has_resource(&buffer.name) {
            write!(output, "resources.{}.{}", buffer.name, name).unwrap();
            return;
        }
    }
    output.push_str(name);
}

/// Emit a call to a tree function or intrinsic
fn generate_call(
    name: &str,
    args: &[tree::Expression],
    output: &mut String,
    context: &mut GenerateContext,
) {
    let tree_ref = context.tree;
    if let Some(callee) = tree_ref.find_function(name) {
        if !context.prepass.is_visited(name) {
            context.error(GenerateError::NotReachedByPrepass(name.to_string()));
        }

        output.push_str(name);
        output.push('(');
        let mut first = true;
        for (i, arg) in args.iter().enumerate() {
            if !first {
                output.push_str(", ");
            }
            first = false;
            match callee.params.get(i) {
                Some(param) => {
                    generate_typed_expression(&param.param_type, arg, output, context)
                }
                None => generate_expression(arg, output, context),
            }
        }
        if context.prepass.requires_forwarding(name) {
            if !first {
                output.push_str(", ");
            }
            output.push_str("resources");
        }
        output.push(')');
        return;
    }

    match names::intrinsic_form(name) {
        Some(IntrinsicForm::Metal(msl_name)) => {
            output.push_str("metal::");
            output.push_str(msl_name);
            output.push('(');
            generate_expression_list(args, output, context);
            output.push(')');
        }
        Some(IntrinsicForm::MulReversed) if args.len() == 2 => {
            // HLSL mul(a, b) maps to the operator product with reversed
            // operands under Metal's column vector convention
            output.push('(');
            generate_operand(&args[1], output, context);
            output.push_str(" * ");
            generate_operand(&args[0], output, context);
            output.push(')');
        }
        _ => {
            context.error(GenerateError::UnknownFunction(name.to_string()));
            output.push_str(name);
            output.push('(');
            generate_expression_list(args, output, context);
            output.push(')');
        }
    }
}

/// Emit a texture method call
fn generate_method(
    object: &tree::Expression,
    name: &str,
    args: &[tree::Expression],
    output: &mut String,
    context: &mut GenerateContext,
) {
    let form = match names::method_form(name) {
        Some(form) => form,
        None => {
            context.error(GenerateError::UnknownMethod(name.to_string()));
            generate_operand(object, output, context);
            output.push('.');
            output.push_str(name);
            output.push('(');
            generate_expression_list(args, output, context);
            output.push(')');
            return;
        }
    };

    generate_operand(object, output, context);
    match form {
        MethodForm::Sample => {
            output.push_str(".sample(");
            generate_expression_list(args, output, context);
            output.push(')');
        }
        MethodForm::SampleLevel => {
            output.push_str(".sample(");
            if args.len() == 3 {
                generate_expression(&args[0], output, context);
                output.push_str(", ");
                generate_expression(&args[1], output, context);
                output.push_str(", metal::level(");
                generate_expression(&args[2], output, context);
                output.push_str(")");
            } else {
                generate_expression_list(args, output, context);
            }
            output.push(')');
        }
        MethodForm::SampleCompare => {
            output.push_str(".sample_compare(");
            generate_expression_list(args, output, context);
            output.push(')');
        }
        MethodForm::Read => {
            output.push_str(".read(");
            generate_expression_list(args, output, context);
            output.push(')');
        }
    }
}

/// Emit a bare comma separated expression list
fn generate_expression_list(
    exprs: &[tree::Expression],
    output: &mut String,
    context: &mut GenerateContext,
) {
    let mut first = true;
    for expr in exprs {
        if !first {
            output.push_str(", ");
        }
        first = false;
        generate_expression(expr, output, context);
    }
}

/// The expected type of a constructor slot: the constructed scalar type with
/// the argument's own dimension, when both shapes are known
fn constructor_slot_type(constructed: &tree::Type, arg: &tree::Type) -> Option<tree::Type> {
    let scalar = match &constructed.0 {
        tree::TypeLayout::Scalar(s) => *s,
        tree::TypeLayout::Vector(s, _) => *s,
        tree::TypeLayout::Matrix(s, _, _) => *s,
        _ => return None,
    };
    match &arg.0 {
        tree::TypeLayout::Scalar(_) => Some(tree::Type::from_scalar(scalar)),
        tree::TypeLayout::Vector(_, x) => Some(tree::Type::from_vector(scalar, *x)),
        _ => None,
    }
}

/// Emit a literal
fn generate_literal(literal: &tree::Literal, output: &mut String, context: &mut GenerateContext) {
    match literal {
        tree::Literal::Bool(true) => output.push_str("true"),
        tree::Literal::Bool(false) => output.push_str("false"),
        tree::Literal::Int(v) => write!(output, "{}", v).unwrap(),
        tree::Literal::UInt(v) => write!(output, "{}u", v).unwrap(),
        tree::Literal::Half(v) => {
            if context.options.treat_half_as_float {
                generate_float_literal(*v, "f", output);
            } else {
                generate_float_literal(*v, "h", output);
            }
        }
        tree::Literal::Float(v) => generate_float_literal(*v, "f", output),
    }
}

fn generate_float_literal(v: f32, suffix: &str, output: &mut String) {
    if v == f32::INFINITY {
        output.push_str("INFINITY");
    } else if v == f32::NEG_INFINITY {
        output.push_str("-INFINITY");
    } else if v == (v as i64 as f32) {
        write!(output, "{}.0{}", v as i64, suffix).unwrap();
    } else if v > i64::MAX as f32 || v < i64::MIN as f32 {
        write!(output, "{}.0{}", v, suffix).unwrap();
    } else {
        write!(output, "{}{}", v, suffix).unwrap();
    }
}

fn unary_op_text(op: tree::UnaryOp) -> &'static str {
    match op {
        tree::UnaryOp::PrefixIncrement | tree::UnaryOp::PostfixIncrement => "++",
        tree::UnaryOp::PrefixDecrement | tree::UnaryOp::PostfixDecrement => "--",
        tree::UnaryOp::Plus => "+",
        tree::UnaryOp::Minus => "-",
        tree::UnaryOp::LogicalNot => "!",
        tree::UnaryOp::BitwiseNot => "~",
    }
}

fn bin_op_text(op: tree::BinOp) -> &'static str {
    match op {
        tree::BinOp::Add => "+",
        tree::BinOp::Subtract => "-",
        tree::BinOp::Multiply => "*",
        tree::BinOp::Divide => "/",
        tree::BinOp::Modulus => "%",
        tree::BinOp::LeftShift => "<<",
        tree::BinOp::RightShift => ">>",
        tree::BinOp::BitwiseAnd => "&",
        tree::BinOp::BitwiseOr => "|",
        tree::BinOp::BitwiseXor => "^",
        tree::BinOp::BooleanAnd => "&&",
        tree::BinOp::BooleanOr => "||",
        tree::BinOp::LessThan => "<",
        tree::BinOp::LessEqual => "<=",
        tree::BinOp::GreaterThan => ">",
        tree::BinOp::GreaterEqual => ">=",
        tree::BinOp::Equality => "==",
        tree::BinOp::Inequality => "!=",
        tree::BinOp::Assignment => "=",
        tree::BinOp::SumAssignment => "+=",
        tree::BinOp::DifferenceAssignment => "-=",
        tree::BinOp::ProductAssignment => "*=",
        tree::BinOp::QuotientAssignment => "/=",
        tree::BinOp::RemainderAssignment => "%=",
    }
}

fn is_assignment_op(op: tree::BinOp) -> bool {
    matches!(
        op,
        tree::BinOp::Assignment
            | tree::BinOp::SumAssignment
            | tree::BinOp::DifferenceAssignment
            | tree::BinOp::ProductAssignment
            | tree::BinOp::QuotientAssignment
            | tree::BinOp::RemainderAssignment
    )
}
