use std::collections::{HashMap, HashSet};

use hlsl2msl_tree as tree;

use super::Options;

/// Kind of bound resource discovered by the prepass
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub(crate) enum ResourceKind {
    ConstantBuffer,
    Texture(tree::ObjectType),
    Sampler,
}

/// One entry in the synthesized resource argument list
#[derive(PartialEq, Debug, Clone)]
pub(crate) struct ResourceArgument {
    pub kind: ResourceKind,
    /// Name of the source declaration
    pub name: String,
    /// Assigned binding index: first discovery position plus the configured
    /// register offset
    pub binding: u32,
}

/// Output of the reachability prepass over the call graph
///
/// Rebuilt from scratch for every generate call.
#[derive(Default)]
pub(crate) struct Prepass {
    /// Ordered resource argument list, unique by declaration, in first
    /// discovery order of a deterministic depth first walk from the entry
    pub resource_arguments: Vec<ResourceArgument>,

    /// Comparison samplers lifted to constexpr declarations instead of
    /// bindings
    pub constexpr_samplers: Vec<String>,

    /// Every function visited from the entry point with the set of resources
    /// it transitively touches
    functions: HashMap<String, FunctionUsage>,
}

#[derive(Default)]
struct FunctionUsage {
    resources: HashSet<String>,
    callees: Vec<String>,
}

impl Prepass {
    /// Test if the prepass reached a function
    pub fn is_visited(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Test if a function must receive the resource aggregate
    pub fn requires_forwarding(&self, name: &str) -> bool {
        match self.functions.get(name) {
            Some(usage) => !usage.resources.is_empty(),
            None => false,
        }
    }

    /// Test if a name is an entry in the resource argument list
    pub fn has_resource(&self, name: &str) -> bool {
        self.resource_arguments.iter().any(|arg| arg.name == name)
    }

    /// Test if a name is a lifted constexpr sampler
    pub fn is_constexpr_sampler(&self, name: &str) -> bool {
        self.constexpr_samplers.iter().any(|s| s == name)
    }

    pub fn visited_count(&self) -> usize {
        self.functions.len()
    }
}

/// Walk the call graph from the entry function and gather every reachable
/// resource reference
pub(crate) fn run(tree: &tree::Tree, entry: &tree::FunctionDefinition, options: &Options) -> Prepass {
    let mut state = PrepassState {
        tree,
        options,
        discovered: Vec::new(),
        constexpr_samplers: Vec::new(),
        functions: HashMap::new(),
    };

    state.visit_function(entry);

    // Propagate resource sets up through callers until a fixed point, so a
    // function forwarding requirement covers indirect use through callees
    let names: Vec<String> = state.functions.keys().cloned().collect();
    loop {
        let mut modified = false;

        for name in &names {
            let usage = &state.functions[name];
            let mut merged = usage.resources.clone();
            for callee in usage.callees.clone() {
                if let Some(callee_usage) = state.functions.get(&callee) {
                    merged.extend(callee_usage.resources.iter().cloned());
                }
            }
            let stored = state.functions.get_mut(name).unwrap();
            if merged.len() > stored.resources.len() {
                stored.resources = merged;
                modified = true;
            }
        }

        if !modified {
            break;
        }
    }

    let resource_arguments = state
        .discovered
        .into_iter()
        .enumerate()
        .map(|(i, (kind, name))| ResourceArgument {
            kind,
            name,
            binding: i as u32 + options.buffer_register_offset,
        })
        .collect();

    Prepass {
        resource_arguments,
        constexpr_samplers: state.constexpr_samplers,
        functions: state.functions,
    }
}

struct PrepassState<'t> {
    tree: &'t tree::Tree,
    options: &'t Options,
    discovered: Vec<(ResourceKind, String)>,
    constexpr_samplers: Vec<String>,
    functions: HashMap<String, FunctionUsage>,
}

impl<'t> PrepassState<'t> {
    fn visit_function(&mut self, fd: &'t tree::FunctionDefinition) {
        // Each function is visited at most once so mutual recursion in the
        // call graph terminates
        if self.functions.contains_key(&fd.name) {
            return;
        }
        self.functions.insert(fd.name.clone(), FunctionUsage::default());

        for statement in &fd.body {
            self.visit_statement(statement, &fd.name);
        }
    }

    fn visit_statement(&mut self, statement: &'t tree::Statement, current: &str) {
        match statement {
            tree::Statement::Expression(expr) => self.visit_expression(expr, current),
            tree::Statement::Var(def) => self.visit_var_def(def, current),
            tree::Statement::Block(block) => {
                for statement in block {
                    self.visit_statement(statement, current);
                }
            }
            tree::Statement::If(cond, block) => {
                self.visit_expression(cond, current);
                self.visit_statement(block, current);
            }
            tree::Statement::IfElse(cond, block_true, block_false) => {
                self.visit_expression(cond, current);
                self.visit_statement(block_true, current);
                self.visit_statement(block_false, current);
            }
            tree::Statement::For(init, cond, inc, block) => {
                match init {
                    tree::InitStatement::Empty => {}
                    tree::InitStatement::Expression(expr) => self.visit_expression(expr, current),
                    tree::InitStatement::Declaration(def) => self.visit_var_def(def, current),
                }
                if let Some(cond) = cond {
                    self.visit_expression(cond, current);
                }
                if let Some(inc) = inc {
                    self.visit_expression(inc, current);
                }
                self.visit_statement(block, current);
            }
            tree::Statement::While(cond, block) => {
                self.visit_expression(cond, current);
                self.visit_statement(block, current);
            }
            tree::Statement::Break => {}
            tree::Statement::Continue => {}
            tree::Statement::Discard => {}
            tree::Statement::Return(Some(expr)) => self.visit_expression(expr, current),
            tree::Statement::Return(None) => {}
        }
    }

    fn visit_var_def(&mut self, def: &'t tree::VarDef, current: &str) {
        for entry in &def.defs {
            if let Some(init) = &entry.init {
                self.visit_initializer(init, current);
            }
        }
    }

    fn visit_initializer(&mut self, init: &'t tree::Initializer, current: &str) {
        match init {
            tree::Initializer::Expression(expr) => self.visit_expression(expr, current),
            tree::Initializer::Aggregate(entries) => {
                for entry in entries {
                    self.visit_initializer(entry, current);
                }
            }
        }
    }

    fn visit_expression(&mut self, expr: &'t tree::Expression, current: &str) {
        match &expr.kind {
            tree::ExpressionKind::Literal(_) => {}
            tree::ExpressionKind::Variable(name) => self.visit_variable_ref(name, current),
            tree::ExpressionKind::UnaryOperation(_, inner) => {
                self.visit_expression(inner, current);
            }
            tree::ExpressionKind::BinaryOperation(_, left, right) => {
                self.visit_expression(left, current);
                self.visit_expression(right, current);
            }
            tree::ExpressionKind::TernaryConditional(cond, expr_true, expr_false) => {
                self.visit_expression(cond, current);
                self.visit_expression(expr_true, current);
                self.visit_expression(expr_false, current);
            }
            tree::ExpressionKind::ArraySubscript(object, index) => {
                self.visit_expression(object, current);
                self.visit_expression(index, current);
            }
            tree::ExpressionKind::Member(object, _) => {
                self.visit_expression(object, current);
            }
            tree::ExpressionKind::Call(name, args) => {
                for arg in args {
                    self.visit_expression(arg, current);
                }
                if let Some(callee) = self.tree.find_function(name) {
                    let usage = self.functions.get_mut(current).unwrap();
                    usage.callees.push(name.clone());
                    self.visit_function(callee);
                }
            }
            tree::ExpressionKind::Method(object, _, args) => {
                self.visit_expression(object, current);
                for arg in args {
                    self.visit_expression(arg, current);
                }
            }
            tree::ExpressionKind::NumericConstructor(args) => {
                for arg in args {
                    self.visit_expression(arg, current);
                }
            }
            tree::ExpressionKind::Cast(inner) => {
                self.visit_expression(inner, current);
            }
        }
    }

    fn visit_variable_ref(&mut self, name: &str, current: &str) {
        if let Some(global) = self.tree.find_global(name) {
            let kind = match &global.ty.0 {
                tree::TypeLayout::Object(tree::ObjectType::SamplerComparisonState)
                    if self.options.const_shadow_sampler =>
                {
                    // Lifted to a constexpr declaration, not a binding
                    if !self.constexpr_samplers.iter().any(|s| s == name) {
                        self.constexpr_samplers.push(name.to_string());
                    }
                    return;
                }
                tree::TypeLayout::Object(
                    tree::ObjectType::SamplerState | tree::ObjectType::SamplerComparisonState,
                ) => ResourceKind::Sampler,
                tree::TypeLayout::Object(object) => ResourceKind::Texture(*object),
                _ => return,
            };
            self.discover(kind, name);
            self.record_use(name, current);
            return;
        }

        if let Some(buffer) = self.tree.find_buffer_for_field(name) {
            let buffer_name = buffer.name.clone();
            self.discover(ResourceKind::ConstantBuffer, &buffer_name);
            self.record_use(&buffer_name, current);
        }
    }

    fn discover(&mut self, kind: ResourceKind, name: &str) {
        if !self.discovered.iter().any(|(_, n)| n == name) {
            self.discovered.push((kind, name.to_string()));
        }
    }

    fn record_use(&mut self, resource: &str, current: &str) {
        let usage = self.functions.get_mut(current).unwrap();
        usage.resources.insert(resource.to_string());
    }
}
