use crate::declarations::*;

#[derive(PartialEq, Debug, Clone)]
pub enum RootDefinition {
    Struct(StructDefinition),
    Buffer(Buffer),
    GlobalVariable(GlobalVariable),
    Function(FunctionDefinition),
}

/// A resolved shader program
///
/// Root definitions keep source order, which in HLSL guarantees that a
/// function's callees are declared before the function itself
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Tree {
    pub root_definitions: Vec<RootDefinition>,
}

impl Tree {
    /// Find a function definition by name
    pub fn find_function(&self, name: &str) -> Option<&FunctionDefinition> {
        self.root_definitions.iter().find_map(|def| match def {
            RootDefinition::Function(fd) if fd.name == name => Some(fd),
            _ => None,
        })
    }

    /// Find a struct definition by name
    pub fn find_struct(&self, name: &str) -> Option<&StructDefinition> {
        self.root_definitions.iter().find_map(|def| match def {
            RootDefinition::Struct(sd) if sd.name == name => Some(sd),
            _ => None,
        })
    }

    /// Find a constant buffer declaration by name
    pub fn find_buffer(&self, name: &str) -> Option<&Buffer> {
        self.root_definitions.iter().find_map(|def| match def {
            RootDefinition::Buffer(buffer) if buffer.name == name => Some(buffer),
            _ => None,
        })
    }

    /// Find a texture or sampler declaration by name
    pub fn find_global(&self, name: &str) -> Option<&GlobalVariable> {
        self.root_definitions.iter().find_map(|def| match def {
            RootDefinition::GlobalVariable(gv) if gv.name == name => Some(gv),
            _ => None,
        })
    }

    /// Find the constant buffer that declares the given field
    ///
    /// Constant buffer fields are referenced bare in function bodies, so the
    /// generator needs to recover the owning buffer for a name
    pub fn find_buffer_for_field(&self, field_name: &str) -> Option<&Buffer> {
        self.root_definitions.iter().find_map(|def| match def {
            RootDefinition::Buffer(buffer)
                if buffer.members.iter().any(|m| m.name == field_name) =>
            {
                Some(buffer)
            }
            _ => None,
        })
    }
}
