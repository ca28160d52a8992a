use crate::statements::{Statement, VariableBind};
use crate::types::Type;

/// A struct declared at file scope
#[derive(PartialEq, Debug, Clone)]
pub struct StructDefinition {
    pub name: String,
    pub members: Vec<StructMember>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct StructMember {
    pub ty: Type,
    pub name: String,
    pub bind: VariableBind,
    /// Raw I/O semantic string, only meaningful on stage input / output
    /// structs
    pub semantic: Option<String>,
}

impl StructMember {
    pub fn new(ty: Type, name: &str, semantic: Option<&str>) -> StructMember {
        StructMember {
            ty,
            name: name.to_string(),
            bind: VariableBind::Normal,
            semantic: semantic.map(str::to_string),
        }
    }
}

/// A constant buffer declared at file scope
#[derive(PartialEq, Debug, Clone)]
pub struct Buffer {
    pub name: String,
    /// Register index from the source declaration, if one was written
    pub register_index: Option<u32>,
    pub members: Vec<BufferMember>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct BufferMember {
    pub ty: Type,
    pub name: String,
    pub bind: VariableBind,
}

impl BufferMember {
    pub fn new(ty: Type, name: &str) -> BufferMember {
        BufferMember {
            ty,
            name: name.to_string(),
            bind: VariableBind::Normal,
        }
    }
}

/// A texture or sampler declared at file scope
#[derive(PartialEq, Debug, Clone)]
pub struct GlobalVariable {
    pub ty: Type,
    pub name: String,
    /// Register index from the source declaration, if one was written
    pub register_index: Option<u32>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct FunctionParam {
    pub name: String,
    pub param_type: Type,
    pub semantic: Option<String>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct FunctionReturn {
    pub return_type: Type,
    pub semantic: Option<String>,
}

impl From<Type> for FunctionReturn {
    fn from(ty: Type) -> FunctionReturn {
        FunctionReturn {
            return_type: ty,
            semantic: None,
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct FunctionDefinition {
    pub name: String,
    pub returntype: FunctionReturn,
    pub params: Vec<FunctionParam>,
    pub body: Vec<Statement>,
}
