//! `ASTFile`: the parser's unit of output (§6.1), consumed by C3 onward.

use super::ids::DeclId;

#[derive(Debug, Clone)]
pub struct AstFile {
    pub source_file_id: u32,
    pub file_path: String,
    pub declarations: Vec<DeclId>,
    pub imports: Vec<DeclId>,
    pub scope_extensions: Vec<DeclId>,
    /// The file-level namespace scaffolding this file contributes; merged
    /// into the prototype tree by C3.
    pub root_namespace: Option<DeclId>,
}

impl AstFile {
    pub fn new(source_file_id: u32, file_path: impl Into<String>) -> Self {
        AstFile {
            source_file_id,
            file_path: file_path.into(),
            declarations: Vec::new(),
            imports: Vec::new(),
            scope_extensions: Vec::new(),
            root_namespace: None,
        }
    }
}
