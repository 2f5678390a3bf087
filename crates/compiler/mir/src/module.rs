//! # Modules
//!
//! A compilation unit: the functions with bodies plus the external declarations
//! (runtime entry points among them) their calls may target.

use index_vec::IndexVec;
use rustc_hash::FxHashMap;

use crate::{indent_str, FunctionId, MirFunction, MirType, PrettyPrint};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirModule {
    pub functions: IndexVec<FunctionId, MirFunction>,
    /// Name index over `functions`; names are unique
    pub function_names: FxHashMap<String, FunctionId>,
}

impl MirModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(&mut self, function: MirFunction) -> FunctionId {
        let name = function.name.clone();
        let id = self.functions.push(function);
        self.function_names.insert(name, id);
        id
    }

    /// Declares an external function, or returns the function already named `name`
    pub fn declare_external(
        &mut self,
        name: &str,
        params: Vec<MirType>,
        return_type: MirType,
    ) -> FunctionId {
        match self.lookup_function(name) {
            Some(id) => id,
            None => self.add_function(MirFunction::external(name, params, return_type)),
        }
    }

    pub fn get_function(&self, id: FunctionId) -> Option<&MirFunction> {
        self.functions.get(id)
    }

    pub fn lookup_function(&self, name: &str) -> Option<FunctionId> {
        self.function_names.get(name).copied()
    }

    /// Functions that have a body, in id order
    pub fn defined_function_ids(&self) -> Vec<FunctionId> {
        self.functions
            .iter_enumerated()
            .filter(|(_, function)| !function.is_external)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Checks the name index against the function table, then every function
    pub fn validate(&self) -> Result<(), String> {
        if self.function_names.len() != self.functions.len() {
            return Err("function names are not unique".to_string());
        }
        for (name, &id) in &self.function_names {
            match self.functions.get(id) {
                Some(function) if function.name == *name => {}
                Some(function) => {
                    return Err(format!(
                        "name index maps '{name}' to function '{}'",
                        function.name
                    ))
                }
                None => return Err(format!("name index maps '{name}' to missing f{}", id.index())),
            }
        }

        self.functions.iter().try_for_each(|function| {
            function
                .validate()
                .map_err(|err| format!("in function '{}': {err}", function.name))
        })
    }
}

impl PrettyPrint for MirModule {
    fn pretty_print(&self, indent: usize) -> String {
        let prefix = indent_str(indent);
        let mut result = format!("{prefix}module {{\n");
        for function in &self.functions {
            result.push_str(&function.pretty_print(indent + 1));
        }
        result.push_str(&format!("{prefix}}}\n"));
        result
    }
}
