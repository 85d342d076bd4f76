//! Parameter naming for one statement.

use crate::ast::ParameterSpec;
use crate::dialect::DialectRules;
use crate::error::Result;
use crate::statement::Parameter;
use crate::types::StoreType;

use super::fragment::SqlFragment;

/// Assigns statement-unique names to parameters.
///
/// Unnamed parameters are numbered `p0`, `p1`, ... in the order they are
/// bound, skipping names already claimed. A named parameter keeps its name
/// unless a different value already holds it, in which case it becomes
/// `name_0`, `name_1`, ... Binding the same name and value again reuses the
/// existing parameter.
#[derive(Debug, Default)]
pub(crate) struct ParameterRegistry {
    bound: Vec<Parameter>,
    next: usize,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a parameter and returns its placeholder fragment.
    pub fn bind(&mut self, rules: &DialectRules, spec: &ParameterSpec) -> Result<SqlFragment> {
        let value = rules.normalize_value(spec.value.clone());
        let store_type = match spec.store_type {
            Some(ty) => ty,
            None => StoreType::infer(&value)?,
        };
        let candidate = Parameter {
            name: String::new(),
            nullable: spec.nullable || value.is_null(),
            size: store_type.size(),
            value,
            store_type,
        };
        let param = match spec.name.as_deref() {
            Some(name) => self.claim_named(name, candidate),
            None => self.claim_generated(candidate),
        };
        Ok(SqlFragment::placeholder(rules.placeholder(&param.name), param))
    }

    fn claim_named(&mut self, name: &str, candidate: Parameter) -> Parameter {
        let mut attempt = String::from(name);
        let mut suffix = 0;
        loop {
            match self.bound.iter().find(|p| p.name == attempt) {
                None => return self.record(attempt, candidate),
                Some(existing) if same_binding(existing, &candidate) => return existing.clone(),
                Some(_) => {
                    attempt = format!("{name}_{suffix}");
                    suffix += 1;
                }
            }
        }
    }

    fn claim_generated(&mut self, candidate: Parameter) -> Parameter {
        loop {
            let name = format!("p{}", self.next);
            self.next += 1;
            if !self.bound.iter().any(|p| p.name == name) {
                return self.record(name, candidate);
            }
        }
    }

    fn record(&mut self, name: String, mut param: Parameter) -> Parameter {
        param.name = name;
        self.bound.push(param.clone());
        param
    }
}

fn same_binding(a: &Parameter, b: &Parameter) -> bool {
    a.value == b.value && a.store_type == b.store_type
}
