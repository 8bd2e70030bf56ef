use std::sync::Arc;

use super::arguments::{field_key, Argument, ArgumentValue, UnboundVariable, Variables};
use crate::store::FieldKey;

/// Shared, immutable list of selections.
pub type SelectionSet = Arc<[SelectionNode]>;

/// One thing to read or write. A closed set of three kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionNode {
    Scalar(ScalarField),
    Linked(LinkedField),
    /// A client-defined computation, resolved by name in a
    /// [`SelectionRegistry`](super::SelectionRegistry).
    Computed(ComputedField),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    pub field_name: String,
    pub alias: Option<String>,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkedField {
    pub field_name: String,
    pub alias: Option<String>,
    pub arguments: Vec<Argument>,
    pub selections: SelectionSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputedField {
    /// Name of the definition in the registry.
    pub definition: String,
    /// Output key of the computed value.
    pub alias: String,
    /// Bindings that form the nested computation's variables.
    pub arguments: Vec<Argument>,
}

impl SelectionNode {
    pub fn scalar(field_name: impl Into<String>) -> Self {
        SelectionNode::Scalar(ScalarField {
            field_name: field_name.into(),
            alias: None,
            arguments: Vec::new(),
        })
    }

    pub fn linked(field_name: impl Into<String>, selections: Vec<SelectionNode>) -> Self {
        SelectionNode::Linked(LinkedField {
            field_name: field_name.into(),
            alias: None,
            arguments: Vec::new(),
            selections: Arc::from(selections),
        })
    }

    /// Select the registered computation `definition`, output under its own name.
    pub fn computed(definition: impl Into<String>) -> Self {
        let definition = definition.into();
        SelectionNode::Computed(ComputedField {
            alias: definition.clone(),
            definition,
            arguments: Vec::new(),
        })
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        match &mut self {
            SelectionNode::Scalar(field) => field.alias = Some(alias),
            SelectionNode::Linked(field) => field.alias = Some(alias),
            SelectionNode::Computed(field) => field.alias = alias,
        }
        self
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: ArgumentValue) -> Self {
        let argument = Argument::new(name, value);
        match &mut self {
            SelectionNode::Scalar(field) => field.arguments.push(argument),
            SelectionNode::Linked(field) => field.arguments.push(argument),
            SelectionNode::Computed(field) => field.arguments.push(argument),
        }
        self
    }

    /// Key under which the node appears in responses and read output.
    pub fn response_key(&self) -> &str {
        match self {
            SelectionNode::Scalar(field) => field.alias.as_deref().unwrap_or(&field.field_name),
            SelectionNode::Linked(field) => field.alias.as_deref().unwrap_or(&field.field_name),
            SelectionNode::Computed(field) => &field.alias,
        }
    }
}

impl ScalarField {
    pub fn field_key(&self, variables: &Variables) -> Result<FieldKey, UnboundVariable> {
        field_key(&self.field_name, &self.arguments, variables)
    }

    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.field_name)
    }
}

impl LinkedField {
    pub fn field_key(&self, variables: &Variables) -> Result<FieldKey, UnboundVariable> {
        field_key(&self.field_name, &self.arguments, variables)
    }

    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.field_name)
    }
}
