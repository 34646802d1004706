//! Render the declared type of a single argument or field
//!
//! apollo-compiler prints whole definitions but not a lone type reference in
//! declaration position, so [`PrintedSignature`] prints a one-field input type
//! and cuts the field's type back out of the printed text. Anything able to
//! produce the declaration text can stand in through [`SignatureRenderer`].

use std::sync::LazyLock;

use apollo_compiler::{
    Name, Node,
    ast::{self, Definition, DirectiveList, Document, InputObjectTypeDefinition, Type},
    name,
};
use regex::Regex;

use crate::errors::SignatureError;

/// A printed input value definition: the field name, then its type
#[allow(clippy::expect_used)]
static INPUT_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*([_A-Za-z][_0-9A-Za-z]*)\s*:\s*(\S+)\s*$").expect("regex pattern compiles")
});

/// Produces the declaration text (`[ID!]!`, `String`, ...) for a named type reference
pub trait SignatureRenderer: Send + Sync {
    fn render(&self, name: &Name, ty: &Type) -> Result<String, SignatureError>;
}

/// Print-then-extract renderer.
///
/// The field name is the anchor used to find the type in the printed output.
/// The synthetic type only ever holds that one field, so the anchor is unique
/// in practice, but a printer that emitted other lines starting with the same
/// name would confuse it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintedSignature;

impl PrintedSignature {
    fn print(name: &Name, ty: &Type) -> String {
        let mut document = Document::new();
        document
            .definitions
            .push(Definition::InputObjectTypeDefinition(Node::new(
                InputObjectTypeDefinition {
                    description: None,
                    name: name!("ToolSignature"),
                    directives: DirectiveList::new(),
                    fields: vec![Node::new(ast::InputValueDefinition {
                        description: None,
                        name: name.clone(),
                        ty: Node::new(ty.clone()),
                        default_value: None,
                        directives: DirectiveList::new(),
                    })],
                },
            )));
        document.to_string()
    }
}

impl SignatureRenderer for PrintedSignature {
    fn render(&self, name: &Name, ty: &Type) -> Result<String, SignatureError> {
        let printed = Self::print(name, ty);

        INPUT_VALUE
            .captures_iter(&printed)
            .filter(|captures| captures.get(1).is_some_and(|field| field.as_str() == name.as_str()))
            .find_map(|captures| captures.get(2))
            .map(|signature| signature.as_str().to_string())
            .ok_or_else(|| SignatureError(name.to_string()))
    }
}
