//! Runtime type tags.

use std::fmt;

/// The type of a runtime value.
///
/// Every assigned variable and every operand-stack slot carries exactly one
/// tag. The tag's name is what TYPE produces and what READ accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Signed 64-bit integer.
    Int,
    /// Boolean.
    Bool,
    /// String in raw (escaped) form.
    String,
    /// The single nil value.
    Nil,
}

/// All type tags, in definition order.
pub const ALL_TYPE_TAGS: [TypeTag; 4] = [TypeTag::Int, TypeTag::Bool, TypeTag::String, TypeTag::Nil];

impl TypeTag {
    /// Returns the source-level name of this type.
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Int => "int",
            TypeTag::Bool => "bool",
            TypeTag::String => "string",
            TypeTag::Nil => "nil",
        }
    }

    /// Looks up a type by its source-level name. Names are case-sensitive.
    pub fn from_name(name: &str) -> Option<TypeTag> {
        ALL_TYPE_TAGS.iter().find(|tt| tt.name() == name).copied()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
