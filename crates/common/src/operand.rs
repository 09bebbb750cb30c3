//! Operand model: syntactic classes, variable references and decoded operands.
//!
//! The loader hands over each operand as an [`OperandRecord`]: a syntactic
//! class plus the raw text. [`Operand::decode`] validates that text once and
//! produces the typed form the VM executes against.

use std::fmt;

use crate::error::OperandError;
use crate::type_tag::TypeTag;
use crate::value::Value;

/// Syntactic class of an operand, as declared by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandClass {
    /// Variable reference (`GF@x`).
    Var,
    /// Integer literal.
    Int,
    /// Boolean literal.
    Bool,
    /// String literal (raw, escaped form).
    String,
    /// The nil literal.
    Nil,
    /// Label name.
    Label,
    /// Type name (`int`, `bool`, `string`, `nil`).
    Type,
}

/// Classes accepted wherever any value ("symbol") may appear.
pub const SYMBOL: &[OperandClass] = &[
    OperandClass::Var,
    OperandClass::Int,
    OperandClass::Bool,
    OperandClass::String,
    OperandClass::Nil,
];

/// All operand classes, in definition order.
pub const ALL_OPERAND_CLASSES: [OperandClass; 7] = [
    OperandClass::Var,
    OperandClass::Int,
    OperandClass::Bool,
    OperandClass::String,
    OperandClass::Nil,
    OperandClass::Label,
    OperandClass::Type,
];

impl OperandClass {
    /// Loader-facing name of this class.
    pub fn name(&self) -> &'static str {
        match self {
            OperandClass::Var => "var",
            OperandClass::Int => "int",
            OperandClass::Bool => "bool",
            OperandClass::String => "string",
            OperandClass::Nil => "nil",
            OperandClass::Label => "label",
            OperandClass::Type => "type",
        }
    }

    /// Looks up a class by its loader-facing name.
    pub fn from_name(name: &str) -> Option<OperandClass> {
        ALL_OPERAND_CLASSES
            .iter()
            .find(|c| c.name() == name)
            .copied()
    }
}

impl fmt::Display for OperandClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which frame a variable reference addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// The global frame (`GF`).
    Global,
    /// The top of the local-frame stack (`LF`).
    Local,
    /// The pending temporary frame (`TF`).
    Temporary,
}

impl FrameKind {
    /// Source prefix (`GF`, `LF`, `TF`).
    pub fn prefix(&self) -> &'static str {
        match self {
            FrameKind::Global => "GF",
            FrameKind::Local => "LF",
            FrameKind::Temporary => "TF",
        }
    }

    fn from_prefix(prefix: &str) -> Option<FrameKind> {
        match prefix {
            "GF" => Some(FrameKind::Global),
            "LF" => Some(FrameKind::Local),
            "TF" => Some(FrameKind::Temporary),
            _ => None,
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A parsed variable reference: frame plus bare name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VarRef {
    pub frame: FrameKind,
    pub name: String,
}

impl VarRef {
    /// Create a reference without validating the name.
    pub fn new(frame: FrameKind, name: impl Into<String>) -> Self {
        Self {
            frame,
            name: name.into(),
        }
    }

    /// Parse `GF@name` / `LF@name` / `TF@name`.
    ///
    /// The name must satisfy [`is_identifier`].
    pub fn parse(text: &str) -> Result<Self, OperandError> {
        let invalid = || OperandError::InvalidVariable {
            text: text.to_string(),
        };

        let (prefix, name) = text.split_once('@').ok_or_else(invalid)?;
        let frame = FrameKind::from_prefix(prefix).ok_or_else(invalid)?;
        if !is_identifier(name) {
            return Err(invalid());
        }

        Ok(Self::new(frame, name))
    }
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.frame, self.name)
    }
}

/// One operand as delivered by the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperandRecord {
    pub class: OperandClass,
    pub text: String,
}

impl OperandRecord {
    pub fn new(class: OperandClass, text: impl Into<String>) -> Self {
        Self {
            class,
            text: text.into(),
        }
    }
}

/// A decoded operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Reference to a variable; resolved at execution time.
    Var(VarRef),
    /// A literal value.
    Const(Value),
    /// A label name; resolved against the label table at execution time.
    Label(String),
    /// A type name.
    Type(TypeTag),
}

impl Operand {
    /// Validate and decode a loader record.
    ///
    /// Literal syntax errors are reported as [`OperandError::InvalidLiteral`];
    /// malformed variable references as [`OperandError::InvalidVariable`].
    pub fn decode(record: &OperandRecord) -> Result<Self, OperandError> {
        let text = record.text.as_str();
        let invalid = || OperandError::InvalidLiteral {
            class: record.class,
            text: text.to_string(),
        };

        match record.class {
            OperandClass::Var => VarRef::parse(text).map(Operand::Var),
            OperandClass::Int => parse_int(text)
                .map(|n| Operand::Const(Value::Int(n)))
                .ok_or_else(invalid),
            OperandClass::Bool => match text {
                "true" => Ok(Operand::Const(Value::Bool(true))),
                "false" => Ok(Operand::Const(Value::Bool(false))),
                _ => Err(invalid()),
            },
            OperandClass::String => {
                if is_valid_string_literal(text) {
                    Ok(Operand::Const(Value::string(text)))
                } else {
                    Err(invalid())
                }
            }
            OperandClass::Nil => {
                if text == "nil" {
                    Ok(Operand::Const(Value::Nil))
                } else {
                    Err(invalid())
                }
            }
            OperandClass::Label => {
                if is_identifier(text) {
                    Ok(Operand::Label(text.to_string()))
                } else {
                    Err(invalid())
                }
            }
            OperandClass::Type => TypeTag::from_name(text)
                .map(Operand::Type)
                .ok_or_else(invalid),
        }
    }

    /// The syntactic class this operand was decoded from.
    pub fn class(&self) -> OperandClass {
        match self {
            Operand::Var(_) => OperandClass::Var,
            Operand::Const(Value::Int(_)) => OperandClass::Int,
            Operand::Const(Value::Bool(_)) => OperandClass::Bool,
            Operand::Const(Value::Str(_)) => OperandClass::String,
            Operand::Const(Value::Nil) => OperandClass::Nil,
            Operand::Label(_) => OperandClass::Label,
            Operand::Type(_) => OperandClass::Type,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Var(var) => write!(f, "{var}"),
            Operand::Const(value) => write!(f, "{}@{value}", value.type_tag().name()),
            Operand::Label(label) => f.write_str(label),
            Operand::Type(tt) => f.write_str(tt.name()),
        }
    }
}

/// Name syntax shared by labels and variables.
///
/// First character: ASCII letter or one of `_ - $ & % * ! ?`. Following
/// characters may also be ASCII digits.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if is_identifier_start(first) => {
            chars.all(|c| is_identifier_start(c) || c.is_ascii_digit())
        }
        _ => false,
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '_' | '-' | '$' | '&' | '%' | '*' | '!' | '?')
}

/// Parse an integer literal: optional sign followed by decimal digits.
pub fn parse_int(text: &str) -> Option<i64> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// A string literal may not contain `#`, and every backslash must start a
/// three-digit `\DDD` escape.
pub fn is_valid_string_literal(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'#' => return false,
            b'\\' => {
                let escape = bytes.get(i + 1..i + 4);
                if !escape.is_some_and(|d| d.iter().all(u8::is_ascii_digit)) {
                    return false;
                }
                i += 4;
            }
            _ => i += 1,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(class: OperandClass, text: &str) -> Result<Operand, OperandError> {
        Operand::decode(&OperandRecord::new(class, text))
    }

    #[test]
    fn class_name_roundtrip() {
        for &class in &ALL_OPERAND_CLASSES {
            assert_eq!(OperandClass::from_name(class.name()), Some(class));
        }
        assert_eq!(OperandClass::from_name("float"), None);
    }

    #[test]
    fn var_ref_parse() {
        let var = VarRef::parse("LF@counter").unwrap();
        assert_eq!(var.frame, FrameKind::Local);
        assert_eq!(var.name, "counter");
        assert_eq!(var.to_string(), "LF@counter");
    }

    #[test]
    fn var_ref_special_characters() {
        assert!(VarRef::parse("GF@_-$&%*!?a1").is_ok());
        assert!(VarRef::parse("TF@?").is_ok());
    }

    #[test]
    fn var_ref_rejects_bad_frame() {
        assert_eq!(
            VarRef::parse("XF@a"),
            Err(OperandError::InvalidVariable {
                text: "XF@a".to_string()
            })
        );
        assert!(VarRef::parse("gf@a").is_err());
        assert!(VarRef::parse("GFa").is_err());
    }

    #[test]
    fn var_ref_rejects_bad_name() {
        assert!(VarRef::parse("GF@").is_err());
        assert!(VarRef::parse("GF@1abc").is_err());
        assert!(VarRef::parse("GF@a b").is_err());
        assert!(VarRef::parse("GF@a@b").is_err());
    }

    #[test]
    fn int_literals() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("-13"), Some(-13));
        assert_eq!(parse_int("+7"), Some(7));
        assert_eq!(parse_int("0"), Some(0));
        assert_eq!(parse_int("9223372036854775807"), Some(i64::MAX));
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("+"), None);
        assert_eq!(parse_int("0x1f"), None);
        assert_eq!(parse_int("1 2"), None);
        assert_eq!(parse_int("9223372036854775808"), None);
    }

    #[test]
    fn string_literals() {
        assert!(is_valid_string_literal(""));
        assert!(is_valid_string_literal("hello\\032world"));
        assert!(is_valid_string_literal("žluťoučký"));
        assert!(!is_valid_string_literal("a#b"));
        assert!(!is_valid_string_literal("trailing\\"));
        assert!(!is_valid_string_literal("\\12"));
        assert!(!is_valid_string_literal("\\abc"));
    }

    #[test]
    fn decode_literals() {
        assert_eq!(
            decode(OperandClass::Int, "5"),
            Ok(Operand::Const(Value::Int(5)))
        );
        assert_eq!(
            decode(OperandClass::Bool, "true"),
            Ok(Operand::Const(Value::Bool(true)))
        );
        assert_eq!(
            decode(OperandClass::String, "a\\010"),
            Ok(Operand::Const(Value::string("a\\010")))
        );
        assert_eq!(decode(OperandClass::Nil, "nil"), Ok(Operand::Const(Value::Nil)));
        assert_eq!(
            decode(OperandClass::Type, "string"),
            Ok(Operand::Type(TypeTag::String))
        );
        assert_eq!(
            decode(OperandClass::Label, "loop"),
            Ok(Operand::Label("loop".to_string()))
        );
    }

    #[test]
    fn decode_rejects_malformed_literals() {
        for (class, text) in [
            (OperandClass::Int, "five"),
            (OperandClass::Bool, "TRUE"),
            (OperandClass::Nil, "null"),
            (OperandClass::String, "#"),
            (OperandClass::Label, "1st"),
            (OperandClass::Type, "float"),
        ] {
            let err = decode(class, text).unwrap_err();
            assert!(
                matches!(err, OperandError::InvalidLiteral { .. }),
                "{class} '{text}' gave {err:?}"
            );
        }
    }

    #[test]
    fn class_of_decoded_operand() {
        for (class, text) in [
            (OperandClass::Var, "GF@x"),
            (OperandClass::Int, "1"),
            (OperandClass::Bool, "false"),
            (OperandClass::String, "s"),
            (OperandClass::Nil, "nil"),
            (OperandClass::Label, "end"),
            (OperandClass::Type, "int"),
        ] {
            assert_eq!(decode(class, text).unwrap().class(), class);
        }
    }

    #[test]
    fn operand_display() {
        assert_eq!(decode(OperandClass::Var, "TF@x").unwrap().to_string(), "TF@x");
        assert_eq!(decode(OperandClass::Int, "-1").unwrap().to_string(), "int@-1");
        assert_eq!(decode(OperandClass::Nil, "nil").unwrap().to_string(), "nil@nil");
    }
}
