use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/* Scalar names accepted in type expressions */
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ScalarName {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl ScalarName {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => ScalarName::Bool,
            "byte" | "int8" | "i8" => ScalarName::I8,
            "ubyte" | "uint8" | "u8" => ScalarName::U8,
            "short" | "int16" | "i16" => ScalarName::I16,
            "ushort" | "uint16" | "u16" => ScalarName::U16,
            "int" | "int32" | "i32" => ScalarName::I32,
            "uint" | "uint32" | "u32" => ScalarName::U32,
            "long" | "int64" | "i64" => ScalarName::I64,
            "ulong" | "uint64" | "u64" => ScalarName::U64,
            "float" | "float32" | "f32" => ScalarName::F32,
            "double" | "float64" | "f64" => ScalarName::F64,
            _ => return None,
        })
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, ScalarName::Bool | ScalarName::F32 | ScalarName::F64)
    }
}

/* Parsed field type: `u8`, `string`, `[T]`, `[T:N]` or a definition name */
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TypeExpr {
    Scalar(ScalarName),
    String,
    Vector(Box<TypeExpr>),
    Array(Box<TypeExpr>, u16),
    Named(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeExprError {
    #[error("empty type expression")]
    Empty,

    #[error("unbalanced brackets in '{0}'")]
    Unbalanced(String),

    #[error("invalid array length in '{0}'")]
    InvalidLength(String),

    #[error("invalid type name '{0}'")]
    InvalidName(String),
}

impl FromStr for TypeExpr {
    type Err = TypeExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TypeExprError::Empty);
        }

        if let Some(rest) = s.strip_prefix('[') {
            let inner = rest.strip_suffix(']').ok_or_else(|| TypeExprError::Unbalanced(s.to_string()))?;
            /* Only the outermost colon separates the length */
            return match inner.rsplit_once(':') {
                Some((elem, len)) if !len.contains(']') => {
                    let len: u16 = len.trim().parse().map_err(|_| TypeExprError::InvalidLength(s.to_string()))?;
                    if len == 0 {
                        return Err(TypeExprError::InvalidLength(s.to_string()));
                    }
                    Ok(TypeExpr::Array(Box::new(elem.parse()?), len))
                }
                _ => Ok(TypeExpr::Vector(Box::new(inner.parse()?))),
            };
        }

        if s.contains('[') || s.contains(']') {
            return Err(TypeExprError::Unbalanced(s.to_string()));
        }

        if s == "string" {
            return Ok(TypeExpr::String);
        }

        if let Some(scalar) = ScalarName::parse(s) {
            return Ok(TypeExpr::Scalar(scalar));
        }

        let valid = s.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
        if !valid {
            return Err(TypeExprError::InvalidName(s.to_string()));
        }

        Ok(TypeExpr::Named(s.to_string()))
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Scalar(s) => write!(f, "{:?}", s),
            TypeExpr::String => write!(f, "string"),
            TypeExpr::Vector(e) => write!(f, "[{}]", e),
            TypeExpr::Array(e, n) => write!(f, "[{}:{}]", e, n),
            TypeExpr::Named(n) => write!(f, "{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalars_and_aliases() {
        assert_eq!("ubyte".parse::<TypeExpr>().unwrap(), TypeExpr::Scalar(ScalarName::U8));
        assert_eq!("u8".parse::<TypeExpr>().unwrap(), TypeExpr::Scalar(ScalarName::U8));
        assert_eq!("double".parse::<TypeExpr>().unwrap(), TypeExpr::Scalar(ScalarName::F64));
        assert_eq!("string".parse::<TypeExpr>().unwrap(), TypeExpr::String);
    }

    #[test]
    fn test_parse_vector_and_array() {
        assert_eq!(
            "[Monster]".parse::<TypeExpr>().unwrap(),
            TypeExpr::Vector(Box::new(TypeExpr::Named("Monster".to_string())))
        );
        assert_eq!(
            "[int:4]".parse::<TypeExpr>().unwrap(),
            TypeExpr::Array(Box::new(TypeExpr::Scalar(ScalarName::I32)), 4)
        );
        assert_eq!(
            "[MyGame.Vec3 : 2]".parse::<TypeExpr>().unwrap(),
            TypeExpr::Array(Box::new(TypeExpr::Named("MyGame.Vec3".to_string())), 2)
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<TypeExpr>(), Err(TypeExprError::Empty));
        assert!(matches!("[int".parse::<TypeExpr>(), Err(TypeExprError::Unbalanced(_))));
        assert!(matches!("[int:0]".parse::<TypeExpr>(), Err(TypeExprError::InvalidLength(_))));
        assert!(matches!("[int:x]".parse::<TypeExpr>(), Err(TypeExprError::InvalidLength(_))));
        assert!(matches!("9lives".parse::<TypeExpr>(), Err(TypeExprError::InvalidName(_))));
    }
}
