//! The parsed annotation tree handed over by the model reader.

use std::fmt;

/// A call-shaped annotation such as `int_search(x, first_fail, indomain_min, complete)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub name: String,
    pub args: Vec<AnnArg>,
}

/// One annotation argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnArg {
    Ident(String),
    Int(i64),
    Array(Vec<AnnArg>),
    Call(Annotation),
}

impl Annotation {
    pub fn new(name: impl Into<String>, args: Vec<AnnArg>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// An annotation with no arguments, e.g. `complete`.
    pub fn atom(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }
}

impl AnnArg {
    pub fn ident(name: impl Into<String>) -> Self {
        AnnArg::Ident(name.into())
    }

    /// An array of identifiers.
    pub fn idents<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AnnArg::Array(names.into_iter().map(|n| AnnArg::Ident(n.into())).collect())
    }

    /// Name of an identifier or of a zero-argument call.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            AnnArg::Ident(name) => Some(name),
            AnnArg::Call(ann) if ann.args.is_empty() => Some(&ann.name),
            _ => None,
        }
    }
}

impl From<Annotation> for AnnArg {
    fn from(ann: Annotation) -> Self {
        AnnArg::Call(ann)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, args: &[AnnArg]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", arg)?;
    }
    Ok(())
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "(")?;
            write_list(f, &self.args)?;
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Display for AnnArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnArg::Ident(name) => write!(f, "{}", name),
            AnnArg::Int(v) => write!(f, "{}", v),
            AnnArg::Array(items) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            AnnArg::Call(ann) => write!(f, "{}", ann),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let ann = Annotation::new(
            "int_search",
            vec![
                AnnArg::idents(["x", "y"]),
                AnnArg::ident("first_fail"),
                AnnArg::ident("indomain_min"),
                Annotation::new("lds", vec![AnnArg::Int(2)]).into(),
            ],
        );
        assert_eq!(
            ann.to_string(),
            "int_search([x, y], first_fail, indomain_min, lds(2))"
        );
    }

    #[test]
    fn test_as_name() {
        assert_eq!(AnnArg::ident("complete").as_name(), Some("complete"));
        assert_eq!(AnnArg::Call(Annotation::atom("complete")).as_name(), Some("complete"));
        assert_eq!(AnnArg::Int(3).as_name(), None);
    }
}
