use std::rc::Rc;

use crate::interpreter::value::{
    chars::CharString, multiarray::MultiArray, scalar::Scalar, structure::Structure,
};

/// The lazy adapter produced by multi-valued calls.
///
/// A return list carries a selector `(expected, index) → value` that is
/// driven by the assignment site: a multi-target assignment asks for each
/// index in turn, while every other consumer collapses to `select(1, 0)`.
/// `None` marks an element the producer does not define, which the caller
/// reports as `element number K undefined in return list`.
#[derive(Clone)]
pub struct RetList {
    select: Rc<dyn Fn(usize, usize) -> Option<Value>>,
}

impl RetList {
    /// Wraps a selector closure.
    pub fn new(select: impl Fn(usize, usize) -> Option<Value> + 'static) -> Self {
        Self { select: Rc::new(select) }
    }

    /// Wraps a single value into a one-element selector, the shape a
    /// multi-target assignment gives to single-valued results.
    #[must_use]
    pub fn single(value: Value) -> Self {
        Self::new(move |_, index| if index == 0 { Some(value.clone()) } else { None })
    }

    /// Selects element `index` of `expected` requested outputs.
    #[must_use]
    pub fn select(&self, expected: usize, index: usize) -> Option<Value> {
        (self.select)(expected, index)
    }
}

impl std::fmt::Debug for RetList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<return list>")
    }
}

/// A runtime value of the interpreter.
///
/// The first four variants form the value universe of the language; the
/// `RetList` variant only exists in flight between a multi-valued call and
/// its consumer, never in the environment.
#[derive(Debug, Clone)]
pub enum Value {
    /// An arbitrary-precision complex scalar.
    Scalar(Scalar),
    /// An immutable character string.
    CharString(CharString),
    /// An N-dimensional array or cell container.
    Array(MultiArray),
    /// A named-field structure.
    Struct(Structure),
    /// A multi-valued result adapter.
    RetList(RetList),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            (Self::CharString(a), Self::CharString(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Struct(a), Self::Struct(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

impl From<CharString> for Value {
    fn from(s: CharString) -> Self {
        Self::CharString(s)
    }
}

impl From<MultiArray> for Value {
    fn from(a: MultiArray) -> Self {
        Self::Array(a)
    }
}

impl From<Structure> for Value {
    fn from(s: Structure) -> Self {
        Self::Struct(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Scalar(Scalar::logical(b))
    }
}

impl Value {
    /// A short noun for error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::CharString(_) => "string",
            Self::Array(a) => {
                if a.cell {
                    "cell array"
                } else {
                    "array"
                }
            },
            Self::Struct(_) => "structure",
            Self::RetList(_) => "return list",
        }
    }

    /// Collapses a return list to its first element; other values pass
    /// through. `None` only for a return list with no first element.
    #[must_use]
    pub fn collapse(self) -> Option<Self> {
        match self {
            Self::RetList(list) => list.select(1, 0),
            other => Some(other),
        }
    }

    /// The boolean projection: non-zero scalars, non-empty strings, and
    /// all-non-zero arrays are true.
    ///
    /// # Errors
    /// A description when the value has no boolean projection.
    pub fn is_true(&self) -> Result<bool, String> {
        match self {
            Self::Scalar(s) => Ok(s.is_true()),
            Self::CharString(s) => Ok(!s.text.is_empty()),
            Self::Array(a) => Ok(a.all_true()),
            Self::Struct(_) | Self::RetList(_) => {
                Err(format!("a {} has no boolean value", self.type_name()))
            },
        }
    }

}
