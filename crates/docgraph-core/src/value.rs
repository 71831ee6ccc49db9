// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Field values and array payloads.
use crate::ident::NodeId;
use crate::schema::Range;

/// Value held by a record field.
///
/// `Null` is the initial value of string, reference and array-valued fields;
/// scalar fields start at their zero value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Unset string or reference.
    Null,
    /// `boolean`.
    Bool(bool),
    /// `byte`.
    Byte(i8),
    /// `short`.
    Short(i16),
    /// `int`.
    Int(i32),
    /// `long`.
    Long(i64),
    /// `double`.
    Double(f64),
    /// `string`.
    Str(String),
    /// Reference to a record or array node in the same store.
    Ref(NodeId),
}

impl Value {
    /// Initial value for a freshly allocated field of range `range`.
    pub fn initial(range: &Range) -> Self {
        match range {
            Range::Boolean => Self::Bool(false),
            Range::Byte => Self::Byte(0),
            Range::Short => Self::Short(0),
            Range::Int => Self::Int(0),
            Range::Long => Self::Long(0),
            Range::Double => Self::Double(0.0),
            Range::String | Range::Ref(_) | Range::Array(_) => Self::Null,
        }
    }

    /// Returns `true` when this value may be stored in a field of `range`.
    ///
    /// Reference targets are checked by the store, not here.
    pub fn conforms_to(&self, range: &Range) -> bool {
        matches!(
            (self, range),
            (Self::Bool(_), Range::Boolean)
                | (Self::Byte(_), Range::Byte)
                | (Self::Short(_), Range::Short)
                | (Self::Int(_), Range::Int)
                | (Self::Long(_), Range::Long)
                | (Self::Double(_), Range::Double)
                | (Self::Str(_), Range::String)
                | (Self::Ref(_), Range::Ref(_) | Range::Array(_))
                | (Self::Null, Range::String | Range::Ref(_) | Range::Array(_))
        )
    }

    /// Reads the value as an offset, if it is integral.
    pub fn as_offset(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Short(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the referenced node, if any.
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Ref(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the string contents, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Element kind of an array node. This is a closed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementKind {
    /// `bool` elements.
    Bool,
    /// `i8` elements.
    Byte,
    /// `i16` elements.
    Short,
    /// `i32` elements.
    Int,
    /// `i64` elements.
    Long,
    /// `f64` elements.
    Double,
    /// Optional string elements.
    Str,
    /// Optional node references.
    Ref,
}

impl ElementKind {
    /// Element kind for an array whose elements are declared as `element`.
    ///
    /// Returns `None` for nested arrays, which fall outside the closed set.
    pub fn for_element(element: &Range) -> Option<Self> {
        match element {
            Range::Boolean => Some(Self::Bool),
            Range::Byte => Some(Self::Byte),
            Range::Short => Some(Self::Short),
            Range::Int => Some(Self::Int),
            Range::Long => Some(Self::Long),
            Range::Double => Some(Self::Double),
            Range::String => Some(Self::Str),
            Range::Ref(_) => Some(Self::Ref),
            Range::Array(_) => None,
        }
    }
}

/// Homogeneous element storage of an array node.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArrayData {
    /// `boolean[]`.
    Bool(Vec<bool>),
    /// `byte[]`.
    Byte(Vec<i8>),
    /// `short[]`.
    Short(Vec<i16>),
    /// `int[]`.
    Int(Vec<i32>),
    /// `long[]`.
    Long(Vec<i64>),
    /// `double[]`.
    Double(Vec<f64>),
    /// `string[]`; `None` is an unset slot.
    Str(Vec<Option<String>>),
    /// Node references; `None` is an unset slot.
    Ref(Vec<Option<NodeId>>),
}

impl ArrayData {
    /// Zero-initialized array of `kind` with `len` slots.
    pub fn zeroed(kind: ElementKind, len: usize) -> Self {
        match kind {
            ElementKind::Bool => Self::Bool(vec![false; len]),
            ElementKind::Byte => Self::Byte(vec![0; len]),
            ElementKind::Short => Self::Short(vec![0; len]),
            ElementKind::Int => Self::Int(vec![0; len]),
            ElementKind::Long => Self::Long(vec![0; len]),
            ElementKind::Double => Self::Double(vec![0.0; len]),
            ElementKind::Str => Self::Str(vec![None; len]),
            ElementKind::Ref => Self::Ref(vec![None; len]),
        }
    }

    /// Element kind of this array.
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Bool(_) => ElementKind::Bool,
            Self::Byte(_) => ElementKind::Byte,
            Self::Short(_) => ElementKind::Short,
            Self::Int(_) => ElementKind::Int,
            Self::Long(_) => ElementKind::Long,
            Self::Double(_) => ElementKind::Double,
            Self::Str(_) => ElementKind::Str,
            Self::Ref(_) => ElementKind::Ref,
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Byte(v) => v.len(),
            Self::Short(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Long(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Str(v) => v.len(),
            Self::Ref(v) => v.len(),
        }
    }

    /// Returns `true` when the array has no slots.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates the node references held by a reference array.
    pub fn refs(&self) -> impl Iterator<Item = NodeId> + '_ {
        let slots: &[Option<NodeId>] = match self {
            Self::Ref(v) => v,
            _ => &[],
        };
        slots.iter().flatten().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_values_conform_to_their_range() {
        let ranges = [
            Range::Boolean,
            Range::Byte,
            Range::Short,
            Range::Int,
            Range::Long,
            Range::Double,
            Range::String,
            Range::reference("Token"),
            Range::array_of(Range::Int),
        ];
        for r in &ranges {
            assert!(Value::initial(r).conforms_to(r), "{r}");
        }
    }

    #[test]
    fn scalars_do_not_widen() {
        assert!(!Value::Int(1).conforms_to(&Range::Long));
        assert!(!Value::Null.conforms_to(&Range::Int));
        assert!(Value::Ref(NodeId(3)).conforms_to(&Range::array_of(Range::Double)));
    }

    #[test]
    fn nested_arrays_have_no_element_kind() {
        assert_eq!(
            ElementKind::for_element(&Range::reference("Token")),
            Some(ElementKind::Ref)
        );
        assert_eq!(
            ElementKind::for_element(&Range::array_of(Range::Int)),
            None
        );
    }

    #[test]
    fn zeroed_arrays_report_kind_and_len() {
        let a = ArrayData::zeroed(ElementKind::Str, 4);
        assert_eq!(a.kind(), ElementKind::Str);
        assert_eq!(a.len(), 4);
        assert_eq!(a.refs().count(), 0);
    }
}
