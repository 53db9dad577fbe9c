//! Resolved types (§3 "Resolved types") and the structural intern pool that
//! deduplicates them (component 7, §2).
//!
//! Every composite type is structurally hashed and interned — pointer
//! equality (here, `Rc::ptr_eq`) implies structural equality. This is the
//! indexing scheme spec.md §9 asks implementers to choose for the `Named`
//! variant's cyclic reference: an `Rc` handle rather than a raw back-pointer.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::effects::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Fs,
    Net,
    Io,
    Time,
    Rng,
    Alloc,
    Cpu,
    Atomics,
    Simd,
    Ffi,
}

/// The type system's internal representation (§3). `Rc<ResolvedType>` is the
/// interned handle: two handles are the same type iff `Rc::ptr_eq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolvedType {
    I8,
    I16,
    I32,
    I64,
    I128,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F16,
    F32,
    F64,
    Bool,
    Char,
    String,
    Bytes,
    Unit,
    Capability(Capability),
    Array(Rc<ResolvedType>, usize),
    Vector(Rc<ResolvedType>, usize),
    View(Rc<ResolvedType>, bool),
    Nullable(Rc<ResolvedType>),
    Range(Rc<ResolvedType>),
    Function {
        params: Vec<Rc<ResolvedType>>,
        return_type: Rc<ResolvedType>,
        effects: Vec<Effect>,
        error_domain: Option<String>,
        type_params: Vec<String>,
    },
    /// A user-declared named type, with an indirect handle to its underlying
    /// representation — breaks the cycle described in spec.md §9.
    Named(String, Rc<ResolvedType>),
    Result(Rc<ResolvedType>, String),
    /// Field names are interned (§4.4.2): two records with the same field
    /// list share `Rc<str>` handles rather than each owning a fresh `String`.
    Record(Vec<Rc<str>>, Vec<Rc<ResolvedType>>),
    Union(Vec<Rc<ResolvedType>>),
    TypeParam(String, usize),
    GenericInstance {
        base_name: String,
        args: Vec<Rc<ResolvedType>>,
        underlying: Option<Rc<ResolvedType>>,
    },
    ConstValue(i128, Rc<ResolvedType>),
    /// The soft-fail sentinel (§7, §9 "Soft-fail sentinels"): substituted for
    /// an expression whose type could not be determined so later checks
    /// stop cascading. Modelled as its own variant rather than reusing
    /// `Unit`, per spec.md §9's explicit implementer's choice.
    Unknown,
}

impl ResolvedType {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ResolvedType::I8
                | ResolvedType::I16
                | ResolvedType::I32
                | ResolvedType::I64
                | ResolvedType::I128
                | ResolvedType::U8
                | ResolvedType::U16
                | ResolvedType::U32
                | ResolvedType::U64
                | ResolvedType::U128
                | ResolvedType::Usize
                | ResolvedType::F16
                | ResolvedType::F32
                | ResolvedType::F64
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ResolvedType::I8
                | ResolvedType::I16
                | ResolvedType::I32
                | ResolvedType::I64
                | ResolvedType::I128
                | ResolvedType::U8
                | ResolvedType::U16
                | ResolvedType::U32
                | ResolvedType::U64
                | ResolvedType::U128
                | ResolvedType::Usize
        )
    }

    /// The sentinel satisfies no constraint — every `expects(Unknown)` check
    /// downstream should pass silently rather than emit a secondary
    /// diagnostic (§7 "Propagation policy").
    pub fn is_unknown(&self) -> bool {
        matches!(self, ResolvedType::Unknown)
    }

    pub fn primitive_by_name(name: &str) -> Option<ResolvedType> {
        Some(match name {
            "i8" => ResolvedType::I8,
            "i16" => ResolvedType::I16,
            "i32" => ResolvedType::I32,
            "i64" => ResolvedType::I64,
            "i128" => ResolvedType::I128,
            "u8" => ResolvedType::U8,
            "u16" => ResolvedType::U16,
            "u32" => ResolvedType::U32,
            "u64" => ResolvedType::U64,
            "u128" => ResolvedType::U128,
            "usize" => ResolvedType::Usize,
            "f16" => ResolvedType::F16,
            "f32" => ResolvedType::F32,
            "f64" => ResolvedType::F64,
            "Bool" => ResolvedType::Bool,
            "Char" => ResolvedType::Char,
            "String" => ResolvedType::String,
            "Bytes" => ResolvedType::Bytes,
            "Unit" => ResolvedType::Unit,
            "Fs" => ResolvedType::Capability(Capability::Fs),
            "Net" => ResolvedType::Capability(Capability::Net),
            "Io" => ResolvedType::Capability(Capability::Io),
            "Time" => ResolvedType::Capability(Capability::Time),
            "Rng" => ResolvedType::Capability(Capability::Rng),
            "Alloc" => ResolvedType::Capability(Capability::Alloc),
            "Cpu" => ResolvedType::Capability(Capability::Cpu),
            "Atomics" => ResolvedType::Capability(Capability::Atomics),
            "Simd" => ResolvedType::Capability(Capability::Simd),
            "Ffi" => ResolvedType::Capability(Capability::Ffi),
            _ => return None,
        })
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedType::I8 => write!(f, "i8"),
            ResolvedType::I16 => write!(f, "i16"),
            ResolvedType::I32 => write!(f, "i32"),
            ResolvedType::I64 => write!(f, "i64"),
            ResolvedType::I128 => write!(f, "i128"),
            ResolvedType::U8 => write!(f, "u8"),
            ResolvedType::U16 => write!(f, "u16"),
            ResolvedType::U32 => write!(f, "u32"),
            ResolvedType::U64 => write!(f, "u64"),
            ResolvedType::U128 => write!(f, "u128"),
            ResolvedType::Usize => write!(f, "usize"),
            ResolvedType::F16 => write!(f, "f16"),
            ResolvedType::F32 => write!(f, "f32"),
            ResolvedType::F64 => write!(f, "f64"),
            ResolvedType::Bool => write!(f, "Bool"),
            ResolvedType::Char => write!(f, "Char"),
            ResolvedType::String => write!(f, "String"),
            ResolvedType::Bytes => write!(f, "Bytes"),
            ResolvedType::Unit => write!(f, "Unit"),
            ResolvedType::Capability(cap) => write!(f, "{cap:?}"),
            ResolvedType::Array(elem, n) => write!(f, "Array<{elem}, {n}>"),
            ResolvedType::Vector(elem, n) => write!(f, "Vector<{elem}, {n}>"),
            ResolvedType::View(elem, true) => write!(f, "View<mut {elem}>"),
            ResolvedType::View(elem, false) => write!(f, "View<{elem}>"),
            ResolvedType::Nullable(inner) => write!(f, "{inner}?"),
            ResolvedType::Range(elem) => write!(f, "Range<{elem}>"),
            ResolvedType::Function {
                params,
                return_type,
                ..
            } => {
                let params = params
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "function({params}) -> {return_type}")
            }
            ResolvedType::Named(name, _) => write!(f, "{name}"),
            ResolvedType::Result(ok, domain) => write!(f, "Result<{ok}, {domain}>"),
            ResolvedType::Record(names, types) => {
                let fields = names
                    .iter()
                    .zip(types.iter())
                    .map(|(n, t)| format!("{n}: {t}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{ {fields} }}")
            }
            ResolvedType::Union(variants) => {
                let variants = variants
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(" | ");
                write!(f, "{variants}")
            }
            ResolvedType::TypeParam(name, _) => write!(f, "{name}"),
            ResolvedType::GenericInstance {
                base_name, args, ..
            } => {
                let args = args
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{base_name}<{args}>")
            }
            ResolvedType::ConstValue(value, ty) => write!(f, "{value}: {ty}"),
            ResolvedType::Unknown => write!(f, "<unknown>"),
        }
    }
}

/// Structural deduplication of resolved types and interned strings (§3
/// "Invariants", §9 "Global mutable state" — lives in the compilation
/// context's permanent arena, not a process-global singleton).
#[derive(Debug, Default)]
pub struct InternPool {
    types: HashSet<Rc<ResolvedType>>,
    strings: HashSet<Rc<str>>,
}

impl InternPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Testable property 3: structurally equal type expressions intern to
    /// pointer-equal handles.
    pub fn intern_type(&mut self, ty: ResolvedType) -> Rc<ResolvedType> {
        if let Some(existing) = self.types.get(&ty) {
            return existing.clone();
        }
        let rc = Rc::new(ty);
        self.types.insert(rc.clone());
        rc
    }

    pub fn intern_string(&mut self, text: &str) -> Rc<str> {
        if let Some(existing) = self.strings.get(text) {
            return existing.clone();
        }
        let rc: Rc<str> = Rc::from(text);
        self.strings.insert(rc.clone());
        rc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_structural_type_returns_pointer_equal_handle() {
        let mut pool = InternPool::new();
        let a = pool.intern_type(ResolvedType::Array(Rc::new(ResolvedType::I32), 4));
        let b = pool.intern_type(ResolvedType::Array(Rc::new(ResolvedType::I32), 4));
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn interning_different_types_returns_distinct_handles() {
        let mut pool = InternPool::new();
        let a = pool.intern_type(ResolvedType::I32);
        let b = pool.intern_type(ResolvedType::I64);
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn primitive_by_name_covers_scalars_and_capabilities() {
        assert_eq!(ResolvedType::primitive_by_name("i32"), Some(ResolvedType::I32));
        assert_eq!(
            ResolvedType::primitive_by_name("Fs"),
            Some(ResolvedType::Capability(Capability::Fs))
        );
        assert_eq!(ResolvedType::primitive_by_name("nonexistent"), None);
    }
}
