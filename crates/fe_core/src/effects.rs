//! Effect labels (§4.4.4 "Effect checking") and the fixed table mapping
//! primitive operations to the effect they contribute.

use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Effect {
    Io,
    Fs,
    Net,
    Time,
    Rng,
    Alloc,
    Simd,
    Cpu,
    Ffi,
    Atomics,
}

impl Effect {
    pub fn name(self) -> &'static str {
        match self {
            Effect::Io => "io",
            Effect::Fs => "fs",
            Effect::Net => "net",
            Effect::Time => "time",
            Effect::Rng => "rng",
            Effect::Alloc => "alloc",
            Effect::Simd => "simd",
            Effect::Cpu => "cpu",
            Effect::Ffi => "ffi",
            Effect::Atomics => "atomics",
        }
    }

    pub fn lookup(name: &str) -> Option<Effect> {
        match name {
            "io" => Some(Effect::Io),
            "fs" => Some(Effect::Fs),
            "net" => Some(Effect::Net),
            "time" => Some(Effect::Time),
            "rng" => Some(Effect::Rng),
            "alloc" => Some(Effect::Alloc),
            "simd" => Some(Effect::Simd),
            "cpu" => Some(Effect::Cpu),
            "ffi" => Some(Effect::Ffi),
            "atomics" => Some(Effect::Atomics),
            _ => None,
        }
    }

    /// The effect contributed by calling a given documented primitive
    /// (§4.4.4): `io.println → io`, `fs.read → fs`, `clock.now → time`,
    /// `rng.u32 → rng`, allocation → `alloc`, SIMD → `simd`, inline assembly
    /// → `cpu`, raw pointer deref → `ffi`.
    pub fn of_primitive(qualified_name: &str) -> Option<Effect> {
        match qualified_name {
            "io.println" | "io.print" | "io.read_line" => Some(Effect::Io),
            "fs.read" | "fs.write" | "fs.open" => Some(Effect::Fs),
            "net.connect" | "net.send" | "net.recv" => Some(Effect::Net),
            "clock.now" => Some(Effect::Time),
            "rng.u32" | "rng.u64" | "rng.fill" => Some(Effect::Rng),
            "alloc.allocate" | "alloc.deallocate" => Some(Effect::Alloc),
            "simd.splat" | "simd.lanes" => Some(Effect::Simd),
            "asm.inline" => Some(Effect::Cpu),
            "ptr.deref" => Some(Effect::Ffi),
            "atomics.load" | "atomics.store" | "atomics.cas" => Some(Effect::Atomics),
            _ => None,
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An ordered, deduplicated set of effects — the effect clause on a function
/// signature, or the accumulated effect set of a function body. Effect sets
/// compose by union (GLOSSARY "Effect").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectSet(BTreeSet<Effect>);

impl EffectSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_iter(effects: impl IntoIterator<Item = Effect>) -> Self {
        Self(effects.into_iter().collect())
    }

    pub fn insert(&mut self, effect: Effect) {
        self.0.insert(effect);
    }

    pub fn union_with(&mut self, other: &EffectSet) {
        self.0.extend(other.0.iter().copied());
    }

    pub fn contains(&self, effect: Effect) -> bool {
        self.0.contains(&effect)
    }

    /// Effects present in `self` but not declared in `declared` — testable
    /// property 5 ("effect monotonicity").
    pub fn leaked_from(&self, declared: &EffectSet) -> Vec<Effect> {
        self.0.difference(&declared.0).copied().collect()
    }

    pub fn is_subset_of(&self, other: &EffectSet) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = Effect> + '_ {
        self.0.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaked_effect_is_reported_when_not_a_subset() {
        let mut body = EffectSet::new();
        body.insert(Effect::Io);
        let declared = EffectSet::new();
        assert_eq!(body.leaked_from(&declared), vec![Effect::Io]);
    }

    #[test]
    fn no_leak_when_declared_covers_body() {
        let mut body = EffectSet::new();
        body.insert(Effect::Io);
        let mut declared = EffectSet::new();
        declared.insert(Effect::Io);
        declared.insert(Effect::Fs);
        assert!(body.leaked_from(&declared).is_empty());
        assert!(body.is_subset_of(&declared));
    }

    #[test]
    fn primitive_table_matches_spec_examples() {
        assert_eq!(Effect::of_primitive("io.println"), Some(Effect::Io));
        assert_eq!(Effect::of_primitive("fs.read"), Some(Effect::Fs));
        assert_eq!(Effect::of_primitive("clock.now"), Some(Effect::Time));
        assert_eq!(Effect::of_primitive("rng.u32"), Some(Effect::Rng));
    }
}
