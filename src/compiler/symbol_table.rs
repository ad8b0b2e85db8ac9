use std::collections::HashMap;

use strum::{Display, EnumString};

use crate::code::Segment;

/// Storage class of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Kind {
    Static,
    Field,
    Argument,
    Local,
}

impl Kind {
    pub fn segment(self) -> Segment {
        match self {
            Kind::Static => Segment::Static,
            Kind::Field => Segment::This,
            Kind::Argument => Segment::Argument,
            Kind::Local => Segment::Local,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub typ: String,
    pub kind: Kind,
    pub index: usize,
}

impl Symbol {
    fn new(typ: String, kind: Kind, index: usize) -> Self {
        Self {
            typ,
            kind,
            index,
        }
    }

    pub fn segment(&self) -> Segment {
        self.kind.segment()
    }
}

// One lexical scope. The compiler keeps two: the class scope holds statics
// and fields, the routine scope holds arguments and locals. Slot indices are
// dense per kind, assigned in declaration order.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    store: HashMap<String, Symbol>,
    counts: HashMap<Kind, usize>,
}

impl SymbolTable {
    /// Adds `name` with the next free slot of `kind`.
    ///
    /// Redefining a name is allowed: the later definition wins and the
    /// earlier slot stays allocated.
    pub fn define(&mut self, name: impl Into<String>, typ: impl Into<String>, kind: Kind) -> &Symbol {
        let name = name.into();
        let count = self.counts.entry(kind).or_default();
        let symbol = Symbol::new(typ.into(), kind, *count);
        *count += 1;

        if self.store.contains_key(&name) {
            log::warn!("`{}` redefined in the same scope as {} {}", name, kind, symbol.index);
        }
        self.store.insert(name.clone(), symbol);
        &self.store[&name]
    }

    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.store.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.store.contains_key(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<Kind> {
        self.resolve(name).map(|s| s.kind)
    }

    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.resolve(name).map(|s| s.typ.as_str())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.resolve(name).map(|s| s.index)
    }

    /// Number of slots handed out for `kind` since the last reset.
    pub fn var_count(&self, kind: Kind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn reset(&mut self) {
        self.store.clear();
        self.counts.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn resolve_should_work() {
        let mut st = SymbolTable::default();
        st.define("a", "int", Kind::Field);
        st.define("b", "Square", Kind::Field);
        st.define("c", "int", Kind::Static);

        assert_eq!(Some(0), st.index_of("a"));
        assert_eq!(Some(1), st.index_of("b"));
        assert_eq!(Some(0), st.index_of("c"));
        assert_eq!(Some(Kind::Field), st.kind_of("b"));
        assert_eq!(Some("Square"), st.type_of("b"));
        assert_eq!(Some(Kind::Static), st.kind_of("c"));
        assert_eq!(None, st.kind_of("d"));
        assert_eq!(None, st.type_of("d"));
        assert!(st.contains("a"));
        assert!(!st.contains("d"));
        assert_eq!(Segment::This, st.resolve("a").unwrap().segment());
    }

    #[test]
    fn slots_should_be_dense_per_kind() {
        let mut st = SymbolTable::default();
        let decls = [
            ("this", Kind::Argument),
            ("x", Kind::Argument),
            ("i", Kind::Local),
            ("y", Kind::Argument),
            ("j", Kind::Local),
            ("k", Kind::Local),
        ];
        decls.iter().for_each(|(name, kind)| {
            st.define(*name, "int", *kind);
        });

        for kind in [Kind::Argument, Kind::Local] {
            let mut slots: Vec<usize> = decls
                .iter()
                .filter(|(_, k)| *k == kind)
                .map(|(name, _)| st.index_of(name).unwrap())
                .collect();
            slots.sort();
            let expect: Vec<usize> = (0..st.var_count(kind)).collect();
            assert_eq!(expect, slots, "slots of {}", kind);
        }
        assert_eq!(3, st.var_count(Kind::Argument));
        assert_eq!(3, st.var_count(Kind::Local));
        assert_eq!(0, st.var_count(Kind::Static));
    }

    #[test]
    fn redefinition_should_shadow() {
        let mut st = SymbolTable::default();
        st.define("x", "int", Kind::Local);
        let symbol = st.define("x", "char", Kind::Local);
        assert_eq!(1, symbol.index);

        assert_eq!(Some("char"), st.type_of("x"));
        assert_eq!(Some(1), st.index_of("x"));
        assert_eq!(2, st.var_count(Kind::Local));
    }

    #[test]
    fn reset_should_clear() {
        let mut st = SymbolTable::default();
        st.define("x", "int", Kind::Argument);
        st.define("y", "int", Kind::Argument);
        st.reset();

        assert!(!st.contains("x"));
        assert_eq!(0, st.var_count(Kind::Argument));
        st.define("z", "int", Kind::Argument);
        assert_eq!(Some(0), st.index_of("z"));
    }

    #[test]
    fn kind_should_parse() {
        assert_eq!(Ok(Kind::Field), "field".parse::<Kind>());
        assert_eq!(Ok(Kind::Static), "static".parse::<Kind>());
        assert!("var".parse::<Kind>().is_err());
        assert_eq!(Segment::Local, Kind::Local.segment());
    }
}
