use strum::{Display, EnumString};

use crate::code::Instructions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum RoutineKind {
    Constructor,
    Function,
    Method,
}

/// ClassScope holds the state of the class currently being compiled.
#[derive(Debug, Default, Clone)]
pub(super) struct ClassScope {
    pub(super) name: String,
    pub(super) instructions: Instructions,
}

impl ClassScope {
    pub(super) fn new(name: String) -> Self {
        Self {
            name,
            instructions: Instructions::default(),
        }
    }
}

/// RoutineScope describes the constructor, function or method being compiled.
#[derive(Debug, Clone)]
pub(super) struct RoutineScope {
    pub(super) name: String,
    pub(super) kind: RoutineKind,
    pub(super) return_type: String,
}

impl RoutineScope {
    pub(super) fn returns_void(&self) -> bool {
        self.return_type == "void"
    }
}

/// Control-flow label counters. They live for a whole compilation unit and
/// are never reset, so labels stay unique across classes.
#[derive(Debug, Default, Clone)]
pub(super) struct Labels {
    if_count: usize,
    while_count: usize,
}

impl Labels {
    /// Returns the `(false, true)` label pair of the next `if`.
    pub(super) fn next_if(&mut self) -> (String, String) {
        let n = self.if_count;
        self.if_count += 1;
        (format!("IF_FALSE{}", n), format!("IF_TRUE{}", n))
    }

    /// Returns the `(top, exit)` label pair of the next `while`.
    pub(super) fn next_while(&mut self) -> (String, String) {
        let n = self.while_count;
        self.while_count += 1;
        (format!("WHILE_EXP{}", n), format!("WHILE_END{}", n))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn labels_should_be_unique() {
        let mut labels = Labels::default();
        assert_eq!(
            ("IF_FALSE0".to_string(), "IF_TRUE0".to_string()),
            labels.next_if()
        );
        assert_eq!(
            ("WHILE_EXP0".to_string(), "WHILE_END0".to_string()),
            labels.next_while()
        );
        assert_eq!(
            ("IF_FALSE1".to_string(), "IF_TRUE1".to_string()),
            labels.next_if()
        );
        assert_eq!(
            ("WHILE_EXP1".to_string(), "WHILE_END1".to_string()),
            labels.next_while()
        );
    }

    #[test]
    fn routine_kind_should_parse() {
        assert_eq!(Ok(RoutineKind::Method), "method".parse::<RoutineKind>());
        assert_eq!("constructor", RoutineKind::Constructor.to_string());
        assert!("var".parse::<RoutineKind>().is_err());
    }
}
