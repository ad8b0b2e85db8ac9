use std::cell::Cell;

thread_local! {
    static TRACE_LEVEL: Cell<usize> = const { Cell::new(0) };
}

fn ident_level() -> String {
    " ".repeat(TRACE_LEVEL.with(|level| level.get().saturating_sub(1)))
}

/// Logs `BEGIN rule` on creation and `END rule` when dropped, indented by
/// grammar nesting depth.
pub(crate) struct Trace {
    rule: &'static str,
}

impl Trace {
    pub(crate) fn begin(rule: &'static str) -> Self {
        TRACE_LEVEL.with(|level| level.set(level.get() + 1));
        log::trace!("{}BEGIN {}", ident_level(), rule);
        Self { rule }
    }
}

impl Drop for Trace {
    fn drop(&mut self) {
        log::trace!("{}END {}", ident_level(), self.rule);
        TRACE_LEVEL.with(|level| level.set(level.get().saturating_sub(1)));
    }
}

/// Traces the enclosing grammar rule when the `trace` feature is enabled.
macro_rules! trace_rule {
    ($rule:expr) => {
        #[cfg(feature = "trace")]
        let _trace = $crate::compiler::trace::Trace::begin($rule);
    };
}

pub(crate) use trace_rule;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn trace_level_should_nest() {
        let outer = Trace::begin("class");
        let inner = Trace::begin("statements");
        assert_eq!(" ", ident_level());
        drop(inner);
        assert_eq!("", ident_level());
        drop(outer);
        assert_eq!(0, TRACE_LEVEL.with(|level| level.get()));
    }
}
