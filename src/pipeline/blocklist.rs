//! Call blocklist (spec.md §4.5): names consulted before any resolution
//! attempt. Builtins, runtime/web globals, framework hook names, and
//! base-class-library noise never become CALLS edges no matter how many
//! candidates would otherwise match.
//!
//! Immutable after init (spec.md §9: "the only process-wide state is the
//! parser cache and the blocklist; both are immutable after init").

use std::collections::HashSet;
use std::sync::OnceLock;

static BLOCKLIST: OnceLock<HashSet<&'static str>> = OnceLock::new();

#[rustfmt::skip]
const NAMES: &[&str] = &[
    // Python builtins
    "print", "len", "isinstance", "issubclass", "super", "range", "enumerate",
    "zip", "map", "filter", "sorted", "reversed", "min", "max", "sum", "abs",
    "round", "open", "input", "repr", "str", "int", "float", "bool", "list",
    "dict", "set", "tuple", "type", "hasattr", "getattr", "setattr",
    "delattr", "iter", "next", "vars", "dir", "id", "hash", "format",
    "staticmethod", "classmethod", "property",
    // Python dunders commonly invoked implicitly
    "__init__", "__new__", "__repr__", "__str__", "__eq__", "__hash__",
    "__len__", "__iter__", "__next__", "__enter__", "__exit__",
    // JS/TS runtime and web globals
    "console", "setTimeout", "setInterval", "clearTimeout", "clearInterval",
    "fetch", "require", "import", "parseInt", "parseFloat", "isNaN",
    "isFinite", "encodeURIComponent", "decodeURIComponent", "JSON",
    "Object", "Array", "Promise", "Map", "Set", "Symbol", "Reflect",
    "Proxy", "Number", "String", "Boolean", "Math", "Date", "RegExp",
    "Error", "TypeError", "RangeError",
    // React / common framework hooks
    "useState", "useEffect", "useRef", "useMemo", "useCallback",
    "useContext", "useReducer", "useLayoutEffect", "useImperativeHandle",
    "useId", "useTransition", "useDeferredValue", "useSyncExternalStore",
    // Express-style handler helpers
    "next", "send", "json", "status", "render",
    // C# / .NET base-class-library noise
    "WriteLine", "Write", "ReadLine", "ToString", "Equals", "GetHashCode",
    "GetType", "Dispose", "Clone", "CompareTo", "Parse", "TryParse",
    // LINQ operators
    "Select", "Where", "OrderBy", "OrderByDescending", "GroupBy", "Join",
    "FirstOrDefault", "First", "LastOrDefault", "Last", "SingleOrDefault",
    "Single", "Any", "All", "Count", "Sum", "Average", "Min", "Max",
    "ToList", "ToArray", "ToDictionary", "Aggregate", "Distinct", "Skip",
    "Take", "Reverse", "Concat", "Union", "Intersect", "Except", "Contains",
    // xUnit / NUnit / MSTest assertion helpers
    "Assert", "Equal", "NotEqual", "True", "False", "NotNull", "IsNull",
    "IsNotNull", "AreEqual", "AreNotEqual", "IsTrue", "IsFalse",
    // Logging noise shared across languages
    "log", "debug", "info", "warn", "error", "trace",
];

fn blocklist() -> &'static HashSet<&'static str> {
    BLOCKLIST.get_or_init(|| NAMES.iter().copied().collect())
}

pub fn is_blocked(name: &str) -> bool {
    blocklist().contains(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_builtins_and_framework_hooks() {
        assert!(is_blocked("print"));
        assert!(is_blocked("useState"));
        assert!(!is_blocked("Console")); // only bare-member names are listed, not the receiver
        assert!(is_blocked("WriteLine"));
    }

    #[test]
    fn does_not_block_ordinary_names() {
        assert!(!is_blocked("validate_user"));
        assert!(!is_blocked("GetAll"));
    }
}
