use ahash::AHashSet;

/// Words the emitted TypeScript cannot use as a binding, plus the identifiers
/// the emitter itself declares.
const RESERVED: &[&str] = &[
    "abstract", "any", "as", "async", "await", "boolean", "break", "case", "catch", "class",
    "const", "constructor", "continue", "debugger", "declare", "default", "delete", "do", "else",
    "enum", "export", "extends", "false", "finally", "for", "from", "function", "get", "if",
    "implements", "import", "in", "instanceof", "interface", "let", "module", "namespace", "never",
    "new", "null", "number", "object", "of", "package", "private", "protected", "public",
    "readonly", "return", "set", "static", "string", "super", "switch", "symbol", "this", "throw",
    "true", "try", "type", "typeof", "undefined", "unknown", "var", "void", "while", "with",
    "yield", "tx", "myAddress", "Transaction",
];

/// Hands out unique identifiers within one compile.
///
/// Requested names are sanitized into identifiers; a taken name gets the
/// smallest free `_N` suffix starting at 2.
#[derive(Debug, Clone)]
pub struct NameAllocator {
    taken: AHashSet<String>,
}

impl Default for NameAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl NameAllocator {
    pub fn new() -> Self {
        Self {
            taken: RESERVED.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// An allocator that also treats `names` as taken.
    pub fn seeded<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut allocator = Self::new();
        allocator.taken.extend(names.into_iter().map(str::to_string));
        allocator
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    pub fn alloc(&mut self, hint: &str) -> String {
        let base = sanitize(hint);
        let mut candidate = base.clone();
        let mut n = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }

    /// Allocates a plural form of `hint`, for vector-valued symbols.
    pub fn alloc_plural(&mut self, hint: &str) -> String {
        self.alloc(&pluralize(&sanitize(hint)))
    }
}

fn sanitize(hint: &str) -> String {
    let mut out = String::with_capacity(hint.len());
    let mut last_underscore = false;
    for c in hint.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '$' {
            out.push(c);
            last_underscore = false;
        } else if !last_underscore && !out.is_empty() {
            out.push('_');
            last_underscore = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        return "value".to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

fn pluralize(name: &str) -> String {
    if name.ends_with('s') {
        name.to_string()
    } else if let Some(stem) = name
        .strip_suffix('y')
        .filter(|s| !s.ends_with(['a', 'e', 'o', 'u']))
    {
        format!("{}ies", stem)
    } else {
        format!("{}s", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collisions_get_numbered_suffixes() {
        let mut names = NameAllocator::new();
        assert_eq!(names.alloc("coin"), "coin");
        assert_eq!(names.alloc("coin"), "coin_2");
        assert_eq!(names.alloc("coin"), "coin_3");
    }

    #[test]
    fn reserved_and_malformed_hints() {
        let mut names = NameAllocator::new();
        assert_eq!(names.alloc("tx"), "tx_2");
        assert_eq!(names.alloc("const"), "const_2");
        assert_eq!(names.alloc("my coin!"), "my_coin");
        assert_eq!(names.alloc("1st"), "_1st");
        assert_eq!(names.alloc("  "), "value");
    }

    #[test]
    fn plural_names() {
        let mut names = NameAllocator::new();
        assert_eq!(names.alloc_plural("coin"), "coins");
        assert_eq!(names.alloc_plural("entry"), "entries");
        assert_eq!(names.alloc_plural("key"), "keys");
        assert_eq!(names.alloc_plural("ids"), "ids");
    }
}
