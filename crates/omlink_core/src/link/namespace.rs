use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Clone, Debug, Default)]
pub struct Namespace {
    names: FxHashSet<String>,
    next_index: FxHashMap<String, usize>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&mut self, name: &str) -> bool {
        if self.names.contains(name) {
            return false;
        }
        self.names.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Returns a name nobody has reserved yet and reserves it.
    ///
    /// `base` is returned as-is when it is free. Otherwise `base_suffix` is tried first when a
    /// suffix is given, then `stem_1`, `stem_2`, ... where the stem is `base` or `base_suffix`.
    pub fn fresh(&mut self, base: &str, suffix: Option<&str>) -> String {
        if self.reserve(base) {
            return base.to_string();
        }

        let stem = match suffix {
            Some(suffix) => {
                let stem = format!("{base}_{suffix}");
                if self.reserve(&stem) {
                    return stem;
                }
                stem
            }
            None => base.to_string(),
        };

        let next = self.next_index.entry(stem.clone()).or_insert(1);
        loop {
            let candidate = format!("{stem}_{next}");
            *next += 1;
            if !self.names.contains(&candidate) {
                self.names.insert(candidate.clone());
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Namespace;

    #[test]
    fn free_names_are_returned_unchanged() {
        let mut ns = Namespace::new();
        assert_eq!(ns.fresh("Top", None), "Top");
        assert!(ns.contains("Top"));
        assert!(!ns.reserve("Top"));
    }

    #[test]
    fn numeric_suffixes_skip_taken_names() {
        let mut ns = Namespace::new();
        ns.reserve("Helper");
        ns.reserve("Helper_2");

        assert_eq!(ns.fresh("Helper", None), "Helper_1");
        assert_eq!(ns.fresh("Helper", None), "Helper_3");
        assert_eq!(ns.fresh("Helper", None), "Helper_4");
    }

    #[test]
    fn suffix_hint_is_preferred() {
        let mut ns = Namespace::new();
        ns.reserve("Helper");

        assert_eq!(ns.fresh("Helper", Some("b")), "Helper_b");
        assert_eq!(ns.fresh("Helper", Some("b")), "Helper_b_1");
        assert_eq!(ns.fresh("Helper", Some("c")), "Helper_c");
    }

    #[test]
    fn issued_names_are_never_reissued() {
        let mut ns = Namespace::new();
        ns.reserve("A");
        ns.reserve("A_1");
        let issued: Vec<_> = (0..4).map(|_| ns.fresh("A", None)).collect();
        assert_eq!(issued, vec!["A_2", "A_3", "A_4", "A_5"]);
        assert_eq!(ns.fresh("A_1", None), "A_1_1");
    }
}
