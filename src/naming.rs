use std::collections::{BTreeSet, HashSet};

/// Identifiers that clash with the generated API surface or with Rust
/// keywords (strict, reserved and 2024-edition).
pub const RESERVED_WORDS: &[&str] = &[
    "lock", "base", "default", "abstract", "as", "async", "await", "become", "box", "break",
    "const", "continue", "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn",
    "for", "gen", "if", "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut",
    "override", "priv", "pub", "ref", "return", "self", "Self", "static", "struct", "super",
    "trait", "true", "try", "type", "typeof", "union", "unsafe", "unsized", "use", "virtual",
    "where", "while", "yield", "new",
];

fn segments(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn pascal_case(raw: &str) -> String {
    segments(raw).map(capitalize).collect()
}

pub fn camel_case(raw: &str) -> String {
    let mut parts = segments(raw);
    let mut out = parts.next().map(str::to_string).unwrap_or_default();
    for part in parts {
        out.push_str(&capitalize(part));
    }
    out
}

pub fn snake_case(raw: &str) -> String {
    segments(raw)
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

#[derive(Debug, Clone, Default)]
pub struct Reserved {
    extra: BTreeSet<String>,
}

impl Reserved {
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extra: extra.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, ident: &str) -> bool {
        RESERVED_WORDS.contains(&ident) || self.extra.contains(ident)
    }

    /// Appends `_` to reserved words and prefixes `_` when the identifier
    /// would start with a digit. The wire name is never derived from this.
    pub fn escape(&self, ident: String) -> String {
        let ident = if ident.is_empty() {
            "value".to_string()
        } else if ident.starts_with(|c: char| c.is_ascii_digit()) {
            format!("_{ident}")
        } else {
            ident
        };
        if self.contains(&ident) {
            format!("{ident}_")
        } else {
            ident
        }
    }

    pub fn member(&self, raw: &str) -> String {
        self.escape(snake_case(raw))
    }
}

/// Names already taken inside one generated type. A clash gets the verb
/// appended, then a counter.
#[derive(Debug, Default)]
pub struct NameScope {
    taken: HashSet<String>,
}

impl NameScope {
    pub fn claim(&mut self, base: &str, qualifier: &str) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }

        let candidate = format!("{base}_{qualifier}");
        if self.taken.insert(candidate.clone()) {
            return candidate;
        }

        let mut idx = 2;
        loop {
            let next = format!("{candidate}_{idx}");
            if self.taken.insert(next.clone()) {
                return next;
            }
            idx += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_per_convention() {
        assert_eq!(pascal_case("bwlimit_interval"), "BwlimitInterval");
        assert_eq!(camel_case("bwlimit_interval"), "bwlimitInterval");
        assert_eq!(snake_case("bwlimit_interval"), "bwlimit_interval");
    }

    #[test]
    fn dashes_and_markers_split_segments() {
        assert_eq!(pascal_case("backup-info"), "BackupInfo");
        assert_eq!(snake_case("with-local-disks"), "with_local_disks");
        assert_eq!(pascal_case("{vmid}"), "Vmid");
        assert_eq!(snake_case("ipconfig[n]"), "ipconfig_n");
    }

    #[test]
    fn first_segment_kept_as_written() {
        assert_eq!(camel_case("VMid_list"), "VMidList");
        assert_eq!(pascal_case("vmid"), "Vmid");
    }

    #[test]
    fn reserved_words_get_trailing_underscore() {
        let reserved = Reserved::default();
        assert_eq!(reserved.member("lock"), "lock_");
        assert_eq!(reserved.member("base"), "base_");
        assert_eq!(reserved.member("default"), "default_");
        assert_eq!(reserved.member("type"), "type_");
        assert_eq!(reserved.member("storage"), "storage");
        assert_eq!(reserved.member("6to4"), "_6to4");

        let custom = Reserved::with_extra(["storage"]);
        assert_eq!(custom.member("storage"), "storage_");
    }

    #[test]
    fn scope_disambiguates_deterministically() {
        let mut scope = NameScope::default();
        assert_eq!(scope.claim("status", "get"), "status");
        assert_eq!(scope.claim("status", "post"), "status_post");
        assert_eq!(scope.claim("status", "post"), "status_post_2");
    }
}
