//! Slash-separated path handling.
//!
//! Every path stored in the namespace is canonical: absolute, no `.` or
//! `..` segments, no repeated or trailing separators. Ancestor checks
//! compare whole segments, so `/ab` is never considered to live under `/a`.

pub const ROOT: &str = "/";
pub const SEPARATOR: char = '/';

/// Turn `path` into a canonical absolute path, resolving relative input
/// against `cwd` (which must itself be canonical).
pub fn normalize(path: &str, cwd: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    if !path.starts_with(SEPARATOR) {
        stack.extend(segments(cwd));
    }

    for segment in path.split(SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            name => stack.push(name),
        }
    }

    from_segments(&stack)
}

/// Non-empty segments of a canonical path. The root has none.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty())
}

fn from_segments(segments: &[&str]) -> String {
    if segments.is_empty() {
        return ROOT.to_string();
    }
    let mut out = String::with_capacity(segments.iter().map(|s| s.len() + 1).sum());
    for segment in segments {
        out.push(SEPARATOR);
        out.push_str(segment);
    }
    out
}

pub fn is_root(path: &str) -> bool {
    path == ROOT
}

/// Parent of a canonical path; `None` for the root.
pub fn parent_of(path: &str) -> Option<&str> {
    if is_root(path) {
        return None;
    }
    match path.rfind(SEPARATOR) {
        Some(0) | None => Some(ROOT),
        Some(idx) => Some(&path[..idx]),
    }
}

/// Final segment of a canonical path; empty for the root.
pub fn basename(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Append a single name (or a relative, already clean suffix) to `base`.
pub fn join(base: &str, name: &str) -> String {
    if name.is_empty() {
        return base.to_string();
    }
    if is_root(base) {
        format!("{ROOT}{name}")
    } else {
        format!("{base}{SEPARATOR}{name}")
    }
}

/// The prefix every strict descendant of `path` starts with.
pub fn descendant_prefix(path: &str) -> String {
    if is_root(path) {
        ROOT.to_string()
    } else {
        format!("{path}{SEPARATOR}")
    }
}

/// `path` equals `ancestor` or lies somewhere beneath it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    path == ancestor || is_strictly_within(path, ancestor)
}

/// `path` lies beneath `ancestor` and is not `ancestor` itself.
pub fn is_strictly_within(path: &str, ancestor: &str) -> bool {
    if is_root(ancestor) {
        return !is_root(path);
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == SEPARATOR as u8
}

/// Rewrite `path` (which must be within `from`) to the same location under `to`.
pub fn rebase(path: &str, from: &str, to: &str) -> String {
    if path == from {
        return to.to_string();
    }
    let suffix = if is_root(from) {
        &path[1..]
    } else {
        &path[from.len() + 1..]
    };
    join(to, suffix)
}
