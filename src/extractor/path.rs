//! Mount-path recovery.
//!
//! Express-style routers keep only a compiled regex source for each mount, such as
//! `^\/test(?:\/([^\/]+?))\/?(?=\/|$)` for `/test/:id`, plus the ordered list of capture names.
//! [`reconstruct`] turns that back into a literal base path (`/test/{id}/`).
//! [`normalize_template`] produces the same form directly from a mount template and is
//! used whenever the template is still known.
//!
//! Both functions return base paths: they start and end with `/`.

use log::{debug, warn};
use regex::Regex;
use std::sync::OnceLock;

/// Capture group emitted for a single `:name` segment
pub const CAPTURE_GROUP: &str = r"(?:\/([^\/]+?))";

/// Suffix that matches the rest of the path without consuming it
pub const MOUNT_SUFFIX: &str = r"\/?(?=\/|$)";

fn lookahead_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(\?=[^)]*\)").expect("valid lookahead pattern"))
}

fn residual_capture_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\(\?:\\/\(\[\^\\/\]\+\?\)\)\??").expect("valid capture pattern")
    })
}

fn escape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\(.)").expect("valid escape pattern"))
}

fn slashes_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/{2,}").expect("valid slash pattern"))
}

fn colon_param_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":([^/{}?]+)\??").expect("valid parameter pattern"))
}

/// Recover a literal base path from a compiled mount pattern.
///
/// Each name in `keys` replaces the next capture group (and its optional `?` marker) with
/// `/{name}`. A name without a matching group is logged and skipped; the walk goes on with
/// whatever could be recovered.
///
/// # Examples
///
/// ```
/// use router_openapi::extractor::path::reconstruct;
///
/// assert_eq!(reconstruct(r"^\/test\/?(?=\/|$)", &[]), "/test/");
/// assert_eq!(
///     reconstruct(r"^\/test(?:\/([^\/]+?))\/?(?=\/|$)", &["name".to_string()]),
///     "/test/{name}/"
/// );
/// ```
pub fn reconstruct(source: &str, keys: &[String]) -> String {
    let mut path = source.strip_prefix('^').unwrap_or(source).to_string();

    for key in keys {
        match path.find(CAPTURE_GROUP) {
            Some(start) => {
                let mut end = start + CAPTURE_GROUP.len();
                if path[end..].starts_with('?') {
                    end += 1;
                }
                path.replace_range(start..end, &format!("/{{{}}}", key));
            }
            None => {
                warn!(
                    "No capture group left for parameter '{}' in mount pattern {}",
                    key, source
                );
            }
        }
    }

    if residual_capture_re().is_match(&path) {
        warn!("Mount pattern {} has unnamed capture groups, dropping them", source);
        path = residual_capture_re().replace_all(&path, "").into_owned();
    }

    let path = lookahead_re().replace_all(&path, "");
    let path = escape_re().replace_all(&path, "$1");
    let path = path.replace("/?", "/");
    let path = colon_param_re().replace_all(&path, "{$1}");

    let base = as_base_path(&path);
    debug!("Reconstructed mount path {} from {}", base, source);
    base
}

/// Bring a mount template into base-path form: `:name` and `:name?` become `{name}`, and
/// the result starts and ends with `/`.
pub fn normalize_template(template: &str) -> String {
    let path = colon_param_re().replace_all(template, "{$1}");
    as_base_path(&path)
}

/// Convert `:name` route parameters to `{name}` without touching slashes
pub fn braced_params(path: &str) -> String {
    colon_param_re().replace_all(path, "{$1}").into_owned()
}

fn as_base_path(path: &str) -> String {
    let wrapped = format!("/{}/", path);
    slashes_re().replace_all(&wrapped, "/").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::MountPattern;
    use pretty_assertions::assert_eq;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_static_mount() {
        assert_eq!(reconstruct(r"^\/test\/?(?=\/|$)", &[]), "/test/");
    }

    #[test]
    fn test_root_mount() {
        assert_eq!(reconstruct(r"^\/?(?=\/|$)", &[]), "/");
    }

    #[test]
    fn test_single_parameter() {
        assert_eq!(
            reconstruct(r"^\/test(?:\/([^\/]+?))\/?(?=\/|$)", &keys(&["name"])),
            "/test/{name}/"
        );
    }

    #[test]
    fn test_parameters_in_declaration_order() {
        let source = r"^\/org(?:\/([^\/]+?))\/team(?:\/([^\/]+?))\/?(?=\/|$)";
        assert_eq!(
            reconstruct(source, &keys(&["orgId", "teamId"])),
            "/org/{orgId}/team/{teamId}/"
        );
    }

    #[test]
    fn test_optional_parameter() {
        assert_eq!(
            reconstruct(r"^\/files(?:\/([^\/]+?))?\/?(?=\/|$)", &keys(&["name"])),
            "/files/{name}/"
        );
    }

    #[test]
    fn test_missing_group_keeps_walking() {
        // Two names, one group: the second name is reported and skipped
        assert_eq!(
            reconstruct(r"^\/test(?:\/([^\/]+?))\/?(?=\/|$)", &keys(&["a", "b"])),
            "/test/{a}/"
        );
    }

    #[test]
    fn test_unnamed_group_is_dropped() {
        assert_eq!(
            reconstruct(r"^\/test(?:\/([^\/]+?))\/?(?=\/|$)", &[]),
            "/test/"
        );
    }

    #[test]
    fn test_escaped_literals_are_unescaped() {
        assert_eq!(reconstruct(r"^\/v1\.0\/?(?=\/|$)", &[]), "/v1.0/");
    }

    #[test]
    fn test_normalize_template() {
        assert_eq!(normalize_template(""), "/");
        assert_eq!(normalize_template("/"), "/");
        assert_eq!(normalize_template("/test"), "/test/");
        assert_eq!(normalize_template("test/"), "/test/");
        assert_eq!(normalize_template("/test/:id"), "/test/{id}/");
        assert_eq!(normalize_template("/test/:id?"), "/test/{id}/");
    }

    #[test]
    fn test_braced_params() {
        assert_eq!(braced_params(":name"), "{name}");
        assert_eq!(braced_params("users/:id/posts"), "users/{id}/posts");
    }

    #[test]
    fn test_reconstruct_inverts_compile() {
        let templates = [
            "",
            "/",
            "/test",
            "/test/",
            "/test/:id",
            "/test/:id?",
            "/a/:x/b",
            "/a/:x/b/:y",
            "/v1.0/items",
            "/:tenant",
        ];

        for template in templates {
            let pattern = MountPattern::compile(template);
            assert_eq!(
                reconstruct(&pattern.source, &pattern.keys),
                normalize_template(template),
                "template {:?} compiled to {}",
                template,
                pattern.source
            );
        }
    }
}
