/*
 * requests.rs
 * Copyright (c) 2025 Lesspack Contributors
 *
 * Specifier classification and rewriting. Import specifiers arrive in
 * several shapes (module-style with a `~` sigil, relative, absolute,
 * URLs) and the compiler's extension-completion heuristic interacts
 * badly with the module-style ones; this module turns a raw specifier
 * into the ordered candidate requests the host resolver is tried with.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use lesspack_less::try_append_extension;

// A bare module reference: the compiler passes these without the
// extension it would otherwise have appended, so the hint is ignored.
static IS_SPECIAL_MODULE_IMPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^~[^/]+$").unwrap());

// `[drive_letter]:\` and `\\[server]\[share_name]\`
static IS_NATIVE_WIN32_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z]:[/\\]|^\\\\").unwrap());

// Module roots, with or without a trailing slash:
// ~package, ~package/, ~@org, ~@org/, ~@org/package, ~@org/package/
static IS_MODULE_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^~([^/]+|[^/]+/|@[^/]+/[^/]+|@[^/]+/?|@[^/]+/[^/]+/)$").unwrap());

// Everything up to and including the sigil is dropped to obtain the
// bare module request.
static MODULE_REQUEST: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^?]*~").unwrap());

// Dots are disallowed in module names, so `~name.less` can only be the
// compiler's own extension heuristic misfiring on a module root. It must
// not match a subpath like `~name/file.less`.
static MALFORMED_MODULE_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(~[^/\\]+)\.less$").unwrap());

// Files whose resolved contents are stylesheet text rather than an
// artifact to stringify.
static IS_LESS_COMPATIBLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(le|c)ss$").unwrap());

// RFC 3986 scheme prefix.
static URL_SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z\d+\-.]*:").unwrap());

/// A bare `~module` reference (no subpath).
pub fn is_special_module_import(specifier: &str) -> bool {
    IS_SPECIAL_MODULE_IMPORT.is_match(specifier)
}

/// Windows drive-letter or UNC path.
pub fn is_native_win32_path(specifier: &str) -> bool {
    IS_NATIVE_WIN32_PATH.is_match(specifier)
}

/// Any module-root form, with or without an org scope or trailing slash.
pub fn is_module_import(specifier: &str) -> bool {
    IS_MODULE_IMPORT.is_match(specifier)
}

/// Whether a resolved path holds stylesheet text (`.less` or `.css`).
pub fn is_less_compatible(path: &str) -> bool {
    IS_LESS_COMPATIBLE.is_match(path)
}

/// Scheme-qualified references are not locally re-buildable and are
/// excluded from dependency tracking. Windows drive-letter paths look
/// scheme-like but are real files and stay tracked.
pub fn is_unsupported_url(url: &str) -> bool {
    if is_native_win32_path(url) {
        return false;
    }

    URL_SCHEME.is_match(url)
}

/// Apply the compiler's extension hint to a specifier.
///
/// Module roots are left alone (appending would corrupt the module
/// name), and a `~name.less` artifact produced by the compiler's own
/// heuristic is corrected back to `~name`.
pub fn apply_extension_hint(specifier: &str, ext: Option<&str>) -> String {
    let hinted = match ext {
        Some(ext) if !is_module_import(specifier) => try_append_extension(specifier, ext),
        _ => specifier.to_string(),
    };

    MALFORMED_MODULE_FILENAME
        .replace(&hinted, "$1")
        .into_owned()
}

/// Rewrite a specifier into the bare request handed to the host
/// resolver: sigil stripped, module roots normalized to directory form
/// so main-field and index probing activates.
pub fn module_request(specifier: &str) -> String {
    let mut request = if MODULE_REQUEST.is_match(specifier) {
        MODULE_REQUEST.replace(specifier, "").into_owned()
    } else {
        specifier.to_string()
    };

    if is_module_import(specifier) && !request.ends_with('/') {
        request.push('/');
    }

    request
}

/// Ordered candidate requests for one import: the rewritten form first,
/// the raw specifier as fallback, duplicates removed.
pub fn candidate_requests(specifier: &str, ext: Option<&str>) -> Vec<String> {
    let hinted = apply_extension_hint(specifier, ext);
    let rewritten = module_request(&hinted);

    let mut candidates = vec![rewritten];
    if !candidates.contains(&specifier.to_string()) {
        candidates.push(specifier.to_string());
    }

    candidates
}
