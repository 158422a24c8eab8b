/*
 * source_map.rs
 * Copyright (c) 2025 Lesspack Contributors
 */

use std::path::Path;

use lesspack_less::SourceMap;
use lesspack_vfs::{normalize_path, to_native_separators};

/// Normalize a compiler-emitted source map for the host build chain.
///
/// The final bundle filename is unknown at this stage, so `file` is
/// dropped; `sourceRoot` is cleared; and the POSIX-style source paths
/// the compiler emits are rewritten to platform-native, lexically
/// normalized form.
pub fn normalize_source_map(mut map: SourceMap) -> SourceMap {
    map.file = None;
    map.source_root = Some(String::new());
    map.sources = map
        .sources
        .iter()
        .map(|source| {
            let native = to_native_separators(source);
            normalize_path(Path::new(&native)).display().to_string()
        })
        .collect();

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_strips_output_naming() {
        let mut map = SourceMap::new();
        map.file = Some("bundle.css".to_string());
        map.source_root = Some("/project".to_string());
        map.sources = vec![
            "/styles/./entry.less".to_string(),
            "/styles/sub/../basic.less".to_string(),
        ];

        let map = normalize_source_map(map);

        assert!(map.file.is_none());
        assert_eq!(map.source_root.as_deref(), Some(""));
        assert_eq!(
            map.sources,
            vec!["/styles/entry.less".to_string(), "/styles/basic.less".to_string()]
        );
    }
}
