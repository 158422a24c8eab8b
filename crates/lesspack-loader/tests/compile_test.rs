//! End-to-end compile tests over an in-memory build context: resolver
//! delegation, dependency reporting, source maps, option handling, and
//! the error surface.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use lesspack_less::{
    logger, register_implementation, LessImplementation, Level, RenderError, RenderOptions,
    RenderOutput,
};
use lesspack_loader::{
    compile, AdditionalData, AdditionalDataProcessor, BuildContext, BundlerImporter,
    CompileErrorKind, HostError, ImplementationSpec, LessOptionsSource, LoaderOptions,
    ResolveOptions, SourceMapSetting,
};
use lesspack_vfs::FileSystem;

mod support;
use support::TestContext;

fn entry_context() -> TestContext {
    TestContext::new("/project/src/entry.less")
}

fn options_with_paths(paths: &[&str]) -> LoaderOptions {
    LoaderOptions {
        less_options: LessOptionsSource::Bag(RenderOptions {
            paths: paths.iter().map(PathBuf::from).collect(),
            ..RenderOptions::default()
        }),
        ..LoaderOptions::default()
    }
}

/// Stand-in compiler with a canned result, for implementation-selection
/// tests.
struct FixedOutput;

#[async_trait]
impl LessImplementation for FixedOutput {
    fn name(&self) -> &str {
        "fixed"
    }

    fn version(&self) -> [u32; 3] {
        [9, 0, 0]
    }

    async fn render(
        &self,
        _source: &str,
        _options: &RenderOptions,
    ) -> Result<RenderOutput, RenderError> {
        Ok(RenderOutput {
            css: ".fixed {}\n".to_string(),
            map: None,
            imports: vec![
                PathBuf::from("https://example.com/remote.css"),
                PathBuf::from("/project/mixins.less"),
            ],
        })
    }
}

#[tokio::test]
async fn test_entry_and_resolved_import_are_reported() {
    let ctx = Arc::new(
        entry_context()
            .with_file("/project/vendor/basic.less", ".a{color:red}")
            .with_resolution("basic.less", "/project/vendor/basic.less"),
    );

    let output = compile("@import \"basic\";", &LoaderOptions::default(), ctx.clone())
        .await
        .unwrap();

    assert_eq!(output.css, ".a{color:red}\n");
    assert_eq!(
        output.imports,
        vec![
            PathBuf::from("/project/src/entry.less"),
            PathBuf::from("/project/vendor/basic.less"),
        ]
    );
    assert_eq!(
        ctx.recorded_dependencies(),
        output.imports,
        "every reported import must also have been forwarded to add_dependency"
    );
}

#[tokio::test]
async fn test_relative_import_prefers_native_resolution() {
    // Both resolvers could satisfy "basic"; without include paths the
    // native lookup in the importing directory wins.
    let ctx = Arc::new(
        entry_context()
            .with_file("/project/src/basic.less", ".local {}")
            .with_file("/project/vendor/basic.less", ".vendor {}")
            .with_resolution("basic.less", "/project/vendor/basic.less"),
    );

    let output = compile("@import \"basic\";", &LoaderOptions::default(), ctx.clone())
        .await
        .unwrap();

    assert_eq!(output.css, ".local {}\n");
    assert_eq!(
        output.imports,
        vec![
            PathBuf::from("/project/src/entry.less"),
            PathBuf::from("/project/src/basic.less"),
        ]
    );
}

#[tokio::test]
async fn test_nested_imports_collect_every_dependency_once() {
    let ctx = Arc::new(
        entry_context()
            .with_file(
                "/project/src/a.less",
                "@import \"b\";\n@import \"c\";\n.a {}",
            )
            .with_file("/project/src/b.less", ".b {}")
            .with_file("/project/lib/c.less", ".c {}")
            .with_resolution("c.less", "/project/lib/c.less"),
    );

    // "c" is imported twice, from a.less and from the entry.
    let output = compile(
        "@import \"a\";\n@import \"c\";",
        &LoaderOptions::default(),
        ctx.clone(),
    )
    .await
    .unwrap();

    assert_eq!(output.css, ".b {}\n.c {}\n.a {}\n");
    assert_eq!(
        output.imports,
        vec![
            PathBuf::from("/project/src/entry.less"),
            PathBuf::from("/project/src/a.less"),
            PathBuf::from("/project/src/b.less"),
            PathBuf::from("/project/lib/c.less"),
        ]
    );
    assert_eq!(
        ctx.recorded_dependencies(),
        output.imports,
        "repeated imports must not be forwarded twice"
    );
}

#[tokio::test]
async fn test_repeated_compiles_are_idempotent() {
    let ctx = Arc::new(
        entry_context()
            .with_file("/project/vendor/basic.less", ".a {}")
            .with_resolution("basic.less", "/project/vendor/basic.less"),
    );
    let source = "@import \"basic\";\n.entry {}";

    let first = compile(source, &LoaderOptions::default(), ctx.clone())
        .await
        .unwrap();
    let second = compile(source, &LoaderOptions::default(), ctx.clone())
        .await
        .unwrap();

    assert_eq!(first.css, second.css);
    assert_eq!(first.imports, second.imports);
}

#[tokio::test]
async fn test_disabled_importer_cannot_reach_bundler_resolutions() {
    // The resolution table could satisfy the request, but with the
    // bundler importer off the resolver is never consulted.
    let ctx = Arc::new(
        entry_context()
            .with_file(
                "/project/node_modules/widgets/theme.less",
                ".theme {}",
            )
            .with_resolution(
                "widgets/theme.less",
                "/project/node_modules/widgets/theme.less",
            ),
    );
    let options = LoaderOptions {
        bundler_importer: BundlerImporter::Disabled,
        ..LoaderOptions::default()
    };

    let error = compile("@import \"~widgets/theme\";", &options, ctx.clone())
        .await
        .unwrap_err();

    assert_eq!(error.kind, CompileErrorKind::ResolutionNotFound);
    assert!(
        error.message.contains("'~widgets/theme.less' wasn't found"),
        "unexpected message: {}",
        error.message
    );
    assert!(error.message.contains("/project/src/~widgets/theme.less"));
    assert_eq!(
        ctx.recorded_dependencies(),
        vec![PathBuf::from("/project/src/entry.less")],
        "the failing entry stays watched so a fix retriggers the build"
    );
}

#[tokio::test]
async fn test_only_mode_skips_native_resolution() {
    let ctx = Arc::new(
        entry_context()
            .with_file("/project/src/basic.less", ".local {}")
            .with_file("/project/vendor/basic.less", ".vendor {}")
            .with_resolution("basic.less", "/project/vendor/basic.less"),
    );
    let options = LoaderOptions {
        bundler_importer: BundlerImporter::Only,
        ..LoaderOptions::default()
    };

    let output = compile("@import \"basic\";", &options, ctx.clone())
        .await
        .unwrap();

    assert_eq!(output.css, ".vendor {}\n");
    assert!(
        !output.imports.contains(&PathBuf::from("/project/src/basic.less")),
        "the native candidate must not be touched in only mode"
    );
}

#[tokio::test]
async fn test_only_mode_failure_reports_bundler_trace() {
    let ctx = Arc::new(entry_context());
    let options = LoaderOptions {
        bundler_importer: BundlerImporter::Only,
        ..LoaderOptions::default()
    };

    let error = compile("@import \"missing\";", &options, ctx.clone())
        .await
        .unwrap_err();

    assert_eq!(error.kind, CompileErrorKind::ResolutionNotFound);
    // No native attempt was made, so the bundler trace leads.
    assert!(
        error
            .message
            .contains("Bundler resolver error:\nCan't resolve 'missing'"),
        "unexpected message: {}",
        error.message
    );
    assert!(error.message.contains("no resolution rule matches 'missing'"));
    assert!(error.message.contains("/project/node_modules/missing"));
}

#[tokio::test]
async fn test_conflicting_resolvers_fail_the_compile() {
    let ctx = Arc::new(
        entry_context()
            .with_file("/project/lib/shared.less", ".lib {}")
            .with_resolution("shared.less", "/project/src/other/shared.less"),
    );

    let error = compile(
        "@import \"shared\";",
        &options_with_paths(&["/project/lib"]),
        ctx.clone(),
    )
    .await
    .unwrap_err();

    assert_eq!(error.kind, CompileErrorKind::MixedResolverConflict);
    assert_eq!(error.filename, Some(PathBuf::from("/project/src/entry.less")));
    let source = error.source.unwrap();
    insta::assert_snapshot!(
        source.message,
        @"'shared' is satisfiable by both resolvers: the include paths give /project/lib/shared.less while the bundler resolver gives /project/src/other/shared.less; drop the include path or rewrite the import so only one applies"
    );
}

#[tokio::test]
async fn test_agreeing_resolvers_compile_normally() {
    // Same import, but both sides land on the same file: no conflict.
    let ctx = Arc::new(
        entry_context()
            .with_file("/project/lib/shared.less", ".lib {}")
            .with_resolution("shared.less", "/project/lib/shared.less"),
    );

    let output = compile(
        "@import \"shared\";",
        &options_with_paths(&["/project/lib"]),
        ctx.clone(),
    )
    .await
    .unwrap();

    assert_eq!(output.css, ".lib {}\n");
    assert_eq!(
        output.imports,
        vec![
            PathBuf::from("/project/src/entry.less"),
            PathBuf::from("/project/lib/shared.less"),
        ]
    );
}

#[tokio::test]
async fn test_errors_name_the_importing_file() {
    let ctx = Arc::new(
        entry_context().with_file("/project/src/a.less", ".ok {}\n@import broken;"),
    );

    let error = compile("@import \"a\";", &LoaderOptions::default(), ctx.clone())
        .await
        .unwrap_err();

    assert_eq!(error.kind, CompileErrorKind::Syntax);
    assert_eq!(error.filename, Some(PathBuf::from("/project/src/a.less")));
    assert_eq!(error.line, Some(2));
    assert!(error.message.contains("Malformed import statement"));
    assert!(
        error
            .message
            .contains("Error in /project/src/a.less (line 2, column 1)"),
        "unexpected message: {}",
        error.message
    );
    assert!(
        ctx.recorded_dependencies()
            .contains(&PathBuf::from("/project/src/a.less")),
        "the erroring file must stay in the watch set"
    );

    // The host forwarder must detach on the error path too.
    logger::warn("stray warning after failed compile 4c9d");
    let leaked = ctx
        .logs
        .lock()
        .unwrap()
        .iter()
        .any(|(_, message)| message.contains("4c9d"));
    assert!(!leaked, "listener should be detached after a failed compile");
}

#[tokio::test]
async fn test_source_map_lists_every_input() {
    let entry_source = "@import \"basic\";\n.entry {}";
    let ctx = Arc::new(
        entry_context()
            .with_file("/project/src/entry.less", entry_source)
            .with_file("/project/vendor/basic.less", ".a{color:red}")
            .with_resolution("basic.less", "/project/vendor/basic.less"),
    );
    let options = LoaderOptions {
        source_map: Some(SourceMapSetting::Flag(true)),
        ..LoaderOptions::default()
    };

    let output = compile(entry_source, &options, ctx.clone()).await.unwrap();

    assert_eq!(output.css, ".a{color:red}\n.entry {}\n");
    let map = output.source_map.expect("source map was requested");
    assert_eq!(
        map.sources,
        vec![
            "/project/src/entry.less".to_string(),
            "/project/vendor/basic.less".to_string(),
        ]
    );
    for source in &map.sources {
        assert!(
            ctx.fs.is_file(Path::new(source)).unwrap(),
            "map source {} should exist",
            source
        );
    }
    assert_eq!(
        map.sources_content,
        Some(vec![entry_source.to_string(), ".a{color:red}".to_string()])
    );
    assert_eq!(map.file, None);
    assert_eq!(map.source_root, Some(String::new()));
    assert_eq!(
        map.mappings.split(';').count(),
        output.css.lines().count(),
        "every output line should carry a mappings group"
    );
}

#[tokio::test]
async fn test_host_source_map_default_applies() {
    let with_host_maps = Arc::new(entry_context().with_source_maps());
    let output = compile(".a {}", &LoaderOptions::default(), with_host_maps.clone())
        .await
        .unwrap();
    let map = output.source_map.expect("host default should enable the map");
    assert_eq!(map.sources, vec!["/project/src/entry.less".to_string()]);

    let without_host_maps = Arc::new(entry_context());
    let output = compile(".a {}", &LoaderOptions::default(), without_host_maps.clone())
        .await
        .unwrap();
    assert!(output.source_map.is_none());

    // An explicit false wins over the host default.
    let options = LoaderOptions {
        source_map: Some(SourceMapSetting::Flag(false)),
        ..LoaderOptions::default()
    };
    let suppressed = Arc::new(entry_context().with_source_maps());
    let output = compile(".a {}", &options, suppressed.clone()).await.unwrap();
    assert!(output.source_map.is_none());
}

#[tokio::test]
async fn test_additional_data_literal_prepends() {
    let ctx = Arc::new(entry_context());
    let options = LoaderOptions {
        additional_data: Some(AdditionalData::Literal("@brand: teal;".to_string())),
        ..LoaderOptions::default()
    };

    let output = compile(".a {}", &options, ctx.clone()).await.unwrap();

    assert_eq!(output.css, "@brand: teal;\n.a {}\n");
}

struct BannerProcessor;

#[async_trait]
impl AdditionalDataProcessor for BannerProcessor {
    async fn process(&self, content: String, ctx: &dyn BuildContext) -> Result<String, HostError> {
        Ok(format!("/* {} */\n{}", ctx.resource_path().display(), content))
    }
}

struct FailingProcessor;

#[async_trait]
impl AdditionalDataProcessor for FailingProcessor {
    async fn process(&self, _content: String, _ctx: &dyn BuildContext) -> Result<String, HostError> {
        Err(HostError::new("boom"))
    }
}

#[tokio::test]
async fn test_additional_data_processor_transforms() {
    let ctx = Arc::new(entry_context());
    let options = LoaderOptions {
        additional_data: Some(AdditionalData::Processor(Arc::new(BannerProcessor))),
        ..LoaderOptions::default()
    };

    let output = compile(".a {}", &options, ctx.clone()).await.unwrap();

    assert_eq!(output.css, "/* /project/src/entry.less */\n.a {}\n");
}

#[tokio::test]
async fn test_additional_data_processor_failure_is_io() {
    let ctx = Arc::new(entry_context());
    let options = LoaderOptions {
        additional_data: Some(AdditionalData::Processor(Arc::new(FailingProcessor))),
        ..LoaderOptions::default()
    };

    let error = compile(".a {}", &options, ctx.clone()).await.unwrap_err();

    assert_eq!(error.kind, CompileErrorKind::Io);
    assert!(error.message.contains("additional data processing failed"));
    assert!(error.message.contains("boom"));
}

#[tokio::test]
async fn test_unknown_implementation_name_fails_before_compiling() {
    let ctx = Arc::new(entry_context());
    let options = LoaderOptions {
        implementation: Some(ImplementationSpec::Name("no-such-compiler".to_string())),
        ..LoaderOptions::default()
    };

    let error = compile(".a {}", &options, ctx.clone()).await.unwrap_err();

    assert_eq!(error.kind, CompileErrorKind::ImplementationNotFound);
    assert_eq!(
        error.message,
        "the Less implementation \"no-such-compiler\" is not registered"
    );
    assert!(
        ctx.recorded_dependencies().is_empty(),
        "nothing should be watched when the implementation lookup fails"
    );
}

#[tokio::test]
async fn test_custom_implementation_instance_is_used() {
    let ctx = Arc::new(entry_context());
    let options = LoaderOptions {
        implementation: Some(ImplementationSpec::Instance(Arc::new(FixedOutput))),
        ..LoaderOptions::default()
    };

    let output = compile(".ignored {}", &options, ctx.clone()).await.unwrap();

    assert_eq!(output.css, ".fixed {}\n");
    // The url import reported by the compiler is not locally buildable
    // and stays out of the watch set.
    assert_eq!(
        output.imports,
        vec![
            PathBuf::from("/project/src/entry.less"),
            PathBuf::from("/project/mixins.less"),
        ]
    );
}

#[tokio::test]
async fn test_registered_implementation_selected_by_name() {
    register_implementation("fixed-for-name-lookup", Arc::new(FixedOutput));
    let ctx = Arc::new(entry_context());
    let options = LoaderOptions {
        implementation: Some(ImplementationSpec::Name(
            "fixed-for-name-lookup".to_string(),
        )),
        ..LoaderOptions::default()
    };

    let output = compile(".ignored {}", &options, ctx.clone()).await.unwrap();

    assert_eq!(output.css, ".fixed {}\n");
}

#[tokio::test]
async fn test_stringified_module_payloads_are_decoded() {
    // A resolved non-stylesheet asset comes back through the host's
    // module pipeline as a JSON string payload.
    let ctx = Arc::new(
        entry_context()
            .with_resolution("palette.json", "/project/assets/palette.json")
            .with_module("/project/assets/palette.json", "\"@pill: 2px;\""),
    );

    let output = compile(
        "@import \"palette.json\";",
        &LoaderOptions::default(),
        ctx.clone(),
    )
    .await
    .unwrap();

    assert_eq!(output.css, "@pill: 2px;\n");
    assert_eq!(
        output.imports,
        vec![
            PathBuf::from("/project/src/entry.less"),
            PathBuf::from("/project/assets/palette.json"),
        ]
    );
}

#[tokio::test]
async fn test_resolver_receives_stylesheet_policy() {
    let ctx = Arc::new(
        entry_context()
            .with_file("/project/vendor/basic.less", ".a {}")
            .with_resolution("basic.less", "/project/vendor/basic.less"),
    );

    compile("@import \"basic\";", &LoaderOptions::default(), ctx.clone())
        .await
        .unwrap();

    let seen = ctx.resolver_options.lock().unwrap().clone();
    assert_eq!(seen, Some(ResolveOptions::stylesheet()));
}

#[tokio::test]
async fn test_raw_specifier_candidate_used_as_fallback() {
    // Only the untouched form "~widgets/theme" has a resolution rule;
    // the rewritten "widgets/theme.less" misses first.
    let ctx = Arc::new(
        entry_context()
            .with_file("/project/node_modules/widgets/theme.less", ".theme {}")
            .with_resolution(
                "~widgets/theme",
                "/project/node_modules/widgets/theme.less",
            ),
    );

    let output = compile(
        "@import \"~widgets/theme\";",
        &LoaderOptions::default(),
        ctx.clone(),
    )
    .await
    .unwrap();

    assert_eq!(output.css, ".theme {}\n");
    assert!(output
        .imports
        .contains(&PathBuf::from("/project/node_modules/widgets/theme.less")));
}

#[tokio::test]
async fn test_bare_module_root_maps_to_directory_request() {
    // A native file matching the raw specifier exists; a bare module
    // root must go straight to the bundler resolver and never find it.
    let ctx = Arc::new(
        entry_context()
            .with_file("/project/src/~widgets.less", ".trap {}")
            .with_file("/project/node_modules/widgets/index.less", ".widget {}")
            .with_resolution("widgets/", "/project/node_modules/widgets/index.less"),
    );

    let output = compile("@import \"~widgets\";", &LoaderOptions::default(), ctx.clone())
        .await
        .unwrap();

    assert_eq!(output.css, ".widget {}\n");
    assert_eq!(
        output.imports,
        vec![
            PathBuf::from("/project/src/entry.less"),
            PathBuf::from("/project/node_modules/widgets/index.less"),
        ]
    );
}

#[tokio::test]
async fn test_compiler_warnings_reach_the_host_log() {
    let ctx = Arc::new(
        entry_context().with_file("/project/src/basic.less", ".b {}"),
    );

    let output = compile(
        "@import (glittery) \"basic\";",
        &LoaderOptions::default(),
        ctx.clone(),
    )
    .await
    .unwrap();
    assert_eq!(output.css, ".b {}\n");

    let forwarded = ctx
        .logs
        .lock()
        .unwrap()
        .iter()
        .any(|(level, message)| *level == Level::Warn && message.contains("glittery"));
    assert!(forwarded, "the unknown-option warning should reach the host");

    // The forwarder detaches when the compile returns; later compiler
    // log traffic must not reach this context.
    logger::warn("stray warning after compile 7f3a");
    let leaked = ctx
        .logs
        .lock()
        .unwrap()
        .iter()
        .any(|(_, message)| message.contains("7f3a"));
    assert!(!leaked, "listener should be detached after compile");
}
