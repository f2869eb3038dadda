//! End-to-end pipeline tests.
//!
//! Each test assembles a token stream by hand (the lexer is external),
//! runs the pipeline, and asserts on diagnostics, registry contents,
//! analysis annotations or emitted instructions.

#![expect(clippy::expect_used, reason = "Tests use expect for brevity")]

mod support;

use mojic::{report_package, CompiledPackage, Compiler};

use moji_codegen::{Op, RecordingBuilder};
use moji_diagnostic::{ErrorCode, Severity};
use moji_ir::{glyphs, ExprKind, Glyph, StmtKind};
use moji_sema::MFFlowCategory;
use moji_types::{CompileOptions, FunctionKind, Type, TypeKind};
use support::TokenBuilder;

fn compiler() -> Compiler {
    Compiler::new(CompileOptions::default())
}

/// 🐇 🗃 🐚 T ⚪ 🍇 … 🍉 — a generic box class with one instance
/// variable, an initializer assigning it, and a method returning it.
fn box_class(builder: &mut TokenBuilder<'_>) {
    builder
        .g('🐇')
        .g('🗃')
        .g('🐚')
        .v("T")
        .g('⚪')
        .g('🍇')
        .nl()
        .g('🍰')
        .v("value")
        .v("T")
        .nl()
        .g('🐈')
        .g('🆕')
        .v("v")
        .v("T")
        .g('🍇')
        .g('🍮')
        .v("value")
        .v("v")
        .g('🍉')
        .nl()
        .g('🐖')
        .g('🎁')
        .g('➡')
        .v("T")
        .g('🍇')
        .g('🍎')
        .v("value")
        .g('🍉')
        .nl()
        .g('🍉')
        .nl();
}

fn error_codes(compiler: &Compiler) -> Vec<ErrorCode> {
    compiler
        .session
        .diagnostics
        .diagnostics()
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .filter_map(|d| d.code)
        .collect()
}

fn find_function(
    compiler: &Compiler,
    compiled: &CompiledPackage,
    kind: FunctionKind,
) -> usize {
    compiled
        .functions
        .iter()
        .position(|f| compiler.session.registry.function(f.function).kind == kind)
        .expect("function of requested kind")
}

#[test]
fn happy_class_compiles_and_types_the_method_body() {
    let mut compiler = compiler();
    let mut builder = TokenBuilder::new(&compiler.session.pool, "box.moji");
    box_class(&mut builder);
    let compiled = compiler.compile_document("_", builder.build());

    assert!(
        !compiler.session.diagnostics.has_errors(),
        "{}",
        compiler.session.diagnostics.render(&compiler.session.pool)
    );

    // The registry knows the class.
    let package = compiled.package;
    let fetched = compiler
        .session
        .registry
        .fetch_raw_type(package, glyphs::GLOBAL_NAMESPACE, Glyph('🗃'), false);
    assert!(fetched.is_some());

    // One initializer, one method, zero boxing layers.
    assert_eq!(compiled.functions.len(), 2);
    assert!(compiled.boxing_layers.is_empty());

    // The method body types to T.
    let index = find_function(&compiler, &compiled, FunctionKind::Method);
    let method = &compiled.functions[index];
    let root = method.ast.root.expect("body");
    let StmtKind::Return(value) = method.ast.stmt(method.ast.block(root).stmts[0]).kind else {
        panic!("expected a return statement");
    };
    let ty = method.analysis.expr_type(value);
    assert!(matches!(
        ty.kind(),
        TypeKind::GenericVariable { index: 0, local: false, .. }
    ));
}

#[test]
fn generic_mismatch_fails_the_function_but_not_its_siblings() {
    let mut compiler = compiler();
    let mut builder = TokenBuilder::new(&compiler.session.pool, "mismatch.moji");
    box_class(&mut builder);
    // 🐖 💥 🍇 🍮 x 🔷 🗃 🐚 🚂 🍆 🆕 👍 ❗ 🍉 — boolean where T = 🚂.
    builder
        .g('🐇')
        .g('🏭')
        .g('🍇')
        .nl()
        .g('🐖')
        .g('💥')
        .g('🍇')
        .g('🍮')
        .v("x")
        .g('🔷')
        .g('🗃')
        .g('🐚')
        .g('🚂')
        .g('🍆')
        .g('🆕')
        .g('👍')
        .g('❗')
        .g('🍉')
        .nl()
        .g('🐖')
        .g('💚')
        .g('➡')
        .g('🚂')
        .g('🍇')
        .g('🍎')
        .int(1)
        .g('🍉')
        .nl()
        .g('🍉')
        .nl();
    let compiled = compiler.compile_document("_", builder.build());

    assert!(compiler.session.diagnostics.has_errors());
    assert!(error_codes(&compiler).contains(&ErrorCode::E3001));

    // 💥 aborted; 🆕, 🎁 and 💚 still compiled.
    let compiled_names: Vec<Glyph> = compiled
        .functions
        .iter()
        .map(|f| compiler.session.registry.function(f.function).name)
        .collect();
    assert!(compiled_names.contains(&Glyph('💚')));
    assert!(!compiled_names.contains(&Glyph('💥')));
}

#[test]
fn missing_required_initializer_is_reported_at_the_subclass() {
    let mut compiler = compiler();
    let mut builder = TokenBuilder::new(&compiler.session.pool, "required.moji");
    // 🐇 🦸 🍇 🔑 🐈 🆕 🍇 🍉 🍉
    builder
        .g('🐇')
        .g('🦸')
        .g('🍇')
        .g('🔑')
        .g('🐈')
        .g('🆕')
        .g('🍇')
        .g('🍉')
        .g('🍉')
        .nl();
    // 🐇 🦹 🦸 🍇 🍉 — subclass without 🆕.
    builder.g('🐇').g('🦹').g('🦸').g('🍇').g('🍉').nl();
    compiler.compile_document("_", builder.build());

    let rendered = compiler.session.diagnostics.render(&compiler.session.pool);
    assert!(error_codes(&compiler).contains(&ErrorCode::E4003), "{rendered}");
    assert!(rendered.contains("🆕"));
}

#[test]
fn unwrap_of_non_optional_is_rejected() {
    let mut compiler = compiler();
    let mut builder = TokenBuilder::new(&compiler.session.pool, "unwrap.moji");
    // 🐖 🧯 🍇 🍮 x 5  🍺 x 🍉
    builder
        .g('🐇')
        .g('🧪')
        .g('🍇')
        .g('🐖')
        .g('🧯')
        .g('🍇')
        .g('🍮')
        .v("x")
        .int(5)
        .g('🍺')
        .v("x")
        .g('🍉')
        .g('🍉')
        .nl();
    compiler.compile_document("_", builder.build());

    let rendered = compiler.session.diagnostics.render(&compiler.session.pool);
    assert!(error_codes(&compiler).contains(&ErrorCode::E3007), "{rendered}");
    assert!(rendered.contains("🍺 can only be used with optionals or 🚨."));
}

#[test]
fn is_error_on_non_error_is_rejected() {
    let mut compiler = compiler();
    let mut builder = TokenBuilder::new(&compiler.session.pool, "signal.moji");
    builder
        .g('🐇')
        .g('🧪')
        .g('🍇')
        .g('🐖')
        .g('🚦')
        .g('🍇')
        .g('🍮')
        .v("x")
        .int(5)
        .g('🚥')
        .v("x")
        .g('🍉')
        .g('🍉')
        .nl();
    compiler.compile_document("_", builder.build());

    let rendered = compiler.session.diagnostics.render(&compiler.session.pool);
    assert!(error_codes(&compiler).contains(&ErrorCode::E3006), "{rendered}");
    assert!(rendered.contains("🚥 can only be used with 🚨."));
}

#[test]
fn shadowing_warns_but_compiles() {
    let mut compiler = compiler();
    let mut builder = TokenBuilder::new(&compiler.session.pool, "shadow.moji");
    // 🍦 x 1 🍇 🍦 x 2 🍉
    builder
        .g('🐇')
        .g('🧅')
        .g('🍇')
        .g('🐖')
        .g('🌓')
        .g('🍇')
        .g('🍦')
        .v("x")
        .int(1)
        .g('🍇')
        .g('🍦')
        .v("x")
        .int(2)
        .g('🍉')
        .g('🍉')
        .g('🍉')
        .nl();
    compiler.compile_document("_", builder.build());

    assert!(!compiler.session.diagnostics.has_errors());
    let rendered = compiler.session.diagnostics.render(&compiler.session.pool);
    assert!(rendered.contains("warning:"), "{rendered}");
    assert!(rendered.contains("shadows previous local variable"), "{rendered}");
}

#[test]
fn duplicate_starting_flag_names_the_first_class() {
    let mut compiler = compiler();
    let mut builder = TokenBuilder::new(&compiler.session.pool, "flags.moji");
    for class in ['🅰', '🅱'] {
        builder
            .g('🐇')
            .g(class)
            .g('🍇')
            .g('🐇')
            .g('🐖')
            .g('🏁')
            .g('➡')
            .g('🚂')
            .g('🍇')
            .g('🍎')
            .int(0)
            .g('🍉')
            .g('🍉')
            .nl();
    }
    compiler.compile_document("_", builder.build());

    let rendered = compiler.session.diagnostics.render(&compiler.session.pool);
    assert!(error_codes(&compiler).contains(&ErrorCode::E4002), "{rendered}");
    assert!(rendered.contains("🅰"), "{rendered}");
}

#[test]
fn conformance_autoboxes_and_labels_the_instance_escaping() {
    let mut compiler = compiler();
    let mut builder = TokenBuilder::new(&compiler.session.pool, "conform.moji");
    // 🐊 🤝 🍇 🐖 📢 ➡ 🚂 🍉
    builder
        .g('🐊')
        .g('🤝')
        .g('🍇')
        .g('🐖')
        .g('📢')
        .g('➡')
        .g('🚂')
        .g('🍉')
        .nl();
    // 🐇 🧺 🍇 🐊 🤝  🐖 📢 ➡ 🚂 🍇 🍎 1 🍉 🍉
    builder
        .g('🐇')
        .g('🧺')
        .g('🍇')
        .g('🐊')
        .g('🤝')
        .nl()
        .g('🐖')
        .g('📢')
        .g('➡')
        .g('🚂')
        .g('🍇')
        .g('🍎')
        .int(1)
        .g('🍉')
        .g('🍉')
        .nl();
    // 🐇 🏭 🍇 🐖 📨 b 🧺 ➡ 🤝 🍇 🍎 b 🍉 🍉
    builder
        .g('🐇')
        .g('🏭')
        .g('🍇')
        .g('🐖')
        .g('📨')
        .v("b")
        .g('🧺')
        .g('➡')
        .g('🤝')
        .g('🍇')
        .g('🍎')
        .v("b")
        .g('🍉')
        .g('🍉')
        .nl();
    let compiled = compiler.compile_document("_", builder.build());

    assert!(
        !compiler.session.diagnostics.has_errors(),
        "{}",
        compiler.session.diagnostics.render(&compiler.session.pool)
    );

    // 📨 returns through an implicit protocol box.
    let function = compiled
        .functions
        .iter()
        .find(|f| compiler.session.registry.function(f.function).name == Glyph('📨'))
        .expect("📨 analysed");
    let root = function.ast.root.expect("body");
    let StmtKind::Return(boxed) = function.ast.stmt(function.ast.block(root).stmts[0]).kind
    else {
        panic!("expected a return statement");
    };
    let ExprKind::Box { value, .. } = function.ast.expr(boxed).kind else {
        panic!("expected an implicit box node");
    };
    assert!(matches!(
        function.analysis.expr_type(boxed).kind(),
        TypeKind::Protocol(_)
    ));
    assert_eq!(
        function.analysis.flow_category(value),
        MFFlowCategory::Escaping
    );

    // The conformance needed one boxing layer (🚂 boxes to ⚪).
    assert_eq!(compiled.boxing_layers.len(), 1);
    let layer = compiler.session.registry.function(compiled.boxing_layers[0]);
    assert_eq!(layer.kind, FunctionKind::BoxingLayer);
    assert_eq!(layer.return_type, Type::something());
}

#[test]
fn boxing_layer_signature_is_the_boxed_form_of_the_implementation() {
    let mut compiler = compiler();
    let mut builder = TokenBuilder::new(&compiler.session.pool, "boxed.moji");
    // 🐊 ⚖ has a method taking and returning 🚂.
    builder
        .g('🐊')
        .g('🤝')
        .g('🍇')
        .g('🐖')
        .g('📏')
        .v("n")
        .g('🚂')
        .g('➡')
        .g('🚂')
        .g('🍉')
        .nl();
    builder
        .g('🐇')
        .g('🧺')
        .g('🍇')
        .g('🐊')
        .g('🤝')
        .nl()
        .g('🐖')
        .g('📏')
        .v("n")
        .g('🚂')
        .g('➡')
        .g('🚂')
        .g('🍇')
        .g('🍎')
        .v("n")
        .g('🍉')
        .g('🍉')
        .nl();
    let compiled = compiler.compile_document("_", builder.build());

    assert!(
        !compiler.session.diagnostics.has_errors(),
        "{}",
        compiler.session.diagnostics.render(&compiler.session.pool)
    );
    assert_eq!(compiled.boxing_layers.len(), 1);
    let layer = compiler.session.registry.function(compiled.boxing_layers[0]);
    // Boxed form: every non-reference type travels as ⚪.
    assert_eq!(layer.parameters.len(), 1);
    assert_eq!(layer.parameters[0].ty, Type::something());
    assert_eq!(layer.return_type, Type::something());
    let boxing = layer.boxing.as_ref().expect("destination info");
    assert_eq!(boxing.destination_parameters, vec![Type::integer()]);
    assert_eq!(boxing.destination_return, Type::integer());
}

#[test]
fn raise_outside_an_error_function_is_rejected() {
    let mut compiler = compiler();
    let mut builder = TokenBuilder::new(&compiler.session.pool, "raise.moji");
    builder
        .g('🐇')
        .g('🧪')
        .g('🍇')
        .g('🐖')
        .g('🧨')
        .g('🍇')
        .g('🚨')
        .int(1)
        .g('🍉')
        .g('🍉')
        .nl();
    compiler.compile_document("_", builder.build());
    assert!(error_codes(&compiler).contains(&ErrorCode::E4004));
}

#[test]
fn frozen_variables_reject_reassignment() {
    let mut compiler = compiler();
    let mut builder = TokenBuilder::new(&compiler.session.pool, "frozen.moji");
    builder
        .g('🐇')
        .g('🧪')
        .g('🍇')
        .g('🐖')
        .g('🧊')
        .g('🍇')
        .g('🍦')
        .v("x")
        .int(1)
        .g('🍮')
        .v("x")
        .int(2)
        .g('🍉')
        .g('🍉')
        .nl();
    compiler.compile_document("_", builder.build());
    assert!(error_codes(&compiler).contains(&ErrorCode::E4007));
}

#[test]
fn conditional_assignment_binds_only_inside_the_true_branch() {
    let mut compiler = compiler();
    let mut builder = TokenBuilder::new(&compiler.session.pool, "condassign.moji");
    // 🐖 🔍 o 🍬🚂 ➡ 🚂 🍇 🍊 o ➡ x 🍇 🍎 x 🍉  🍎 0 🍉
    builder
        .g('🐇')
        .g('🧪')
        .g('🍇')
        .g('🐖')
        .g('🔍')
        .v("o")
        .g('🍬')
        .g('🚂')
        .g('➡')
        .g('🚂')
        .g('🍇')
        .g('🍊')
        .v("o")
        .g('➡')
        .v("x")
        .g('🍇')
        .g('🍎')
        .v("x")
        .g('🍉')
        .g('🍎')
        .int(0)
        .g('🍉')
        .g('🍉')
        .nl();
    compiler.compile_document("_", builder.build());
    assert!(
        !compiler.session.diagnostics.has_errors(),
        "{}",
        compiler.session.diagnostics.render(&compiler.session.pool)
    );

    // Outside the branch the binding is gone.
    let mut compiler = self::compiler();
    let mut builder = TokenBuilder::new(&compiler.session.pool, "condassign2.moji");
    builder
        .g('🐇')
        .g('🧪')
        .g('🍇')
        .g('🐖')
        .g('🔍')
        .v("o")
        .g('🍬')
        .g('🚂')
        .g('➡')
        .g('🚂')
        .g('🍇')
        .g('🍊')
        .v("o")
        .g('➡')
        .v("x")
        .g('🍇')
        .g('🍉')
        .g('🍎')
        .v("x")
        .g('🍉')
        .g('🍉')
        .nl();
    compiler.compile_document("_", builder.build());
    assert!(error_codes(&compiler).contains(&ErrorCode::E2003));
}

#[test]
fn analysis_is_monotonic_on_an_annotated_tree() {
    let mut compiler = compiler();
    let mut builder = TokenBuilder::new(&compiler.session.pool, "twice.moji");
    box_class(&mut builder);
    let compiled = compiler.compile_document("_", builder.build());
    assert!(!compiler.session.diagnostics.has_errors());

    for function in &compiled.functions {
        let mut reanalysed = function.ast.clone();
        let moji_types::CompilerSession {
            registry,
            pool,
            diagnostics,
            ..
        } = &mut compiler.session;
        let analysis =
            moji_sema::analyse_function(registry, pool, diagnostics, function.function, &mut reanalysed)
                .expect("second run succeeds");
        // Running the analyser twice produces identical annotations and
        // leaves the tree unchanged.
        assert_eq!(reanalysed, function.ast);
        assert_eq!(analysis.expr_types, function.analysis.expr_types);
    }
    assert!(!compiler.session.diagnostics.has_errors());
}

#[test]
fn code_generation_emits_and_releases_temporaries() {
    let mut compiler = compiler();
    let mut builder = TokenBuilder::new(&compiler.session.pool, "emit.moji");
    // 🐖 🧹 🍇 1 ➕ 2 🍉 — the discarded sum is temporarily scoped.
    builder
        .g('🐇')
        .g('🧹')
        .g('🍇')
        .g('🐖')
        .g('🧼')
        .g('🍇')
        .int(1)
        .g('➕')
        .int(2)
        .g('🍉')
        .g('🍉')
        .nl();
    let compiled = compiler.compile_document("_", builder.build());
    assert!(
        !compiler.session.diagnostics.has_errors(),
        "{}",
        compiler.session.diagnostics.render(&compiler.session.pool)
    );

    let mut recording = RecordingBuilder::new();
    compiler.generate(&compiled, &mut recording);
    assert!(!recording.recorded.is_empty());
    // The ➕ resolves to the 🚂 value-type method and is called directly.
    assert!(!recording.calls().is_empty());
    assert_eq!(recording.instructions(Op::Release).len(), 1);
}

#[test]
fn no_code_is_emitted_after_errors() {
    let mut compiler = compiler();
    let mut builder = TokenBuilder::new(&compiler.session.pool, "broken.moji");
    builder
        .g('🐇')
        .g('🧪')
        .g('🍇')
        .g('🐖')
        .g('🧯')
        .g('🍇')
        .g('🍺')
        .int(5)
        .g('🍉')
        .g('🍉')
        .nl();
    let compiled = compiler.compile_document("_", builder.build());
    assert!(compiler.session.diagnostics.has_errors());

    let mut recording = RecordingBuilder::new();
    compiler.generate(&compiled, &mut recording);
    assert!(recording.recorded.is_empty());
}

#[test]
fn report_describes_the_package_as_json() {
    let mut compiler = compiler();
    let mut builder = TokenBuilder::new(&compiler.session.pool, "report.moji");
    box_class(&mut builder);
    let compiled = compiler.compile_document("_", builder.build());
    assert!(!compiler.session.diagnostics.has_errors());

    let json = report_package(&compiler.session, compiled.package);
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
    let classes = value["classes"].as_array().expect("classes array");
    let class = classes
        .iter()
        .find(|c| c["name"] == "🗃")
        .expect("🗃 reported");
    assert_eq!(class["methods"].as_array().map(Vec::len), Some(1));
    assert_eq!(class["initializers"].as_array().map(Vec::len), Some(1));
    let method = &class["methods"][0];
    assert_eq!(method["name"], "🎁");
    assert!(value["enums"].is_array());
    assert!(value["protocols"].is_array());
}
