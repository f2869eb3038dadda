//! The compilation pipeline.

use rustc_hash::FxHashMap;
use tracing::debug;

use moji_codegen::{generate_boxing_layer, generate_function, Builder, TypeHelper};
use moji_ir::{Ast, TokenStream};
use moji_parse::{parse_function_body, DocumentParser, PendingLoad};
use moji_sema::{analyse_memory_flow, analyse_function, synthesise_boxing_layers, FunctionAnalysis, ThunkRequest};
use moji_types::{CompileOptions, CompilerSession, FunctionId, PackageId};

use crate::signatures::resolve_package_signatures;

/// One analysed function ready for code generation.
#[derive(Debug)]
pub struct CompiledFunction {
    pub function: FunctionId,
    pub ast: Ast,
    pub analysis: FunctionAnalysis,
}

/// The outcome of compiling one package.
#[derive(Debug)]
pub struct CompiledPackage {
    pub package: PackageId,
    pub functions: Vec<CompiledFunction>,
    /// Synthesised boxing layers and callable thunks.
    pub boxing_layers: Vec<FunctionId>,
}

/// Drives the pipeline for one program.
///
/// The compiler core is single-threaded and synchronous; declarations
/// are processed in file order within a package, packages in
/// import-dependency order (the embedding process feeds them in that
/// order).
pub struct Compiler {
    pub session: CompilerSession,
    decl_asts: FxHashMap<PackageId, Ast>,
    bodies: FxHashMap<FunctionId, TokenStream>,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Compiler {
            session: CompilerSession::new(options),
            decl_asts: FxHashMap::default(),
            bodies: FxHashMap::default(),
        }
    }

    /// Phase 1: parse one document of a package, registering skeleton
    /// declarations and recording body token ranges.
    ///
    /// Returns the 📜 directives found; the embedding process lexes
    /// those files and calls `parse_document` again with the same
    /// package name.
    pub fn parse_document(
        &mut self,
        package_name: &str,
        tokens: TokenStream,
    ) -> (PackageId, Vec<PendingLoad>) {
        let name = self.session.pool.pool(package_name);
        let package = self.session.registry.load_package(name);
        let mut decl_ast = self.decl_asts.remove(&package).unwrap_or_default();

        let functions_before = self.session.registry.function_count() as u32;
        let document = tokens.clone();
        let parser = DocumentParser::new(&mut self.session, tokens, package, &mut decl_ast);
        let pending = parser.parse();
        self.decl_asts.insert(package, decl_ast);

        // Keep each new function's body tokens for phase 3.
        for index in functions_before..self.session.registry.function_count() as u32 {
            let function = FunctionId(index);
            if let Some(range) = self.session.registry.function(function).body {
                self.bodies.insert(function, document.subrange(range));
            }
        }
        (package, pending)
    }

    /// Phases 2–6 for a package whose documents are all parsed.
    pub fn analyse_package(&mut self, package: PackageId) -> CompiledPackage {
        // Phase 2: signatures.
        let decl_ast = self.decl_asts.remove(&package).unwrap_or_default();
        resolve_package_signatures(&mut self.session, package, &decl_ast);
        self.decl_asts.insert(package, decl_ast);
        debug!(package = package.0, "signatures resolved");

        // Phases 3–5: per function, best-effort across siblings.
        let best_effort = self.session.options.best_effort;
        let mut functions = Vec::new();
        let mut thunks: Vec<ThunkRequest> = Vec::new();
        for function in self.package_functions(package) {
            let Some(tokens) = self.bodies.get(&function).cloned() else {
                continue;
            };
            let mut ast = match parse_function_body(tokens) {
                Ok(ast) => ast,
                Err(error) => {
                    self.session.diagnostics.error(error);
                    continue;
                }
            };
            let CompilerSession {
                registry,
                pool,
                diagnostics,
                ..
            } = &mut self.session;
            match analyse_function(registry, pool, diagnostics, function, &mut ast) {
                Ok(mut analysis) => {
                    analyse_memory_flow(registry, &ast, &mut analysis, diagnostics);
                    registry.function_mut(function).variable_ceiling =
                        analysis.variable_ceiling;
                    thunks.extend(analysis.pending_thunks.drain(..));
                    functions.push(CompiledFunction {
                        function,
                        ast,
                        analysis,
                    });
                }
                Err(error) => {
                    diagnostics.error(error);
                    if !best_effort {
                        break;
                    }
                }
            }
        }
        debug!(
            package = package.0,
            functions = functions.len(),
            "bodies analysed"
        );

        // Phase 6: boxing layers.
        let CompilerSession {
            registry,
            diagnostics,
            ..
        } = &mut self.session;
        let report = synthesise_boxing_layers(registry, diagnostics, &thunks);

        CompiledPackage {
            package,
            functions,
            boxing_layers: report.layers,
        }
    }

    /// Convenience wrapper for single-document packages.
    pub fn compile_document(&mut self, package_name: &str, tokens: TokenStream) -> CompiledPackage {
        let (package, _pending) = self.parse_document(package_name, tokens);
        self.analyse_package(package)
    }

    /// Phase 7: emit instructions through the external builder.
    ///
    /// Emits nothing if any error was recorded.
    pub fn generate(&mut self, compiled: &CompiledPackage, builder: &mut dyn Builder) {
        if self.session.diagnostics.has_errors() {
            debug!("errors recorded; no code emitted");
            return;
        }
        let mut helper = TypeHelper::new();
        for function in &compiled.functions {
            generate_function(
                &self.session.registry,
                function.function,
                &function.ast,
                &function.analysis,
                &mut helper,
                builder,
            );
        }
        for layer in &compiled.boxing_layers {
            generate_boxing_layer(&self.session.registry, *layer, builder);
        }
    }

    /// Every function of the package that has a body, in declaration
    /// order.
    fn package_functions(&self, package: PackageId) -> Vec<FunctionId> {
        let registry = &self.session.registry;
        let mut out = Vec::new();
        for class in &registry.package(package).classes {
            let def = registry.class(*class);
            out.extend(def.methods.iter().copied());
            out.extend(def.class_methods.iter().copied());
            out.extend(def.initializers.iter().copied());
        }
        out.sort_by_key(|f| f.0);
        out
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompileOptions::default())
    }
}
