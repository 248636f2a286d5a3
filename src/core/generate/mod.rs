//! Walks a validated AST and emits host-language wiring source through the
//! template engine. Semantic errors are caught upstream by the inspector;
//! the only failure left here is a bad template path.

use std::path::{Path, PathBuf};

use crate::core::annotation::ConfigurationAttribute;
use crate::core::lexer::RegisterAnnotation;
use crate::core::tree::{Expr, File, TypeDeclaration};
use crate::core::types::{AccessLevel, CompositeType, Scope};

mod errors;
pub mod template;

pub use errors::GeneratorError;

use template::{TemplateContext, render};

const HEADER_TEMPLATE: &str = include_str!("../../../templates/header.stencil");
const RESOLVER_TEMPLATE: &str = include_str!("../../../templates/resolver.stencil");
const CONTAINER_TEMPLATE: &str = include_str!("../../../templates/container.stencil");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub text: String,
}

/// The three stencils the generator substitutes into, loaded from a bundle
/// directory or embedded defaults.
#[derive(Debug, Clone)]
pub struct TemplateBundle {
    header: String,
    resolver: String,
    container: String,
}

impl TemplateBundle {
    pub fn builtin() -> Self {
        TemplateBundle {
            header: HEADER_TEMPLATE.to_string(),
            resolver: RESOLVER_TEMPLATE.to_string(),
            container: CONTAINER_TEMPLATE.to_string(),
        }
    }

    pub fn load(dir: &Path) -> Result<Self, GeneratorError> {
        let read = |name: &str| -> Result<String, GeneratorError> {
            let path = dir.join(name);
            std::fs::read_to_string(&path)
                .map_err(|_| GeneratorError::InvalidTemplatePath(path))
        };
        Ok(TemplateBundle {
            header: read("header.stencil")?,
            resolver: read("resolver.stencil")?,
            container: read("container.stencil")?,
        })
    }
}

pub struct Generator {
    bundle: TemplateBundle,
}

impl Generator {
    pub fn new(bundle: TemplateBundle) -> Self {
        Generator { bundle }
    }

    /// Emits one generated file per input file. Pure: identical input,
    /// identical bytes.
    pub fn generate(&self, ast: &File) -> Vec<GeneratedFile> {
        let stem = ast
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Unnamed".to_string());

        let mut text = render(&self.bundle.header, &header_context(ast));

        let mut declarations = Vec::new();
        collect_types(&ast.types, None, &mut declarations);
        for (qualified_name, decl) in &declarations {
            let ctx = type_context(ast, decl, qualified_name);
            text.push('\n');
            text.push_str(&render(&self.bundle.resolver, &ctx));
            text.push('\n');
            text.push_str(&render(&self.bundle.container, &ctx));
        }

        vec![GeneratedFile {
            path: PathBuf::from(format!("Weaver.{stem}.swift")),
            text,
        }]
    }
}

/// Pre-order over the nested type declarations, carrying qualified names.
fn collect_types<'a>(
    exprs: &'a [Expr],
    prefix: Option<&str>,
    out: &mut Vec<(String, &'a TypeDeclaration)>,
) {
    for expr in exprs {
        if let Expr::Type(decl) = expr {
            let qualified = match prefix {
                Some(prefix) => format!("{prefix}.{}", decl.name),
                None => decl.name.clone(),
            };
            out.push((qualified.clone(), decl));
            collect_types(&decl.children, Some(&qualified), out);
        }
    }
}

fn header_context(ast: &File) -> TemplateContext {
    let mut ctx = TemplateContext::new();
    let imports = ast
        .imports
        .iter()
        .map(|import| {
            let mut item = TemplateContext::new();
            item.set("name", import);
            item
        })
        .collect();
    ctx.set_list("imports", imports);
    ctx
}

fn type_context(ast: &File, decl: &TypeDeclaration, qualified_name: &str) -> TemplateContext {
    let flat_name = qualified_name.replace('.', "");
    let access = match decl.access_level {
        AccessLevel::Public => "public",
        _ => "internal",
    };

    let mut dependencies = Vec::new();
    let mut registrations = Vec::new();

    for child in &decl.children {
        match child {
            Expr::Register(node) => {
                let ann = &node.annotation;
                let scope = configured_scope(decl, &ann.name).unwrap_or_default();
                let parameters = target_parameters(ast, &ann.concrete_type.0);

                let mut reg = TemplateContext::new();
                reg.set("store_line", store_line(decl, ann, scope, &parameters));
                registrations.push(reg);

                let mut dep = TemplateContext::new();
                dep.set(
                    "resolver_decl",
                    resolver_decl(&ann.name, &ann.abstract_type.0.render(), &parameters),
                );
                dep.set(
                    "resolver_impl",
                    resolver_impl(
                        access,
                        &ann.name,
                        &ann.abstract_type.0.render(),
                        &parameters,
                    ),
                );
                dependencies.push(dep);
            }
            Expr::Reference(node) => {
                let ann = &node.annotation;
                let mut dep = TemplateContext::new();
                dep.set(
                    "resolver_decl",
                    resolver_decl(&ann.name, &ann.abstract_type.0.render(), &[]),
                );
                dep.set(
                    "resolver_impl",
                    resolver_impl(access, &ann.name, &ann.abstract_type.0.render(), &[]),
                );
                dependencies.push(dep);
            }
            _ => {}
        }
    }

    let mut ctx = TemplateContext::new();
    ctx.set("type_name", qualified_name);
    ctx.set("access", access);
    ctx.set("container_name", format!("{flat_name}DependencyContainer"));
    ctx.set("resolver_name", format!("{flat_name}Resolver"));
    ctx.set_list("dependencies", dependencies);
    ctx.set_list("registrations", registrations);
    ctx
}

/// `(name, type)` pairs of the parameters declared by the type a
/// registration builds, in document order.
fn target_parameters(ast: &File, concrete: &CompositeType) -> Vec<(String, String)> {
    let Some(target_name) = concrete.name() else {
        return Vec::new();
    };
    let mut declarations = Vec::new();
    collect_types(&ast.types, None, &mut declarations);
    declarations
        .iter()
        .find(|(_, decl)| decl.name == target_name)
        .map(|(_, decl)| {
            decl.parameters()
                .map(|p| {
                    (
                        p.annotation.name.clone(),
                        p.annotation.parameter_type.render(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

fn configured_scope(decl: &TypeDeclaration, name: &str) -> Option<Scope> {
    decl.configuration_of(name)
        .filter_map(|attr| match attr {
            ConfigurationAttribute::Scope(scope) => Some(*scope),
            _ => None,
        })
        .last()
}

fn custom_builder(decl: &TypeDeclaration, name: &str) -> Option<String> {
    decl.configuration_of(name)
        .filter_map(|attr| match attr {
            ConfigurationAttribute::CustomBuilder(builder) => Some(builder.clone()),
            _ => None,
        })
        .last()
}

fn store_line(
    decl: &TypeDeclaration,
    ann: &RegisterAnnotation,
    scope: Scope,
    parameters: &[(String, String)],
) -> String {
    let builder = custom_builder(decl, &ann.name)
        .unwrap_or_else(|| format!("{}(injecting: resolver)", ann.concrete_type.0.render()));
    format!(
        "store.set(key: {key}, scope: .{scope}) {{ resolver, parameters in {builder} }}",
        key = instance_key(&ann.abstract_type.0.render(), parameters),
    )
}

/// The registration-time identity the runtime expects: the abstract type
/// plus the ordered parameter types.
fn instance_key(abstract_ty: &str, parameters: &[(String, String)]) -> String {
    let tys = parameters
        .iter()
        .map(|(_, ty)| format!("\"{ty}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!("InstanceKey(type: \"{abstract_ty}\", parameterTypes: [{tys}])")
}

fn resolver_decl(name: &str, ty: &str, parameters: &[(String, String)]) -> String {
    if parameters.is_empty() {
        format!("var {name}: {ty} {{ get }}")
    } else {
        format!("func {name}({}) -> {ty}", parameter_list(parameters))
    }
}

fn resolver_impl(
    access: &str,
    name: &str,
    ty: &str,
    parameters: &[(String, String)],
) -> String {
    if parameters.is_empty() {
        format!(
            "{access} var {name}: {ty} {{ return cache.resolve(store: store, key: {key}) as! {ty} }}",
            key = instance_key(ty, parameters),
        )
    } else {
        let args = parameters
            .iter()
            .map(|(pname, _)| pname.clone())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{access} func {name}({params}) -> {ty} {{ return cache.resolve(store: store, key: {key}, parameters: [{args}]) as! {ty} }}",
            params = parameter_list(parameters),
            key = instance_key(ty, parameters),
        )
    }
}

fn parameter_list(parameters: &[(String, String)]) -> String {
    parameters
        .iter()
        .map(|(name, ty)| format!("{name}: {ty}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[path = "../../tests/t_generator.rs"]
mod tests;
