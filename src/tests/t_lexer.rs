use super::*;
use indoc::indoc;
use serde_json::json;

use crate::core::annotation::ConfigurationAttribute as Attr;
use crate::core::types::{CompositeType, Scope};

fn lex(source: &str, decls: serde_json::Value) -> Result<Vec<Token>, LexerError> {
    let file = SourceFile::new("Test.swift", source);
    let declarations: Vec<Declaration> = serde_json::from_value(decls).unwrap();
    Lexer::new(&file).tokenize(&declarations)
}

/// Declaration dictionary for a class spanning `class_text` within `source`,
/// with the given substructure.
fn class_decl(source: &str, name: &str, substructure: serde_json::Value) -> serde_json::Value {
    let offset = source.find("class ").expect("class keyword");
    let end = source.rfind('}').expect("closing brace");
    let body = source[offset..].find('{').expect("body") + offset;
    json!({
        "kind": "class",
        "name": name,
        "offset": offset,
        "length": end - offset + 1,
        "bodyOffset": body,
        "accessibility": "source.lang.swift.accessibility.internal",
        "substructure": substructure,
    })
}

fn var_decl(source: &str, name: &str, typename: &str) -> serde_json::Value {
    let attr_offset = source.find("@Weaver").expect("annotation");
    let attr_len = source[attr_offset..].find(')').expect("closing paren") + 1;
    json!({
        "kind": "var.instance",
        "name": name,
        "typename": typename,
        "offset": attr_offset,
        "length": source.len() - attr_offset,
        "accessibility": "source.lang.swift.accessibility.private",
        "attributes": [
            {"kind": "custom", "offset": attr_offset, "length": attr_len},
        ],
    })
}

#[test]
fn test_lex_registration_with_configuration() {
    let source = indoc! {r#"
        import API

        final class MovieManager {
            @Weaver(.registration, type: MovieAPI.self, scope: .container) private var movieAPI: APIProtocol
        }
    "#};
    let decls = json!([class_decl(
        source,
        "MovieManager",
        json!([var_decl(source, "movieAPI", "APIProtocol")]),
    )]);

    let tokens = lex(source, decls).unwrap();
    assert_eq!(tokens.len(), 5);

    assert!(matches!(tokens[0].kind, TokenKind::Import(ref m) if m == "API"));
    assert_eq!(tokens[0].span.start.offset, 0);

    let class_offset = source.find("class ").unwrap();
    assert!(matches!(
        tokens[1].kind,
        TokenKind::InjectableType(ref t) if t.name == "MovieManager"
    ));
    assert_eq!(tokens[1].span.start.offset, class_offset);

    let attr_offset = source.find("@Weaver").unwrap();
    let TokenKind::Register(ref register) = tokens[2].kind else {
        panic!("expected register token, got {}", tokens[2]);
    };
    assert_eq!(tokens[2].span.start.offset, attr_offset);
    assert_eq!(register.name, "movieAPI");
    assert_eq!(register.abstract_type.0, CompositeType::named("APIProtocol"));
    assert_eq!(register.concrete_type.0, CompositeType::named("MovieAPI"));
    assert_eq!(register.access_level, AccessLevel::Internal);

    let TokenKind::Configuration(ref config) = tokens[3].kind else {
        panic!("expected configuration token, got {}", tokens[3]);
    };
    assert_eq!(
        config.target,
        ConfigurationTarget::Dependency("movieAPI".to_string())
    );
    assert_eq!(config.attribute, Attr::Scope(Scope::Container));

    assert!(matches!(tokens[4].kind, TokenKind::EndOfInjectableType));
    let end = source.rfind('}').unwrap();
    assert_eq!(tokens[4].span.start.offset, end);
}

#[test]
fn test_lex_enum_is_any_declaration() {
    let source = indoc! {r#"
        enum Genre {
            case drama
        }
    "#};
    let offset = 0;
    let end = source.rfind('}').unwrap();
    let decls = json!([{
        "kind": "enum",
        "name": "Genre",
        "offset": offset,
        "length": end - offset + 1,
        "bodyOffset": source.find('{').unwrap(),
    }]);

    let tokens = lex(source, decls).unwrap();
    assert_eq!(tokens.len(), 2);
    assert!(matches!(tokens[0].kind, TokenKind::AnyDeclaration));
    assert!(matches!(tokens[1].kind, TokenKind::EndOfAnyDeclaration));
}

#[test]
fn test_lex_bodyless_declaration_produces_no_tokens() {
    let decls = json!([{
        "kind": "class",
        "name": "Marker",
        "offset": 0,
        "length": 12,
    }]);
    let tokens = lex("class Marker", decls).unwrap();
    assert!(tokens.is_empty());
}

#[test]
fn test_lex_foreign_attribute_is_skipped() {
    let source = indoc! {r#"
        final class MovieManager {
            @Published private var state: Int
        }
    "#};
    let attr_offset = source.find("@Published").unwrap();
    let decls = json!([class_decl(
        source,
        "MovieManager",
        json!([{
            "kind": "var.instance",
            "name": "state",
            "typename": "Int",
            "offset": attr_offset,
            "length": 10,
            "attributes": [{"kind": "custom", "offset": attr_offset, "length": 10}],
        }]),
    )]);

    let tokens = lex(source, decls).unwrap();
    assert_eq!(tokens.len(), 2);
    assert!(matches!(tokens[0].kind, TokenKind::InjectableType(_)));
    assert!(matches!(tokens[1].kind, TokenKind::EndOfInjectableType));
}

#[test]
fn test_lex_invalid_annotation_reports_line() {
    let source = indoc! {r#"
        final class MovieManager {
            @Weaver(.bogus) private var api: API
        }
    "#};
    let decls = json!([class_decl(
        source,
        "MovieManager",
        json!([var_decl(source, "api", "API")]),
    )]);

    let error = lex(source, decls).unwrap_err();
    assert!(matches!(
        error.kind,
        LexerErrorKind::InvalidAnnotation(TokenErrorKind::InvalidAnnotation(_))
    ));
    // The annotation sits on the second line (0-based line 1).
    assert_eq!(error.span.start.line, 1);
}

#[test]
fn test_lex_objc_attribute_becomes_configuration() {
    let source = indoc! {r#"
        final class MovieManager {
            @objc @Weaver(.reference) private var logger: Logger
        }
    "#};
    let objc_offset = source.find("@objc").unwrap();
    let attr_offset = source.find("@Weaver").unwrap();
    let attr_len = source[attr_offset..].find(')').unwrap() + 1;
    let decls = json!([class_decl(
        source,
        "MovieManager",
        json!([{
            "kind": "var.instance",
            "name": "logger",
            "typename": "Logger",
            "offset": objc_offset,
            "length": source.len() - objc_offset,
            "attributes": [
                {"kind": "objc", "offset": objc_offset, "length": 5},
                {"kind": "custom", "offset": attr_offset, "length": attr_len},
            ],
        }]),
    )]);

    let tokens = lex(source, decls).unwrap();
    let configs: Vec<_> = tokens
        .iter()
        .filter_map(|t| match &t.kind {
            TokenKind::Configuration(c) => Some(c),
            _ => None,
        })
        .collect();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].attribute, Attr::Objc(true));
    assert_eq!(
        configs[0].target,
        ConfigurationTarget::Dependency("logger".to_string())
    );
}

#[test]
fn test_lex_comment_configuration() {
    let source = indoc! {r#"
        final class MovieManager {
            // weaver: self.isIsolated = true
            @Weaver(.reference) private var logger: Logger
        }
    "#};
    let decls = json!([class_decl(
        source,
        "MovieManager",
        json!([var_decl(source, "logger", "Logger")]),
    )]);

    let tokens = lex(source, decls).unwrap();
    let config = tokens
        .iter()
        .find_map(|t| match &t.kind {
            TokenKind::Configuration(c) => Some(c),
            _ => None,
        })
        .expect("configuration token");
    assert_eq!(config.target, ConfigurationTarget::Type);
    assert_eq!(config.attribute, Attr::IsIsolated(true));

    // Document order: the comment sits before the annotation.
    let config_at = tokens
        .iter()
        .position(|t| matches!(t.kind, TokenKind::Configuration(_)))
        .unwrap();
    let reference_at = tokens
        .iter()
        .position(|t| matches!(t.kind, TokenKind::Reference(_)))
        .unwrap();
    assert!(config_at < reference_at);
}

#[test]
fn test_lex_is_deterministic() {
    let source = indoc! {r#"
        import API

        final class MovieManager {
            @Weaver(.registration, type: MovieAPI.self) private var movieAPI: APIProtocol
        }
    "#};
    let decls = json!([class_decl(
        source,
        "MovieManager",
        json!([var_decl(source, "movieAPI", "APIProtocol")]),
    )]);

    let first = lex(source, decls.clone()).unwrap();
    let second = lex(source, decls).unwrap();
    assert_eq!(first, second);
}
