use super::*;

use crate::core::types::{CompositeType, Scope};

#[test]
fn test_parse_registration_annotation() {
    let parsed =
        parse_annotation("@Weaver(.registration, type: MovieAPI.self, scope: .container)")
            .unwrap()
            .unwrap();

    assert_eq!(parsed.kind, DependencyKind::Registration);
    assert_eq!(parsed.arity, 0);
    assert_eq!(
        parsed.concrete_type.map(|c| c.0),
        Some(CompositeType::named("MovieAPI"))
    );
    assert_eq!(
        parsed.attributes,
        vec![ConfigurationAttribute::Scope(Scope::Container)]
    );
}

#[test]
fn test_parse_bare_reference() {
    let parsed = parse_annotation("@Weaver(.reference)").unwrap().unwrap();

    assert_eq!(parsed.kind, DependencyKind::Reference);
    assert_eq!(parsed.concrete_type, None);
    assert!(parsed.attributes.is_empty());
}

#[test]
fn test_parse_keyword_kind_argument() {
    let parsed = parse_annotation("@Weaver(kind: .parameter)").unwrap().unwrap();
    assert_eq!(parsed.kind, DependencyKind::Parameter);
}

#[test]
fn test_arity_suffix() {
    let parsed = parse_annotation("@WeaverP2(.parameter, type: Int.self)")
        .unwrap()
        .unwrap();
    assert_eq!(parsed.arity, 2);
}

#[test]
fn test_p0_suffix_equals_bare_prefix() {
    let bare = parse_annotation("@Weaver(.reference)").unwrap().unwrap();
    let p0 = parse_annotation("@WeaverP0(.reference)").unwrap().unwrap();
    assert_eq!(bare, p0);
}

#[test]
fn test_prefix_is_case_insensitive() {
    assert!(parse_annotation("@weaver(.reference)").unwrap().is_some());
    assert!(parse_annotation("@WEAVERP1(.parameter)").unwrap().is_some());
}

#[test]
fn test_foreign_attributes_are_skipped_silently() {
    assert_eq!(parse_annotation("@Published"), Ok(None));
    assert_eq!(parse_annotation("@IBOutlet weak"), Ok(None));
    // Invalid suffix means the attribute is not part of the family at all.
    assert_eq!(parse_annotation("@WeaverX(.reference)"), Ok(None));
}

#[test]
fn test_missing_kind_is_invalid() {
    assert!(matches!(
        parse_annotation("@Weaver(type: MovieAPI.self)"),
        Err(TokenErrorKind::InvalidAnnotation(_))
    ));
}

#[test]
fn test_unknown_kind_case_is_invalid() {
    assert!(matches!(
        parse_annotation("@Weaver(.bogus)"),
        Err(TokenErrorKind::InvalidAnnotation(_))
    ));
}

#[test]
fn test_unknown_attribute_name_is_invalid() {
    assert!(matches!(
        parse_annotation("@Weaver(.registration, frobnicate: true)"),
        Err(TokenErrorKind::InvalidAnnotation(_))
    ));
}

#[test]
fn test_invalid_scope_value() {
    assert_eq!(
        parse_annotation("@Weaver(.registration, scope: .singleton)"),
        Err(TokenErrorKind::InvalidScope(".singleton".to_string()))
    );
}

#[test]
fn test_custom_builder_argument() {
    let parsed = parse_annotation(
        "@Weaver(.registration, type: Logger.self, customBuilder: Logger.make)",
    )
    .unwrap()
    .unwrap();

    assert!(
        parsed
            .attributes
            .contains(&ConfigurationAttribute::CustomBuilder("Logger.make".to_string()))
    );
}

#[test]
fn test_closure_type_argument_keeps_commas_together() {
    let parsed = parse_annotation(
        "@Weaver(.registration, type: ((Int, String) -> Bool).self, escaping: true)",
    )
    .unwrap()
    .unwrap();

    assert_eq!(
        parsed.concrete_type.map(|c| c.0.render()),
        Some("(Int, String) -> Bool".to_string())
    );
    assert_eq!(
        parsed.attributes,
        vec![ConfigurationAttribute::Escaping(true)]
    );
}

#[test]
fn test_comment_configuration_self_target() {
    let (target, attribute) =
        parse_comment_configuration("// weaver: self.isIsolated = true")
            .unwrap()
            .unwrap();
    assert_eq!(target, "self");
    assert_eq!(attribute, ConfigurationAttribute::IsIsolated(true));
}

#[test]
fn test_comment_configuration_dependency_target() {
    let (target, attribute) =
        parse_comment_configuration("// weaver: movieAPI.scope = .weak")
            .unwrap()
            .unwrap();
    assert_eq!(target, "movieAPI");
    assert_eq!(attribute, ConfigurationAttribute::Scope(Scope::Weak));
}

#[test]
fn test_ordinary_comments_are_not_configuration() {
    assert_eq!(parse_comment_configuration("// a note"), Ok(None));
    assert_eq!(parse_comment_configuration("let x = 1"), Ok(None));
}

#[test]
fn test_comment_configuration_unknown_name_is_invalid() {
    assert!(matches!(
        parse_comment_configuration("// weaver: api.frobnicate = true"),
        Err(TokenErrorKind::InvalidAnnotation(_))
    ));
}
