use super::*;

fn parse(input: &str) -> CompositeType {
    CompositeType::parse(input).unwrap()
}

#[test]
fn test_parse_named() {
    assert_eq!(parse("MovieAPI"), CompositeType::named("MovieAPI"));
}

#[test]
fn test_parse_named_with_generics() {
    assert_eq!(
        parse("Dictionary<String, Int>"),
        CompositeType::Named {
            name: "Dictionary".to_string(),
            generics: vec![
                CompositeType::named("String"),
                CompositeType::named("Int"),
            ],
        }
    );
}

#[test]
fn test_parse_is_whitespace_insensitive() {
    assert_eq!(
        parse("  Dictionary < String ,  Int >  ").render(),
        "Dictionary<String, Int>"
    );
}

#[test]
fn test_parse_tuple() {
    assert_eq!(
        parse("(Int, String)"),
        CompositeType::Tuple(vec![
            CompositeType::named("Int"),
            CompositeType::named("String"),
        ])
    );
}

#[test]
fn test_single_parenthesized_type_unwraps() {
    assert_eq!(parse("(Int)"), CompositeType::named("Int"));
}

#[test]
fn test_parse_closure() {
    assert_eq!(
        parse("(Int, String) -> Bool"),
        CompositeType::Closure {
            params: vec![
                CompositeType::named("Int"),
                CompositeType::named("String"),
            ],
            ret: Box::new(CompositeType::named("Bool")),
        }
    );
}

#[test]
fn test_optional_forms_are_equal() {
    assert_eq!(parse("Int?"), parse("Optional<Int>"));
    assert_eq!(
        parse("Int?"),
        CompositeType::Optional(Box::new(CompositeType::named("Int")))
    );
}

#[test]
fn test_double_optional() {
    assert_eq!(
        parse("Int??").render(),
        "Optional<Optional<Int>>"
    );
}

#[test]
fn test_round_trip_is_canonical() {
    let input = "(Int, String) -> Optional<Result<A, B>>";
    let parsed = parse(input);
    assert_eq!(parsed.render(), input);
    assert_eq!(parse(&parsed.render()), parsed);
}

#[test]
fn test_parse_after_render_is_identity() {
    let ty = CompositeType::Optional(Box::new(CompositeType::Closure {
        params: vec![CompositeType::named("Request")],
        ret: Box::new(CompositeType::Named {
            name: "Response".to_string(),
            generics: vec![CompositeType::named("Movie")],
        }),
    }));
    assert_eq!(parse(&ty.render()), ty);
}

#[test]
fn test_parse_rejects_empty() {
    assert_eq!(CompositeType::parse(""), Err(TypeParseError::Empty));
    assert_eq!(CompositeType::parse("   "), Err(TypeParseError::Empty));
}

#[test]
fn test_parse_rejects_unbalanced_generics() {
    assert!(matches!(
        CompositeType::parse("Array<Int"),
        Err(TypeParseError::Unbalanced(_))
    ));
}

#[test]
fn test_parse_rejects_trailing_input() {
    assert!(matches!(
        CompositeType::parse("Foo Bar"),
        Err(TypeParseError::TrailingInput(_))
    ));
}

#[test]
fn test_access_level_scans_first_keyword() {
    assert_eq!(
        AccessLevel::parse("source.lang.swift.accessibility.public"),
        AccessLevel::Public
    );
    assert_eq!(AccessLevel::parse("open class Movie"), AccessLevel::Public);
    assert_eq!(AccessLevel::parse("fileprivate"), AccessLevel::Internal);
    assert_eq!(AccessLevel::parse("private var x"), AccessLevel::Internal);
    assert_eq!(AccessLevel::parse("var x"), AccessLevel::Default);
}

#[test]
fn test_access_level_resolution_and_ordering() {
    assert_eq!(
        AccessLevel::Default.resolved(AccessLevel::Public),
        AccessLevel::Public
    );
    assert_eq!(
        AccessLevel::Default.resolved(AccessLevel::Default),
        AccessLevel::Internal
    );
    assert!(AccessLevel::Public.exceeds(AccessLevel::Internal));
    assert!(!AccessLevel::Internal.exceeds(AccessLevel::Public));
    assert!(!AccessLevel::Public.exceeds(AccessLevel::Public));
}

#[test]
fn test_scope_parses_enum_case_form() {
    assert_eq!(Scope::parse(".container"), Some(Scope::Container));
    assert_eq!(Scope::parse("graph"), Some(Scope::Graph));
    assert_eq!(Scope::parse(".weak"), Some(Scope::Weak));
    assert_eq!(Scope::parse("singleton"), None);
}

#[test]
fn test_scope_default_and_width() {
    assert_eq!(Scope::default(), Scope::Graph);
    assert!(Scope::Container.is_container_lived());
    assert!(Scope::Lazy.is_container_lived());
    assert!(Scope::Weak.is_container_lived());
    assert!(!Scope::Transient.is_container_lived());
    assert!(!Scope::Graph.is_container_lived());
}
