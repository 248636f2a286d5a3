use super::*;

use std::cell::Cell;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::core::types::{AbstractType, CompositeType, Scope};

fn abstract_ty(name: &str) -> AbstractType {
    AbstractType(CompositeType::named(name))
}

fn int_ty() -> CompositeType {
    CompositeType::named("Int")
}

/// Registers a builder that counts its invocations and returns a fresh `u32`
/// marker instance.
fn register_counted(container: &Container, name: &str, scope: Scope, calls: Rc<Cell<usize>>) {
    container.register(
        InstanceKey::of(CompositeType::named(name)),
        scope,
        move |_, _| {
            calls.set(calls.get() + 1);
            Rc::new(0u32)
        },
    );
}

fn hash_of(key: &InstanceKey) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn test_instance_key_identity() {
    let plain = InstanceKey::of(CompositeType::named("Dep"));
    let same = InstanceKey::of(CompositeType::named("Dep"));
    let parameterized = InstanceKey::new(
        abstract_ty("Dep"),
        vec![ParameterKey {
            ty: int_ty(),
            description: "42".to_string(),
        }],
    );

    assert_eq!(plain, same);
    assert_eq!(hash_of(&plain), hash_of(&same));
    // A parameterized resolve caches independently of the plain one.
    assert_ne!(plain, parameterized);
}

#[test]
fn test_instance_keys_differ_by_parameter_value() {
    let with_42 = InstanceKey::new(
        abstract_ty("Dep"),
        vec![ParameterKey {
            ty: int_ty(),
            description: "42".to_string(),
        }],
    );
    let with_43 = InstanceKey::new(
        abstract_ty("Dep"),
        vec![ParameterKey {
            ty: int_ty(),
            description: "43".to_string(),
        }],
    );
    assert_ne!(with_42, with_43);
}

#[test]
fn test_container_scope_builds_once() {
    let container = Container::new();
    let calls = Rc::new(Cell::new(0));
    register_counted(&container, "Session", Scope::Container, calls.clone());

    let first = container.resolve(&abstract_ty("Session"), &[]).unwrap();
    let second = container.resolve(&abstract_ty("Session"), &[]).unwrap();

    assert_eq!(calls.get(), 1);
    assert!(Rc::ptr_eq(&first, &second));
}

#[test]
fn test_transient_scope_builds_every_time() {
    let container = Container::new();
    let calls = Rc::new(Cell::new(0));
    register_counted(&container, "Job", Scope::Transient, calls.clone());

    let first = container.resolve(&abstract_ty("Job"), &[]).unwrap();
    let second = container.resolve(&abstract_ty("Job"), &[]).unwrap();

    assert_eq!(calls.get(), 2);
    assert!(!Rc::ptr_eq(&first, &second));
}

#[test]
fn test_lazy_scope_builds_on_first_resolve_only() {
    let container = Container::new();
    let calls = Rc::new(Cell::new(0));
    register_counted(&container, "Cache", Scope::Lazy, calls.clone());

    assert_eq!(calls.get(), 0);
    container.resolve(&abstract_ty("Cache"), &[]).unwrap();
    container.resolve(&abstract_ty("Cache"), &[]).unwrap();
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_graph_scope_shares_within_one_resolve_chain() {
    struct Pair {
        left: Instance,
        right: Instance,
    }

    let container = Container::new();
    let calls = Rc::new(Cell::new(0));
    register_counted(&container, "Dep", Scope::Graph, calls.clone());
    container.register(
        InstanceKey::of(CompositeType::named("Pair")),
        Scope::Transient,
        |resolver, _| {
            let left = resolver.resolve(&abstract_ty("Dep"), &[]).unwrap();
            let right = resolver.resolve(&abstract_ty("Dep"), &[]).unwrap();
            Rc::new(Pair { left, right })
        },
    );

    let pair = container
        .resolve(&abstract_ty("Pair"), &[])
        .unwrap()
        .downcast::<Pair>()
        .unwrap();
    assert_eq!(calls.get(), 1);
    assert!(Rc::ptr_eq(&pair.left, &pair.right));

    // The graph cache is released when the outermost resolve returns.
    let second = container
        .resolve(&abstract_ty("Pair"), &[])
        .unwrap()
        .downcast::<Pair>()
        .unwrap();
    assert_eq!(calls.get(), 2);
    assert!(!Rc::ptr_eq(&pair.left, &second.left));
}

#[test]
fn test_parameterized_resolves_cache_by_value() {
    struct Movie {
        movie_id: i32,
    }

    struct Triple {
        a: Rc<Movie>,
        b: Rc<Movie>,
        c: Rc<Movie>,
    }

    let container = Container::new();
    container.register(
        InstanceKey::new(
            abstract_ty("Movie"),
            vec![ParameterKey {
                ty: int_ty(),
                description: String::new(),
            }],
        ),
        Scope::Graph,
        |_, parameters| {
            let movie_id = *parameters[0].value.clone().downcast::<i32>().unwrap();
            Rc::new(Movie { movie_id })
        },
    );
    container.register(
        InstanceKey::of(CompositeType::named("Triple")),
        Scope::Transient,
        |resolver, _| {
            let a = resolver
                .resolve(&abstract_ty("Movie"), &[Parameter::new(int_ty(), 42i32)])
                .unwrap()
                .downcast::<Movie>()
                .unwrap();
            let b = resolver
                .resolve(&abstract_ty("Movie"), &[Parameter::new(int_ty(), 42i32)])
                .unwrap()
                .downcast::<Movie>()
                .unwrap();
            let c = resolver
                .resolve(&abstract_ty("Movie"), &[Parameter::new(int_ty(), 43i32)])
                .unwrap()
                .downcast::<Movie>()
                .unwrap();
            Rc::new(Triple { a, b, c })
        },
    );

    let triple = container
        .resolve(&abstract_ty("Triple"), &[])
        .unwrap()
        .downcast::<Triple>()
        .unwrap();

    assert_eq!(triple.a.movie_id, 42);
    assert!(Rc::ptr_eq(&triple.a, &triple.b));
    assert_eq!(triple.c.movie_id, 43);
    assert!(!Rc::ptr_eq(&triple.a, &triple.c));
}

#[test]
fn test_weak_scope_rebuilds_after_holders_release() {
    let container = Container::new();
    let calls = Rc::new(Cell::new(0));
    register_counted(&container, "Screen", Scope::Weak, calls.clone());

    let first = container.resolve(&abstract_ty("Screen"), &[]).unwrap();
    let second = container.resolve(&abstract_ty("Screen"), &[]).unwrap();
    assert_eq!(calls.get(), 1);
    assert!(Rc::ptr_eq(&first, &second));

    drop(first);
    drop(second);

    // No strong holder remains, so the container must rebuild.
    let third = container.resolve(&abstract_ty("Screen"), &[]).unwrap();
    assert_eq!(calls.get(), 2);
    drop(third);
}

#[test]
fn test_store_lookup_falls_back_to_parent() {
    let parent = Container::new();
    let calls = Rc::new(Cell::new(0));
    register_counted(&parent, "Logger", Scope::Container, calls.clone());

    let child = Container::with_parent(&parent);
    assert!(child.resolve(&abstract_ty("Logger"), &[]).is_some());
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_resolve_unknown_key_returns_none() {
    let container = Container::new();
    assert!(container.resolve(&abstract_ty("Ghost"), &[]).is_none());
}

#[test]
fn test_registration_after_parameterless_resolve_uses_distinct_key() {
    let container = Container::new();
    let calls = Rc::new(Cell::new(0));
    register_counted(&container, "Dep", Scope::Container, calls.clone());

    assert!(container.resolve(&abstract_ty("Dep"), &[]).is_some());
    // Same type with a parameter is a different key, and nothing registered it.
    assert!(
        container
            .resolve(&abstract_ty("Dep"), &[Parameter::new(int_ty(), 1i32)])
            .is_none()
    );
}

#[test]
fn test_container_is_reclaimable_after_register_and_resolve() {
    let container = Rc::new(Container::new());
    let calls = Rc::new(Cell::new(0));
    register_counted(&container, "Session", Scope::Container, calls.clone());

    let session = container.resolve(&abstract_ty("Session"), &[]).unwrap();

    let probe = Rc::downgrade(&container);
    drop(container);

    // Builders hold no strong reference back to the container; resolved
    // values keep living on their own.
    assert!(probe.upgrade().is_none());
    drop(session);
}
