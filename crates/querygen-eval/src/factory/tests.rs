use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::backend::{InterpretingBackend, TieredBackend};
use crate::error::CompileError;
use querygen_config::BackendKind;
use querygen_core::Types;

/// Interpreting backend recording every compile request.
#[derive(Debug, Default)]
struct CountingBackend {
    compiles: AtomicUsize,
    ids: parking_lot::Mutex<Vec<String>>,
}

impl CountingBackend {
    fn count(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }
}

impl CompileBackend for CountingBackend {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn compile(&self, request: &CompileRequest<'_>, store: &UnitStore) -> Result<()> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        self.ids.lock().push(request.id.to_string());
        InterpretingBackend.compile(request, store)
    }
}

/// Backend reporting success without producing a unit.
#[derive(Debug)]
struct LosingBackend;

impl CompileBackend for LosingBackend {
    fn name(&self) -> &'static str {
        "losing"
    }

    fn compile(&self, _request: &CompileRequest<'_>, _store: &UnitStore) -> Result<()> {
        Ok(())
    }
}

fn factory_with(backend: Arc<dyn CompileBackend>, config: &EvaluatorConfig) -> EvaluatorFactory {
    EvaluatorFactory::new(backend, Arc::new(UnitStore::new()), config)
}

fn counting() -> (Arc<CountingBackend>, EvaluatorFactory) {
    let backend = Arc::new(CountingBackend::default());
    let factory = factory_with(backend.clone(), &EvaluatorConfig::default());
    (backend, factory)
}

fn constant(name: &str, value: Value) -> IndexMap<String, Value> {
    let mut constants = IndexMap::new();
    constants.insert(name.to_string(), value);
    constants
}

#[test]
fn test_same_shape_reuses_entry() {
    let (backend, factory) = counting();

    let first = factory
        .create_evaluator::<i64>(
            "a + c",
            &Types::long(),
            &["a"],
            &[Types::long()],
            constant("c", Value::Long(1)),
        )
        .unwrap();
    let second = factory
        .create_evaluator::<i64>(
            "a + c",
            &Types::long(),
            &["a"],
            &[Types::long()],
            constant("c", Value::Long(100)),
        )
        .unwrap();

    assert_eq!(backend.count(), 1);
    assert!(Arc::ptr_eq(first.entry_point(), second.entry_point()));
    // Same compiled unit, each evaluator passes its own constant value.
    assert_eq!(first.evaluate(&[Value::Long(5)]).unwrap(), 6);
    assert_eq!(second.evaluate(&[Value::Long(5)]).unwrap(), 105);
}

#[test]
fn test_changed_shape_recompiles() {
    let (backend, factory) = counting();
    let base = || constant("c", Value::Long(1));

    factory
        .create_evaluator::<Value>("a + c", &Types::long(), &["a"], &[Types::long()], base())
        .unwrap();
    // Source.
    factory
        .create_evaluator::<Value>("a - c", &Types::long(), &["a"], &[Types::long()], base())
        .unwrap();
    // Projection.
    factory
        .create_evaluator::<Value>("a + c", &Types::double(), &["a"], &[Types::long()], base())
        .unwrap();
    // Argument type.
    factory
        .create_evaluator::<Value>("a + c", &Types::long(), &["a"], &[Types::long_p()], base())
        .unwrap();
    // Runtime type of a constant.
    factory
        .create_evaluator::<Value>(
            "a + c",
            &Types::long(),
            &["a"],
            &[Types::long()],
            constant("c", Value::Double(1.0)),
        )
        .unwrap();

    assert_eq!(backend.count(), 5);
    let ids = backend.ids.lock();
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 5);
}

#[test]
fn test_wrapper_layout() {
    let unit = synthesize(
        "Q_1",
        "return a + offset;",
        &Types::long(),
        &[
            Parameter::new("a", Types::long_p()),
            Parameter::new("offset", Types::long()),
        ],
    )
    .unwrap();
    assert_eq!(
        unit,
        "public class Q_1 {\n\n    public static Long eval(long a, Long offset) {\nreturn a + offset;\n    }\n\n}\n\n"
    );
}

#[test]
fn test_wrapper_embeds_source_unchanged() {
    let source = "  a\t+ 1   \n\n   ;  ";
    let unit = synthesize("Q_2", source, &Types::long(), &[Parameter::new("a", Types::long())]).unwrap();
    assert!(unit.contains(&format!("eval(Long a) {{\n{source}\n    }}")));

    // The unchanged body still parses and evaluates.
    let factory = EvaluatorFactory::from_config(&EvaluatorConfig::default());
    let evaluator = factory
        .create_evaluator::<i64>(source, &Types::long(), &["a"], &[Types::long()], IndexMap::new())
        .unwrap();
    assert_eq!(evaluator.evaluate(&[Value::Long(2)]).unwrap(), 3);
}

#[test]
fn test_evaluate_converts_projection() {
    let factory = EvaluatorFactory::from_config(&EvaluatorConfig::default());
    let evaluator = factory
        .create_evaluator::<f64>("a / 2", &Types::double(), &["a"], &[Types::long()], IndexMap::new())
        .unwrap();
    assert_eq!(evaluator.evaluate(&[Value::Long(5)]).unwrap(), 2.0);

    let evaluator = factory
        .create_evaluator::<String>(
            "upper(name) + \"!\"",
            &Types::string(),
            &["name"],
            &[Types::string()],
            IndexMap::new(),
        )
        .unwrap();
    assert_eq!(evaluator.evaluate(&[Value::str("hi")]).unwrap(), "HI!");
    assert!(matches!(
        evaluator.evaluate(&[]),
        Err(EvalError::Runtime(_))
    ));
}

#[test]
fn test_jit_factory() {
    let config = EvaluatorConfig::default().with_backend(BackendKind::Jit);
    let factory = EvaluatorFactory::from_config(&config);
    let evaluator = factory
        .create_evaluator::<bool>(
            "return x >= lo && x <= hi;",
            &Types::boolean(),
            &["x"],
            &[Types::int_p()],
            [("lo".to_string(), Value::Long(1)), ("hi".to_string(), Value::Long(9))]
                .into_iter()
                .collect(),
        )
        .unwrap();
    assert!(evaluator.evaluate(&[Value::Long(5)]).unwrap());
    assert!(!evaluator.evaluate(&[Value::Long(10)]).unwrap());
    assert!(format!("{:?}", evaluator.entry_point()).starts_with("NativeOperation"));

    let err = factory
        .create_evaluator::<String>("s", &Types::string(), &["s"], &[Types::string()], IndexMap::new())
        .unwrap_err();
    assert!(matches!(err, EvalError::Compile(CompileError::Unsupported(_))));
}

#[test]
fn test_store_shared_between_factories() {
    let store = Arc::new(UnitStore::new());
    let backend = Arc::new(CountingBackend::default());
    let config = EvaluatorConfig::default();
    let one = EvaluatorFactory::new(backend.clone(), store.clone(), &config);
    let two = EvaluatorFactory::new(backend.clone(), store.clone(), &config);

    for factory in [&one, &two] {
        let evaluator = factory
            .create_evaluator::<i64>("a * a", &Types::long(), &["a"], &[Types::long()], IndexMap::new())
            .unwrap();
        assert_eq!(evaluator.evaluate(&[Value::Long(4)]).unwrap(), 16);
    }

    assert_eq!(backend.count(), 1);
    assert_eq!(store.len(), 1);
    assert!(two.cache().contains(&backend.ids.lock()[0]));
}

#[test]
fn test_eviction_reloads_from_store() {
    let backend = Arc::new(CountingBackend::default());
    let config = EvaluatorConfig::default().with_cache_capacity(1);
    let factory = factory_with(backend.clone(), &config);
    let create = |source: &str| {
        factory
            .create_evaluator::<i64>(source, &Types::long(), &[], &[], IndexMap::new())
            .unwrap()
    };

    create("1");
    create("2");
    assert_eq!(factory.cache().len(), 1);
    create("1");

    // Evicted entries come back from the store without another compile.
    assert_eq!(backend.count(), 2);
    assert_eq!(create("1").evaluate(&[]).unwrap(), 1);
}

#[test]
fn test_staging_writes_wrapper() {
    let dir = std::env::temp_dir().join(format!("querygen-staging-{}", std::process::id()));
    let config = EvaluatorConfig::default().with_staging_dir(&dir);
    let factory = factory_with(Arc::new(TieredBackend), &config);

    factory
        .create_evaluator::<i64>("a + 1", &Types::long(), &["a"], &[Types::long()], IndexMap::new())
        .unwrap();

    let id = fingerprint("a + 1", &Types::long(), &[Types::long()], &IndexMap::new()).unwrap();
    let staged = fs::read_to_string(dir.join(format!("{id}.java"))).unwrap();
    assert!(staged.starts_with(&format!("public class {id} {{")));
    assert!(staged.contains("eval(Long a) {\na + 1\n    }"));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_staging_failure_is_io_error() {
    let file = std::env::temp_dir().join(format!("querygen-staging-file-{}", std::process::id()));
    fs::write(&file, "").unwrap();
    let config = EvaluatorConfig::default().with_staging_dir(file.join("nested"));
    let (backend, _) = counting();
    let factory = factory_with(backend.clone(), &config);

    let err = factory
        .create_evaluator::<i64>("1", &Types::long(), &[], &[], IndexMap::new())
        .unwrap_err();

    assert!(matches!(err, EvalError::Io(_)));
    assert_eq!(backend.count(), 0);
    fs::remove_file(&file).unwrap();
}

#[test]
fn test_unresolvable_unit() {
    let factory = factory_with(Arc::new(LosingBackend), &EvaluatorConfig::default());
    let err = factory
        .create_evaluator::<i64>("1", &Types::long(), &[], &[], IndexMap::new())
        .unwrap_err();
    match err {
        EvalError::Resolve { id } => assert!(id.starts_with("Q_")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_request_errors() {
    let (backend, factory) = counting();

    let err = factory
        .create_evaluator::<i64>("a", &Types::long(), &["a", "b"], &[Types::long()], IndexMap::new())
        .unwrap_err();
    assert!(matches!(err, EvalError::Signature { names: 2, types: 1 }));

    let err = factory
        .create_evaluator::<i64>(
            "a",
            &Types::long(),
            &["a"],
            &[Types::long()],
            constant("c", Value::Null),
        )
        .unwrap_err();
    assert!(matches!(err, EvalError::NullConstant { .. }));

    let err = factory
        .create_evaluator::<i64>("a +", &Types::long(), &["a"], &[Types::long()], IndexMap::new())
        .unwrap_err();
    assert!(matches!(err, EvalError::Syntax(_)));

    // One compile attempt for the syntax error, none for the others.
    assert_eq!(backend.count(), 1);
}

#[test]
fn test_concurrent_requests_share_one_entry() {
    let (_, factory) = counting();
    std::thread::scope(|scope| {
        for i in 0..8 {
            let factory = &factory;
            scope.spawn(move || {
                let evaluator = factory
                    .create_evaluator::<i64>(
                        "a + c",
                        &Types::long(),
                        &["a"],
                        &[Types::long()],
                        constant("c", Value::Long(i)),
                    )
                    .unwrap();
                assert_eq!(evaluator.evaluate(&[Value::Long(1)]).unwrap(), 1 + i);
            });
        }
    });
    assert_eq!(factory.cache().len(), 1);
}
