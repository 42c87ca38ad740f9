//! Integration tests for typed-settings crate.

use mockall::mock;
use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::thread;
use typed_settings::{
    global_namespace, undefined, with_namespace_key, with_namespace_key_in, with_prefix,
    with_prefix_in, ClassRef, Decorator, ImportError, ImportRegistry, Importer, Module,
    NamespaceHandle, OverrideProvider, SchemaBuilder, SettingNotFound, Settings,
    SettingsError, SettingsNamespace, TypeHint, TypedSettings, Value,
};
use typed_settings_common::test_utils::{
    assert_not_configured, assert_write_rejected, init_test_logging,
};

mock! {
    pub Provider {}

    impl OverrideProvider for Provider {
        fn try_get_override(&self, key: &str) -> Result<Value, SettingNotFound>;
    }
}

struct SomeBaseClass;
struct SomeClass;

struct Fixture {
    registry: ImportRegistry,
    namespace: NamespaceHandle,
}

impl Fixture {
    fn new() -> Self {
        init_test_logging();

        let registry = ImportRegistry::with_builtins().with_module(
            Module::new("app.classes")
                .with_class::<SomeBaseClass>("SomeBaseClass")
                .with_class::<SomeClass>("SomeClass"),
        );

        let int = Value::Class(registry.import_class("builtins.int").unwrap());
        let overrides = [
            ("STR_SETTING_1", Value::from("Setting 1 override")),
            ("CLASS_SETTING_2", Value::from("collections.deque")),
            ("CLASS_SETTING_3", int),
            ("CLASS_SETTING_4", Value::from("collections.deque")),
            ("MODULE_SETTING_2", Value::from("pathlib")),
            ("UNCONFIGURED_OVERRIDE", Value::from("Unconfigured override")),
        ];

        let mut namespace = SettingsNamespace::new().with("DEBUG", true);
        let mut nested = BTreeMap::new();
        for (key, value) in overrides {
            namespace = namespace.with(format!("MY_APP_{key}"), value.clone());
            nested.insert(key.to_string(), value);
        }
        namespace = namespace.with("MY_SECOND_APP", nested);

        Self {
            registry,
            namespace: NamespaceHandle::new(namespace),
        }
    }

    fn class(&self, path: &str) -> ClassRef {
        self.registry.import_class(path).unwrap()
    }

    fn schema(&self, name: &str) -> SchemaBuilder {
        SchemaBuilder::new(name)
            .typed("STR_SETTING_1", TypeHint::named("str"), "Setting 1")
            .typed("STR_SETTING_2", TypeHint::named("str"), "Setting 2")
            .typed(
                "CLASS_SETTING_1",
                "Type[SomeBaseClass]".parse().unwrap(),
                self.class("app.classes.SomeClass"),
            )
            .typed(
                "CLASS_SETTING_2",
                "Type[Sequence[Any]]".parse().unwrap(),
                self.class("builtins.list"),
            )
            .typed(
                "CLASS_SETTING_3",
                "Type[object]".parse().unwrap(),
                self.class("builtins.str"),
            )
            .typed("CLASS_SETTING_4", "type".parse().unwrap(), self.class("builtins.list"))
            .typed(
                "MODULE_SETTING_1",
                TypeHint::Module,
                self.registry.import_module("os.path").unwrap(),
            )
            .typed(
                "MODULE_SETTING_2",
                TypeHint::Module,
                self.registry.import_module("os.path").unwrap(),
            )
            .typed("UNCONFIGURED_OVERRIDE", TypeHint::named("str"), undefined())
            .typed("UNCONFIGURED_SETTING", TypeHint::named("int"), undefined())
    }

    fn prefix_settings(&self) -> TypedSettings {
        with_prefix_in(&self.namespace, "MY_APP")
            .unwrap()
            .with_importer(self.registry.clone())
            .decorate(self.schema("PrefixSettings"))
    }

    fn dict_settings(&self) -> TypedSettings {
        with_namespace_key_in(&self.namespace, "MY_SECOND_APP")
            .with_importer(self.registry.clone())
            .decorate(self.schema("DictSettings"))
    }

    fn both(&self) -> [Settings; 2] {
        [self.prefix_settings().instance(), self.dict_settings().instance()]
    }
}

#[test]
fn test_str_setting() {
    let fixture = Fixture::new();
    for settings in fixture.both() {
        assert_eq!(settings.get_str("STR_SETTING_1").unwrap(), "Setting 1 override");
        assert_eq!(settings.get_str("STR_SETTING_2").unwrap(), "Setting 2");
    }
}

#[test]
fn test_class_setting_default_passes_through() {
    let fixture = Fixture::new();
    for settings in fixture.both() {
        let class = settings.get_class("CLASS_SETTING_1").unwrap();
        assert_eq!(class, fixture.class("app.classes.SomeClass"));
        assert!(class.is::<SomeClass>());
    }
}

#[test]
fn test_class_setting_both_spellings_import_deque() {
    let fixture = Fixture::new();
    let deque = fixture.class("collections.deque");
    for settings in fixture.both() {
        assert_eq!(settings.get_class("CLASS_SETTING_2").unwrap(), deque);
        assert_eq!(settings.get_class("CLASS_SETTING_4").unwrap(), deque);
        assert!(deque.is::<VecDeque<Value>>());
    }
}

#[test]
fn test_class_override_object_passes_through() {
    let fixture = Fixture::new();
    for settings in fixture.both() {
        let class = settings.get_class("CLASS_SETTING_3").unwrap();
        assert_eq!(class, fixture.class("builtins.int"));
        assert!(class.is::<i64>());
    }
}

#[test]
fn test_module_settings() {
    let fixture = Fixture::new();
    let os_path = fixture.registry.import_module("os.path").unwrap();
    let pathlib = fixture.registry.import_module("pathlib").unwrap();
    for settings in fixture.both() {
        assert_eq!(settings.get_module("MODULE_SETTING_1").unwrap(), os_path);
        let module = settings.get_module("MODULE_SETTING_2").unwrap();
        assert_eq!(module, pathlib);
        assert!(module.class("Path").unwrap().is::<PathBuf>());
    }
}

#[test]
fn test_unconfigured_setting_raising() {
    let fixture = Fixture::new();
    for settings in fixture.both() {
        assert_not_configured(settings.get("UNCONFIGURED_SETTING"), "UNCONFIGURED_SETTING");
    }
}

#[test]
fn test_unconfigured_setting_override() {
    let fixture = Fixture::new();
    for settings in fixture.both() {
        assert_eq!(
            settings.get_str("UNCONFIGURED_OVERRIDE").unwrap(),
            "Unconfigured override"
        );
    }
}

#[test]
fn test_prefix_and_dict_schemas_agree() {
    let fixture = Fixture::new();
    let [prefix, dict] = fixture.both();
    let keys: Vec<String> = fixture.prefix_settings().keys().map(String::from).collect();

    for key in &keys {
        match (prefix.get(key), dict.get(key)) {
            (Ok(a), Ok(b)) => assert!(a.try_eq(&b).unwrap(), "{key} differs"),
            (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
            (a, b) => panic!("{key}: {a:?} vs {b:?}"),
        }
    }
}

#[test]
fn test_writes_are_rejected() {
    let fixture = Fixture::new();
    for settings in fixture.both() {
        let before = settings.get_str("STR_SETTING_1").unwrap();
        assert_write_rejected(settings.set("STR_SETTING_1", "changed"), "STR_SETTING_1");
        assert_write_rejected(settings.set("ANYTHING_ELSE", 1), "ANYTHING_ELSE");
        assert_eq!(settings.get_str("STR_SETTING_1").unwrap(), before);
    }
}

#[test]
fn test_prefix_validation_fails_before_instantiation() {
    let namespace = NamespaceHandle::default();
    let err = with_prefix_in(&namespace, "MY_APP_").unwrap_err();
    assert!(err.is_improperly_configured());
    assert!(err.to_string().contains("must not end with '_'"));
}

#[test]
fn test_import_failures_propagate_unwrapped() {
    let fixture = Fixture::new();
    let settings = with_prefix_in(&fixture.namespace, "MY_APP")
        .unwrap()
        .with_importer(fixture.registry.clone())
        .decorate(
            SchemaBuilder::new("Broken")
                .typed("MODULE", TypeHint::Module, "no.such.module")
                .typed("CLASS", TypeHint::Type(None), "collections.nope"),
        )
        .instance();

    assert!(matches!(
        settings.get("MODULE"),
        Err(SettingsError::Import(ImportError::ModuleNotFound(path))) if path == "no.such.module"
    ));
    assert!(matches!(
        settings.get("CLASS"),
        Err(SettingsError::Import(ImportError::MissingAttribute { .. }))
    ));
}

#[test]
fn test_string_with_plain_hint_is_not_coerced() {
    let fixture = Fixture::new();
    let settings = with_prefix_in(&fixture.namespace, "MY_APP")
        .unwrap()
        .with_importer(fixture.registry.clone())
        .decorate(
            SchemaBuilder::new("Plain")
                .typed("PATH", TypeHint::named("str"), "collections.deque")
                .member("UNHINTED", "pathlib"),
        )
        .instance();

    assert_eq!(settings.get_str("PATH").unwrap(), "collections.deque");
    assert_eq!(settings.get_str("UNHINTED").unwrap(), "pathlib");
}

#[test]
fn test_inherited_members_lose_hints() {
    let fixture = Fixture::new();
    let base = SchemaBuilder::new("Base").typed("MODULE", TypeHint::Module, "pathlib");
    let child = with_prefix_in(&fixture.namespace, "MY_APP")
        .unwrap()
        .with_importer(fixture.registry.clone())
        .decorate(SchemaBuilder::new("Child").extend(&base));

    assert!(child.type_hint("MODULE").is_none());
    assert_eq!(child.instance().get_str("MODULE").unwrap(), "pathlib");
}

#[test]
fn test_child_annotation_coerces_inherited_member() {
    let fixture = Fixture::new();
    let base = SchemaBuilder::new("Base").member("MODULE", "pathlib");
    let child = with_prefix_in(&fixture.namespace, "MY_APP")
        .unwrap()
        .with_importer(fixture.registry.clone())
        .decorate(
            SchemaBuilder::new("Child")
                .annotate("MODULE", TypeHint::Module)
                .extend(&base),
        );

    assert!(matches!(child.type_hint("MODULE"), Some(TypeHint::Module)));
    assert_eq!(
        child.instance().get_module("MODULE").unwrap(),
        fixture.registry.import_module("pathlib").unwrap()
    );
}

#[test]
fn test_override_consulted_once_and_value_cached() {
    let mut provider = MockProvider::new();
    provider
        .expect_try_get_override()
        .times(1)
        .returning(|_| Ok(Value::from("collections.deque")));

    let registry = ImportRegistry::with_builtins();
    let settings = Decorator::new(provider)
        .with_importer(registry.clone())
        .decorate(SchemaBuilder::new("Counted").typed("CLASS", TypeHint::Type(None), "builtins.list"))
        .instance();

    let first = settings.get_class("CLASS").unwrap();
    let second = settings.get_class("CLASS").unwrap();
    assert_eq!(first, second);
    assert_eq!(first, registry.import_class("collections.deque").unwrap());
}

#[test]
fn test_concurrent_first_reads_resolve_once() {
    let mut provider = MockProvider::new();
    provider
        .expect_try_get_override()
        .times(1)
        .returning(|_| Err(SettingNotFound));

    let registry = ImportRegistry::with_builtins();
    let settings = Decorator::new(provider)
        .with_importer(registry.clone())
        .decorate(SchemaBuilder::new("Shared").typed("MODULE", TypeHint::Module, "pathlib"))
        .instance();

    let pathlib = registry.import_module("pathlib").unwrap();
    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| assert_eq!(settings.get_module("MODULE").unwrap(), pathlib));
        }
    });
}

#[test]
fn test_global_namespace_entry_points() {
    init_test_logging();
    global_namespace().install(
        SettingsNamespace::new()
            .with("GLOBAL_APP_NAME", "from global")
            .with("GLOBAL_DICT", {
                let mut map = BTreeMap::new();
                map.insert("NAME".to_string(), Value::from("from dict"));
                map
            }),
    );

    let schema = || SchemaBuilder::new("Global").member("NAME", "default").member("OTHER", 1);

    let prefix = with_prefix("GLOBAL_APP").unwrap().decorate(schema()).instance();
    assert_eq!(prefix.get_str("NAME").unwrap(), "from global");
    assert_eq!(prefix.get_int("OTHER").unwrap(), 1);

    let dict = with_namespace_key("GLOBAL_DICT").decorate(schema()).instance();
    assert_eq!(dict.get_str("NAME").unwrap(), "from dict");

    let missing = with_namespace_key("NO_SUCH_DICT").decorate(schema()).instance();
    assert_eq!(missing.get_str("NAME").unwrap(), "default");

    assert!(with_prefix("GLOBAL_APP_").is_err());
}
