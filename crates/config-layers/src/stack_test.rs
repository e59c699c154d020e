// Copyright (c) Contributors to the config-layers project.
// SPDX-License-Identifier: Apache-2.0

use rstest::{fixture, rstest};
use serde_yaml::Mapping;
use tempfile::TempDir;

use super::*;
use crate::{DataOptions, PathStore, SectionsStore, Store};

fn yaml(content: &str) -> Value {
    serde_yaml::from_str(content).expect("valid test yaml")
}

fn mapping(content: &str) -> Mapping {
    serde_yaml::from_str(content).expect("valid test yaml")
}

/// `runtime` on top of `local`, with `local` preloaded.
#[fixture]
fn config() -> LayerStack {
    let local = PathStore::with_data(mapping("{test: found_local, test2: {test: subhash}}"));
    LayerStack::from_layers([Layer::new("local", local), Layer::default()])
}

fn names<'a>(found: &'a Option<Vec<String>>) -> Option<Vec<&'a str>> {
    found
        .as_ref()
        .map(|found| found.iter().map(String::as_str).collect())
}

#[rstest]
fn test_default_stack_has_runtime_layer() {
    let mut config = LayerStack::new();
    assert_eq!(config.layers(), vec!["runtime"]);
    assert_eq!(config.set(&["test"], yaml("toto")), Some(yaml("toto")));
    assert!(config.exists(&["test"]));
    assert_eq!(config.get(&["test"]), Some(yaml("toto")));
}

#[rstest]
fn test_initial_layers_last_on_top(config: LayerStack) {
    assert_eq!(config.layers(), vec!["runtime", "local"]);
    assert!(config.layer("runtime").unwrap().is_protected());
    assert!(config.layer("local").unwrap().is_protected());
}

#[rstest]
fn test_layer_indexes(config: LayerStack) {
    assert_eq!(config.layer_indexes("runtime"), Some(vec![0]));
    assert_eq!(config.layer_indexes("local"), Some(vec![1]));
    assert_eq!(config.layer_indexes("test"), None);
    assert_eq!(config.layer_indexes(&["local", "runtime"]), Some(vec![1, 0]));
    assert_eq!(
        config.layer_indexes(&["runtime", "local", "runtime"]),
        Some(vec![0, 1, 0])
    );
    assert_eq!(config.layer_indexes(&["missing", "local"]), Some(vec![1]));
    assert_eq!(
        config.layer_indexes(LayerSelector::matching(|layer, _| layer.name() == "local")),
        Some(vec![1])
    );
    assert_eq!(
        config.layer_indexes(LayerSelector::matching(|layer, _| {
            ["local", "runtime"].contains(&layer.name())
        })),
        Some(vec![0, 1])
    );
    assert_eq!(
        config.layer_indexes(LayerSelector::matching(|_, index| index > 5)),
        Some(vec![])
    );
}

#[rstest]
fn test_layer_versions(mut config: LayerStack) {
    assert_eq!(config.version("local"), None);
    assert_eq!(config.version("runtime"), None);
    assert_eq!(config.version("inexistent"), None);

    assert_eq!(config.set_version("local", "1"), Some("1"));
    assert_eq!(config.version("local"), Some("1"));
    assert_eq!(config.version("runtime"), None);
    assert_eq!(config.set_version("inexistent", "1"), None);
}

#[rstest]
fn test_exists_by_layer(config: LayerStack) {
    assert!(config.exists(&["test"]));
    assert!(config.exists(&["test2", "test"]));
    assert!(!config.exists(&["missing"]));
    assert!(!config.exists(&[]));

    assert!(!config.exists_with(&Query::new(&["test"]).name("runtime")));
    assert!(!config.exists_with(&Query::new(&["test"]).names(&["runtime"])));
    assert!(config.exists_with(&Query::new(&["test"]).names(&["local"])));
    assert!(!config.exists_with(&Query::new(&["test"]).names(&["missing"])));
}

#[rstest]
fn test_shadow_override_and_reveal(mut config: LayerStack) {
    assert_eq!(config.get(&["test"]), Some(yaml("found_local")));
    assert_eq!(names(&config.where_is(&["test"])), Some(vec!["local"]));
    assert_eq!(names(&config.where_is(&["test2"])), Some(vec!["local"]));
    assert_eq!(names(&config.where_is(&["test2", "test"])), Some(vec!["local"]));

    let written = config.set_with(&Query::new(&["test"]).name("runtime"), yaml("where"));
    assert_eq!(written, Some(yaml("where")));
    assert_eq!(config.get(&["test"]), Some(yaml("where")));
    assert_eq!(names(&config.where_is(&["test"])), Some(vec!["runtime", "local"]));

    assert_eq!(config.delete(&["test"]), Some(yaml("where")));
    assert_eq!(config.get(&["test"]), Some(yaml("found_local")));
    assert_eq!(names(&config.where_is(&["test"])), Some(vec!["local"]));
}

#[rstest]
fn test_delete_missing_or_empty(mut config: LayerStack) {
    assert_eq!(config.delete(&["missing"]), None);
    assert_eq!(config.delete(&[]), None);
    assert_eq!(config.get(&["test"]), Some(yaml("found_local")));
}

#[rstest]
fn test_empty_key_path_is_absent(mut config: LayerStack) {
    assert_eq!(config.get(&[]), None);
    assert_eq!(config.where_is(&[]), None);
    assert_eq!(config.set(&[], yaml("value")), None);
    assert_eq!(config.merge(&[]), None);
    assert!(!config.mergeable(&[], false));
}

#[rstest]
fn test_define_layer_defaults() {
    let layer = Layer::new("instant", PathStore::new());
    assert_eq!(layer.name(), "instant");
    assert!(layer.writable);
    assert!(!layer.loadable);
    assert!(!layer.savable);
    assert!(!layer.has_file);
    assert!(!layer.is_protected());

    let layer = Layer::default();
    assert_eq!(layer.name(), "runtime");
    assert!(layer.store().data().is_empty());
}

#[rstest]
fn test_layer_lifecycle(mut config: LayerStack) {
    assert!(config.layer_add(Layer::named("instant")));
    assert_eq!(config.layers(), vec!["instant", "runtime", "local"]);
    assert!(!config.layer("instant").unwrap().is_protected());

    assert!(!config.layer_add(Layer::new("instant", PathStore::new())));
    assert_eq!(config.layers(), vec!["instant", "runtime", "local"]);

    config.set(&["test"], yaml("toto"));
    assert_eq!(names(&config.where_is(&["test"])), Some(vec!["instant", "local"]));

    assert!(config.layer_remove("instant"));
    assert_eq!(config.layers(), vec!["runtime", "local"]);
    assert_eq!(names(&config.where_is(&["test"])), Some(vec!["local"]));

    assert!(!config.layer_remove("runtime"));
    assert!(!config.layer_remove("missing"));
    assert_eq!(config.layers(), vec!["runtime", "local"]);
}

#[rstest]
fn test_where_is_none_after_removal() {
    let mut config = LayerStack::new();
    config.layer_add(Layer::named("instant"));
    config.set(&["test"], yaml("toto"));
    assert!(config.layer_remove("instant"));
    assert_eq!(config.where_is(&["test"]), None);
}

#[rstest]
fn test_set_targets(mut config: LayerStack) {
    let value = yaml("{data1: test_data1, data2: test_data2}");
    let written = config.set_with(&Query::new(&["merge1"]).name("local"), value.clone());
    assert_eq!(written, Some(value));
    assert_eq!(names(&config.where_is(&["merge1"])), Some(vec!["local"]));

    // names only restrict reads, the write lands in runtime
    let value = yaml("{data1: test_data1, data2: test_data3}");
    let written = config.set_with(&Query::new(&["merge1"]).names(&["local"]), value.clone());
    assert_eq!(written, Some(value));
    assert_eq!(names(&config.where_is(&["merge1"])), Some(vec!["runtime", "local"]));

    let value = yaml("{data2: value_runtime, test_runtime: true}");
    config.set_with(&Query::new(&["merge1"]).name("runtime"), value.clone());
    assert_eq!(config.get(&["merge1"]), Some(value));

    assert_eq!(config.set_with(&Query::new(&["merge1"]).name("missing"), yaml("x")), None);
}

#[rstest]
fn test_get_by_name_and_names(mut config: LayerStack) {
    config.set_with(
        &Query::new(&["merge1"]).name("local"),
        yaml("{data1: test_data1, data2: test_data2}"),
    );
    config.set_with(
        &Query::new(&["merge1"]).name("runtime"),
        yaml("{data2: value_runtime, test_runtime: true}"),
    );

    let local = config.get_with(&Query::new(&["merge1"]).names(&["local"]).merge(true));
    assert_eq!(local, Some(yaml("{data1: test_data1, data2: test_data2}")));
    let runtime = config.get_with(&Query::new(&["merge1"]).names(&["runtime"]).merge(true));
    assert_eq!(runtime, Some(yaml("{data2: value_runtime, test_runtime: true}")));

    let both = config.get_with(
        &Query::new(&["merge1"])
            .names(&["runtime", "local"])
            .merge(true),
    );
    assert_eq!(
        both,
        Some(yaml("{data1: test_data1, data2: value_runtime, test_runtime: true}"))
    );
    let reversed = config.get_with(
        &Query::new(&["merge1"])
            .names(&["local", "runtime"])
            .merge(true),
    );
    assert_eq!(
        reversed,
        Some(yaml("{data1: test_data1, data2: test_data2, test_runtime: true}"))
    );

    let first = config.get_with(&Query::new(&["merge1"]).names(&["local", "runtime"]));
    assert_eq!(first, Some(yaml("{data1: test_data1, data2: test_data2}")));

    config.set_with(&Query::new(&["test"]).name("runtime"), yaml("{test: runtime}"));
    assert_eq!(config.get(&["test"]), Some(yaml("{test: runtime}")));
    assert_eq!(config.get_with(&Query::new(&["test"]).name("local")), Some(yaml("found_local")));
    assert_eq!(config.get_with(&Query::new(&["test"]).names(&["missing"])), None);
}

#[rstest]
fn test_default_write_skips_non_writable_layers() {
    let mut config = LayerStack::from_layers([
        Layer::named("local"),
        Layer::named("readonly").writable(false),
    ]);
    config.set(&["key"], yaml("value"));
    assert_eq!(names(&config.where_is(&["key"])), Some(vec!["local"]));

    let mut config = LayerStack::from_layers([Layer::named("readonly").writable(false)]);
    assert_eq!(config.set(&["key"], yaml("value")), None);
    assert!(!config.exists(&["key"]));
}

#[rstest]
fn test_named_write_honors_data_readonly(mut config: LayerStack) {
    config
        .layer_mut("local")
        .unwrap()
        .store_mut()
        .set_data_options(DataOptions::new().data_readonly(true));
    let written = config.set_with(&Query::new(&["test"]).name("local"), yaml("changed"));
    assert_eq!(written, None);
    assert_eq!(config.get(&["test"]), Some(yaml("found_local")));
}

#[rstest]
fn test_each_lists_top_level_keys(mut config: LayerStack) {
    config.set_with(&Query::new(&["merge1"]).name("local"), yaml("{data1: test_data1}"));
    let mut keys: Vec<String> = config
        .each("local")
        .unwrap()
        .filter_map(|(key, _)| key.as_str().map(String::from))
        .collect();
    keys.sort();
    assert_eq!(keys, vec!["merge1", "test", "test2"]);

    // each call starts over
    assert_eq!(config.each("local").unwrap().count(), 3);
    assert!(config.each("missing").is_none());
}

fn with_merge_data(mut config: LayerStack, runtime: &str, local: &str) -> LayerStack {
    config.set(&["merge1"], yaml(runtime));
    config.set_with(&Query::new(&["merge1"]).name("local"), yaml(local));
    config
}

#[rstest]
fn test_merge_scalar_in_deepest_layer(config: LayerStack) {
    let config = with_merge_data(
        config,
        "{data2: {test_runtime: true}}",
        "{data1: test_data1, data2: test_data3}",
    );
    let keys = ["merge1", "data2"];
    assert_eq!(names(&config.where_is(&keys)), Some(vec!["runtime", "local"]));
    assert!(!config.mergeable(&keys, false));
    assert!(!config.mergeable(&keys, true));
    assert_eq!(config.merge(&keys), Some(yaml("test_data3")));
}

#[rstest]
fn test_merge_scalar_over_mapping(config: LayerStack) {
    let config = with_merge_data(
        config,
        "{data2: test_runtime}",
        "{data2: {test: test_data2}}",
    );
    let keys = ["merge1", "data2"];
    assert!(config.mergeable(&keys, false));
    assert!(!config.mergeable(&keys, true));
    assert_eq!(config.merge(&keys), Some(yaml("{test: test_data2}")));
}

#[rstest]
fn test_merge_mappings(config: LayerStack) {
    let config = with_merge_data(
        config,
        "{data2: {test_runtime: true}}",
        "{data2: {test: test_data2}}",
    );
    let keys = ["merge1", "data2"];
    assert!(config.mergeable(&keys, false));
    assert!(config.mergeable(&keys, true));
    assert_eq!(
        config.merge(&keys),
        Some(yaml("{test_runtime: true, test: test_data2}"))
    );
}

#[rstest]
fn test_merge_lists(config: LayerStack) {
    let config = with_merge_data(config, "{data2: [by]}", "{data2: [replaced]}");
    let keys = ["merge1", "data2"];
    assert!(config.mergeable(&keys, false));
    assert!(config.mergeable(&keys, true));
    assert_eq!(config.merge(&keys), Some(yaml("[by]")));
}

#[rstest]
fn test_merge_missing_key(config: LayerStack) {
    assert!(!config.mergeable(&["missing"], false));
    assert_eq!(config.merge(&["missing"]), None);
}

#[rstest]
fn test_where_is_labels_section_layers() {
    let sections = SectionsStore::with_data(mapping(
        "{sec1: {test1: value1}, default: {test1: value3}}",
    ));
    let mut config = LayerStack::from_layers([Layer::new("account", sections), Layer::default()]);
    config
        .layer_mut("account")
        .unwrap()
        .store_mut()
        .set_data_options(DataOptions::new().sections(["sec1"]));
    config.set(&["test1"], yaml("runtime"));

    assert_eq!(
        names(&config.where_is(&["test1"])),
        Some(vec!["runtime", "account(sec1|default)"])
    );
    assert_eq!(
        config.get_with(&Query::new(&["test1"]).name("account")),
        Some(yaml("value1"))
    );
}

#[rstest]
#[case(&["runtime"], None)]
#[case(&["local"], Some(vec!["local"]))]
#[case(&["local", "runtime"], Some(vec!["local", "runtime"]))]
#[case(&["runtime", "local"], Some(vec!["runtime", "local"]))]
#[case(&["missing"], None)]
fn test_where_is_by_names(
    mut config: LayerStack,
    #[case] selected: &[&str],
    #[case] expected: Option<Vec<&str>>,
) {
    if selected.len() > 1 {
        config.set(&["test"], yaml("runtime"));
    }
    let found = config.where_is_with(&Query::new(&["test"]).names(selected));
    assert_eq!(names(&found), expected);
}

#[rstest]
fn test_where_is_by_name(mut config: LayerStack) {
    let found = config.where_is_with(&Query::new(&["test"]).name("local"));
    assert_eq!(names(&found), Some(vec!["local"]));
    assert_eq!(config.where_is_with(&Query::new(&["test"]).name("runtime")), None);
    assert_eq!(config.where_is_with(&Query::new(&["test"]).name("missing")), None);

    config.set(&["test"], yaml("runtime"));
    let found = config.where_is_with(&Query::new(&["test"]).name("runtime"));
    assert_eq!(names(&found), Some(vec!["runtime"]));
}

#[rstest]
fn test_delete_only_touches_active_section() {
    let sections = SectionsStore::with_data(mapping(
        "{sec1: {test1: value1}, default: {test1: value3}}",
    ));
    let mut config = LayerStack::from_layers([Layer::new("account", sections)]);
    config
        .layer_mut("account")
        .unwrap()
        .store_mut()
        .set_data_options(DataOptions::new().section("sec1").sections(["sec1"]));

    assert_eq!(config.delete(&["test1"]), Some(yaml("value1")));
    assert_eq!(config.get(&["test1"]), Some(yaml("value3")));

    // only the default section holds it now, which is not active
    assert_eq!(config.delete(&["test1"]), None);
    assert_eq!(config.get(&["test1"]), Some(yaml("value3")));
}

#[rstest]
fn test_layer_persistence_flags() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("local.yaml");
    std::fs::write(&file, "file_version: '2'\nkey: from_file\n").unwrap();

    let mut config = LayerStack::from_layers([
        Layer::named("local").loadable(true).savable(true).has_file(true),
        Layer::default(),
    ]);

    assert_eq!(config.set_layer_file("runtime", &file), None);
    assert_eq!(config.set_layer_file("local", &file), Some(file.clone()));

    assert!(!config.load("runtime").unwrap());
    assert!(!config.load("missing").unwrap());
    assert!(config.load("local").unwrap());
    assert_eq!(config.get(&["key"]), Some(yaml("from_file")));
    assert_eq!(config.version("local"), Some("2"));

    config.set_with(&Query::new(&["key"]).name("local"), yaml("saved"));
    assert!(!config.save("runtime").unwrap());
    assert!(config.save("local").unwrap());

    let mut reloaded = PathStore::new();
    reloaded.load(Some(&file)).unwrap();
    assert_eq!(reloaded.get(&["key"]), Some(&yaml("saved")));
    assert_eq!(reloaded.version(), Some("2"));
}

#[rstest]
fn test_save_without_file_fails() {
    let mut config = LayerStack::from_layers([Layer::named("local").savable(true)]);
    assert!(matches!(config.save("local"), Err(crate::Error::FilenameNotSet)));
}

#[rstest]
fn test_shared_stack_across_threads(config: LayerStack) {
    let shared = config.into_shared();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let shared = SharedLayerStack::clone(&shared);
            std::thread::spawn(move || {
                let key = format!("key{i}");
                let mut stack = shared.lock().unwrap();
                stack.set(&[key.as_str()], Value::from(i));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stack = shared.lock().unwrap();
    for i in 0..4 {
        let key = format!("key{i}");
        assert_eq!(stack.get(&[key.as_str()]), Some(Value::from(i)));
    }
    assert_eq!(stack.get(&["test"]), Some(yaml("found_local")));
}
