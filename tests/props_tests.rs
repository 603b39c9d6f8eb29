//! Property store and loader integration tests

use std::fs;
use std::path::Path;

use anyhow::Result;
use serde_json::json;

use keystone::props::{load_into, load_path, load_path_lenient, PropsError};
use keystone::PropertyStore;

fn write(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text)?;
    Ok(())
}

#[test]
fn load_simple_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("app.properties");
    write(
        &file,
        "# app config\n\
         service.name=geo\n\
         service.port: 8001\n\
         service.debug=yes\n",
    )?;

    let store = load_path(&file)?;
    assert_eq!(store.string_for_key("service.name").as_deref(), Some("geo"));
    assert_eq!(store.int_for_key("service.port")?, 8001);
    assert!(store.bool_for_key("service.debug")?);
    Ok(())
}

#[test]
fn later_entries_override_earlier_ones() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("app.properties");
    write(&file, "retries=2\nretries=5\n")?;

    let store = load_path(&file)?;
    assert_eq!(store.int_for_key("retries")?, 5);
    Ok(())
}

#[test]
fn includes_load_in_place() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path().join("base.properties").as_path(), "a=base\nb=base\n")?;
    write(
        dir.path().join("app.properties").as_path(),
        "a=app-before\n\
         .include=base.properties\n\
         b=app-after\n",
    )?;

    let store = load_path(&dir.path().join("app.properties"))?;
    // The include overrode a=app-before, and b was set after the include
    assert_eq!(store.string_for_key("a").as_deref(), Some("base"));
    assert_eq!(store.string_for_key("b").as_deref(), Some("app-after"));
    Ok(())
}

#[test]
fn includes_nest_and_resolve_relative_to_the_including_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let nested = dir.path().join("conf");
    fs::create_dir(&nested)?;
    write(nested.join("inner.properties").as_path(), "depth=two\n")?;
    write(
        nested.join("middle.properties").as_path(),
        ".include=inner.properties\nlayer=middle\n",
    )?;
    write(
        dir.path().join("outer.properties").as_path(),
        ".include=conf/middle.properties\n",
    )?;

    let store = load_path(&dir.path().join("outer.properties"))?;
    assert_eq!(store.string_for_key("depth").as_deref(), Some("two"));
    assert_eq!(store.string_for_key("layer").as_deref(), Some("middle"));
    Ok(())
}

#[test]
fn recursive_include_is_an_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write(
        dir.path().join("a.properties").as_path(),
        ".include=b.properties\n",
    )?;
    write(
        dir.path().join("b.properties").as_path(),
        ".include=a.properties\n",
    )?;

    let err = load_path(&dir.path().join("a.properties")).unwrap_err();
    assert!(matches!(err, PropsError::RecursiveInclude { .. }));
    let message = err.to_string();
    assert!(message.contains("a.properties"), "chain missing: {message}");
    Ok(())
}

#[test]
fn self_include_is_an_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write(
        dir.path().join("loop.properties").as_path(),
        ".include=loop.properties\n",
    )?;

    let err = load_path(&dir.path().join("loop.properties")).unwrap_err();
    assert!(matches!(err, PropsError::RecursiveInclude { .. }));
    Ok(())
}

#[test]
fn missing_include_is_an_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write(
        dir.path().join("app.properties").as_path(),
        ".include=nowhere.properties\n",
    )?;

    let err = load_path(&dir.path().join("app.properties")).unwrap_err();
    assert!(matches!(err, PropsError::NotFound { .. }));
    Ok(())
}

#[test]
fn missing_top_level_file() {
    let path = Path::new("/definitely/not/here.properties");
    assert!(matches!(
        load_path(path).unwrap_err(),
        PropsError::NotFound { .. }
    ));

    // The lenient entry point warns and yields an empty store
    let store = load_path_lenient(path).unwrap();
    assert!(store.is_empty());
}

#[test]
fn continuations_and_escapes_survive_loading() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("app.properties");
    write(
        &file,
        "hosts=a.internal,\\\n    b.internal\n\
         greeting=hi\\tthere\n",
    )?;

    let store = load_path(&file)?;
    assert_eq!(
        store.array_for_key("hosts")?,
        vec![json!("a.internal"), json!("b.internal")]
    );
    assert_eq!(store.string_for_key("greeting").as_deref(), Some("hi\tthere"));
    Ok(())
}

#[test]
fn load_into_existing_store_overrides() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("override.properties");
    write(&file, "mode=file\n")?;

    let store = PropertyStore::new();
    store.set("mode", "initial");
    store.set("kept", "yes");
    // Conversion already cached, must be refreshed by the load
    assert_eq!(store.string_for_key("mode").as_deref(), Some("initial"));

    load_into(&store, &file)?;
    assert_eq!(store.string_for_key("mode").as_deref(), Some("file"));
    assert_eq!(store.string_for_key("kept").as_deref(), Some("yes"));
    Ok(())
}
