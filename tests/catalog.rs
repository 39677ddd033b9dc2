//! Script catalog tests: slugs, visibility, filters, updates.

mod common;

use common::*;

#[test]
fn test_slug_generated_from_name() {
    let conn = setup_test_db();
    let script = create_test_script(&conn, "Layer Export Pro!");
    assert_eq!(script.slug, "layer-export-pro");
    assert_eq!(script.version, "1.0.0");
    assert_eq!(script.status, ScriptStatus::Draft);
}

#[test]
fn test_slug_collisions_get_numeric_suffix() {
    let conn = setup_test_db();
    let a = create_test_script(&conn, "Layer Export");
    let b = create_test_script(&conn, "Layer Export");
    let c = create_test_script(&conn, "Layer Export");
    assert_eq!(a.slug, "layer-export");
    assert_eq!(b.slug, "layer-export-2");
    assert_eq!(c.slug, "layer-export-3");
}

#[test]
fn test_published_lookups_hide_drafts() {
    let conn = setup_test_db();
    let draft = create_test_script(&conn, "Hidden Script");
    let published = create_published_script(&conn, "Visible Script", 500);

    assert!(queries::get_published_script(&conn, draft.id)
        .unwrap()
        .is_none());
    assert!(queries::get_published_script(&conn, published.id)
        .unwrap()
        .is_some());
    assert!(queries::get_published_script_by_slug(&conn, &draft.slug)
        .unwrap()
        .is_none());
    assert!(queries::get_published_script_by_slug(&conn, "visible-script")
        .unwrap()
        .is_some());
}

#[test]
fn test_list_filters() {
    let conn = setup_test_db();
    create_published_script(&conn, "Photoshop Paid", 500);
    create_published_script(&conn, "Photoshop Free", 0);
    create_test_script(&conn, "Draft Script");

    let published_only = ScriptFilters {
        status: Some(ScriptStatus::Published),
        ..Default::default()
    };
    let (items, total) = queries::list_scripts_paginated(&conn, &published_only, 50, 0).unwrap();
    assert_eq!(total, 2);
    assert_eq!(items.len(), 2);

    let free_only = ScriptFilters {
        status: Some(ScriptStatus::Published),
        price_type: Some(PriceType::Free),
        ..Default::default()
    };
    let (items, total) = queries::list_scripts_paginated(&conn, &free_only, 50, 0).unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].name, "Photoshop Free");

    let search = ScriptFilters {
        search: Some("Draft".to_string()),
        ..Default::default()
    };
    let (_, total) = queries::list_scripts_paginated(&conn, &search, 50, 0).unwrap();
    assert_eq!(total, 1);
}

#[test]
fn test_pagination_window() {
    let conn = setup_test_db();
    for i in 0..5 {
        create_test_script(&conn, &format!("Script {}", i));
    }
    let (items, total) =
        queries::list_scripts_paginated(&conn, &Default::default(), 2, 2).unwrap();
    assert_eq!(total, 5);
    assert_eq!(items.len(), 2);
}

#[test]
fn test_update_regenerates_slug_on_rename() {
    let conn = setup_test_db();
    let script = create_test_script(&conn, "Old Name");

    let updated = queries::update_script(
        &conn,
        script.id,
        &UpdateScript {
            name: Some("New Name".to_string()),
            status: Some(ScriptStatus::Published),
            ..Default::default()
        },
    )
    .unwrap()
    .unwrap();
    assert_eq!(updated.slug, "new-name");
    assert_eq!(updated.status, ScriptStatus::Published);
    // Untouched fields survive
    assert_eq!(updated.price_cents, 1200);
}

#[test]
fn test_update_keeps_slug_without_rename() {
    let conn = setup_test_db();
    let script = create_test_script(&conn, "Stable Name");
    let updated = queries::update_script(
        &conn,
        script.id,
        &UpdateScript {
            price_cents: Some(900),
            ..Default::default()
        },
    )
    .unwrap()
    .unwrap();
    assert_eq!(updated.slug, script.slug);
    assert_eq!(updated.price_cents, 900);
}

#[test]
fn test_update_missing_script() {
    let conn = setup_test_db();
    assert!(queries::update_script(&conn, 404, &UpdateScript::default())
        .unwrap()
        .is_none());
}

#[test]
fn test_delete_script() {
    let conn = setup_test_db();
    let script = create_test_script(&conn, "Doomed");
    assert!(queries::delete_script(&conn, script.id).unwrap());
    assert!(queries::get_script_by_id(&conn, script.id).unwrap().is_none());
    assert!(!queries::delete_script(&conn, script.id).unwrap());
}

#[test]
fn test_set_script_file() {
    let conn = setup_test_db();
    let script = create_test_script(&conn, "With File");
    assert!(queries::set_script_file(&conn, script.id, "with-file-ab12cd.jsx", "2.00 KB").unwrap());
    let script = queries::get_script_by_id(&conn, script.id).unwrap().unwrap();
    assert_eq!(script.file_path.as_deref(), Some("with-file-ab12cd.jsx"));
    assert_eq!(script.file_size.as_deref(), Some("2.00 KB"));
}
