use serde_json::json;
use typedpage_core::db::open_db_in_memory;
use typedpage_core::{
    AttributeLookup, ContentPage, DefaultsRegistry, PageService, SqliteAttributeRepository,
};

struct RecipePages {
    first: ContentPage,
    second: ContentPage,
}

fn save_two_recipes(service: &PageService<'_>) -> RecipePages {
    let holder = service
        .create_holder("Recipes", Some("Recipe"))
        .expect("holder should be created");
    let mut first = ContentPage::new(Some(holder.uuid), "Pancakes");
    service.save_page(&mut first, &[]).expect("save should succeed");
    let mut second = ContentPage::new(Some(holder.uuid), "Waffles");
    service.save_page(&mut second, &[]).expect("save should succeed");
    RecipePages { first, second }
}

fn recipe_service(conn: &rusqlite::Connection) -> PageService<'_> {
    let mut service = PageService::try_new(conn, DefaultsRegistry::empty())
        .expect("migrated connection should be accepted");
    service
        .register_defaults(&json!({"Recipe": ["Author", "PrepTime"]}))
        .expect("registration should succeed");
    service
}

#[test]
fn renamed_instance_is_still_found_by_original_title() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let service = recipe_service(&conn);
    let pages = save_two_recipes(&service);

    let author = service
        .find_attribute(pages.second.uuid, "Author")
        .expect("lookup should succeed")
        .expect("attribute should exist");
    service.rename_attribute(author.uuid, "Chef").expect("rename should succeed");

    let found = service
        .find_attribute(pages.second.uuid, "Author")
        .expect("lookup should succeed")
        .expect("attribute should exist");
    assert_eq!(found.uuid, author.uuid);
    assert_eq!(found.title, "Chef");
    assert!(service
        .find_attribute(pages.second.uuid, "Chef")
        .expect("lookup should succeed")
        .is_none());
}

#[test]
fn renaming_an_instance_leaves_other_pages_alone() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let service = recipe_service(&conn);
    let pages = save_two_recipes(&service);

    let author = service
        .find_attribute(pages.second.uuid, "Author")
        .expect("lookup should succeed")
        .expect("attribute should exist");
    service.rename_attribute(author.uuid, "Chef").expect("rename should succeed");

    let template = service
        .find_attribute(pages.first.uuid, "Author")
        .expect("lookup should succeed")
        .expect("attribute should exist");
    assert_eq!(template.title, "Author");
    assert!(template.is_template());
}

#[test]
fn missing_title_is_a_miss_not_an_error() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let service = recipe_service(&conn);
    let pages = save_two_recipes(&service);

    assert!(service
        .find_attribute(pages.second.uuid, "Servings")
        .expect("lookup should succeed")
        .is_none());

    let untyped = ContentPage::new(None, "Loose");
    assert!(service
        .find_attribute(untyped.uuid, "Author")
        .expect("lookup should succeed")
        .is_none());
}

#[test]
fn original_title_resolves_through_the_template() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let service = recipe_service(&conn);
    let pages = save_two_recipes(&service);

    let repo = SqliteAttributeRepository::try_new(&conn)
        .expect("migrated connection should be accepted");
    let lookup = AttributeLookup::new(&repo);

    let template = lookup
        .find_by_original_title(pages.first.uuid, "PrepTime")
        .expect("lookup should succeed")
        .expect("attribute should exist");
    assert_eq!(
        lookup
            .original_title(&template)
            .expect("original title should resolve"),
        "PrepTime"
    );

    let instance = lookup
        .find_by_original_title(pages.second.uuid, "PrepTime")
        .expect("lookup should succeed")
        .expect("attribute should exist");
    let renamed = service
        .rename_attribute(instance.uuid, "Cook Time")
        .expect("rename should succeed");
    assert_eq!(lookup.original_title(&renamed).expect("original title should resolve"), "PrepTime");

    let resolved = lookup.resolved_attributes(pages.second.uuid).expect("attributes should load");
    let pairs: Vec<(&str, &str)> = resolved
        .iter()
        .map(|item| (item.attribute.title.as_str(), item.original_title.as_str()))
        .collect();
    assert_eq!(pairs, vec![("Author", "Author"), ("Cook Time", "PrepTime")]);
}

#[test]
fn lookup_returns_first_match_in_page_order() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let service = recipe_service(&conn);
    let pages = save_two_recipes(&service);

    // Two instances now display as "Author"; lookup still keys on originals.
    let prep = service
        .find_attribute(pages.second.uuid, "PrepTime")
        .expect("lookup should succeed")
        .expect("attribute should exist");
    service.rename_attribute(prep.uuid, "Author").expect("rename should succeed");

    let found = service
        .find_attribute(pages.second.uuid, "PrepTime")
        .expect("lookup should succeed")
        .expect("attribute should exist");
    assert_eq!(found.uuid, prep.uuid);
    let author = service
        .find_attribute(pages.second.uuid, "Author")
        .expect("lookup should succeed")
        .expect("attribute should exist");
    assert_ne!(author.uuid, prep.uuid);
}
