use serde_json::json;
use std::thread;
use std::time::Duration;
use typedpage_core::db::{open_db, open_db_in_memory};
use typedpage_core::{
    Attribute, AttributeKind, AttributeLinker, AttributeRepository, ContentPage,
    DefaultsRegistry, Holder, LinkOutcome, PageRepository, PageService,
    SqliteAttributeRepository, SqlitePageRepository, SqliteTypeRegistry, TypeRegistry,
};

fn recipe_service(conn: &rusqlite::Connection) -> PageService<'_> {
    let mut service = PageService::try_new(conn, DefaultsRegistry::with_builtins())
        .expect("migrated connection should be accepted");
    service.bootstrap().expect("bootstrap should create registry types");
    service
        .register_defaults(&json!({"Recipe": ["Author", "PrepTime"]}))
        .expect("registration should succeed");
    service
}

#[test]
fn first_page_of_type_seeds_one_template_per_default() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let service = recipe_service(&conn);
    let holder = service
        .create_holder("Recipes", Some("Recipe"))
        .expect("holder should be created");

    let mut page = ContentPage::new(Some(holder.uuid), "Pancakes");
    let outcome = service.save_page(&mut page, &[]).expect("save should succeed");
    assert_eq!(outcome.link, Some(LinkOutcome::Seeded { created: 2 }));

    let attributes = service.page_attributes(page.uuid).expect("attributes should load");
    let titles: Vec<&str> = attributes
        .iter()
        .map(|resolved| resolved.attribute.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Author", "PrepTime"]);
    for resolved in &attributes {
        assert_eq!(resolved.attribute.kind, AttributeKind::Template);
        assert_eq!(resolved.attribute.page_uuid, page.uuid);
        assert!(resolved.attribute.content.is_empty());
        assert_eq!(resolved.original_title, resolved.attribute.title);
    }
}

#[test]
fn later_pages_link_instances_to_first_page_templates() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let service = recipe_service(&conn);
    let holder = service
        .create_holder("Recipes", Some("Recipe"))
        .expect("holder should be created");

    let mut first = ContentPage::new(Some(holder.uuid), "Pancakes");
    service.save_page(&mut first, &[]).expect("save should succeed");
    let templates = service.page_attributes(first.uuid).expect("attributes should load");

    let mut second = ContentPage::new(Some(holder.uuid), "Waffles");
    let outcome = service.save_page(&mut second, &[]).expect("save should succeed");
    assert_eq!(outcome.link, Some(LinkOutcome::Linked { created: 2 }));

    let instances = service.page_attributes(second.uuid).expect("attributes should load");
    assert_eq!(instances.len(), templates.len());
    for (instance, template) in instances.iter().zip(&templates) {
        assert_eq!(instance.attribute.title, template.attribute.title);
        assert_eq!(
            instance.attribute.kind,
            AttributeKind::Instance {
                template: template.attribute.uuid
            }
        );
        assert_eq!(instance.original_title, template.attribute.title);
    }

    // Templates stay with the first page only.
    let attribute_repo = SqliteAttributeRepository::try_new(&conn)
        .expect("migrated connection should be accepted");
    let recipe = SqliteTypeRegistry::try_new(&conn)
        .expect("migrated connection should be accepted")
        .find_by_title("Recipe")
        .expect("type lookup should succeed")
        .expect("type should exist");
    let type_templates = attribute_repo
        .list_templates_for_type(recipe.uuid)
        .expect("templates should list");
    assert_eq!(type_templates.len(), 2);
    assert!(type_templates
        .iter()
        .all(|template| template.page_uuid == first.uuid));
}

#[test]
fn pages_under_different_holders_of_same_type_share_templates() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let service = recipe_service(&conn);
    let breakfast = service
        .create_holder("Breakfast", Some("Recipe"))
        .expect("holder should be created");
    let dinner = service.create_holder("Dinner", Some("Recipe")).expect("holder should be created");

    let mut first = ContentPage::new(Some(breakfast.uuid), "Pancakes");
    service.save_page(&mut first, &[]).expect("save should succeed");
    let mut second = ContentPage::new(Some(dinner.uuid), "Stew");
    let outcome = service.save_page(&mut second, &[]).expect("save should succeed");

    assert_eq!(outcome.link, Some(LinkOutcome::Linked { created: 2 }));
}

#[test]
fn type_trees_are_independent() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let service = recipe_service(&conn);
    let recipes = service
        .create_holder("Recipes", Some("Recipe"))
        .expect("holder should be created");
    let blog = service.create_holder("Blog", Some("Blog")).expect("holder should be created");

    let mut recipe_page = ContentPage::new(Some(recipes.uuid), "Pancakes");
    service.save_page(&mut recipe_page, &[]).expect("save should succeed");

    let mut blog_page = ContentPage::new(Some(blog.uuid), "Hello");
    let outcome = service.save_page(&mut blog_page, &[]).expect("save should succeed");
    assert_eq!(outcome.link, Some(LinkOutcome::Seeded { created: 1 }));

    let attributes = service.page_attributes(blog_page.uuid).expect("attributes should load");
    assert_eq!(attributes.len(), 1);
    assert_eq!(attributes[0].attribute.title, "Author");
    assert!(attributes[0].attribute.is_template());
}

#[test]
fn ensure_attributes_twice_creates_nothing_more() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let service = recipe_service(&conn);
    let holder = service
        .create_holder("Recipes", Some("Recipe"))
        .expect("holder should be created");

    let mut first = ContentPage::new(Some(holder.uuid), "Pancakes");
    service.save_page(&mut first, &[]).expect("save should succeed");
    let mut second = ContentPage::new(Some(holder.uuid), "Waffles");
    service.save_page(&mut second, &[]).expect("save should succeed");

    let resave = service.save_page(&mut second, &[]).expect("save should succeed");
    assert_eq!(resave.link, Some(LinkOutcome::AlreadyLinked { existing: 2 }));

    let repo = SqliteAttributeRepository::try_new(&conn)
        .expect("migrated connection should be accepted");
    let recipe = SqliteTypeRegistry::try_new(&conn)
        .expect("migrated connection should be accepted")
        .find_by_title("Recipe")
        .expect("type lookup should succeed")
        .expect("type should exist");
    let linker = AttributeLinker::new(&repo, service.defaults());
    for page in [first.uuid, second.uuid] {
        assert_eq!(
            linker.ensure_attributes(page, &recipe).expect("linking should succeed"),
            LinkOutcome::AlreadyLinked { existing: 2 }
        );
        assert_eq!(repo.count_for_page(page).expect("count should succeed"), 2);
    }
}

#[test]
fn type_without_defaults_links_nothing() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let service = PageService::try_new(&conn, DefaultsRegistry::empty())
        .expect("migrated connection should be accepted");
    let holder = service.create_holder("Misc", Some("Misc")).expect("holder should be created");

    let mut page = ContentPage::new(Some(holder.uuid), "Loose");
    let outcome = service.save_page(&mut page, &[]).expect("save should succeed");

    assert_eq!(outcome.link, Some(LinkOutcome::NoDefaults));
    assert!(service.page_attributes(page.uuid).expect("attributes should load").is_empty());
}

#[test]
fn registered_defaults_merge_into_builtin_type() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let mut service = PageService::try_new(&conn, DefaultsRegistry::with_builtins())
        .expect("migrated connection should be accepted");
    service.bootstrap().expect("bootstrap should create registry types");
    let created = service
        .register_defaults(&json!({"Event": ["Location", "Capacity"]}))
        .expect("registration should succeed");
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].title, "Event");

    let holder = service.create_holder("Events", Some("Event")).expect("holder should be created");
    let mut page = ContentPage::new(Some(holder.uuid), "Launch");
    service.save_page(&mut page, &[]).expect("save should succeed");

    let titles: Vec<String> = service
        .page_attributes(page.uuid)
        .expect("attributes should load")
        .into_iter()
        .map(|resolved| resolved.original_title)
        .collect();
    assert_eq!(titles, vec!["Start Time", "End Time", "Location", "Capacity"]);
}

#[test]
fn concurrent_first_saves_seed_templates_once() {
    const WRITERS: usize = 8;
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("pages.sqlite3");

    let holder_id = {
        let conn = open_db(&path).expect("file db should open");
        let service = PageService::try_new(&conn, DefaultsRegistry::with_builtins())
            .expect("migrated connection should be accepted");
        service.bootstrap().expect("bootstrap should create registry types");
        service.create_holder("Events", Some("Event")).expect("holder should be created").uuid
    };

    let outcomes: Vec<LinkOutcome> = thread::scope(|scope| {
        let handles: Vec<_> = (0..WRITERS)
            .map(|index| {
                let path = &path;
                scope.spawn(move || {
                    let conn = open_db(path).expect("writer connection should open");
                    let service =
                        PageService::try_new(&conn, DefaultsRegistry::with_builtins())
                            .expect("migrated connection should be accepted");
                    let mut page = ContentPage::new(Some(holder_id), format!("Event {index}"));
                    service
                        .save_page(&mut page, &[])
                        .expect("concurrent save should succeed")
                        .link
                        .expect("typed page should be linked")
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("writer thread should not panic"))
            .collect()
    });

    let seeded = outcomes
        .iter()
        .filter(|outcome| **outcome == LinkOutcome::Seeded { created: 3 })
        .count();
    let linked = outcomes
        .iter()
        .filter(|outcome| **outcome == LinkOutcome::Linked { created: 3 })
        .count();
    assert_eq!(seeded, 1);
    assert_eq!(linked, WRITERS - 1);

    let conn = open_db(&path).expect("file db should reopen");
    let event = SqliteTypeRegistry::try_new(&conn)
        .expect("migrated connection should be accepted")
        .find_by_title("Event")
        .expect("type lookup should succeed")
        .expect("Event type should exist");
    let templates = SqliteAttributeRepository::try_new(&conn)
        .expect("migrated connection should be accepted")
        .list_templates_for_type(event.uuid)
        .expect("templates should list");
    assert_eq!(templates.len(), 3);
}

#[test]
fn templates_follow_owning_page_creation_order() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let content_type = SqliteTypeRegistry::try_new(&conn)
        .expect("migrated connection should be accepted")
        .resolve_or_create("Recipe")
        .expect("type should resolve");
    let pages = SqlitePageRepository::try_new(&conn)
        .expect("migrated connection should be accepted");
    let attributes = SqliteAttributeRepository::try_new(&conn)
        .expect("migrated connection should be accepted");

    let mut holder = Holder::new("Recipes");
    holder.type_uuid = Some(content_type.uuid);
    pages.create_holder(&holder).expect("holder should be created");

    // Two owners of one type, created within the same second.
    let mut expected = Vec::new();
    for (title, template) in [("Older", "Author"), ("Newer", "Chef")] {
        let mut page = ContentPage::new(Some(holder.uuid), title);
        page.type_uuid = Some(content_type.uuid);
        pages.save_page(&page).expect("save should succeed");
        let template = Attribute::new_template(page.uuid, template, 0);
        attributes.create_attribute(&template).expect("attribute should be created");
        expected.push(template.uuid);
        thread::sleep(Duration::from_millis(5));
    }

    let ordered: Vec<_> = attributes
        .list_templates_for_type(content_type.uuid)
        .expect("templates should list")
        .into_iter()
        .map(|template| template.uuid)
        .collect();
    assert_eq!(ordered, expected);
}
