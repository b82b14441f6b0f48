//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `typedpage_core` linkage without a host application.
//! - Print the effective defaults table, optionally merged with a JSON
//!   defaults file given as the first argument.
//! - Exercise one bootstrap + save round in an in-memory database.

use std::process::ExitCode;
use typedpage_core::db::open_db_in_memory;
use typedpage_core::{load_defaults_file, ContentPage, DefaultsRegistry, PageService};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("typedpage: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("typedpage_core version={}", typedpage_core::core_version());

    let registry = match std::env::args().nth(1) {
        Some(path) => load_defaults_file(path)?,
        None => DefaultsRegistry::with_builtins(),
    };
    for (type_name, attributes) in registry.snapshot() {
        println!("{type_name}: {}", attributes.join(", "));
    }

    let conn = open_db_in_memory()?;
    let service = PageService::try_new(&conn, registry)?;
    let types = service.bootstrap()?;
    let Some(first) = types.first() else {
        println!("no content types registered");
        return Ok(());
    };

    let holder = service.create_holder(format!("{} holder", first.title), Some(&first.title))?;
    let mut page = ContentPage::new(Some(holder.uuid), "Smoke page");
    let outcome = service.save_page(&mut page, &[])?;
    println!(
        "smoke save type={} attributes={}",
        first.title,
        outcome.link.map_or(0, |link| link.created())
    );
    Ok(())
}
