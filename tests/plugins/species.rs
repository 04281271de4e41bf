use aquadesk::core::auth::{self, NewUser, User};
use aquadesk::core::db;
use aquadesk::core::error::AquaError;
use aquadesk::core::output::OutputFormat;
use aquadesk::core::repository::{ObservationRepository, SqliteRepository};
use aquadesk::core::scoring::SpeciesHealth;
use aquadesk::core::store::{DATA_DIR_NAME, Store};
use aquadesk::plugins::manage;
use aquadesk::plugins::species::{SpeciesCli, SpeciesCommand, run_species_cli};
use std::fs;
use tempfile::{TempDir, tempdir};

fn fresh_store() -> (TempDir, Store) {
    let tmp = tempdir().expect("tempdir");
    let data_dir = tmp.path().join(DATA_DIR_NAME);
    fs::create_dir_all(&data_dir).expect("data dir");
    let store = Store::open(&data_dir).expect("open store");
    db::initialize_store(&store).expect("init store");
    (tmp, store)
}

fn operator(store: &Store) -> User {
    auth::create_user(
        store,
        "test",
        &NewUser {
            name: "Operator".to_string(),
            role: "Technician".to_string(),
            login: "op".to_string(),
            password: "pw".to_string(),
            is_operational: true,
            is_management: false,
        },
    )
    .expect("create user");
    auth::authenticate(store, "op", "pw").expect("login")
}

fn aquarium_with_species(store: &Store, species: Option<&str>) -> (i64, Option<i64>) {
    let aq = manage::add_row(
        store,
        "test",
        manage::table_spec("aquariums").expect("spec"),
        &["volume=300".to_string()],
    )
    .expect("aquarium");
    let seafood = species.map(|name| {
        manage::add_row(
            store,
            "test",
            manage::table_spec("seafood").expect("spec"),
            &[format!("species_name={}", name), format!("aquarium_id={}", aq)],
        )
        .expect("seafood")
    });
    (aq, seafood)
}

fn add(aquarium: i64, total: u32, damaged: u32, abnormal: u32, dead: u32) -> SpeciesCli {
    SpeciesCli {
        command: SpeciesCommand::Add {
            aquarium,
            total,
            damaged,
            abnormal,
            dead,
            avg_size: 12.5,
            avg_weight: 340.0,
        },
    }
}

#[test]
fn test_species_checks_are_scored_per_row() {
    let (_tmp, store) = fresh_store();
    let user = operator(&store);
    let (aq, seafood) = aquarium_with_species(&store, Some("Carp"));
    let seafood = seafood.expect("seafood id");

    run_species_cli(&store, &user, OutputFormat::Text, add(aq, 100, 0, 0, 5)).expect("excellent");
    run_species_cli(&store, &user, OutputFormat::Text, add(aq, 100, 0, 0, 31)).expect("critical");
    run_species_cli(&store, &user, OutputFormat::Json, add(aq, 0, 0, 0, 0)).expect("no data");

    let history = SqliteRepository::new(&store, "test")
        .species_history(aq, seafood, 50)
        .expect("history");
    let labels: Vec<SpeciesHealth> = history.iter().map(|r| r.health()).collect();
    assert_eq!(
        labels,
        vec![SpeciesHealth::NoData, SpeciesHealth::Critical, SpeciesHealth::Excellent]
    );
    assert_eq!(history[1].avg_weight, Some(340.0));
}

#[test]
fn test_overlapping_categories_are_accepted() {
    let (_tmp, store) = fresh_store();
    let user = operator(&store);
    let (aq, seafood) = aquarium_with_species(&store, Some("Trout"));

    // 7 + 7 + 2 exceeds the total, but each category alone fits.
    run_species_cli(&store, &user, OutputFormat::Text, add(aq, 10, 7, 7, 2)).expect("overlap");
    let history = SqliteRepository::new(&store, "test")
        .species_history(aq, seafood.expect("seafood"), 50)
        .expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].health(), SpeciesHealth::Poor);
}

#[test]
fn test_category_above_total_is_rejected() {
    let (_tmp, store) = fresh_store();
    let user = operator(&store);
    let (aq, _) = aquarium_with_species(&store, Some("Trout"));
    let err = run_species_cli(&store, &user, OutputFormat::Text, add(aq, 10, 0, 0, 11)).unwrap_err();
    assert!(matches!(err, AquaError::ValidationError(_)));
}

#[test]
fn test_aquarium_without_seafood() {
    let (_tmp, store) = fresh_store();
    let user = operator(&store);
    let (aq, _) = aquarium_with_species(&store, None);

    let err = run_species_cli(&store, &user, OutputFormat::Text, add(aq, 10, 0, 0, 0)).unwrap_err();
    assert!(matches!(err, AquaError::ValidationError(_)));

    let err = run_species_cli(
        &store,
        &user,
        OutputFormat::Text,
        SpeciesCli {
            command: SpeciesCommand::List {
                aquarium: aq,
                limit: None,
            },
        },
    )
    .unwrap_err();
    assert!(matches!(err, AquaError::NotFound(_)));
}

#[test]
fn test_list_honours_explicit_limit() {
    let (_tmp, store) = fresh_store();
    let user = operator(&store);
    let (aq, _) = aquarium_with_species(&store, Some("Perch"));
    for _ in 0..3 {
        run_species_cli(&store, &user, OutputFormat::Text, add(aq, 20, 1, 0, 0)).expect("add");
    }
    run_species_cli(
        &store,
        &user,
        OutputFormat::Json,
        SpeciesCli {
            command: SpeciesCommand::List {
                aquarium: aq,
                limit: Some(2),
            },
        },
    )
    .expect("list");
}
