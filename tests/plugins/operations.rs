use aquadesk::core::auth::{self, NewUser, User};
use aquadesk::core::db;
use aquadesk::core::error::AquaError;
use aquadesk::core::output::OutputFormat;
use aquadesk::core::repository::{ObservationRepository, SortOrder, SqliteRepository};
use aquadesk::core::store::{DATA_DIR_NAME, Store};
use aquadesk::plugins::aquarium;
use aquadesk::plugins::feeding::{FeedingCli, FeedingCommand, run_feeding_cli};
use aquadesk::plugins::manage;
use aquadesk::plugins::water::{WaterCli, WaterCommand, run_water_cli, water_series};
use tempfile::{TempDir, tempdir};

fn fresh_store() -> (TempDir, Store) {
    let tmp = tempdir().expect("tempdir");
    let data_dir = tmp.path().join(DATA_DIR_NAME);
    std::fs::create_dir_all(&data_dir).expect("data dir");
    let store = Store::open(&data_dir).expect("open store");
    db::initialize_store(&store).expect("init store");
    (tmp, store)
}

fn user(store: &Store, login: &str, operational: bool, management: bool) -> User {
    auth::create_user(
        store,
        "test",
        &NewUser {
            name: format!("{} name", login),
            role: "Staff".to_string(),
            login: login.to_string(),
            password: "pw".to_string(),
            is_operational: operational,
            is_management: management,
        },
    )
    .expect("create user");
    auth::authenticate(store, login, "pw").expect("login")
}

fn add_row(store: &Store, table: &str, pairs: &[&str]) -> i64 {
    let pairs: Vec<String> = pairs.iter().map(|p| p.to_string()).collect();
    manage::add_row(store, "test", manage::table_spec(table).expect("spec"), &pairs).expect("add row")
}

fn water_add(aquarium: i64, temperature: f64, ph: f64, oxygen: f64) -> WaterCli {
    WaterCli {
        command: WaterCommand::Add {
            aquarium,
            temperature,
            ph,
            oxygen,
        },
    }
}

fn feeding_add(aquarium: i64, date: &str, food_type: &str, total: f64) -> FeedingCli {
    FeedingCli {
        command: FeedingCommand::Add {
            aquarium,
            date: date.to_string(),
            food_type: food_type.to_string(),
            total,
        },
    }
}

#[test]
fn test_water_readings_and_series() {
    let (_tmp, store) = fresh_store();
    let op = user(&store, "op", true, false);
    let aq = add_row(&store, "aquariums", &["volume=80"]);

    assert!(water_series(&store, "op", aq).expect("empty series").is_empty());
    run_water_cli(
        &store,
        &op,
        OutputFormat::Text,
        WaterCli {
            command: WaterCommand::Series { aquarium: aq },
        },
    )
    .expect("empty series prints no data");

    run_water_cli(&store, &op, OutputFormat::Text, water_add(aq, 22.0, 7.1, 8.5)).expect("add");
    run_water_cli(&store, &op, OutputFormat::Json, water_add(aq, 23.5, 6.9, 7.8)).expect("add");

    let series = water_series(&store, "op", aq).expect("series");
    assert_eq!(series.aquarium_id, aq);
    assert_eq!(series.temperature, vec![22.0, 23.5]);
    assert_eq!(series.ph, vec![7.1, 6.9]);
    assert_eq!(series.oxygen, vec![8.5, 7.8]);
    assert_eq!(series.dates.len(), 2);

    run_water_cli(
        &store,
        &op,
        OutputFormat::Text,
        WaterCli {
            command: WaterCommand::List { aquarium: aq },
        },
    )
    .expect("list");
}

#[test]
fn test_water_ranges_are_inclusive() {
    let (_tmp, store) = fresh_store();
    let op = user(&store, "op", true, false);
    let aq = add_row(&store, "aquariums", &["volume=80"]);

    run_water_cli(&store, &op, OutputFormat::Text, water_add(aq, 0.0, 0.0, 0.0)).expect("lower bounds");
    run_water_cli(&store, &op, OutputFormat::Text, water_add(aq, 40.0, 14.0, 20.0)).expect("upper bounds");
    for cli in [
        water_add(aq, 40.1, 7.0, 8.0),
        water_add(aq, 25.0, -0.1, 8.0),
        water_add(aq, 25.0, 7.0, 20.5),
    ] {
        let err = run_water_cli(&store, &op, OutputFormat::Text, cli).unwrap_err();
        assert!(matches!(err, AquaError::ValidationError(_)));
    }
    let stored = SqliteRepository::new(&store, "test")
        .water_history(aq, SortOrder::NewestFirst)
        .expect("history");
    assert_eq!(stored.len(), 2);
}

#[test]
fn test_feedings_use_the_aquarium_species() {
    let (_tmp, store) = fresh_store();
    let op = user(&store, "op", true, false);
    let aq = add_row(&store, "aquariums", &["volume=500"]);
    let aq_str = format!("aquarium_id={}", aq);
    add_row(&store, "seafood", &["species_name=King crab", aq_str.as_str()]);

    run_feeding_cli(&store, &op, OutputFormat::Text, feeding_add(aq, "2024-04-01", "live", 120.0)).expect("add");
    run_feeding_cli(&store, &op, OutputFormat::Text, feeding_add(aq, "2024-04-02", "Plant", 80.25)).expect("add");

    let history = SqliteRepository::new(&store, "test").feeding_history(aq).expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].fed_at, "2024-04-02");
    assert_eq!(history[0].food_type, "Plant");
    assert_eq!(history[1].food_type, "Live");
    assert!(history.iter().all(|r| r.species_name.as_deref() == Some("King crab")));

    run_feeding_cli(
        &store,
        &op,
        OutputFormat::Json,
        FeedingCli {
            command: FeedingCommand::List { aquarium: aq },
        },
    )
    .expect("list");
}

#[test]
fn test_feeding_input_is_validated() {
    let (_tmp, store) = fresh_store();
    let op = user(&store, "op", true, false);
    let aq = add_row(&store, "aquariums", &["volume=500"]);
    let aq_str = format!("aquarium_id={}", aq);
    add_row(&store, "seafood", &["species_name=Mussel", aq_str.as_str()]);

    for cli in [
        feeding_add(aq, "2024-04-01", "pellets", 10.0),
        feeding_add(aq, "04/01/2024", "Dry", 10.0),
        feeding_add(aq, "2024-04-01", "Dry", -1.0),
        feeding_add(aq, "2024-04-01", "Dry", 1_000_000.0),
    ] {
        let err = run_feeding_cli(&store, &op, OutputFormat::Text, cli).unwrap_err();
        assert!(matches!(err, AquaError::ValidationError(_)));
    }
    assert!(SqliteRepository::new(&store, "test").feeding_history(aq).expect("history").is_empty());
}

#[test]
fn test_overview_reports_missing_values() {
    let (_tmp, store) = fresh_store();
    let op = user(&store, "op", true, false);
    let empty = add_row(&store, "aquariums", &["volume=60"]);
    let responsible = format!("responsible_user={}", op.user_id);
    let stocked = add_row(&store, "aquariums", &["volume=90", "aquarium_type=Breeding", responsible.as_str()]);
    let stocked_str = format!("aquarium_id={}", stocked);
    let seafood = add_row(&store, "seafood", &["species_name=Oyster", "normal_weight=85", stocked_str.as_str()]);
    let seafood_str = format!("seafood_id={}", seafood);
    add_row(&store, "optimal-parameters", &[seafood_str.as_str(), "optimal_temperature=16"]);

    let rows = aquarium::overview(&store, "op").expect("overview");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].aquarium_id, empty);
    assert_eq!(rows[0].species_name, "No data");
    assert_eq!(rows[0].last_check, "No data");
    assert_eq!(rows[0].status.as_deref(), Some("Active"));
    assert_eq!(rows[0].aquarium_type.as_deref(), Some("Commercial"));
    assert_eq!(rows[1].species_name, "Oyster");
    assert_eq!(rows[1].responsible.as_deref(), Some("op name"));

    let info = aquarium::info(&store, "op", stocked).expect("info");
    let params = info.species.expect("species parameters");
    assert_eq!(params.normal_weight, Some(85.0));
    assert_eq!(params.optimal_temperature, Some(16.0));
    assert!(aquarium::info(&store, "op", empty).expect("info").species.is_none());

    aquarium::print_overview(&store, &op, OutputFormat::Text).expect("print overview");
    aquarium::print_info(&store, &op, stocked, OutputFormat::Json).expect("print info");
}

#[test]
fn test_info_for_unknown_aquarium() {
    let (_tmp, store) = fresh_store();
    assert!(matches!(
        aquarium::info(&store, "op", 12),
        Err(AquaError::NotFound(_))
    ));
}

#[test]
fn test_operational_view_requires_role() {
    let (_tmp, store) = fresh_store();
    let manager = user(&store, "boss", false, true);
    let aq = add_row(&store, "aquariums", &["volume=60"]);

    assert!(matches!(
        aquarium::print_overview(&store, &manager, OutputFormat::Text),
        Err(AquaError::AuthError(_))
    ));
    assert!(matches!(
        run_water_cli(&store, &manager, OutputFormat::Text, water_add(aq, 20.0, 7.0, 8.0)),
        Err(AquaError::AuthError(_))
    ));
    assert!(matches!(
        run_feeding_cli(&store, &manager, OutputFormat::Text, feeding_add(aq, "2024-01-01", "Dry", 1.0)),
        Err(AquaError::AuthError(_))
    ));
}
