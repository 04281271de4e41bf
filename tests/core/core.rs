use aquadesk::core::auth::{self, NewUser};
use aquadesk::core::broker::{self, DbBroker};
use aquadesk::core::config::{CONFIG_FILE_NAME, Config};
use aquadesk::core::db;
use aquadesk::core::error::AquaError;
use aquadesk::core::repository::{
    Feeding, FoodType, NewObservation, ObservationRepository, SortOrder, SpeciesCheck, SqliteRepository,
    WaterReading,
};
use aquadesk::core::scoring::{self, SpeciesPopulationObservation, TankCondition, TankObservation};
use aquadesk::core::store::{DATA_DIR_NAME, Store};
use rusqlite::params;
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

fn add_aquarium(store: &Store) -> i64 {
    DbBroker::new(store)
        .with_conn("test", "test.aquarium", |conn| {
            conn.execute("INSERT INTO aquariums(volume) VALUES(?1)", params![200.0])?;
            Ok(conn.last_insert_rowid())
        })
        .expect("insert aquarium")
}

fn add_seafood(store: &Store, aquarium_id: i64, name: &str) -> i64 {
    DbBroker::new(store)
        .with_conn("test", "test.seafood", |conn| {
            conn.execute(
                "INSERT INTO seafood(species_name, aquarium_id) VALUES(?1, ?2)",
                params![name, aquarium_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .expect("insert seafood")
}

fn tank(filter: i64, glass: i64, algae: f64, clarity: f64) -> TankObservation {
    TankObservation {
        filter_state: filter,
        glass_state: glass,
        algae_level: algae,
        water_clarity: clarity,
    }
}

#[test]
fn init_creates_every_table_with_foreign_keys_on() {
    let (_tmp, store) = fresh_store();
    assert!(store.db_path().exists());

    let conn = db::db_connect(&store.db_path().to_string_lossy(), 5).expect("connect");
    let fk_on: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .expect("pragma");
    assert_eq!(fk_on, 1);

    for table in [
        "users",
        "aquariums",
        "seafood",
        "optimal_parameters",
        "product_readiness",
        "fridges",
        "tank_states",
        "species_states",
        "water_parameters",
        "feedings",
    ] {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table],
                |row| row.get(0),
            )
            .expect("sqlite_master");
        assert_eq!(count, 1, "missing table {}", table);
    }
}

#[test]
fn init_is_idempotent() {
    let (_tmp, store) = fresh_store();
    let aquarium = add_aquarium(&store);
    db::initialize_store(&store).expect("second init");
    let repo = SqliteRepository::new(&store, "test");
    repo.record(&NewObservation::Tank {
        aquarium_id: aquarium,
        observation: tank(2, 2, 0.0, 100.0),
    })
    .expect("record after re-init");
}

#[test]
fn broker_appends_one_audit_event_per_operation() {
    let (_tmp, store) = fresh_store();
    let before = broker::read_audit_log(&store).expect("audit").len();

    let broker = DbBroker::new(&store);
    broker
        .with_conn("alice", "test.ok", |_| Ok(()))
        .expect("ok op");
    let failed: Result<(), AquaError> = broker.with_conn("alice", "test.fail", |_| {
        Err(AquaError::ValidationError("nope".to_string()))
    });
    assert!(failed.is_err());

    let events = broker::read_audit_log(&store).expect("audit");
    assert_eq!(events.len(), before + 2);
    let ok = &events[before];
    assert_eq!(ok.actor, "alice");
    assert_eq!(ok.op, "test.ok");
    assert_eq!(ok.status, "success");
    assert_eq!(ok.db_id, "aquarium.db");
    assert!(ok.ts.ends_with('Z'));
    assert_eq!(events[before + 1].status, "error");
    assert_ne!(ok.event_id, events[before + 1].event_id);
}

#[test]
fn discover_walks_up_to_the_data_directory() {
    let (tmp, _store) = fresh_store();
    let nested = tmp.path().join("hall").join("row-3");
    fs::create_dir_all(&nested).expect("nested");

    let found = Store::discover(&nested).expect("discover");
    assert_eq!(found.root, tmp.path().join(DATA_DIR_NAME));

    let elsewhere = tempdir().expect("tempdir");
    assert!(matches!(
        Store::discover(elsewhere.path()),
        Err(AquaError::NotFound(_))
    ));
}

#[test]
fn config_file_overrides_database_file_and_history_limit() {
    let tmp = tempdir().expect("tempdir");
    let data_dir = tmp.path().join(DATA_DIR_NAME);
    fs::create_dir_all(&data_dir).expect("data dir");
    fs::write(
        data_dir.join(CONFIG_FILE_NAME),
        "[database]\nfile = \"farm.db\"\n\n[history]\nspecies_limit = 7\n",
    )
    .expect("write config");

    let store = Store::open(&data_dir).expect("open");
    assert_eq!(store.db_path(), data_dir.join("farm.db"));
    assert_eq!(store.config.history.species_limit, 7);
    assert_eq!(store.config.database.busy_timeout_secs, 5);

    db::initialize_store(&store).expect("init");
    assert!(data_dir.join("farm.db").exists());
}

#[test]
fn write_default_config_does_not_overwrite() {
    let tmp = tempdir().expect("tempdir");
    assert!(Config::write_default(tmp.path()).expect("first write"));
    let written = fs::read_to_string(tmp.path().join(CONFIG_FILE_NAME)).expect("read");
    assert_eq!(Config::parse(&written).expect("parse"), Config::default());

    fs::write(tmp.path().join(CONFIG_FILE_NAME), "[log]\nlevel = \"debug\"\n").expect("edit");
    assert!(!Config::write_default(tmp.path()).expect("second write"));
    assert_eq!(Config::load(tmp.path()).expect("load").log.level, "debug");
}

#[test]
fn malformed_config_is_a_config_error() {
    let tmp = tempdir().expect("tempdir");
    fs::write(tmp.path().join(CONFIG_FILE_NAME), "[history]\nspecies_limit = \"many\"\n").expect("write");
    assert!(matches!(Store::open(tmp.path()), Err(AquaError::ConfigError(_))));
}

#[test]
fn authentication_checks_hashed_passwords() {
    let (_tmp, store) = fresh_store();
    let id = auth::create_user(
        &store,
        "test",
        &NewUser {
            name: "Ivan Petrov".to_string(),
            role: "Technician".to_string(),
            login: "ivan".to_string(),
            password: "s3cret".to_string(),
            is_operational: true,
            is_management: false,
        },
    )
    .expect("create user");

    let user = auth::authenticate(&store, "ivan", "s3cret").expect("login");
    assert_eq!(user.user_id, id);
    assert!(user.is_operational);
    assert!(!user.is_management);

    for (login, password) in [("ivan", "wrong"), ("nobody", "s3cret")] {
        match auth::authenticate(&store, login, password) {
            Err(AquaError::AuthError(msg)) => assert_eq!(msg, "Invalid login or password"),
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    let stored: String = DbBroker::new(&store)
        .with_conn("test", "test.read_hash", |conn| {
            Ok(conn.query_row(
                "SELECT password_hash FROM users WHERE login = 'ivan'",
                [],
                |row| row.get(0),
            )?)
        })
        .expect("read hash");
    assert_ne!(stored, "s3cret");
    assert_eq!(stored, auth::hash_password("s3cret"));
}

#[test]
fn duplicate_login_is_rejected() {
    let (_tmp, store) = fresh_store();
    let user = NewUser {
        name: String::new(),
        role: String::new(),
        login: "olga".to_string(),
        password: "pw".to_string(),
        is_operational: false,
        is_management: true,
    };
    auth::create_user(&store, "test", &user).expect("first");
    assert!(matches!(
        auth::create_user(&store, "test", &user),
        Err(AquaError::ValidationError(_))
    ));

    auth::set_password(&store, "test", "olga", "new-pw").expect("passwd");
    assert!(auth::authenticate(&store, "olga", "new-pw").is_ok());
    assert!(matches!(
        auth::set_password(&store, "test", "ghost", "x"),
        Err(AquaError::NotFound(_))
    ));
}

#[test]
fn recorded_tank_state_reads_back_with_the_same_label() {
    let (_tmp, store) = fresh_store();
    let aquarium = add_aquarium(&store);
    let repo = SqliteRepository::new(&store, "test");

    let checks = [
        tank(2, 2, 0.0, 100.0),
        tank(0, 0, 100.0, 0.0),
        tank(1, 1, 50.0, 50.0),
    ];
    for obs in checks {
        repo.record(&NewObservation::Tank {
            aquarium_id: aquarium,
            observation: obs,
        })
        .expect("record");
    }

    let history = repo.tank_history(aquarium).expect("history");
    assert_eq!(history.len(), 3);
    // Newest first.
    assert_eq!(history[0].observation, checks[2]);
    assert_eq!(history[2].observation, checks[0]);
    assert!(history[0].tank_state_id > history[1].tank_state_id);

    for record in &history {
        let o = record.observation;
        assert_eq!(
            record.condition(),
            scoring::score_tank_condition(
                o.filter_state as f64,
                o.glass_state as f64,
                o.algae_level,
                o.water_clarity
            )
        );
    }
    assert_eq!(history[0].condition(), TankCondition::Satisfactory);
    assert_eq!(history[1].condition(), TankCondition::Critical);
    assert_eq!(history[2].condition(), TankCondition::Excellent);
}

#[test]
fn invalid_observations_write_nothing() {
    let (_tmp, store) = fresh_store();
    let aquarium = add_aquarium(&store);
    add_seafood(&store, aquarium, "Tilapia");
    let repo = SqliteRepository::new(&store, "test");

    let bad = [
        NewObservation::Tank {
            aquarium_id: aquarium,
            observation: tank(3, 2, 0.0, 50.0),
        },
        NewObservation::Tank {
            aquarium_id: aquarium,
            observation: tank(2, 2, 101.0, 50.0),
        },
        NewObservation::Species {
            aquarium_id: aquarium,
            check: SpeciesCheck {
                population: SpeciesPopulationObservation {
                    total: 10,
                    damaged: 11,
                    abnormal: 0,
                    dead: 0,
                },
                avg_size: 1.0,
                avg_weight: 1.0,
            },
        },
        NewObservation::Water {
            aquarium_id: aquarium,
            reading: WaterReading {
                temperature: 25.0,
                ph: 14.5,
                oxygen_level: 8.0,
            },
        },
        NewObservation::Feeding {
            aquarium_id: aquarium,
            feeding: Feeding {
                date: "2024-02-30x".to_string(),
                food_type: FoodType::Live,
                total_feed: 10.0,
            },
        },
        NewObservation::Feeding {
            aquarium_id: aquarium,
            feeding: Feeding {
                date: "2024-02-10".to_string(),
                food_type: FoodType::Live,
                total_feed: 1_000_000.0,
            },
        },
    ];
    for obs in &bad {
        assert!(
            matches!(repo.record(obs), Err(AquaError::ValidationError(_))),
            "accepted {:?}",
            obs
        );
    }

    assert!(repo.tank_history(aquarium).expect("tank").is_empty());
    assert!(repo.species_history(aquarium, 1, 50).expect("species").is_empty());
    assert!(repo.water_history(aquarium, SortOrder::NewestFirst).expect("water").is_empty());
    assert!(repo.feeding_history(aquarium).expect("feeding").is_empty());
}

#[test]
fn unknown_aquarium_is_not_found() {
    let (_tmp, store) = fresh_store();
    let repo = SqliteRepository::new(&store, "test");
    let result = repo.record(&NewObservation::Water {
        aquarium_id: 404,
        reading: WaterReading {
            temperature: 20.0,
            ph: 7.0,
            oxygen_level: 6.0,
        },
    });
    assert!(matches!(result, Err(AquaError::NotFound(_))));
}

#[test]
fn species_history_is_capped_and_newest_first() {
    let (_tmp, store) = fresh_store();
    let aquarium = add_aquarium(&store);
    let seafood = add_seafood(&store, aquarium, "Shrimp");
    let repo = SqliteRepository::new(&store, "test");

    let mut last_id = 0;
    for dead in 0..60u32 {
        last_id = repo
            .record(&NewObservation::Species {
                aquarium_id: aquarium,
                check: SpeciesCheck {
                    population: SpeciesPopulationObservation {
                        total: 100,
                        damaged: 0,
                        abnormal: 0,
                        dead,
                    },
                    avg_size: 4.2,
                    avg_weight: 12.0,
                },
            })
            .expect("record");
    }

    let history = repo.species_history(aquarium, seafood, 50).expect("history");
    assert_eq!(history.len(), 50);
    assert_eq!(history[0].health_id, last_id);
    assert_eq!(history[0].population.dead, 59);
    assert_eq!(history[49].population.dead, 10);
    assert_eq!(history[0].seafood_id, seafood);
    assert_eq!(history[0].avg_size, Some(4.2));
}

#[test]
fn feeding_requires_registered_seafood() {
    let (_tmp, store) = fresh_store();
    let aquarium = add_aquarium(&store);
    let repo = SqliteRepository::new(&store, "test");
    let feeding = NewObservation::Feeding {
        aquarium_id: aquarium,
        feeding: Feeding {
            date: "2024-06-01".to_string(),
            food_type: FoodType::Frozen,
            total_feed: 250.5,
        },
    };

    match repo.record(&feeding) {
        Err(AquaError::ValidationError(msg)) => assert!(msg.contains("no seafood")),
        other => panic!("expected validation error, got {:?}", other),
    }

    add_seafood(&store, aquarium, "Sturgeon");
    repo.record(&feeding).expect("record");
    let history = repo.feeding_history(aquarium).expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].fed_at, "2024-06-01");
    assert_eq!(history[0].food_type, "Frozen");
    assert_eq!(history[0].species_name.as_deref(), Some("Sturgeon"));
}

#[test]
fn water_history_order() {
    let (_tmp, store) = fresh_store();
    let aquarium = add_aquarium(&store);
    let repo = SqliteRepository::new(&store, "test");
    for temperature in [18.0, 19.5, 21.0] {
        repo.record(&NewObservation::Water {
            aquarium_id: aquarium,
            reading: WaterReading {
                temperature,
                ph: 7.2,
                oxygen_level: 9.0,
            },
        })
        .expect("record");
    }

    let newest: Vec<f64> = repo
        .water_history(aquarium, SortOrder::NewestFirst)
        .expect("newest")
        .iter()
        .map(|r| r.temperature)
        .collect();
    let ascending: Vec<f64> = repo
        .water_history(aquarium, SortOrder::Ascending)
        .expect("ascending")
        .iter()
        .map(|r| r.temperature)
        .collect();
    assert_eq!(newest, vec![21.0, 19.5, 18.0]);
    assert_eq!(ascending, vec![18.0, 19.5, 21.0]);
}
