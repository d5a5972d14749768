//! Shared fixtures for storage integration tests
//!
//! Provides the `Person` record used throughout the tests, a fixed
//! four-person dataset, and seeded random data generation.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strata_index_storage::{IndexMap, PrimaryIndex, SecondaryIndex};

pub const NAME_INDEX: &str = "name";
pub const CITY_INDEX: &str = "city";
pub const LIKE_INDEX: &str = "like";
pub const INVALID_INDEX: &str = "invalid";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub age: u32,
    pub city: String,
    pub like: Vec<String>,
}

pub fn person(id: i64, name: &str, age: u32, city: &str, like: &[&str]) -> Person {
    Person {
        id,
        name: name.to_string(),
        age,
        city: city.to_string(),
        like: like.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn gen_persons() -> Vec<Person> {
    vec![
        person(0, "Ashe", 38, "San Francisco", &["Bob", "Cassidy"]),
        person(1, "Bob", 18, "San Francisco", &[]),
        person(2, "Cassidy", 40, "Shanghai", &["Bob", "Ashe"]),
        person(3, "Harald", 40, "Nürnberg", &["Cassidy"]),
    ]
}

pub const NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
    "Charles", "Karen", "Amber", "Carol", "Hugo", "Tracer",
];

pub const CITIES: &[&str] = &[
    "Bladensburg", "Brambleton", "Edenburg", "Dubois", "Cotopaxi", "Sperryville", "Westboro",
    "Tonopah", "Fowlerville", "Venice", "Wanship", "Haring", "Morriston", "Gambrills", "London",
];

pub fn random_person(id: i64, rng: &mut StdRng) -> Person {
    let friends = rng.gen_range(0..3);
    Person {
        id,
        name: NAMES[rng.gen_range(0..NAMES.len())].to_string(),
        age: rng.gen_range(0..103),
        city: CITIES[rng.gen_range(0..CITIES.len())].to_string(),
        like: (0..friends)
            .map(|_| NAMES[rng.gen_range(0..NAMES.len())].to_string())
            .collect(),
    }
}

pub fn random_persons(n: usize, seed: u64) -> Vec<Person> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n as i64).map(|id| random_person(id, &mut rng)).collect()
}

/// Map keyed by id with no secondary indexes
pub fn empty_map() -> IndexMap<i64, Person> {
    IndexMap::new(PrimaryIndex::new(|p: &Person| p.id))
}

/// Register the name, city and like indexes
pub fn add_standard_indexes(map: &IndexMap<i64, Person>) {
    assert!(map.add_index(NAME_INDEX, SecondaryIndex::by_field(|p: &Person| p.name.clone())));
    assert!(map.add_index(CITY_INDEX, SecondaryIndex::by_field(|p: &Person| p.city.clone())));
    assert!(map.add_index(
        LIKE_INDEX,
        SecondaryIndex::by_elements(|p: &Person| p.like.as_slice())
    ));
}

/// Indexed map holding `n` seeded random persons
pub fn create_test_map(n: usize) -> IndexMap<i64, Person> {
    let map = empty_map();
    add_standard_indexes(&map);
    map.insert_many(random_persons(n, 123));
    map
}

pub fn sorted_ids<P: std::ops::Deref<Target = Person>>(values: &[P]) -> Vec<i64> {
    let mut ids: Vec<i64> = values.iter().map(|p| p.id).collect();
    ids.sort();
    ids
}

/// Route engine tracing to the test harness; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
