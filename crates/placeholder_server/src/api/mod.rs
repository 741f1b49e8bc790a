//! In-memory stand-in for the `/todos` and random-user services.
//!
//! Reads are served from a catalog generated once at startup. Writes are
//! answered as if they succeeded but never change the catalog, so a client
//! sees the same non-persistent behavior it would get from the public demo
//! API.

use std::sync::{Arc, Mutex, PoisonError};

use rand::{rngs::StdRng, Rng, SeedableRng};
use shared::{
    domain::{OwnerId, TaskId},
    error::{ApiError, ErrorCode},
    protocol::{
        CreateTaskRequest, RandomUser, RandomUserLocation, RandomUserLogin, RandomUserName,
        RandomUserPicture, RemoteTask, UpdateTaskRequest,
    },
};
use uuid::Builder;

pub const TASKS_PER_OWNER: usize = 20;
pub const MAX_RESULTS: usize = 5_000;

const TITLE_WORDS: &[&str] = &[
    "delectus", "aut", "autem", "quis", "ut", "nam", "facilis", "et", "officia", "qui",
    "fugiat", "veritatis", "laborum", "illo", "expedita", "consequatur", "quia", "in",
    "molestiae", "porro", "tempora", "repellendus", "sunt", "dolores", "voluptas",
];

const FIRST_NAMES: &[&str] = &[
    "Ada", "Bruno", "Chiara", "Dmitri", "Elif", "Farah", "Goran", "Hana", "Ines", "Jonas",
    "Keiko", "Luca", "Maya", "Nils", "Olga", "Pedro",
];

const LAST_NAMES: &[&str] = &[
    "Almeida", "Berg", "Costa", "Dubois", "Eriksen", "Fischer", "Garcia", "Horvat", "Ivanova",
    "Jensen", "Kowalski", "Lindqvist", "Moreau", "Novak",
];

const PLACES: &[(&str, &str)] = &[
    ("Lisbon", "Portugal"),
    ("Oslo", "Norway"),
    ("Lyon", "France"),
    ("Graz", "Austria"),
    ("Cork", "Ireland"),
    ("Tampere", "Finland"),
    ("Utrecht", "Netherlands"),
    ("Valencia", "Spain"),
];

#[derive(Clone)]
pub struct ApiContext {
    catalog: Arc<Vec<RemoteTask>>,
    rng: Arc<Mutex<StdRng>>,
}

impl ApiContext {
    pub fn new(task_count: usize, rng_seed: Option<u64>) -> Self {
        let mut rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let catalog = seed_catalog(task_count, &mut rng);
        Self {
            catalog: Arc::new(catalog),
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    pub fn catalog(&self) -> &[RemoteTask] {
        &self.catalog
    }
}

/// Generates `count` tasks with ids `1..=count`, twenty per owner.
pub fn seed_catalog(count: usize, rng: &mut impl Rng) -> Vec<RemoteTask> {
    (0..count)
        .map(|index| {
            let words = rng.random_range(2..=5);
            let title = (0..words)
                .map(|_| pick(rng, TITLE_WORDS))
                .collect::<Vec<_>>()
                .join(" ");
            RemoteTask {
                id: TaskId(index as i64 + 1),
                user_id: OwnerId((index / TASKS_PER_OWNER) as i64 + 1),
                title,
                completed: rng.random_bool(0.5),
                description: None,
            }
        })
        .collect()
}

pub fn list_tasks(ctx: &ApiContext) -> Vec<RemoteTask> {
    ctx.catalog.as_ref().clone()
}

pub fn get_task(ctx: &ApiContext, id: TaskId) -> Result<RemoteTask, ApiError> {
    ctx.catalog
        .iter()
        .find(|task| task.id == id)
        .cloned()
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, format!("task {id} not found")))
}

/// Echoes the request under the next id. The catalog is left as it was, so
/// every create answers with the same id.
pub fn create_task(ctx: &ApiContext, request: CreateTaskRequest) -> RemoteTask {
    RemoteTask {
        id: TaskId(ctx.catalog.len() as i64 + 1),
        user_id: request.user_id,
        title: request.title,
        completed: request.completed,
        description: None,
    }
}

/// Echoes the request for seeded ids; anything else fails as an internal error.
pub fn update_task(
    ctx: &ApiContext,
    id: TaskId,
    request: UpdateTaskRequest,
) -> Result<RemoteTask, ApiError> {
    if !ctx.catalog.iter().any(|task| task.id == id) {
        return Err(ApiError::new(
            ErrorCode::Internal,
            format!("cannot update task {id}"),
        ));
    }
    Ok(RemoteTask {
        id,
        user_id: request.user_id,
        title: request.title,
        completed: request.completed,
        description: None,
    })
}

/// Clamps `requested` to `1..=MAX_RESULTS`; a missing count means one.
pub fn result_count(requested: Option<usize>) -> usize {
    requested.unwrap_or(1).clamp(1, MAX_RESULTS)
}

pub fn random_users(ctx: &ApiContext, count: usize) -> Vec<RandomUser> {
    let mut rng = ctx.rng.lock().unwrap_or_else(PoisonError::into_inner);
    (0..count).map(|_| random_user(&mut *rng)).collect()
}

fn random_user(rng: &mut impl Rng) -> RandomUser {
    let first = pick(rng, FIRST_NAMES);
    let last = pick(rng, LAST_NAMES);
    let (city, country) = PLACES[rng.random_range(0..PLACES.len())];
    let portrait = rng.random_range(0..10);
    let uuid = Builder::from_random_bytes(rng.random()).into_uuid();
    RandomUser {
        login: RandomUserLogin {
            uuid: uuid.to_string(),
        },
        name: RandomUserName {
            first: first.to_string(),
            last: last.to_string(),
        },
        email: format!(
            "{}.{}@example.com",
            first.to_lowercase(),
            last.to_lowercase()
        ),
        picture: RandomUserPicture {
            medium: format!("https://randomuser.me/api/portraits/med/lego/{portrait}.jpg"),
        },
        location: RandomUserLocation {
            city: city.to_string(),
            country: country.to_string(),
        },
        phone: format!(
            "({:03}) {:03}-{:04}",
            rng.random_range(100..1000),
            rng.random_range(0..1000),
            rng.random_range(0..10_000)
        ),
    }
}

fn pick<'a>(rng: &mut impl Rng, pool: &[&'a str]) -> &'a str {
    pool[rng.random_range(0..pool.len())]
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
