use tracing::{debug, info};

use crate::core::error::StoreResult;
use crate::models::user::NewUser;
use crate::stores::users::Users;

/// `(name, email, idCardNo)` of every seeded user, in insertion order.
pub const SEED_USERS: [(&str, &str, &str); 12] = [
    ("Alice", "alice@prisma.io", "10000-10000-001"),
    ("Bob", "bob@prisma.io", "10000-10000-002"),
    ("Charlie", "charlie@prisma.io", "10000-10000-003"),
    ("Diana", "diana@prisma.io", "10000-10000-004"),
    ("Edward", "edward@prisma.io", "10000-10000-005"),
    ("Fiona", "fiona@prisma.io", "10000-10000-006"),
    ("George", "george@prisma.io", "10000-10000-007"),
    ("Hannah", "hannah@prisma.io", "10000-10000-008"),
    ("Isaac", "isaac@prisma.io", "10000-10000-009"),
    ("Julia", "julia@prisma.io", "10000-10000-010"),
    ("Kevin", "kevin@prisma.io", "10000-10000-011"),
    ("Luna", "luna@prisma.io", "10000-10000-012"),
];

pub fn seed_users() -> Vec<NewUser> {
    SEED_USERS
        .iter()
        .map(|(name, email, id_card_no)| NewUser::new(*name, *email, *id_card_no))
        .collect()
}

/// Insert the seed users one at a time, stopping at the first failure.
/// Rows created before the failure are left in place.
pub fn run_seed(users: &Users) -> StoreResult<usize> {
    let mut created = 0;

    for input in seed_users() {
        let email = input.email.clone();
        let user = users.create(input)?;
        debug!(user_id = user.id, email = %email, "Seeded user");
        created += 1;
    }

    info!(created, "Seed complete");
    Ok(created)
}
