//! Repository for the `categories`, `locations`, and `vendors` tables.
//!
//! The three tables share one shape, so one repository serves all of
//! them keyed by [`ReferenceKind`].

use inventra_core::entity::{NewReference, ReferenceKind};
use sqlx::PgPool;

use crate::models::reference::ReferenceRow;

/// Column list for `locations` queries.
const LOCATION_COLUMNS: &str = "id, name, parent_id, created_at, updated_at";

/// Column list for `categories` and `vendors`, which have no parent.
const FLAT_COLUMNS: &str = "id, name, NULL::BIGINT AS parent_id, created_at, updated_at";

fn table(kind: ReferenceKind) -> &'static str {
    match kind {
        ReferenceKind::Category => "categories",
        ReferenceKind::Location => "locations",
        ReferenceKind::Vendor => "vendors",
    }
}

fn columns(kind: ReferenceKind) -> &'static str {
    match kind {
        ReferenceKind::Location => LOCATION_COLUMNS,
        _ => FLAT_COLUMNS,
    }
}

/// Provides list/create for reference entities.
pub struct ReferenceRepo;

impl ReferenceRepo {
    /// All entities of `kind`, oldest first.
    pub async fn list(
        pool: &PgPool,
        kind: ReferenceKind,
    ) -> Result<Vec<ReferenceRow>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM {} ORDER BY id",
            columns(kind),
            table(kind)
        );
        sqlx::query_as::<_, ReferenceRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Insert a new entity. `parent_id` is ignored for non-location kinds.
    pub async fn create(
        pool: &PgPool,
        kind: ReferenceKind,
        input: &NewReference,
    ) -> Result<ReferenceRow, sqlx::Error> {
        let query = match kind {
            ReferenceKind::Location => format!(
                "INSERT INTO locations (name, parent_id) VALUES ($1, $2) \
                 RETURNING {LOCATION_COLUMNS}"
            ),
            _ => format!(
                "INSERT INTO {} (name) VALUES ($1) RETURNING {FLAT_COLUMNS}",
                table(kind)
            ),
        };
        let mut q = sqlx::query_as::<_, ReferenceRow>(&query).bind(&input.name);
        if kind == ReferenceKind::Location {
            q = q.bind(input.parent_id);
        }
        q.fetch_one(pool).await
    }
}
