//! Pivot (many-to-many) link operations
//!
//! A [`Relation`] names a pivot table and the two key columns joining an owner
//! entity to a related entity, plus an optional metadata column stored on the
//! pivot row. All functions take a borrowed connection so they can be composed
//! inside a transaction.

use std::marker::PhantomData;

use chrono::Utc;
use sqlx::{Row, SqliteConnection};

use super::table::{record_from_row, SqliteTable};
use crate::application::ports::outbound::StoreError;
use crate::domain::entities::{
    EcosystemFields, EventFields, LinkInfo, Linked, LocationFields, OrganizationFields,
    ProjectFields, Record, RoleFields, SectorFields, StageFields,
};

/// A pivot table linking owner `O` to related `R`
pub struct Relation<O, R> {
    pub pivot: &'static str,
    pub owner_key: &'static str,
    pub related_key: &'static str,
    pub metadata: Option<&'static str>,
    marker: PhantomData<fn() -> (O, R)>,
}

impl<O, R> Relation<O, R> {
    pub const fn new(
        pivot: &'static str,
        owner_key: &'static str,
        related_key: &'static str,
        metadata: Option<&'static str>,
    ) -> Self {
        Self {
            pivot,
            owner_key,
            related_key,
            metadata,
            marker: PhantomData,
        }
    }
}

/// An owner entity joined to `R` through exactly one pivot table
pub trait Pivot<R: SqliteTable>: SqliteTable {
    const RELATION: Relation<Self, R>;
}

macro_rules! pivot {
    ($owner:ty => $related:ty, $relation:ident) => {
        impl Pivot<$related> for $owner {
            const RELATION: Relation<Self, $related> = $relation;
        }
    };
}

pub const ORGANIZATION_ROLES: Relation<OrganizationFields, RoleFields> =
    Relation::new("organization_roles", "organization_id", "role_id", None);

pub const ORGANIZATION_SECTORS: Relation<OrganizationFields, SectorFields> = Relation::new(
    "organization_sectors",
    "organization_id",
    "sector_id",
    Some("description"),
);

pub const ORGANIZATION_LOCATIONS: Relation<OrganizationFields, LocationFields> =
    Relation::new("organization_locations", "organization_id", "location_id", None);

pub const ORGANIZATION_STAGES: Relation<OrganizationFields, StageFields> =
    Relation::new("organization_stages", "organization_id", "stage_id", None);

pub const ORGANIZATION_EVENTS: Relation<OrganizationFields, EventFields> =
    Relation::new("organization_events", "organization_id", "event_id", None);

pub const ORGANIZATION_PROJECTS: Relation<OrganizationFields, ProjectFields> =
    Relation::new("organization_projects", "organization_id", "project_id", None);

// Both directions share the ecosystem_organizations pivot.
pub const ORGANIZATION_ECOSYSTEMS: Relation<OrganizationFields, EcosystemFields> = Relation::new(
    "ecosystem_organizations",
    "organization_id",
    "ecosystem_id",
    Some("status"),
);

pub const ECOSYSTEM_ORGANIZATIONS: Relation<EcosystemFields, OrganizationFields> = Relation::new(
    "ecosystem_organizations",
    "ecosystem_id",
    "organization_id",
    Some("status"),
);

pivot!(OrganizationFields => RoleFields, ORGANIZATION_ROLES);
pivot!(OrganizationFields => SectorFields, ORGANIZATION_SECTORS);
pivot!(OrganizationFields => LocationFields, ORGANIZATION_LOCATIONS);
pivot!(OrganizationFields => StageFields, ORGANIZATION_STAGES);
pivot!(OrganizationFields => EventFields, ORGANIZATION_EVENTS);
pivot!(OrganizationFields => ProjectFields, ORGANIZATION_PROJECTS);
pivot!(OrganizationFields => EcosystemFields, ORGANIZATION_ECOSYSTEMS);
pivot!(EcosystemFields => OrganizationFields, ECOSYSTEM_ORGANIZATIONS);

/// Insert a pivot row
///
/// When `metadata` is `None` the metadata column is left to its default.
/// Metadata for a pivot without a metadata column is refused. A duplicate
/// pair fails with `StoreError::Duplicate`, an unknown id on either side with
/// `StoreError::MissingReference`.
pub async fn attach<O: SqliteTable, R: SqliteTable>(
    conn: &mut SqliteConnection,
    relation: &Relation<O, R>,
    owner: O::Id,
    related: R::Id,
    metadata: Option<&str>,
) -> Result<(), StoreError> {
    let metadata = match (relation.metadata, metadata) {
        (Some(column), Some(value)) => Some((column, value)),
        (None, Some(_)) => {
            return Err(StoreError::Database(format!(
                "{} has no metadata column",
                relation.pivot
            )))
        }
        (_, None) => None,
    };

    let sql = match metadata {
        Some((column, _)) => format!(
            "INSERT INTO {} ({}, {}, {}, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
            relation.pivot, relation.owner_key, relation.related_key, column
        ),
        None => format!(
            "INSERT INTO {} ({}, {}, created_at, updated_at) VALUES (?, ?, ?, ?)",
            relation.pivot, relation.owner_key, relation.related_key
        ),
    };

    let now = Utc::now();
    let mut query = sqlx::query(&sql)
        .bind(Into::<i64>::into(owner))
        .bind(Into::<i64>::into(related));
    if let Some((_, value)) = metadata {
        query = query.bind(value);
    }
    query.bind(now).bind(now).execute(&mut *conn).await?;

    tracing::debug!(
        "Linked {} {} to {} {} via {}",
        O::ENTITY,
        owner,
        R::ENTITY,
        related,
        relation.pivot
    );
    Ok(())
}

/// Remove a pivot row; `false` if the pair was not linked
pub async fn detach<O: SqliteTable, R: SqliteTable>(
    conn: &mut SqliteConnection,
    relation: &Relation<O, R>,
    owner: O::Id,
    related: R::Id,
) -> Result<bool, StoreError> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ? AND {} = ?",
        relation.pivot, relation.owner_key, relation.related_key
    );

    let result = sqlx::query(&sql)
        .bind(Into::<i64>::into(owner))
        .bind(Into::<i64>::into(related))
        .execute(&mut *conn)
        .await?;

    let removed = result.rows_affected() > 0;
    if removed {
        tracing::debug!(
            "Unlinked {} {} from {} {} via {}",
            O::ENTITY,
            owner,
            R::ENTITY,
            related,
            relation.pivot
        );
    }
    Ok(removed)
}

/// Live related records linked to `owner`, in link order
pub async fn list_linked<O: SqliteTable, R: SqliteTable>(
    conn: &mut SqliteConnection,
    relation: &Relation<O, R>,
    owner: O::Id,
) -> Result<Vec<Linked<Record<R::Id, R>>>, StoreError> {
    let metadata = relation
        .metadata
        .map(|column| format!("p.{column}"))
        .unwrap_or_else(|| "NULL".to_string());
    let sql = format!(
        "SELECT r.*, {metadata} AS link_metadata, p.created_at AS linked_at \
         FROM {related} r \
         JOIN {pivot} p ON p.{related_key} = r.id \
         WHERE p.{owner_key} = ? AND r.deleted_at IS NULL \
         ORDER BY p.id",
        related = R::TABLE,
        pivot = relation.pivot,
        related_key = relation.related_key,
        owner_key = relation.owner_key,
    );

    let rows = sqlx::query(&sql)
        .bind(Into::<i64>::into(owner))
        .fetch_all(&mut *conn)
        .await?;

    rows.iter()
        .map(|row| {
            Ok(Linked {
                record: record_from_row::<R>(row)?,
                link: LinkInfo {
                    metadata: row.try_get("link_metadata")?,
                    linked_at: row.try_get("linked_at")?,
                },
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()
        .map_err(StoreError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::record_repository::{insert, soft_delete};
    use crate::infrastructure::persistence::SqliteRepository;

    #[tokio::test]
    async fn test_attach_and_list_with_metadata() {
        let repository = SqliteRepository::in_memory().await;
        let mut conn = repository.pool().acquire().await.unwrap();

        let org = insert(&mut conn, &OrganizationFields::new("Acme")).await.unwrap();
        let sector = insert(&mut conn, &SectorFields::new("ICT")).await.unwrap();

        attach(&mut conn, &ORGANIZATION_SECTORS, org.id, sector.id, Some("Tech"))
            .await
            .unwrap();

        let linked = list_linked(&mut conn, &ORGANIZATION_SECTORS, org.id).await.unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].record.id, sector.id);
        // The sector's own description is untouched; the link carries "Tech"
        assert_eq!(linked[0].record.fields.description, None);
        assert_eq!(linked[0].link.metadata.as_deref(), Some("Tech"));
    }

    #[tokio::test]
    async fn test_status_defaults_to_active_when_omitted() {
        let repository = SqliteRepository::in_memory().await;
        let mut conn = repository.pool().acquire().await.unwrap();

        let org = insert(&mut conn, &OrganizationFields::new("Acme")).await.unwrap();
        let ecosystem = insert(&mut conn, &EcosystemFields::new("Nairobi")).await.unwrap();

        attach(&mut conn, &ECOSYSTEM_ORGANIZATIONS, ecosystem.id, org.id, None)
            .await
            .unwrap();

        // Visible from both directions
        let members = list_linked(&mut conn, &ECOSYSTEM_ORGANIZATIONS, ecosystem.id)
            .await
            .unwrap();
        assert_eq!(members[0].link.metadata.as_deref(), Some("active"));
        let ecosystems = list_linked(&mut conn, &ORGANIZATION_ECOSYSTEMS, org.id)
            .await
            .unwrap();
        assert_eq!(ecosystems[0].record.id, ecosystem.id);
    }

    #[tokio::test]
    async fn test_duplicate_pair_is_rejected() {
        let repository = SqliteRepository::in_memory().await;
        let mut conn = repository.pool().acquire().await.unwrap();

        let org = insert(&mut conn, &OrganizationFields::new("Acme")).await.unwrap();
        let role = insert(&mut conn, &RoleFields::new("Funder")).await.unwrap();

        attach(&mut conn, &ORGANIZATION_ROLES, org.id, role.id, None)
            .await
            .unwrap();
        let second = attach(&mut conn, &ORGANIZATION_ROLES, org.id, role.id, None).await;
        assert!(matches!(second, Err(StoreError::Duplicate(_))));

        let linked = list_linked(&mut conn, &ORGANIZATION_ROLES, org.id).await.unwrap();
        assert_eq!(linked.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_foreign_key_is_rejected() {
        let repository = SqliteRepository::in_memory().await;
        let mut conn = repository.pool().acquire().await.unwrap();

        let org = insert(&mut conn, &OrganizationFields::new("Acme")).await.unwrap();
        let result = attach(
            &mut conn,
            &ORGANIZATION_ROLES,
            org.id,
            crate::domain::value_objects::RoleId::new(999),
            None,
        )
        .await;
        assert!(matches!(result, Err(StoreError::MissingReference(_))));
    }

    #[tokio::test]
    async fn test_metadata_without_column_is_refused() {
        let repository = SqliteRepository::in_memory().await;
        let mut conn = repository.pool().acquire().await.unwrap();

        let org = insert(&mut conn, &OrganizationFields::new("Acme")).await.unwrap();
        let role = insert(&mut conn, &RoleFields::new("Funder")).await.unwrap();

        let result = attach(&mut conn, &ORGANIZATION_ROLES, org.id, role.id, Some("lead")).await;
        assert!(matches!(result, Err(StoreError::Database(_))));
        assert!(list_linked(&mut conn, &ORGANIZATION_ROLES, org.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_detach_only_removes_named_pair() {
        let repository = SqliteRepository::in_memory().await;
        let mut conn = repository.pool().acquire().await.unwrap();

        let org = insert(&mut conn, &OrganizationFields::new("Acme")).await.unwrap();
        let stage_a = insert(&mut conn, &StageFields::new("Idea")).await.unwrap();
        let stage_b = insert(&mut conn, &StageFields::new("Growth")).await.unwrap();
        attach(&mut conn, &ORGANIZATION_STAGES, org.id, stage_a.id, None)
            .await
            .unwrap();
        attach(&mut conn, &ORGANIZATION_STAGES, org.id, stage_b.id, None)
            .await
            .unwrap();

        assert!(detach(&mut conn, &ORGANIZATION_STAGES, org.id, stage_a.id)
            .await
            .unwrap());
        assert!(!detach(&mut conn, &ORGANIZATION_STAGES, org.id, stage_a.id)
            .await
            .unwrap());

        let linked = list_linked(&mut conn, &ORGANIZATION_STAGES, org.id).await.unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].record.id, stage_b.id);
    }

    #[tokio::test]
    async fn test_soft_deleted_related_rows_are_not_listed() {
        let repository = SqliteRepository::in_memory().await;
        let mut conn = repository.pool().acquire().await.unwrap();

        let org = insert(&mut conn, &OrganizationFields::new("Acme")).await.unwrap();
        let project = insert(&mut conn, &ProjectFields::new("Library")).await.unwrap();
        attach(&mut conn, &ORGANIZATION_PROJECTS, org.id, project.id, None)
            .await
            .unwrap();
        soft_delete::<ProjectFields>(&mut conn, project.id).await.unwrap();

        let linked = list_linked(&mut conn, &ORGANIZATION_PROJECTS, org.id).await.unwrap();
        assert!(linked.is_empty());
    }
}
