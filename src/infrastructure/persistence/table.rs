//! Row mapping between entity field structs and their SQLite tables

use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::Row;

use crate::domain::entities::{
    EcosystemFields, EntityFields, EventFields, LocationFields, OrganizationFields, ProjectFields,
    Record, RoleFields, SectorFields, StageFields,
};
use crate::domain::value_objects::Admission;

pub type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// An entity field set that maps onto one SQLite table
///
/// `COLUMNS` lists the writable columns in the order `bind_fields` binds them.
/// The bookkeeping columns (`id`, `created_at`, `updated_at`, `deleted_at`)
/// are handled by the repository.
pub trait SqliteTable: EntityFields {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn bind_fields<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q>;

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error>;
}

pub fn record_from_row<F: SqliteTable>(row: &SqliteRow) -> Result<Record<F::Id, F>, sqlx::Error> {
    Ok(Record {
        id: F::Id::from(row.try_get::<i64, _>("id")?),
        fields: F::from_row(row)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

impl SqliteTable for OrganizationFields {
    const TABLE: &'static str = "organizations";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "website",
        "target_group",
        "description",
        "date_founded",
        "date_registered",
        "tin_number",
    ];

    fn bind_fields<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.name.as_str())
            .bind(self.website.as_deref())
            .bind(self.target_group.as_deref())
            .bind(self.description.as_deref())
            .bind(self.date_founded)
            .bind(self.date_registered)
            .bind(self.tin_number.as_deref())
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            name: row.try_get("name")?,
            website: row.try_get("website")?,
            target_group: row.try_get("target_group")?,
            description: row.try_get("description")?,
            date_founded: row.try_get("date_founded")?,
            date_registered: row.try_get("date_registered")?,
            tin_number: row.try_get("tin_number")?,
        })
    }
}

impl SqliteTable for LocationFields {
    const TABLE: &'static str = "locations";
    const COLUMNS: &'static [&'static str] = &["address", "longitude", "latitude"];

    fn bind_fields<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.address.as_str())
            .bind(self.longitude)
            .bind(self.latitude)
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            address: row.try_get("address")?,
            longitude: row.try_get("longitude")?,
            latitude: row.try_get("latitude")?,
        })
    }
}

impl SqliteTable for EventFields {
    const TABLE: &'static str = "events";
    const COLUMNS: &'static [&'static str] =
        &["name", "description", "start_date", "end_date", "free_or_paid"];

    fn bind_fields<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.name.as_str())
            .bind(self.description.as_deref())
            .bind(self.start_date)
            .bind(self.end_date)
            .bind(self.free_or_paid.map(Admission::as_str))
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let free_or_paid = row
            .try_get::<Option<String>, _>("free_or_paid")?
            .map(|raw| raw.parse::<Admission>())
            .transpose()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "free_or_paid".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            free_or_paid,
        })
    }
}

impl SqliteTable for ProjectFields {
    const TABLE: &'static str = "projects";
    const COLUMNS: &'static [&'static str] = &["name", "description", "start_date", "end_date"];

    fn bind_fields<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.name.as_str())
            .bind(self.description.as_deref())
            .bind(self.start_date)
            .bind(self.end_date)
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
        })
    }
}

// Ecosystem, Stage, Sector and Role share the same (name, description) shape.
macro_rules! named_table {
    ($fields:ident, $table:literal) => {
        impl SqliteTable for $fields {
            const TABLE: &'static str = $table;
            const COLUMNS: &'static [&'static str] = &["name", "description"];

            fn bind_fields<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
                query
                    .bind(self.name.as_str())
                    .bind(self.description.as_deref())
            }

            fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
                Ok(Self {
                    name: row.try_get("name")?,
                    description: row.try_get("description")?,
                })
            }
        }
    };
}

named_table!(EcosystemFields, "ecosystems");
named_table!(StageFields, "stages");
named_table!(SectorFields, "sectors");
named_table!(RoleFields, "roles");
