use crate::errors::AppError;
use crate::models::{
    Company, CompanyListItem, CompanySuggestion, HasRegistrationDate, RegistryFilingEntry,
};
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Maximum rows returned by a search; the API does not paginate.
const SEARCH_LIMIT: i64 = 50;

/// Maximum autocomplete suggestions.
const SUGGESTION_LIMIT: i64 = 10;

/// Minimum query length before suggestions are computed.
const SUGGESTION_MIN_CHARS: usize = 3;

/// A registry filing row as stored in the database.
///
/// Implements [`HasRegistrationDate`] so the compliance check can
/// consume rows directly, without copying into value types first.
#[derive(Debug, Clone, FromRow)]
pub struct FilingRow {
    pub id: Uuid,
    pub company_id: Uuid,
    pub entry_type: Option<String>,
    pub court: Option<String>,
    pub file_number: Option<String>,
    pub application_date: Option<NaiveDate>,
    pub registration_date: Option<NaiveDate>,
}

impl HasRegistrationDate for FilingRow {
    fn registration_date(&self) -> Option<NaiveDate> {
        self.registration_date
    }
}

impl From<FilingRow> for RegistryFilingEntry {
    fn from(row: FilingRow) -> Self {
        RegistryFilingEntry {
            entry_type: row.entry_type,
            court: row.court,
            file_number: row.file_number,
            application_date: row.application_date,
            registration_date: row.registration_date,
        }
    }
}

/// Read access to the persisted registry records.
pub struct CompanyStore {
    pool: PgPool,
}

impl CompanyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a single company by its Firmenbuchnummer.
    pub async fn find_by_firmenbuchnummer(
        &self,
        firmenbuchnummer: &str,
    ) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(
            "SELECT * FROM registry.companies WHERE firmenbuchnummer = $1 LIMIT 1",
        )
        .bind(firmenbuchnummer)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    /// Case-insensitive substring search across the searchable fields.
    pub async fn search(&self, query: &str) -> Result<Vec<CompanyListItem>, AppError> {
        let like = format!("%{}%", query);
        let results = sqlx::query_as::<_, CompanyListItem>(
            "SELECT firmenbuchnummer, name, legal_form, business_purpose, seat
             FROM registry.companies
             WHERE name ILIKE $1
                OR firmenbuchnummer ILIKE $1
                OR seat ILIKE $1
                OR business_purpose ILIKE $1
             ORDER BY name ASC
             LIMIT $2",
        )
        .bind(&like)
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Database error in search for '{}': {:?}", query, e);
            AppError::DatabaseError(e)
        })?;

        Ok(results)
    }

    /// Autocomplete suggestions: Firmenbuchnummer and name only.
    /// Queries shorter than three characters return nothing.
    pub async fn suggestions(&self, query: &str) -> Result<Vec<CompanySuggestion>, AppError> {
        if query.chars().count() < SUGGESTION_MIN_CHARS {
            return Ok(Vec::new());
        }

        let like = format!("%{}%", query);
        let suggestions = sqlx::query_as::<_, CompanySuggestion>(
            "SELECT firmenbuchnummer, name
             FROM registry.companies
             WHERE name ILIKE $1 OR firmenbuchnummer ILIKE $1
             ORDER BY name ASC
             LIMIT $2",
        )
        .bind(&like)
        .bind(SUGGESTION_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(suggestions)
    }

    /// All filing entries recorded for a company, oldest first.
    pub async fn filing_entries(&self, company_id: Uuid) -> Result<Vec<FilingRow>, AppError> {
        let entries = sqlx::query_as::<_, FilingRow>(
            "SELECT id, company_id, entry_type, court, file_number,
                    application_date, registration_date
             FROM registry.filing_entries
             WHERE company_id = $1
             ORDER BY registration_date ASC NULLS FIRST",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
