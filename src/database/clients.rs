// ABOUTME: Client entity database operations per tenant store
// ABOUTME: Duplicate detection compares digits-only document numbers among active clients
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::Database;
use crate::models::{digits_only, Client};
use anyhow::Result;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the clients table
    pub(super) async fn migrate_clients(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS clients (
                id TEXT PRIMARY KEY,
                full_name TEXT NOT NULL,
                document_number TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT,
                zip_code TEXT,
                paid BOOLEAN NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_clients_document ON clients(document_number)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    fn row_to_client(row: &sqlx::sqlite::SqliteRow) -> Result<Client> {
        let id: String = row.get("id");
        Ok(Client {
            id: Uuid::parse_str(&id)?,
            full_name: row.get("full_name"),
            document_number: row.get("document_number"),
            email: row.get("email"),
            phone: row.get("phone"),
            zip_code: row.get("zip_code"),
            paid: row.get("paid"),
            is_active: row.get("is_active"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    /// Insert a new client
    pub async fn insert_client(&self, client: &Client) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO clients (
                id, full_name, document_number, email, phone, zip_code,
                paid, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(client.id.to_string())
        .bind(&client.full_name)
        .bind(&client.document_number)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.zip_code)
        .bind(client.paid)
        .bind(client.is_active)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get a client by id
    pub async fn get_client(&self, client_id: Uuid) -> Result<Option<Client>> {
        let row = sqlx::query(
            r"
            SELECT id, full_name, document_number, email, phone, zip_code,
                   paid, is_active, created_at, updated_at
            FROM clients WHERE id = $1
            ",
        )
        .bind(client_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| Self::row_to_client(&row)).transpose()
    }

    /// Find an active client whose document number matches digits-for-digits,
    /// ignoring formatting punctuation. Used for duplicate detection.
    pub async fn find_active_client_by_document(
        &self,
        document_number: &str,
    ) -> Result<Option<Client>> {
        let digits = digits_only(document_number);
        let row = sqlx::query(
            r"
            SELECT id, full_name, document_number, email, phone, zip_code,
                   paid, is_active, created_at, updated_at
            FROM clients
            WHERE is_active = 1
              AND REPLACE(REPLACE(REPLACE(document_number, '.', ''), '-', ''), '/', '') = $1
            ",
        )
        .bind(&digits)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| Self::row_to_client(&row)).transpose()
    }

    /// Update a client's mutable fields
    pub async fn update_client(&self, client: &Client) -> Result<()> {
        sqlx::query(
            r"
            UPDATE clients SET full_name = $1, document_number = $2, email = $3,
                   phone = $4, zip_code = $5, paid = $6, updated_at = $7
            WHERE id = $8
            ",
        )
        .bind(&client.full_name)
        .bind(&client.document_number)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.zip_code)
        .bind(client.paid)
        .bind(Utc::now())
        .bind(client.id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Soft-delete a client; returns the number of rows changed
    pub async fn deactivate_client(&self, client_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE clients SET is_active = 0, updated_at = $1 WHERE id = $2 AND is_active = 1",
        )
        .bind(Utc::now())
        .bind(client_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Hard-delete a client; returns the number of rows removed
    pub async fn delete_client(&self, client_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(client_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// List active clients with search and paging. Search matches full name,
    /// document number, or email, case-insensitive substring.
    pub async fn list_clients(
        &self,
        search_text: Option<&str>,
        page_number: i64,
        page_size: i64,
    ) -> Result<(Vec<Client>, i64)> {
        // An empty search term matches everything through '%%'
        let search = search_text.unwrap_or("");
        const SEARCH_CLAUSE: &str = "AND (UPPER(full_name) LIKE '%' || UPPER($1) || '%' \
             OR document_number LIKE '%' || $1 || '%' \
             OR UPPER(email) LIKE '%' || UPPER($1) || '%')";

        let count_query =
            format!("SELECT COUNT(*) FROM clients WHERE is_active = 1 {SEARCH_CLAUSE}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(search)
            .fetch_one(&self.pool)
            .await?;

        let list_query = format!(
            r"
            SELECT id, full_name, document_number, email, phone, zip_code,
                   paid, is_active, created_at, updated_at
            FROM clients
            WHERE is_active = 1 {SEARCH_CLAUSE}
            ORDER BY full_name ASC
            LIMIT $2 OFFSET $3
            "
        );
        let rows = sqlx::query(&list_query)
            .bind(search)
            .bind(page_size)
            .bind((page_number - 1) * page_size)
            .fetch_all(&self.pool)
            .await?;

        let clients = rows
            .iter()
            .map(Self::row_to_client)
            .collect::<Result<Vec<_>>>()?;
        Ok((clients, total))
    }
}
