use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::{AppError, ResultExt};
use crate::models::{Credit, CreditRow, Customer, CustomerId, NewCredit, NewCustomer};
use crate::repository::{CreditRepository, CustomerRepository};

const CUSTOMER_COLUMNS: &str =
    "id, first_name, last_name, cpf, email, password_hash, zip_code, street, income";

const CREDIT_COLUMNS: &str = "id, credit_code, credit_value, day_first_installment, \
     number_of_installments, status, customer_id";

/// Turns constraint violations into the matching API error, leaving the rest as database errors.
fn map_constraint_error(err: sqlx::Error, what: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unique key");
            return AppError::Conflict(format!("{} violates {}", what, constraint));
        }
        if db_err.is_foreign_key_violation() {
            return AppError::NotFound(format!("{} references a missing customer", what));
        }
    }
    AppError::DatabaseError(err)
}

/// PostgreSQL-backed customer storage
pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn save(&self, customer: NewCustomer) -> Result<Customer, AppError> {
        let saved = sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers
                (first_name, last_name, cpf, email, password_hash, zip_code, street, income)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.cpf)
        .bind(&customer.email)
        .bind(&customer.password_hash)
        .bind(&customer.address.zip_code)
        .bind(&customer.address.street)
        .bind(&customer.income)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "customer"))?;

        tracing::debug!("Inserted customer {}", saved.id);
        Ok(saved)
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, AppError> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE id = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("loading customer {}", id))
    }

    async fn update(&self, customer: &Customer) -> Result<Option<Customer>, AppError> {
        sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers
            SET first_name = $2, last_name = $3, zip_code = $4, street = $5, income = $6
            WHERE id = $1
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(customer.id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.address.zip_code)
        .bind(&customer.address.street)
        .bind(&customer.income)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "customer"))
    }

    async fn delete_by_id(&self, id: CustomerId) -> Result<bool, AppError> {
        // credits go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("deleting customer {}", id))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM customers")
            .execute(&self.pool)
            .await
            .context("deleting all customers")?;
        Ok(())
    }
}

/// PostgreSQL-backed credit storage
pub struct PgCreditRepository {
    pool: PgPool,
}

impl PgCreditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CreditRepository for PgCreditRepository {
    async fn save(&self, credit: NewCredit) -> Result<Credit, AppError> {
        let row = sqlx::query_as::<_, CreditRow>(&format!(
            r#"
            INSERT INTO credits
                (credit_code, credit_value, day_first_installment,
                 number_of_installments, status, customer_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            CREDIT_COLUMNS
        ))
        .bind(credit.credit_code)
        .bind(&credit.credit_value)
        .bind(credit.day_first_installment)
        .bind(credit.number_of_installments)
        .bind(credit.status.as_str())
        .bind(credit.customer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "credit"))?;

        tracing::debug!(
            "Inserted credit {} for customer {}",
            row.credit_code,
            row.customer_id
        );
        Credit::try_from(row)
    }

    async fn find_by_credit_code(&self, credit_code: Uuid) -> Result<Option<Credit>, AppError> {
        let row = sqlx::query_as::<_, CreditRow>(&format!(
            "SELECT {} FROM credits WHERE credit_code = $1",
            CREDIT_COLUMNS
        ))
        .bind(credit_code)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("loading credit {}", credit_code))?;

        row.map(Credit::try_from).transpose()
    }

    async fn find_all_by_customer_id(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Credit>, AppError> {
        let rows = sqlx::query_as::<_, CreditRow>(&format!(
            "SELECT {} FROM credits WHERE customer_id = $1 ORDER BY id ASC",
            CREDIT_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("listing credits of customer {}", customer_id))?;

        rows.into_iter().map(Credit::try_from).collect()
    }

    async fn delete_all(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM credits")
            .execute(&self.pool)
            .await
            .context("deleting all credits")?;
        Ok(())
    }
}
