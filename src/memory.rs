use std::collections::BTreeMap;

use async_trait::async_trait;
use bigdecimal::{BigDecimal, RoundingMode};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Credit, Customer, CustomerId, NewCredit, NewCustomer, MONEY_SCALE};
use crate::repository::{CreditRepository, CustomerRepository};

#[derive(Default)]
struct Tables {
    customers: BTreeMap<CustomerId, Customer>,
    credits: BTreeMap<i64, Credit>,
    next_customer_id: i64,
    next_credit_id: i64,
}

/// Lock-protected store implementing both repositories with the same
/// constraints as the SQL schema (unique cpf/email/credit code, FK with cascade).
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// Column widths of the SQL schema.
const TEXT_WIDTH: usize = 255;
const CPF_WIDTH: usize = 11;
const ZIP_CODE_WIDTH: usize = 32;
const MONEY_INTEGER_DIGITS: u32 = 17;

fn fit_text(column: &str, value: &str, width: usize) -> Result<(), AppError> {
    if value.chars().count() > width {
        return Err(AppError::InternalError(format!(
            "value too long for {} (max {} characters)",
            column, width
        )));
    }
    Ok(())
}

/// Rounds to the column scale the way NUMERIC(19, 2) does.
fn fit_money(column: &str, value: &BigDecimal) -> Result<BigDecimal, AppError> {
    let rounded = value.with_scale_round(MONEY_SCALE, RoundingMode::HalfUp);
    if rounded.abs() >= BigDecimal::from(10_i64.pow(MONEY_INTEGER_DIGITS)) {
        return Err(AppError::InternalError(format!(
            "numeric field overflow for {}",
            column
        )));
    }
    Ok(rounded)
}

fn fit_profile(customer: &mut Customer) -> Result<(), AppError> {
    fit_text("first_name", &customer.first_name, TEXT_WIDTH)?;
    fit_text("last_name", &customer.last_name, TEXT_WIDTH)?;
    fit_text("cpf", &customer.cpf, CPF_WIDTH)?;
    fit_text("email", &customer.email, TEXT_WIDTH)?;
    fit_text("password_hash", &customer.password_hash, TEXT_WIDTH)?;
    fit_text("zip_code", &customer.address.zip_code, ZIP_CODE_WIDTH)?;
    fit_text("street", &customer.address.street, TEXT_WIDTH)?;
    customer.income = fit_money("income", &customer.income)?;
    Ok(())
}

#[async_trait]
impl CustomerRepository for InMemoryStore {
    async fn save(&self, customer: NewCustomer) -> Result<Customer, AppError> {
        let mut tables = self.tables.write().await;

        if tables.customers.values().any(|c| c.cpf == customer.cpf) {
            return Err(AppError::Conflict(
                "customer violates customers_cpf_key".to_string(),
            ));
        }
        if tables.customers.values().any(|c| c.email == customer.email) {
            return Err(AppError::Conflict(
                "customer violates customers_email_key".to_string(),
            ));
        }

        let mut saved = customer.with_id(CustomerId(tables.next_customer_id + 1));
        fit_profile(&mut saved)?;
        tables.next_customer_id += 1;
        tables.customers.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.customers.get(&id).cloned())
    }

    async fn update(&self, customer: &Customer) -> Result<Option<Customer>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.customers.get_mut(&customer.id) else {
            return Ok(None);
        };

        let mut updated = Customer {
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            address: customer.address.clone(),
            income: customer.income.clone(),
            ..stored.clone()
        };
        fit_profile(&mut updated)?;
        *stored = updated;
        Ok(Some(stored.clone()))
    }

    async fn delete_by_id(&self, id: CustomerId) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.customers.remove(&id).is_none() {
            return Ok(false);
        }
        tables.credits.retain(|_, credit| credit.customer_id != id);
        Ok(true)
    }

    async fn delete_all(&self) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        tables.customers.clear();
        tables.credits.clear();
        Ok(())
    }
}

#[async_trait]
impl CreditRepository for InMemoryStore {
    async fn save(&self, credit: NewCredit) -> Result<Credit, AppError> {
        let mut tables = self.tables.write().await;

        if !tables.customers.contains_key(&credit.customer_id) {
            return Err(AppError::NotFound(
                "credit references a missing customer".to_string(),
            ));
        }
        if tables
            .credits
            .values()
            .any(|c| c.credit_code == credit.credit_code)
        {
            return Err(AppError::Conflict(
                "credit violates credits_credit_code_key".to_string(),
            ));
        }

        let mut saved = credit.with_id(tables.next_credit_id + 1);
        saved.credit_value = fit_money("credit_value", &saved.credit_value)?;
        tables.next_credit_id += 1;
        tables.credits.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn find_by_credit_code(&self, credit_code: Uuid) -> Result<Option<Credit>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .credits
            .values()
            .find(|c| c.credit_code == credit_code)
            .cloned())
    }

    async fn find_all_by_customer_id(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Credit>, AppError> {
        let tables = self.tables.read().await;
        // BTreeMap iteration is id order, i.e. insertion order
        Ok(tables
            .credits
            .values()
            .filter(|c| c.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn delete_all(&self) -> Result<(), AppError> {
        self.tables.write().await.credits.clear();
        Ok(())
    }
}
