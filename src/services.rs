use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Local, Months, NaiveDate};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::config::CreditRules;
use crate::errors::AppError;
use crate::models::*;
use crate::repository::{CreditRepository, CustomerRepository};

/// Argon2id hash in PHC string format.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalError(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub struct CustomerService {
    customers: Arc<dyn CustomerRepository>,
}

impl CustomerService {
    pub fn new(customers: Arc<dyn CustomerRepository>) -> Self {
        Self { customers }
    }

    pub async fn save(&self, dto: CustomerDto) -> Result<Customer, AppError> {
        dto.validate()?;
        let password_hash = hash_password(&dto.password)?;
        let customer = self
            .customers
            .save(dto.into_new_customer(password_hash))
            .await?;

        tracing::info!("Customer {} registered ({})", customer.id, customer.email);
        Ok(customer)
    }

    pub async fn find_by_id(&self, id: CustomerId) -> Result<Customer, AppError> {
        self.customers
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer with id {} not found", id)))
    }

    pub async fn update(
        &self,
        id: CustomerId,
        dto: CustomerUpdateDto,
    ) -> Result<Customer, AppError> {
        dto.validate()?;
        let current = self.find_by_id(id).await?;
        self.customers
            .update(&dto.apply_to(current))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer with id {} not found", id)))
    }

    pub async fn delete(&self, id: CustomerId) -> Result<(), AppError> {
        if !self.customers.delete_by_id(id).await? {
            return Err(AppError::NotFound(format!(
                "Customer with id {} not found",
                id
            )));
        }
        tracing::info!("Customer {} deleted", id);
        Ok(())
    }
}

pub struct CreditService {
    credits: Arc<dyn CreditRepository>,
    customers: Arc<dyn CustomerRepository>,
    rules: CreditRules,
}

impl CreditService {
    pub fn new(
        credits: Arc<dyn CreditRepository>,
        customers: Arc<dyn CustomerRepository>,
        rules: CreditRules,
    ) -> Self {
        Self {
            credits,
            customers,
            rules,
        }
    }

    /// Validates the application, resolves the customer and stores an IN_PROGRESS credit.
    pub async fn save(&self, dto: CreditDto) -> Result<(Credit, Customer), AppError> {
        self.validate_application(&dto, today())?;

        let customer = self
            .customers
            .find_by_id(dto.customer_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Customer with id {} not found", dto.customer_id))
            })?;

        let credit = self.credits.save(dto.into_new_credit()).await?;
        tracing::info!(
            "Credit {} created for customer {} ({} installments)",
            credit.credit_code,
            customer.id,
            credit.number_of_installments
        );

        Ok((credit, customer))
    }

    /// Field rules from the DTO followed by the configured installment and date rules.
    pub fn validate_application(&self, dto: &CreditDto, today: NaiveDate) -> Result<(), AppError> {
        dto.validate()?;

        let max = self.rules.max_installments;
        if dto.number_of_installments < 1 || i64::from(dto.number_of_installments) > i64::from(max) {
            return Err(AppError::invalid_field(
                "numberOfInstallments",
                format!("must be between 1 and {}", max),
            ));
        }

        if dto.day_first_of_installment <= today {
            return Err(AppError::invalid_field(
                "dayFirstOfInstallment",
                "must be a future date",
            ));
        }

        let months = self.rules.max_months_to_first_installment;
        let latest = today
            .checked_add_months(Months::new(months))
            .ok_or_else(|| AppError::InternalError("date overflow".to_string()))?;
        if dto.day_first_of_installment > latest {
            return Err(AppError::invalid_field(
                "dayFirstOfInstallment",
                format!("must be within {} months from today", months),
            ));
        }

        Ok(())
    }

    pub async fn find_all_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Credit>, AppError> {
        self.credits.find_all_by_customer_id(customer_id).await
    }

    /// Credit plus owner. A code owned by a different customer is reported as not found.
    pub async fn find_by_credit_code(
        &self,
        customer_id: CustomerId,
        credit_code: Uuid,
    ) -> Result<(Credit, Customer), AppError> {
        let not_found =
            || AppError::NotFound(format!("Credit code {} not found", credit_code));

        let credit = self
            .credits
            .find_by_credit_code(credit_code)
            .await?
            .ok_or_else(not_found)?;

        if credit.customer_id != customer_id {
            tracing::warn!(
                "Credit {} requested for customer {} but belongs to {}",
                credit_code,
                customer_id,
                credit.customer_id
            );
            return Err(not_found());
        }

        let customer = self
            .customers
            .find_by_id(customer_id)
            .await?
            .ok_or_else(not_found)?;

        Ok((credit, customer))
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use bigdecimal::BigDecimal;

    fn service() -> CreditService {
        let store = Arc::new(InMemoryStore::new());
        CreditService::new(store.clone(), store, CreditRules::default())
    }

    fn dto(installments: i32, first: NaiveDate) -> CreditDto {
        CreditDto {
            credit_value: BigDecimal::from(1000),
            day_first_of_installment: first,
            number_of_installments: installments,
            customer_id: CustomerId(1),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn password_hash_is_salted_and_verifiable() {
        let first = hash_password("123456").unwrap();
        let second = hash_password("123456").unwrap();

        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(verify_password("123456", &first));
        assert!(!verify_password("654321", &first));
        assert!(!verify_password("123456", "not-a-phc-string"));
    }

    #[test]
    fn credit_value_rules_report_json_field_name() {
        let service = service();
        let mut application = dto(5, day(2026, 2, 10));
        application.credit_value = BigDecimal::from(-1);

        match service.validate_application(&application, day(2026, 1, 10)) {
            Err(AppError::Validation(details)) => {
                assert!(details.contains_key("creditValue"));
                assert!(!details.contains_key("credit_value"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn installment_bounds() {
        let service = service();
        let today = day(2026, 1, 10);
        let first = day(2026, 2, 10);

        assert!(service.validate_application(&dto(5, first), today).is_ok());
        assert!(service.validate_application(&dto(48, first), today).is_ok());
        assert!(service.validate_application(&dto(1, first), today).is_ok());
        assert!(matches!(
            service.validate_application(&dto(49, first), today),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.validate_application(&dto(50, first), today),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.validate_application(&dto(0, first), today),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn first_installment_window() {
        let service = service();
        let today = day(2026, 1, 31);

        // today is not the future
        assert!(service.validate_application(&dto(5, today), today).is_err());
        assert!(service
            .validate_application(&dto(5, day(2026, 2, 1)), today)
            .is_ok());
        // Jan 31 + 3 months clamps to Apr 30
        assert!(service
            .validate_application(&dto(5, day(2026, 4, 30)), today)
            .is_ok());
        assert!(service
            .validate_application(&dto(5, day(2026, 5, 1)), today)
            .is_err());
    }

    #[test]
    fn custom_installment_cap() {
        let store = Arc::new(InMemoryStore::new());
        let service = CreditService::new(
            store.clone(),
            store,
            CreditRules {
                max_installments: 12,
                max_months_to_first_installment: 3,
            },
        );
        let today = day(2026, 1, 10);
        let first = day(2026, 2, 10);

        assert!(service.validate_application(&dto(12, first), today).is_ok());
        assert!(service.validate_application(&dto(13, first), today).is_err());
    }

    #[tokio::test]
    async fn unknown_customer_is_not_found() {
        let service = service();
        let first = today().checked_add_months(Months::new(1)).unwrap();

        let result = service.save(dto(5, first)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
