//! Persistence contracts shared by the PostgreSQL and in-memory backends.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Credit, Customer, CustomerId, NewCredit, NewCustomer};

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Stores a new customer. Duplicate cpf or email yields `AppError::Conflict`.
    async fn save(&self, customer: NewCustomer) -> Result<Customer, AppError>;

    /// Primary-key lookup; absence is `Ok(None)`.
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, AppError>;

    /// Overwrites the mutable profile fields. `Ok(None)` when the id is unknown.
    async fn update(&self, customer: &Customer) -> Result<Option<Customer>, AppError>;

    /// Removes the customer and its credits. Returns whether a row was deleted.
    async fn delete_by_id(&self, id: CustomerId) -> Result<bool, AppError>;

    async fn delete_all(&self) -> Result<(), AppError>;
}

#[async_trait]
pub trait CreditRepository: Send + Sync {
    /// Stores a new credit. An unknown `customer_id` yields `AppError::NotFound`.
    async fn save(&self, credit: NewCredit) -> Result<Credit, AppError>;

    async fn find_by_credit_code(&self, credit_code: Uuid) -> Result<Option<Credit>, AppError>;

    /// All credits of a customer in insertion order.
    async fn find_all_by_customer_id(&self, customer_id: CustomerId)
        -> Result<Vec<Credit>, AppError>;

    async fn delete_all(&self) -> Result<(), AppError>;
}
