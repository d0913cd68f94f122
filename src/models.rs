use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::errors::AppError;

// ============ Database Models ============

/// Storage-assigned customer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct CustomerId(pub i64);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Postal address embedded in a customer row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Address {
    pub zip_code: String,
    pub street: String,
}

/// A customer that has not been stored yet and so has no id.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub cpf: String,
    pub email: String,
    /// Argon2 PHC string produced by `services::hash_password`.
    pub password_hash: String,
    pub address: Address,
    pub income: BigDecimal,
}

/// A stored customer. Credits are reached through
/// `CreditRepository::find_all_by_customer_id`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub cpf: String,
    pub email: String,
    pub password_hash: String,
    #[sqlx(flatten)]
    pub address: Address,
    pub income: BigDecimal,
}

impl NewCustomer {
    pub fn with_id(self, id: CustomerId) -> Customer {
        Customer {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            cpf: self.cpf,
            email: self.email,
            password_hash: self.password_hash,
            address: self.address,
            income: self.income,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreditStatus {
    InProgress,
    Approved,
    Rejected,
}

impl CreditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditStatus::InProgress => "IN_PROGRESS",
            CreditStatus::Approved => "APPROVED",
            CreditStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for CreditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CreditStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_PROGRESS" => Ok(CreditStatus::InProgress),
            "APPROVED" => Ok(CreditStatus::Approved),
            "REJECTED" => Ok(CreditStatus::Rejected),
            other => Err(AppError::InternalError(format!(
                "Unknown credit status '{}'",
                other
            ))),
        }
    }
}

/// A credit that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewCredit {
    pub credit_code: Uuid,
    pub credit_value: BigDecimal,
    pub day_first_installment: NaiveDate,
    pub number_of_installments: i32,
    pub status: CreditStatus,
    pub customer_id: CustomerId,
}

impl NewCredit {
    /// Fresh credit with a generated code, pending review.
    pub fn new(
        credit_value: BigDecimal,
        day_first_installment: NaiveDate,
        number_of_installments: i32,
        customer_id: CustomerId,
    ) -> Self {
        Self {
            credit_code: Uuid::new_v4(),
            credit_value,
            day_first_installment,
            number_of_installments,
            status: CreditStatus::InProgress,
            customer_id,
        }
    }

    pub fn with_id(self, id: i64) -> Credit {
        Credit {
            id,
            credit_code: self.credit_code,
            credit_value: self.credit_value,
            day_first_installment: self.day_first_installment,
            number_of_installments: self.number_of_installments,
            status: self.status,
            customer_id: self.customer_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Credit {
    pub id: i64,
    pub credit_code: Uuid,
    pub credit_value: BigDecimal,
    pub day_first_installment: NaiveDate,
    pub number_of_installments: i32,
    pub status: CreditStatus,
    pub customer_id: CustomerId,
}

/// Raw `credits` row; status is stored as text.
#[derive(Debug, FromRow)]
pub struct CreditRow {
    pub id: i64,
    pub credit_code: Uuid,
    pub credit_value: BigDecimal,
    pub day_first_installment: NaiveDate,
    pub number_of_installments: i32,
    pub status: String,
    pub customer_id: CustomerId,
}

impl TryFrom<CreditRow> for Credit {
    type Error = AppError;

    fn try_from(row: CreditRow) -> Result<Self, Self::Error> {
        Ok(Credit {
            id: row.id,
            credit_code: row.credit_code,
            credit_value: row.credit_value,
            day_first_installment: row.day_first_installment,
            number_of_installments: row.number_of_installments,
            status: row.status.parse()?,
            customer_id: row.customer_id,
        })
    }
}

// ============ API Request Models ============

/// Credit application payload. Installment count and the first installment
/// date depend on configured rules and are checked by `CreditService`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreditDto {
    #[serde(with = "decimal_number")]
    #[schema(value_type = f64, example = 1000.0)]
    #[validate(custom(function = "validate_credit_value"))]
    pub credit_value: BigDecimal,
    pub day_first_of_installment: NaiveDate,
    pub number_of_installments: i32,
    #[schema(value_type = i64)]
    pub customer_id: CustomerId,
}

impl CreditDto {
    pub fn into_new_credit(self) -> NewCredit {
        NewCredit::new(
            self.credit_value,
            self.day_first_of_installment,
            self.number_of_installments,
            self.customer_id,
        )
    }
}

/// Customer registration payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    #[validate(length(min = 1, max = 255, message = "must have 1 to 255 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 255, message = "must have 1 to 255 characters"))]
    pub last_name: String,
    #[validate(custom(function = "validate_cpf", message = "invalid CPF"))]
    pub cpf: String,
    #[serde(with = "decimal_number")]
    #[schema(value_type = f64)]
    #[validate(custom(function = "validate_income"))]
    pub income: BigDecimal,
    #[validate(
        email(message = "invalid email"),
        length(max = 255, message = "must have at most 255 characters")
    )]
    pub email: String,
    #[validate(length(min = 1, max = 128, message = "must have 1 to 128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 32, message = "must have 1 to 32 characters"))]
    pub zip_code: String,
    #[validate(length(min = 1, max = 255, message = "must have 1 to 255 characters"))]
    pub street: String,
}

impl CustomerDto {
    pub fn into_new_customer(self, password_hash: String) -> NewCustomer {
        NewCustomer {
            first_name: self.first_name,
            last_name: self.last_name,
            cpf: self.cpf,
            email: self.email,
            password_hash,
            address: Address {
                zip_code: self.zip_code,
                street: self.street,
            },
            income: self.income,
        }
    }
}

/// Profile update payload; cpf, email and password are not editable.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdateDto {
    #[validate(length(min = 1, max = 255, message = "must have 1 to 255 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 255, message = "must have 1 to 255 characters"))]
    pub last_name: String,
    #[serde(with = "decimal_number")]
    #[schema(value_type = f64)]
    #[validate(custom(function = "validate_income"))]
    pub income: BigDecimal,
    #[validate(length(min = 1, max = 32, message = "must have 1 to 32 characters"))]
    pub zip_code: String,
    #[validate(length(min = 1, max = 255, message = "must have 1 to 255 characters"))]
    pub street: String,
}

impl CustomerUpdateDto {
    pub fn apply_to(self, customer: Customer) -> Customer {
        Customer {
            first_name: self.first_name,
            last_name: self.last_name,
            income: self.income,
            address: Address {
                zip_code: self.zip_code,
                street: self.street,
            },
            ..customer
        }
    }
}

/// `?customerId=` query parameter.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CustomerIdParam {
    #[serde(rename = "customerId")]
    pub customer_id: CustomerId,
}

// ============ API Response Models ============

/// Detailed credit projection including the owner's email and income.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreditView {
    pub credit_code: Uuid,
    #[serde(with = "decimal_number")]
    #[schema(value_type = f64)]
    pub credit_value: BigDecimal,
    pub number_of_installment: i32,
    pub status: CreditStatus,
    pub email_customer: String,
    #[serde(with = "decimal_number")]
    #[schema(value_type = f64)]
    pub income_customer: BigDecimal,
}

impl CreditView {
    pub fn new(credit: &Credit, customer: &Customer) -> Self {
        Self {
            credit_code: credit.credit_code,
            credit_value: credit.credit_value.clone(),
            number_of_installment: credit.number_of_installments,
            status: credit.status,
            email_customer: customer.email.clone(),
            income_customer: customer.income.clone(),
        }
    }
}

/// Lightweight credit projection used in listings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreditViewList {
    pub credit_code: Uuid,
    #[serde(with = "decimal_number")]
    #[schema(value_type = f64)]
    pub credit_value: BigDecimal,
    pub number_of_installments: i32,
}

impl From<&Credit> for CreditViewList {
    fn from(credit: &Credit) -> Self {
        Self {
            credit_code: credit.credit_code,
            credit_value: credit.credit_value.clone(),
            number_of_installments: credit.number_of_installments,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    #[schema(value_type = i64)]
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub cpf: String,
    #[serde(with = "decimal_number")]
    #[schema(value_type = f64)]
    pub income: BigDecimal,
    pub email: String,
    pub zip_code: String,
    pub street: String,
}

impl From<&Customer> for CustomerView {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            cpf: customer.cpf.clone(),
            income: customer.income.clone(),
            email: customer.email.clone(),
            zip_code: customer.address.zip_code.clone(),
            street: customer.address.street.clone(),
        }
    }
}

// ============ Validation helpers ============

/// Brazilian CPF: 11 digits, both check digits correct, not all digits equal.
pub fn validate_cpf(cpf: &str) -> Result<(), ValidationError> {
    if is_valid_cpf(cpf) {
        Ok(())
    } else {
        Err(ValidationError::new("cpf"))
    }
}

pub fn is_valid_cpf(cpf: &str) -> bool {
    if cpf.len() != 11 || !cpf.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let digits: Vec<u32> = cpf.bytes().map(|b| u32::from(b - b'0')).collect();
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let check_digit = |len: usize| -> u32 {
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (len as u32 + 1 - i as u32))
            .sum();
        (sum * 10) % 11 % 10
    };

    check_digit(9) == digits[9] && check_digit(10) == digits[10]
}

/// Decimal places kept for money, matching the `NUMERIC(19, 2)` columns.
pub const MONEY_SCALE: i64 = 2;

/// Accepted amounts stay below 10^13 so that, with two decimal places, every
/// value has at most 15 significant digits and survives the JSON number encoding.
pub const MONEY_MAX_INTEGER_DIGITS: u32 = 13;

fn money_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Checks precision only; sign rules are left to the caller.
pub fn check_money(value: &BigDecimal) -> Result<(), ValidationError> {
    let (_, scale) = value.normalized().as_bigint_and_exponent();
    if scale > MONEY_SCALE {
        return Err(money_error("money_scale", "must have at most 2 decimal places"));
    }
    if value.abs() >= BigDecimal::from(10_i64.pow(MONEY_MAX_INTEGER_DIGITS)) {
        return Err(money_error("money_range", "must be less than 10000000000000"));
    }
    Ok(())
}

fn validate_credit_value(value: &BigDecimal) -> Result<(), ValidationError> {
    if *value <= BigDecimal::from(0) {
        return Err(money_error("positive", "must be greater than zero"));
    }
    check_money(value)
}

fn validate_income(value: &BigDecimal) -> Result<(), ValidationError> {
    if *value < BigDecimal::from(0) {
        return Err(money_error("non_negative", "must not be negative"));
    }
    check_money(value)
}

/// Money travels as a JSON number; strings holding a decimal are accepted on input.
///
/// Numbers go through `f64`, which is exact for amounts accepted by `check_money`
/// (at most 15 significant digits).
pub mod decimal_number {
    use bigdecimal::BigDecimal;
    use serde::{de, ser, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // decimal text parses to the nearest f64
        let number: f64 = value.to_string().parse().map_err(ser::Error::custom)?;
        if !number.is_finite() {
            return Err(ser::Error::custom("decimal out of f64 range"));
        }
        serializer.serialize_f64(number)
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDecimal {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = match RawDecimal::deserialize(deserializer)? {
            RawDecimal::Number(n) if n.is_finite() => n.to_string(),
            RawDecimal::Number(_) => return Err(de::Error::custom("decimal must be finite")),
            RawDecimal::Text(s) => s,
        };
        BigDecimal::from_str(text.trim()).map_err(de::Error::custom)
    }
}
