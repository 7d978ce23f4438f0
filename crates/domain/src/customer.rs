//! Customers and their addresses.

use chrono::{DateTime, NaiveDate, Utc};
use common::{AddressId, AddressType, CustomerId};
use serde::{Deserialize, Serialize};
use store::{
    AddressRecord, AddressRepository, CustomerRecord, CustomerRepository, Store, Transaction,
};

use crate::error::{DomainError, Result};
use crate::validation;

/// Input for registering a customer.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCustomer {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

/// Partial update of a customer. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCustomer {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAddress {
    pub street: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    #[serde(default)]
    pub address_type: AddressType,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerView {
    pub id: CustomerId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<CustomerRecord> for CustomerView {
    fn from(c: CustomerRecord) -> Self {
        Self {
            full_name: format!("{} {}", c.first_name, c.last_name),
            id: c.id,
            email: c.email,
            first_name: c.first_name,
            last_name: c.last_name,
            phone: c.phone,
            date_of_birth: c.date_of_birth,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressView {
    pub id: AddressId,
    pub customer_id: CustomerId,
    pub street: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub address_type: AddressType,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl From<AddressRecord> for AddressView {
    fn from(a: AddressRecord) -> Self {
        Self {
            id: a.id,
            customer_id: a.customer_id,
            street: a.street,
            address_line2: a.address_line2,
            city: a.city,
            state: a.state,
            country: a.country,
            postal_code: a.postal_code,
            address_type: a.address_type,
            is_default: a.is_default,
            created_at: a.created_at,
        }
    }
}

/// Service for managing customers.
#[derive(Clone)]
pub struct CustomerService<S: Store> {
    store: S,
}

impl<S: Store> CustomerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a new customer. Emails are unique regardless of case.
    #[tracing::instrument(skip(self, cmd), fields(email = %cmd.email))]
    pub async fn create_customer(&self, cmd: CreateCustomer) -> Result<CustomerView> {
        let email = validation::email(&cmd.email)?;
        let first_name = validation::required(
            "First name",
            &cmd.first_name,
            validation::MAX_CUSTOMER_NAME_LENGTH,
        )?;
        let last_name = validation::required(
            "Last name",
            &cmd.last_name,
            validation::MAX_CUSTOMER_NAME_LENGTH,
        )?;
        let phone = validation::phone(cmd.phone.as_deref())?;

        let mut tx = self.store.begin().await?;
        if tx.customer_email_exists(&email, None).await? {
            return Err(DomainError::rule(format!(
                "Customer with email {email} already exists"
            )));
        }

        let record = CustomerRecord {
            id: CustomerId::new(),
            email,
            first_name,
            last_name,
            phone,
            date_of_birth: cmd.date_of_birth,
            created_at: Utc::now(),
            updated_at: None,
        };
        tx.insert_customer(&record).await?;
        tx.commit().await?;

        tracing::info!(customer_id = %record.id, "customer created");
        Ok(record.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_customer(&self, id: CustomerId) -> Result<Option<CustomerView>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.get_customer(id).await?.map(Into::into))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_customer_by_email(&self, email: &str) -> Result<Option<CustomerView>> {
        let mut tx = self.store.begin().await?;
        Ok(tx
            .find_customer_by_email(email.trim())
            .await?
            .map(Into::into))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<CustomerView>> {
        let mut tx = self.store.begin().await?;
        Ok(tx
            .list_customers()
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Applies a partial update. A changed email is re-checked for uniqueness.
    #[tracing::instrument(skip(self, cmd))]
    pub async fn update_customer(
        &self,
        id: CustomerId,
        cmd: UpdateCustomer,
    ) -> Result<CustomerView> {
        let mut tx = self.store.begin().await?;
        let mut record = tx
            .get_customer(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Customer", id))?;

        if let Some(ref raw) = cmd.email {
            let email = validation::email(raw)?;
            if email != record.email && tx.customer_email_exists(&email, Some(id)).await? {
                return Err(DomainError::rule(format!(
                    "Email {email} is already in use"
                )));
            }
            record.email = email;
        }
        if let Some(ref first_name) = cmd.first_name {
            record.first_name = validation::required(
                "First name",
                first_name,
                validation::MAX_CUSTOMER_NAME_LENGTH,
            )?;
        }
        if let Some(ref last_name) = cmd.last_name {
            record.last_name = validation::required(
                "Last name",
                last_name,
                validation::MAX_CUSTOMER_NAME_LENGTH,
            )?;
        }
        if cmd.phone.is_some() {
            record.phone = validation::phone(cmd.phone.as_deref())?;
        }
        if cmd.date_of_birth.is_some() {
            record.date_of_birth = cmd.date_of_birth;
        }
        record.updated_at = Some(Utc::now());

        tx.update_customer(&record).await?;
        tx.commit().await?;

        tracing::info!(customer_id = %id, "customer updated");
        Ok(record.into())
    }

    /// Deletes a customer. Returns `false` if the customer does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete_customer(&self, id: CustomerId) -> Result<bool> {
        let mut tx = self.store.begin().await?;
        if tx.get_customer(id).await?.is_none() {
            return Ok(false);
        }
        if tx.customer_has_orders(id).await? {
            return Err(DomainError::rule(
                "Cannot delete customer with existing orders",
            ));
        }
        let deleted = tx.delete_customer(id).await?;
        tx.commit().await?;

        tracing::info!(customer_id = %id, "customer deleted");
        Ok(deleted)
    }

    /// Adds an address. A new default address replaces the previous default.
    #[tracing::instrument(skip(self, cmd))]
    pub async fn add_address(
        &self,
        customer_id: CustomerId,
        cmd: CreateAddress,
    ) -> Result<AddressView> {
        let street = validation::required("Street", &cmd.street, 200)?;
        let address_line2 = validation::optional("Address line 2", cmd.address_line2.as_deref(), 200)?;
        let city = validation::required("City", &cmd.city, 100)?;
        let state = validation::required("State", &cmd.state, 100)?;
        let country = validation::required("Country", &cmd.country, 100)?;
        let postal_code = validation::required("Postal code", &cmd.postal_code, 20)?;

        let mut tx = self.store.begin().await?;
        if tx.get_customer(customer_id).await?.is_none() {
            return Err(DomainError::not_found("Customer", customer_id));
        }
        let is_default = cmd.is_default || tx.list_addresses(customer_id).await?.is_empty();
        if is_default {
            tx.clear_default_addresses(customer_id).await?;
        }

        let record = AddressRecord {
            id: AddressId::new(),
            customer_id,
            street,
            address_line2,
            city,
            state,
            country,
            postal_code,
            address_type: cmd.address_type,
            is_default,
            created_at: Utc::now(),
            updated_at: None,
        };
        tx.insert_address(&record).await?;
        tx.commit().await?;

        tracing::info!(%customer_id, address_id = %record.id, "address added");
        Ok(record.into())
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_addresses(&self, customer_id: CustomerId) -> Result<Vec<AddressView>> {
        let mut tx = self.store.begin().await?;
        if tx.get_customer(customer_id).await?.is_none() {
            return Err(DomainError::not_found("Customer", customer_id));
        }
        Ok(tx
            .list_addresses(customer_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}
