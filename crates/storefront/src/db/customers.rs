//! Customer repository and the onboarding transaction.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use petbox_core::{AddressId, Cpf, CustomerId, PetId, Phone};

use super::{CustomerStore, RepositoryError};
use crate::models::{
    Customer, CustomerLookup, CustomerRef, NewCustomer, NewOnboarding, OnboardingRecord,
};

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: CustomerId,
    name: String,
    email: String,
    phone: String,
    document: Option<String>,
    billing_customer_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let phone = Phone::parse(&row.phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone for customer {}: {e}", row.id))
        })?;
        // Blank documents are treated as absent.
        let document = row.document.as_deref().and_then(|d| Cpf::parse(d).ok());

        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone,
            document,
            billing_customer_id: row.billing_customer_id,
            created_at: row.created_at,
        })
    }
}

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a customer by phone, the first one created if several match.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored phone is invalid.
    pub async fn get_by_phone(&self, phone: &Phone) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, name, email, phone, document, billing_customer_id, created_at
            FROM petbox.customer
            WHERE phone = $1
            ORDER BY created_at
            LIMIT 1
            ",
        )
        .bind(phone.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    /// Get a customer by CPF, the first one created if several match.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored phone is invalid.
    pub async fn get_by_document(
        &self,
        document: &Cpf,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, name, email, phone, document, billing_customer_id, created_at
            FROM petbox.customer
            WHERE document = $1
            ORDER BY created_at
            LIMIT 1
            ",
        )
        .bind(document.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    /// Insert a customer, or return the existing row with the same phone.
    ///
    /// The boolean is `true` when a row was inserted.
    async fn insert_or_reuse(
        tx: &mut Transaction<'_, Postgres>,
        customer: &NewCustomer,
    ) -> Result<(CustomerId, Option<String>, bool), RepositoryError> {
        let inserted: Option<(CustomerId, Option<String>)> = sqlx::query_as(
            r"
            INSERT INTO petbox.customer (name, email, phone, document)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (phone) DO NOTHING
            RETURNING id, billing_customer_id
            ",
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(customer.phone.as_str())
        .bind(customer.document.as_ref().map(Cpf::as_str))
        .fetch_optional(&mut **tx)
        .await?;

        if let Some((id, billing)) = inserted {
            return Ok((id, billing, true));
        }

        let (id, billing): (CustomerId, Option<String>) = sqlx::query_as(
            r"
            SELECT id, billing_customer_id
            FROM petbox.customer
            WHERE phone = $1
            ",
        )
        .bind(customer.phone.as_str())
        .fetch_one(&mut **tx)
        .await?;

        Ok((id, billing, false))
    }
}

impl CustomerStore for CustomerRepository<'_> {
    async fn find_customer(
        &self,
        lookup: &CustomerLookup,
    ) -> Result<Option<Customer>, RepositoryError> {
        match lookup {
            CustomerLookup::Phone(phone) => self.get_by_phone(phone).await,
            CustomerLookup::Document(document) => self.get_by_document(document).await,
        }
    }

    async fn create_onboarding(
        &self,
        onboarding: &NewOnboarding,
    ) -> Result<OnboardingRecord, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (customer_id, billing_customer_id, customer_created) = match &onboarding.customer {
            CustomerRef::Existing(id) => {
                let billing: Option<Option<String>> = sqlx::query_scalar(
                    r"
                    SELECT billing_customer_id
                    FROM petbox.customer
                    WHERE id = $1
                    ",
                )
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
                let billing = billing.ok_or(RepositoryError::NotFound)?;
                (*id, billing, false)
            }
            CustomerRef::New(customer) => Self::insert_or_reuse(&mut tx, customer).await?,
        };

        let address = &onboarding.address;
        let address_id: AddressId = sqlx::query_scalar(
            r"
            INSERT INTO petbox.address
                (customer_id, street, number, complement, neighborhood, city, state,
                 postal_code, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            ",
        )
        .bind(customer_id)
        .bind(&address.street)
        .bind(&address.number)
        .bind(address.complement.as_deref())
        .bind(address.neighborhood.as_deref())
        .bind(&address.city)
        .bind(&address.state)
        .bind(address.postal_code.as_str())
        .bind(address.is_default)
        .fetch_one(&mut *tx)
        .await?;

        let pet = &onboarding.pet;
        let pet_id: PetId = sqlx::query_scalar(
            r"
            INSERT INTO petbox.pet
                (customer_id, name, species, breed, size, gender, birth_date, allergies)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(customer_id)
        .bind(&pet.name)
        .bind(pet.species)
        .bind(pet.breed.as_deref())
        .bind(pet.size)
        .bind(pet.gender)
        .bind(pet.birth_date)
        .bind(&pet.allergies)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(OnboardingRecord {
            customer_id,
            customer_created,
            billing_customer_id,
            address_id,
            pet_id,
        })
    }

    async fn set_billing_customer_id(
        &self,
        id: CustomerId,
        billing_customer_id: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE petbox.customer
            SET billing_customer_id = $2
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(billing_customer_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
