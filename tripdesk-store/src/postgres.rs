use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, QueryBuilder};
use tripdesk_core::{CoreError, CoreResult, SessionId};
use tripdesk_offer::{Offer, OfferFilter, OfferRepository, TransportMode};
use tripdesk_order::{
    decode_requirements, encode_requirements, CustomerNote, CustomerResponse, GiftDetails,
    NoteRepository, Order, OrderRepository, OrderStatus, ResponseRepository, ResponseStatus,
};
use uuid::Uuid;

fn db_err(e: sqlx::Error) -> CoreError {
    CoreError::Internal(format!("database error: {e}"))
}

// ============================================================================
// Offers
// ============================================================================

pub struct PgOfferRepository {
    pool: PgPool,
}

impl PgOfferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OfferRow {
    id: Uuid,
    agent_session_id: String,
    destination_name: String,
    country: String,
    city: Option<String>,
    origin: String,
    destination: String,
    capacity_available: i32,
    capacity_total: i32,
    date_from: NaiveDate,
    date_to: NaiveDate,
    season: String,
    type_of_stay: Option<String>,
    price_housing: i64,
    price_food: i64,
    price_transport_mode: String,
    price_transport_amount: Option<i64>,
    short_description: String,
    extended_description: Option<String>,
    image_url: Option<String>,
    image_credit_source: Option<String>,
    image_credit_author: Option<String>,
    image_credit_link: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OfferRow {
    fn into_offer(self) -> CoreResult<Offer> {
        let mode = TransportMode::parse(&self.price_transport_mode).ok_or_else(|| {
            CoreError::Internal(format!(
                "offer {} has unknown transport mode {:?}",
                self.id, self.price_transport_mode
            ))
        })?;
        let type_of_stay = self
            .type_of_stay
            .as_deref()
            .map(|raw| serde_json::from_str(raw).unwrap_or_default())
            .unwrap_or_default();
        Ok(Offer {
            id: self.id,
            agent_session_id: self.agent_session_id,
            destination_name: self.destination_name,
            country: self.country,
            city: self.city,
            origin: self.origin,
            destination: self.destination,
            capacity_available: self.capacity_available,
            capacity_total: self.capacity_total,
            date_from: self.date_from,
            date_to: self.date_to,
            season: self.season,
            type_of_stay,
            price_housing: self.price_housing,
            price_food: self.price_food,
            price_transport_mode: mode,
            price_transport_amount: self.price_transport_amount,
            short_description: self.short_description,
            extended_description: self.extended_description,
            image_url: self.image_url,
            image_credit_source: self.image_credit_source,
            image_credit_author: self.image_credit_author,
            image_credit_link: self.image_credit_link,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn stays_json(stays: &[String]) -> Option<String> {
    if stays.is_empty() {
        None
    } else {
        serde_json::to_string(stays).ok()
    }
}

const OFFER_COLUMNS: &str = "id, agent_session_id, destination_name, country, city, origin, \
     destination, capacity_available, capacity_total, date_from, date_to, season, type_of_stay, \
     price_housing, price_food, price_transport_mode, price_transport_amount, short_description, \
     extended_description, image_url, image_credit_source, image_credit_author, image_credit_link, \
     created_at, updated_at";

#[async_trait]
impl OfferRepository for PgOfferRepository {
    async fn insert(&self, offer: &Offer) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO offers (id, agent_session_id, destination_name, country, city, origin, \
             destination, capacity_available, capacity_total, date_from, date_to, season, \
             type_of_stay, price_housing, price_food, price_transport_mode, \
             price_transport_amount, short_description, extended_description, image_url, \
             image_credit_source, image_credit_author, image_credit_link, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
             $18, $19, $20, $21, $22, $23, $24, $25)",
        )
        .bind(offer.id)
        .bind(&offer.agent_session_id)
        .bind(&offer.destination_name)
        .bind(&offer.country)
        .bind(&offer.city)
        .bind(&offer.origin)
        .bind(&offer.destination)
        .bind(offer.capacity_available)
        .bind(offer.capacity_total)
        .bind(offer.date_from)
        .bind(offer.date_to)
        .bind(&offer.season)
        .bind(stays_json(&offer.type_of_stay))
        .bind(offer.price_housing)
        .bind(offer.price_food)
        .bind(offer.price_transport_mode.as_str())
        .bind(offer.price_transport_amount)
        .bind(&offer.short_description)
        .bind(&offer.extended_description)
        .bind(&offer.image_url)
        .bind(&offer.image_credit_source)
        .bind(&offer.image_credit_author)
        .bind(&offer.image_credit_link)
        .bind(offer.created_at)
        .bind(offer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> CoreResult<Option<Offer>> {
        let row: Option<OfferRow> =
            sqlx::query_as(&format!("SELECT {OFFER_COLUMNS} FROM offers WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(OfferRow::into_offer).transpose()
    }

    async fn update(&self, offer: &Offer) -> CoreResult<()> {
        let result = sqlx::query(
            "UPDATE offers SET destination_name = $2, country = $3, city = $4, origin = $5, \
             destination = $6, capacity_available = $7, capacity_total = $8, date_from = $9, \
             date_to = $10, season = $11, type_of_stay = $12, price_housing = $13, \
             price_food = $14, price_transport_mode = $15, price_transport_amount = $16, \
             short_description = $17, extended_description = $18, image_url = $19, \
             image_credit_source = $20, image_credit_author = $21, image_credit_link = $22, \
             updated_at = now() WHERE id = $1",
        )
        .bind(offer.id)
        .bind(&offer.destination_name)
        .bind(&offer.country)
        .bind(&offer.city)
        .bind(&offer.origin)
        .bind(&offer.destination)
        .bind(offer.capacity_available)
        .bind(offer.capacity_total)
        .bind(offer.date_from)
        .bind(offer.date_to)
        .bind(&offer.season)
        .bind(stays_json(&offer.type_of_stay))
        .bind(offer.price_housing)
        .bind(offer.price_food)
        .bind(offer.price_transport_mode.as_str())
        .bind(offer.price_transport_amount)
        .bind(&offer.short_description)
        .bind(&offer.extended_description)
        .bind(&offer.image_url)
        .bind(&offer.image_credit_source)
        .bind(&offer.image_credit_author)
        .bind(&offer.image_credit_link)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound("Offer not found".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM offers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound("Offer not found".to_string()));
        }
        Ok(())
    }

    async fn list(&self, filter: &OfferFilter) -> CoreResult<Vec<Offer>> {
        let mut qb: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {OFFER_COLUMNS} FROM offers WHERE 1 = 1"));

        if let Some(origin) = &filter.origin {
            qb.push(" AND origin ILIKE ");
            qb.push_bind(format!("%{origin}%"));
        }
        if let Some(destination) = &filter.destination {
            qb.push(" AND destination ILIKE ");
            qb.push_bind(format!("%{destination}%"));
        }
        if let Some(min) = filter.capacity_min {
            qb.push(" AND capacity_available >= ");
            qb.push_bind(min);
        }
        if let Some(max) = filter.capacity_max {
            qb.push(" AND capacity_available <= ");
            qb.push_bind(max);
        }
        if let Some(from) = filter.date_from {
            qb.push(" AND date_from >= ");
            qb.push_bind(from);
        }
        if let Some(to) = filter.date_to {
            qb.push(" AND date_to <= ");
            qb.push_bind(to);
        }
        if let Some(season) = &filter.season {
            qb.push(" AND lower(season) = lower(");
            qb.push_bind(season);
            qb.push(")");
        }
        if let Some(stays) = &filter.type_of_stay {
            if !stays.is_empty() {
                qb.push(" AND (");
                let mut sep = qb.separated(" OR ");
                for stay in stays {
                    sep.push("type_of_stay ILIKE ");
                    sep.push_bind_unseparated(format!("%{stay}%"));
                }
                qb.push(")");
            }
        }
        if let Some(mode) = filter.transport_mode {
            qb.push(" AND price_transport_mode = ");
            qb.push_bind(mode.as_str());
        }
        qb.push(" ORDER BY created_at DESC");

        // The derived total-price range stays in application code.
        let rows: Vec<OfferRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter().map(OfferRow::into_offer).collect()
    }
}

// ============================================================================
// Orders
// ============================================================================

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    customer_session_id: String,
    offer_id: Uuid,
    number_of_people: i32,
    selected_transport_mode: String,
    special_requirements: Option<String>,
    is_gift: bool,
    gift_recipient_email: Option<String>,
    gift_recipient_name: Option<String>,
    gift_sender_name: Option<String>,
    gift_note: Option<String>,
    gift_subject: Option<String>,
    order_status: String,
    created_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn into_order(self) -> CoreResult<Order> {
        let mode = TransportMode::parse(&self.selected_transport_mode).ok_or_else(|| {
            CoreError::Internal(format!(
                "order {} has unknown transport mode {:?}",
                self.id, self.selected_transport_mode
            ))
        })?;
        let status = OrderStatus::parse(&self.order_status).ok_or_else(|| {
            CoreError::Internal(format!(
                "order {} has unknown status {:?}",
                self.id, self.order_status
            ))
        })?;
        let gift = if self.is_gift {
            match (
                self.gift_recipient_email,
                self.gift_recipient_name,
                self.gift_sender_name,
            ) {
                (Some(recipient_email), Some(recipient_name), Some(sender_name)) => {
                    Some(GiftDetails {
                        recipient_email,
                        recipient_name,
                        sender_name,
                        note: self.gift_note,
                        subject: self.gift_subject,
                    })
                }
                _ => None,
            }
        } else {
            None
        };
        Ok(Order {
            id: self.id,
            customer_session_id: self.customer_session_id,
            offer_id: self.offer_id,
            number_of_people: self.number_of_people,
            selected_transport_mode: mode,
            special_requirements: decode_requirements(self.special_requirements.as_deref()),
            gift,
            status,
            created_at: self.created_at,
            confirmed_at: self.confirmed_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, customer_session_id, offer_id, number_of_people, \
     selected_transport_mode, special_requirements, is_gift, gift_recipient_email, \
     gift_recipient_name, gift_sender_name, gift_note, gift_subject, order_status, created_at, \
     confirmed_at";

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn insert(&self, order: &Order) -> CoreResult<()> {
        let gift = order.gift.as_ref();
        sqlx::query(
            "INSERT INTO orders (id, customer_session_id, offer_id, number_of_people, \
             selected_transport_mode, special_requirements, is_gift, gift_recipient_email, \
             gift_recipient_name, gift_sender_name, gift_note, gift_subject, order_status, \
             created_at, confirmed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(order.id)
        .bind(&order.customer_session_id)
        .bind(order.offer_id)
        .bind(order.number_of_people)
        .bind(order.selected_transport_mode.as_str())
        .bind(encode_requirements(&order.special_requirements))
        .bind(gift.is_some())
        .bind(gift.map(|g| g.recipient_email.clone()))
        .bind(gift.map(|g| g.recipient_name.clone()))
        .bind(gift.map(|g| g.sender_name.clone()))
        .bind(gift.and_then(|g| g.note.clone()))
        .bind(gift.and_then(|g| g.subject.clone()))
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.confirmed_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get(&self, customer: &SessionId, id: Uuid) -> CoreResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND customer_session_id = $2"
        ))
        .bind(id)
        .bind(customer.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(OrderRow::into_order).transpose()
    }

    async fn update(&self, order: &Order) -> CoreResult<()> {
        let gift = order.gift.as_ref();
        let result = sqlx::query(
            "UPDATE orders SET number_of_people = $3, selected_transport_mode = $4, \
             special_requirements = $5, is_gift = $6, gift_recipient_email = $7, \
             gift_recipient_name = $8, gift_sender_name = $9, gift_note = $10, \
             gift_subject = $11, order_status = $12, confirmed_at = $13 \
             WHERE id = $1 AND customer_session_id = $2",
        )
        .bind(order.id)
        .bind(&order.customer_session_id)
        .bind(order.number_of_people)
        .bind(order.selected_transport_mode.as_str())
        .bind(encode_requirements(&order.special_requirements))
        .bind(gift.is_some())
        .bind(gift.map(|g| g.recipient_email.clone()))
        .bind(gift.map(|g| g.recipient_name.clone()))
        .bind(gift.map(|g| g.sender_name.clone()))
        .bind(gift.and_then(|g| g.note.clone()))
        .bind(gift.and_then(|g| g.subject.clone()))
        .bind(order.status.as_str())
        .bind(order.confirmed_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound("Order not found".to_string()));
        }
        Ok(())
    }

    async fn list_for_customer(
        &self,
        customer: &SessionId,
        status: Option<OrderStatus>,
    ) -> CoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = match status {
            Some(status) => sqlx::query_as(&format!(
                "SELECT {ORDER_COLUMNS} FROM orders \
                 WHERE customer_session_id = $1 AND order_status = $2 ORDER BY created_at DESC"
            ))
            .bind(customer.as_str())
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?,
            None => sqlx::query_as(&format!(
                "SELECT {ORDER_COLUMNS} FROM orders \
                 WHERE customer_session_id = $1 ORDER BY created_at DESC"
            ))
            .bind(customer.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?,
        };
        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn confirmed_people(&self, offer_id: Uuid) -> CoreResult<i32> {
        let sum: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(number_of_people) FROM orders \
             WHERE offer_id = $1 AND order_status = 'CONFIRMED'",
        )
        .bind(offer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(sum.unwrap_or(0) as i32)
    }

    async fn delete(&self, customer: &SessionId, id: Uuid) -> CoreResult<()> {
        let result =
            sqlx::query("DELETE FROM orders WHERE id = $1 AND customer_session_id = $2")
                .bind(id)
                .bind(customer.as_str())
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound("Order not found".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Responses
// ============================================================================

pub struct PgResponseRepository {
    pool: PgPool,
}

impl PgResponseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ResponseRow {
    id: Uuid,
    customer_session_id: String,
    offer_id: Uuid,
    response_status: String,
    created_at: DateTime<Utc>,
}

impl ResponseRow {
    fn into_response(self) -> CoreResult<CustomerResponse> {
        let status = ResponseStatus::parse(&self.response_status).ok_or_else(|| {
            CoreError::Internal(format!(
                "response {} has unknown status {:?}",
                self.id, self.response_status
            ))
        })?;
        Ok(CustomerResponse {
            id: self.id,
            customer_session_id: self.customer_session_id,
            offer_id: self.offer_id,
            status,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl ResponseRepository for PgResponseRepository {
    async fn upsert(
        &self,
        customer: &SessionId,
        offer_id: Uuid,
        status: ResponseStatus,
    ) -> CoreResult<CustomerResponse> {
        let row: ResponseRow = sqlx::query_as(
            "INSERT INTO offer_responses (id, customer_session_id, offer_id, response_status) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (customer_session_id, offer_id) \
             DO UPDATE SET response_status = EXCLUDED.response_status \
             RETURNING id, customer_session_id, offer_id, response_status, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(customer.as_str())
        .bind(offer_id)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        row.into_response()
    }

    async fn get(
        &self,
        customer: &SessionId,
        offer_id: Uuid,
    ) -> CoreResult<Option<CustomerResponse>> {
        let row: Option<ResponseRow> = sqlx::query_as(
            "SELECT id, customer_session_id, offer_id, response_status, created_at \
             FROM offer_responses WHERE customer_session_id = $1 AND offer_id = $2",
        )
        .bind(customer.as_str())
        .bind(offer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(ResponseRow::into_response).transpose()
    }

    async fn list_for_customer(&self, customer: &SessionId) -> CoreResult<Vec<CustomerResponse>> {
        let rows: Vec<ResponseRow> = sqlx::query_as(
            "SELECT id, customer_session_id, offer_id, response_status, created_at \
             FROM offer_responses WHERE customer_session_id = $1",
        )
        .bind(customer.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(ResponseRow::into_response).collect()
    }

    async fn list_by_status(
        &self,
        customer: &SessionId,
        status: ResponseStatus,
    ) -> CoreResult<Vec<CustomerResponse>> {
        let rows: Vec<ResponseRow> = sqlx::query_as(
            "SELECT id, customer_session_id, offer_id, response_status, created_at \
             FROM offer_responses WHERE customer_session_id = $1 AND response_status = $2",
        )
        .bind(customer.as_str())
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(ResponseRow::into_response).collect()
    }
}

// ============================================================================
// Notes
// ============================================================================

pub struct PgNoteRepository {
    pool: PgPool,
}

impl PgNoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct NoteRow {
    customer_session_id: String,
    offer_id: Uuid,
    note_text: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl NoteRow {
    fn into_note(self) -> CustomerNote {
        CustomerNote {
            customer_session_id: self.customer_session_id,
            offer_id: self.offer_id,
            note_text: self.note_text,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn upsert(
        &self,
        customer: &SessionId,
        offer_id: Uuid,
        note_text: String,
    ) -> CoreResult<CustomerNote> {
        let row: NoteRow = sqlx::query_as(
            "INSERT INTO offer_notes (customer_session_id, offer_id, note_text) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (customer_session_id, offer_id) \
             DO UPDATE SET note_text = EXCLUDED.note_text, updated_at = now() \
             RETURNING customer_session_id, offer_id, note_text, created_at, updated_at",
        )
        .bind(customer.as_str())
        .bind(offer_id)
        .bind(note_text)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.into_note())
    }

    async fn get(&self, customer: &SessionId, offer_id: Uuid) -> CoreResult<Option<CustomerNote>> {
        let row: Option<NoteRow> = sqlx::query_as(
            "SELECT customer_session_id, offer_id, note_text, created_at, updated_at \
             FROM offer_notes WHERE customer_session_id = $1 AND offer_id = $2",
        )
        .bind(customer.as_str())
        .bind(offer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(NoteRow::into_note))
    }

    async fn list_for_customer(&self, customer: &SessionId) -> CoreResult<Vec<CustomerNote>> {
        let rows: Vec<NoteRow> = sqlx::query_as(
            "SELECT customer_session_id, offer_id, note_text, created_at, updated_at \
             FROM offer_notes WHERE customer_session_id = $1",
        )
        .bind(customer.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(NoteRow::into_note).collect())
    }
}
