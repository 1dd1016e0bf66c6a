use async_trait::async_trait;
use manifest_core::{
    Baggage, BaggageRepository, BaggageWithPassenger, CoreError, CoreResult, NewBaggage,
    NewPassenger, Passenger, PassengerRepository, PassengerSummary, Weight,
};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use tracing::{error, info};

/// PostgreSQL-backed store for passengers and their bags.
///
/// Weights live in a `NUMERIC(5,2)` column and are bound and decoded as
/// `rust_decimal::Decimal`, so no floating point is involved on either side.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> CoreResult<sqlx::pool::PoolConnection<sqlx::Postgres>> {
        self.pool
            .acquire()
            .await
            .map_err(|e| storage_error("acquire connection", e))
    }

    async fn begin(&self) -> CoreResult<sqlx::Transaction<'static, sqlx::Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| storage_error("begin transaction", e))
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct PassengerRow {
    id: i64,
    name: String,
    number: String,
    flight: String,
    scheduled_time: String,
}

#[derive(sqlx::FromRow)]
struct BaggageRow {
    id: i64,
    weight: Decimal,
    fragile: bool,
    passenger_id: i64,
}

#[derive(sqlx::FromRow)]
struct BaggageJoinRow {
    id: i64,
    weight: Decimal,
    fragile: bool,
    passenger_id: i64,
    name: String,
    number: String,
    flight: String,
    scheduled_time: String,
}

impl From<BaggageRow> for Baggage {
    fn from(row: BaggageRow) -> Self {
        Baggage {
            id: row.id,
            weight: Weight::from_decimal(row.weight),
            fragile: row.fragile,
            passenger_id: row.passenger_id,
        }
    }
}

impl From<BaggageJoinRow> for BaggageWithPassenger {
    fn from(row: BaggageJoinRow) -> Self {
        BaggageWithPassenger {
            bag: Baggage {
                id: row.id,
                weight: Weight::from_decimal(row.weight),
                fragile: row.fragile,
                passenger_id: row.passenger_id,
            },
            passenger: PassengerSummary {
                id: row.passenger_id,
                name: row.name,
                number: row.number,
                flight: row.flight,
                scheduled_time: row.scheduled_time,
            },
        }
    }
}

impl PassengerRow {
    fn into_passenger(self, bags: Vec<Baggage>) -> Passenger {
        Passenger {
            id: self.id,
            name: self.name,
            number: self.number,
            flight: self.flight,
            scheduled_time: self.scheduled_time,
            bags,
        }
    }
}

/// Attach bags to their owners. Both inputs are expected in id order.
fn assemble(rows: Vec<PassengerRow>, bags: Vec<BaggageRow>) -> Vec<Passenger> {
    let mut owned: HashMap<i64, Vec<Baggage>> = HashMap::new();
    for bag in bags {
        owned.entry(bag.passenger_id).or_default().push(bag.into());
    }

    rows.into_iter()
        .map(|row| {
            let bags = owned.remove(&row.id).unwrap_or_default();
            row.into_passenger(bags)
        })
        .collect()
}

const SELECT_PASSENGERS: &str =
    "SELECT id, name, number, flight, scheduled_time FROM passengers";

const SELECT_BAGGAGE: &str =
    "SELECT id, weight, fragile, passenger_id FROM baggage";

const SELECT_BAGGAGE_JOIN: &str = r#"
    SELECT b.id, b.weight, b.fragile, b.passenger_id,
           p.name, p.number, p.flight, p.scheduled_time
    FROM baggage b
    JOIN passengers p ON p.id = b.passenger_id
"#;

const SNAPSHOT_READ: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

fn storage_error(context: &str, err: sqlx::Error) -> CoreError {
    error!("Storage failure ({}): {}", context, err);
    CoreError::Storage(format!("{}: {}", context, err))
}

async fn fetch_passenger(conn: &mut PgConnection, id: i64) -> CoreResult<Passenger> {
    let row = sqlx::query_as::<_, PassengerRow>(&format!("{} WHERE id = $1", SELECT_PASSENGERS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| storage_error("fetch passenger", e))?
        .ok_or_else(|| CoreError::passenger_not_found(id))?;

    let bags = sqlx::query_as::<_, BaggageRow>(&format!(
        "{} WHERE passenger_id = $1 ORDER BY id",
        SELECT_BAGGAGE
    ))
    .bind(id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| storage_error("fetch passenger baggage", e))?;

    Ok(row.into_passenger(bags.into_iter().map(Baggage::from).collect()))
}

async fn fetch_baggage(conn: &mut PgConnection, id: i64) -> CoreResult<BaggageWithPassenger> {
    sqlx::query_as::<_, BaggageJoinRow>(&format!("{} WHERE b.id = $1", SELECT_BAGGAGE_JOIN))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| storage_error("fetch baggage", e))?
        .map(BaggageWithPassenger::from)
        .ok_or_else(|| CoreError::baggage_not_found(id))
}

async fn insert_bags(conn: &mut PgConnection, passenger_id: i64, bags: &[NewBaggage]) -> CoreResult<()> {
    for bag in bags {
        sqlx::query(
            r#"
            INSERT INTO baggage (weight, fragile, passenger_id)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(bag.weight.to_decimal())
        .bind(bag.fragile)
        .bind(passenger_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| storage_error("insert baggage", e))?;
    }
    Ok(())
}

#[async_trait]
impl PassengerRepository for PostgresStore {
    async fn list_passengers(&self) -> CoreResult<Vec<Passenger>> {
        // Both reads must see one snapshot, or a concurrent delete shows up
        // as a passenger without bags.
        let mut tx = self.begin().await?;
        sqlx::query(SNAPSHOT_READ)
            .execute(&mut *tx)
            .await
            .map_err(|e| storage_error("set snapshot isolation", e))?;

        let rows = sqlx::query_as::<_, PassengerRow>(&format!("{} ORDER BY id", SELECT_PASSENGERS))
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| storage_error("list passengers", e))?;

        let bags = sqlx::query_as::<_, BaggageRow>(&format!("{} ORDER BY id", SELECT_BAGGAGE))
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| storage_error("list baggage", e))?;

        tx.commit()
            .await
            .map_err(|e| storage_error("commit passenger listing", e))?;

        Ok(assemble(rows, bags))
    }

    async fn get_passenger(&self, id: i64) -> CoreResult<Passenger> {
        let mut conn = self.conn().await?;
        fetch_passenger(&mut conn, id).await
    }

    async fn create_passenger(&self, input: &NewPassenger) -> CoreResult<Passenger> {
        input.validate()?;
        let mut tx = self.begin().await?;

        // The UNIQUE constraint on `number` is the arbiter between racing writers.
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO passengers (name, number, flight, scheduled_time)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&input.name)
        .bind(&input.number)
        .bind(&input.flight)
        .bind(&input.scheduled_time)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CoreError::duplicate_number(&input.number)
            } else {
                storage_error("insert passenger", e)
            }
        })?;

        insert_bags(&mut tx, id, &input.bags).await?;
        let passenger = fetch_passenger(&mut tx, id).await?;

        tx.commit()
            .await
            .map_err(|e| storage_error("commit passenger", e))?;

        info!("Passenger {} created with {} bags", id, passenger.bags.len());
        Ok(passenger)
    }

    async fn update_passenger(&self, id: i64, input: &NewPassenger) -> CoreResult<Passenger> {
        input.validate()?;
        let mut tx = self.begin().await?;

        let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM passengers WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| storage_error("lock passenger", e))?;
        if locked.is_none() {
            return Err(CoreError::passenger_not_found(id));
        }

        sqlx::query(
            r#"
            UPDATE passengers
            SET name = $1, number = $2, flight = $3, scheduled_time = $4
            WHERE id = $5
            "#,
        )
        .bind(&input.name)
        .bind(&input.number)
        .bind(&input.flight)
        .bind(&input.scheduled_time)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CoreError::duplicate_number(&input.number)
            } else {
                storage_error("update passenger", e)
            }
        })?;

        let removed = sqlx::query("DELETE FROM baggage WHERE passenger_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| storage_error("replace baggage", e))?
            .rows_affected();

        insert_bags(&mut tx, id, &input.bags).await?;
        let passenger = fetch_passenger(&mut tx, id).await?;

        tx.commit()
            .await
            .map_err(|e| storage_error("commit passenger update", e))?;

        info!(
            "Passenger {} updated: {} bags replaced by {}",
            id,
            removed,
            passenger.bags.len()
        );
        Ok(passenger)
    }

    async fn delete_passenger(&self, id: i64) -> CoreResult<()> {
        // baggage rows go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM passengers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("delete passenger", e))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::passenger_not_found(id));
        }
        info!("Passenger {} deleted", id);
        Ok(())
    }
}

#[async_trait]
impl BaggageRepository for PostgresStore {
    async fn list_baggage(&self) -> CoreResult<Vec<BaggageWithPassenger>> {
        let rows = sqlx::query_as::<_, BaggageJoinRow>(&format!("{} ORDER BY b.id", SELECT_BAGGAGE_JOIN))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("list baggage", e))?;

        Ok(rows.into_iter().map(BaggageWithPassenger::from).collect())
    }

    async fn get_baggage(&self, id: i64) -> CoreResult<BaggageWithPassenger> {
        let mut conn = self.conn().await?;
        fetch_baggage(&mut conn, id).await
    }

    async fn add_baggage(
        &self,
        passenger_id: i64,
        input: &NewBaggage,
    ) -> CoreResult<BaggageWithPassenger> {
        input.validate()?;
        let mut conn = self.conn().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO baggage (weight, fragile, passenger_id)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(input.weight.to_decimal())
        .bind(input.fragile)
        .bind(passenger_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                CoreError::passenger_not_found(passenger_id)
            } else {
                storage_error("insert baggage", e)
            }
        })?;

        info!("Baggage {} added to passenger {}", id, passenger_id);
        fetch_baggage(&mut conn, id).await
    }

    async fn update_baggage(&self, id: i64, input: &NewBaggage) -> CoreResult<BaggageWithPassenger> {
        input.validate()?;
        let mut conn = self.conn().await?;

        let result = sqlx::query(
            "UPDATE baggage SET weight = $1, fragile = $2 WHERE id = $3",
        )
        .bind(input.weight.to_decimal())
        .bind(input.fragile)
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| storage_error("update baggage", e))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::baggage_not_found(id));
        }
        fetch_baggage(&mut conn, id).await
    }

    async fn delete_baggage(&self, id: i64) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM baggage WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("delete baggage", e))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::baggage_not_found(id));
        }
        Ok(())
    }

    async fn list_baggage_for_passenger(
        &self,
        passenger_id: i64,
    ) -> CoreResult<Vec<BaggageWithPassenger>> {
        let rows = sqlx::query_as::<_, BaggageJoinRow>(&format!(
            "{} WHERE b.passenger_id = $1 ORDER BY b.id",
            SELECT_BAGGAGE_JOIN
        ))
        .bind(passenger_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("list passenger baggage", e))?;

        Ok(rows.into_iter().map(BaggageWithPassenger::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, flight: &str) -> PassengerRow {
        PassengerRow {
            id,
            name: format!("Passenger {}", id),
            number: format!("{:03}", id),
            flight: flight.to_string(),
            scheduled_time: "10:30".to_string(),
        }
    }

    fn bag_row(id: i64, passenger_id: i64, weight_hundredths: i64) -> BaggageRow {
        BaggageRow { id, weight: Decimal::new(weight_hundredths, 2), fragile: false, passenger_id }
    }

    #[test]
    fn test_assemble_groups_bags_by_owner() {
        let passengers = assemble(
            vec![row(1, "AZ123"), row(2, "AZ123"), row(3, "BR789")],
            vec![bag_row(10, 1, 2300), bag_row(11, 3, 2500), bag_row(12, 1, 1200)],
        );

        assert_eq!(passengers.len(), 3);
        let ids: Vec<i64> = passengers[0].bags.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![10, 12]);
        assert!(passengers[1].bags.is_empty());
        assert_eq!(passengers[2].bags[0].weight, Weight::from_units(25));
    }

    #[test]
    fn test_join_row_conversion() {
        let item = BaggageWithPassenger::from(BaggageJoinRow {
            id: 5,
            weight: Decimal::new(1767, 2),
            fragile: true,
            passenger_id: 2,
            name: "Maria Souza".to_string(),
            number: "002".to_string(),
            flight: "AZ123".to_string(),
            scheduled_time: "10:30".to_string(),
        });

        assert_eq!(item.bag.weight.to_string(), "17.67");
        assert_eq!(item.passenger.id, 2);
        assert_eq!(item.passenger.flight, "AZ123");
    }
}
