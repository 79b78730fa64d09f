use log::{debug, info};
use rust_decimal::Decimal;

use crate::storage::gateway::{Gateway, SqlParam};
use crate::storage::models::{ConsumptionRecord, User, CONSUMPTION_COLUMNS, USER_COLUMNS};
use crate::storage::ConsumptionFilter;
use crate::utils::error::ServiceError;

/// Users and their monthly consumption readings.
///
/// Holds nothing but the injected [`Gateway`]; every call is a single round
/// trip to the store. Uniqueness and referential integrity are enforced by
/// the store and mapped to [`ServiceError`] on the way back.
#[derive(Clone)]
pub struct EntityService {
    gateway: Gateway,
}

impl EntityService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub async fn create_user(&self, name: Option<String>, email: &str) -> Result<User, ServiceError> {
        validate_email(email)?;

        let sql = format!(
            "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING {}",
            USER_COLUMNS
        );
        let user: User = self
            .gateway
            .fetch_one(&sql, &[SqlParam::Text(name), SqlParam::Text(Some(email.to_string()))])
            .await?;

        info!("👤 Created user {} <{}>", user.id, user.email);
        Ok(user)
    }

    pub async fn get_user(&self, id: i32) -> Result<User, ServiceError> {
        validate_id(id)?;

        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        self.gateway
            .fetch_optional(&sql, &[SqlParam::Int(id)])
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {} not found", id)))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        Ok(self.gateway.fetch_all(&sql, &[]).await?)
    }

    // The user's existence is left to the foreign key
    pub async fn create_consumption(
        &self,
        user_id: i32,
        year: i32,
        month: i32,
        cubic_meters: Decimal,
    ) -> Result<ConsumptionRecord, ServiceError> {
        validate_id(user_id)?;
        validate_month(month)?;

        let sql = format!(
            "INSERT INTO monthly_consumptions (user_id, year, month, cubic_meters) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            CONSUMPTION_COLUMNS
        );
        let record: ConsumptionRecord = self
            .gateway
            .fetch_one(
                &sql,
                &[
                    SqlParam::Int(user_id),
                    SqlParam::Int(year),
                    SqlParam::Int(month),
                    SqlParam::Decimal(cubic_meters),
                ],
            )
            .await?;

        info!(
            "💧 Recorded {} m³ for user {} ({}-{:02})",
            record.cubic_meters, record.user_id, record.year, record.month
        );
        Ok(record)
    }

    pub async fn list_consumptions_for_user(&self, user_id: i32) -> Result<Vec<ConsumptionRecord>, ServiceError> {
        validate_id(user_id)?;
        self.list_consumptions(&ConsumptionFilter {
            user_id: Some(user_id),
            ..ConsumptionFilter::default()
        })
        .await
    }

    pub async fn list_consumptions(&self, filter: &ConsumptionFilter) -> Result<Vec<ConsumptionRecord>, ServiceError> {
        let query = filter.to_query();
        debug!("Listing consumptions with {} predicate(s)", query.params.len());
        Ok(self.gateway.fetch_all(&query.sql, &query.params).await?)
    }
}

/// Parses an identifier taken from a request path or query string.
pub fn parse_id(raw: &str) -> Result<i32, ServiceError> {
    let id = raw
        .trim()
        .parse::<i32>()
        .map_err(|_| ServiceError::InvalidInput(format!("invalid id: {:?}", raw)))?;
    validate_id(id)?;
    Ok(id)
}

fn parse_number(field: &str, raw: &str) -> Result<i32, ServiceError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| ServiceError::InvalidInput(format!("invalid {}: {:?}", field, raw)))
}

/// Builds a listing filter from raw query-string values. Empty values count as absent.
pub fn parse_filter(
    user_id: Option<&str>,
    year: Option<&str>,
    month: Option<&str>,
) -> Result<ConsumptionFilter, ServiceError> {
    Ok(ConsumptionFilter {
        user_id: present(user_id).map(parse_id).transpose()?,
        year: present(year).map(|v| parse_number("year", v)).transpose()?,
        month: present(month).map(|v| parse_number("month", v)).transpose()?,
    })
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn validate_id(id: i32) -> Result<(), ServiceError> {
    if id <= 0 {
        return Err(ServiceError::InvalidInput(format!("invalid id: {}", id)));
    }
    Ok(())
}

// Presence only; the format is not checked
fn validate_email(email: &str) -> Result<(), ServiceError> {
    if email.is_empty() {
        return Err(ServiceError::InvalidInput("email required".to_string()));
    }
    Ok(())
}

fn validate_month(month: i32) -> Result<(), ServiceError> {
    if !(1..=12).contains(&month) {
        return Err(ServiceError::InvalidInput("month must be 1-12".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    // Points at a closed port; any store access fails
    fn offline_service() -> EntityService {
        let config = DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            acquire_timeout_seconds: 1,
            ..DatabaseConfig::default()
        };
        EntityService::new(Gateway::connect_lazy(&config).unwrap())
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42"), Ok(42));
        assert_eq!(parse_id(" 7 "), Ok(7));
        assert!(matches!(parse_id("abc"), Err(ServiceError::InvalidInput(_))));
        assert!(matches!(parse_id("0"), Err(ServiceError::InvalidInput(_))));
        assert!(matches!(parse_id("-3"), Err(ServiceError::InvalidInput(_))));
        assert!(matches!(parse_id("1.5"), Err(ServiceError::InvalidInput(_))));
        assert!(matches!(parse_id("99999999999"), Err(ServiceError::InvalidInput(_))));
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter(None, None, None),
            Ok(ConsumptionFilter::default())
        );
        assert_eq!(
            parse_filter(Some(""), Some("2024"), Some(" ")),
            Ok(ConsumptionFilter {
                user_id: None,
                year: Some(2024),
                month: None,
            })
        );
        assert_eq!(
            parse_filter(Some("3"), Some("2024"), Some("1")),
            Ok(ConsumptionFilter {
                user_id: Some(3),
                year: Some(2024),
                month: Some(1),
            })
        );
        assert!(matches!(
            parse_filter(None, Some("twenty"), None),
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_filter(Some("x"), None, None),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_month_bounds() {
        for month in 1..=12 {
            assert!(validate_month(month).is_ok());
        }
        for month in [i32::MIN, -1, 0, 13, 100, i32::MAX] {
            assert!(matches!(validate_month(month), Err(ServiceError::InvalidInput(_))));
        }
    }

    #[tokio::test]
    async fn test_empty_email_rejected_before_store() {
        let service = offline_service();
        let result = service.create_user(Some("Ana".to_string()), "").await;
        assert_eq!(result, Err(ServiceError::InvalidInput("email required".to_string())));
    }

    #[tokio::test]
    async fn test_out_of_range_month_rejected_before_store() {
        let service = offline_service();
        for month in [0, 13, -5] {
            let result = service.create_consumption(1, 2024, month, Decimal::new(105, 1)).await;
            assert_eq!(result, Err(ServiceError::InvalidInput("month must be 1-12".to_string())));
        }
    }

    #[tokio::test]
    async fn test_non_positive_ids_rejected_before_store() {
        let service = offline_service();
        assert!(matches!(service.get_user(0).await, Err(ServiceError::InvalidInput(_))));
        assert!(matches!(
            service.list_consumptions_for_user(-1).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_storage_error() {
        let service = offline_service();
        assert!(matches!(service.list_users().await, Err(ServiceError::StorageError(_))));
    }
}
