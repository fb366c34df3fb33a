//! Database repository for spot and photo records.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{LineType, LocationData, NewSpot, Photo, Spot};

const SPOT_COLUMNS: &str = "id, name, line_type, start_lat, start_lng, end_lat, end_lng, length, \
     anchor_type, tag, established_by, first_ascent, description, approach, location_data, created_at";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== SPOT OPERATIONS ====================

    /// List all spots in insertion order.
    pub async fn list_spots(&self) -> Result<Vec<Spot>, AppError> {
        let rows = sqlx::query(&format!("SELECT {} FROM spots ORDER BY id", SPOT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(spot_from_row).collect()
    }

    /// Get a spot by ID.
    pub async fn get_spot(&self, id: i64) -> Result<Option<Spot>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM spots WHERE id = ?", SPOT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(spot_from_row).transpose()
    }

    /// Insert a new spot and return the row as stored.
    pub async fn insert_spot(&self, spot: &NewSpot) -> Result<Spot, AppError> {
        let now = Utc::now().to_rfc3339();
        let location_json = location_to_json(spot.location_data.as_ref())?;

        let id = sqlx::query(
            r#"INSERT INTO spots (
                name, line_type, start_lat, start_lng, end_lat, end_lng, length,
                anchor_type, tag, established_by, first_ascent, description, approach,
                location_data, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&spot.name)
        .bind(spot.line_type.as_str())
        .bind(spot.start.lat)
        .bind(spot.start.lng)
        .bind(spot.end.map(|p| p.lat))
        .bind(spot.end.map(|p| p.lng))
        .bind(spot.length)
        .bind(&spot.anchor_type)
        .bind(&spot.tag)
        .bind(&spot.established_by)
        .bind(&spot.first_ascent)
        .bind(&spot.description)
        .bind(&spot.approach)
        .bind(&location_json)
        .bind(&now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_spot(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Spot {} vanished after insert", id)))
    }

    /// Overwrite every column of an existing spot. Last writer wins.
    pub async fn update_spot(&self, spot: &Spot) -> Result<Spot, AppError> {
        let location_json = location_to_json(spot.location_data.as_ref())?;

        let result = sqlx::query(
            r#"UPDATE spots SET
                name = ?, line_type = ?, start_lat = ?, start_lng = ?, end_lat = ?, end_lng = ?,
                length = ?, anchor_type = ?, tag = ?, established_by = ?, first_ascent = ?,
                description = ?, approach = ?, location_data = ?
            WHERE id = ?"#,
        )
        .bind(&spot.name)
        .bind(spot.line_type.as_str())
        .bind(spot.start_lat)
        .bind(spot.start_lng)
        .bind(spot.end_lat)
        .bind(spot.end_lng)
        .bind(spot.length)
        .bind(&spot.anchor_type)
        .bind(&spot.tag)
        .bind(&spot.established_by)
        .bind(&spot.first_ascent)
        .bind(&spot.description)
        .bind(&spot.approach)
        .bind(&location_json)
        .bind(spot.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Spot {} not found", spot.id)));
        }

        self.get_spot(spot.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Spot {} not found", spot.id)))
    }

    // ==================== PHOTO OPERATIONS ====================

    /// List the photos of a spot, oldest first.
    pub async fn list_photos(&self, spot_id: i64) -> Result<Vec<Photo>, AppError> {
        let rows = sqlx::query(
            "SELECT id, spot_id, image_url, created_at FROM line_photos WHERE spot_id = ? ORDER BY id ASC",
        )
        .bind(spot_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(photo_from_row).collect())
    }

    /// Record an uploaded photo.
    pub async fn insert_photo(&self, spot_id: i64, image_url: &str) -> Result<Photo, AppError> {
        let now = Utc::now().to_rfc3339();

        let id = sqlx::query(
            "INSERT INTO line_photos (spot_id, image_url, created_at) VALUES (?, ?, ?)",
        )
        .bind(spot_id)
        .bind(image_url)
        .bind(&now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Photo {
            id,
            spot_id,
            image_url: image_url.to_string(),
            created_at: now,
        })
    }
}

// Helper functions for row conversion

fn spot_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Spot, AppError> {
    let id: i64 = row.get("id");
    let line_type_str: String = row.get("line_type");
    let line_type = LineType::from_str(&line_type_str).ok_or_else(|| {
        AppError::Database(format!(
            "Spot {} has unknown line type '{}'",
            id, line_type_str
        ))
    })?;
    let location_str: Option<String> = row.get("location_data");

    Ok(Spot {
        id,
        name: row.get("name"),
        line_type,
        start_lat: row.get("start_lat"),
        start_lng: row.get("start_lng"),
        end_lat: row.get("end_lat"),
        end_lng: row.get("end_lng"),
        length: row.get("length"),
        anchor_type: row.get("anchor_type"),
        tag: row.get("tag"),
        established_by: row.get("established_by"),
        first_ascent: row.get("first_ascent"),
        description: row.get("description"),
        approach: row.get("approach"),
        location_data: location_str.and_then(|s| parse_location(&s)),
        created_at: row.get("created_at"),
    })
}

fn photo_from_row(row: &sqlx::sqlite::SqliteRow) -> Photo {
    Photo {
        id: row.get("id"),
        spot_id: row.get("spot_id"),
        image_url: row.get("image_url"),
        created_at: row.get("created_at"),
    }
}

fn location_to_json(location: Option<&LocationData>) -> Result<Option<String>, AppError> {
    location
        .map(serde_json::to_string)
        .transpose()
        .map_err(AppError::from)
}

fn parse_location(s: &str) -> Option<LocationData> {
    serde_json::from_str(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use crate::map::LatLng;
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let temp = TempDir::new().unwrap();
        let pool = init_database(&temp.path().join("test.sqlite")).await.unwrap();
        (Repository::new(pool), temp)
    }

    fn new_spot(name: &str) -> NewSpot {
        NewSpot {
            name: name.to_string(),
            line_type: LineType::Waterline,
            start: LatLng::new(45.9, 6.1),
            end: Some(LatLng::new(45.91, 6.11)),
            length: Some(62.5),
            anchor_type: Some("trees".to_string()),
            tag: None,
            established_by: None,
            first_ascent: None,
            description: Some("Over the lake".to_string()),
            approach: None,
            location_data: Some(LocationData::new("France", "Haute-Savoie", "Annecy")),
        }
    }

    #[tokio::test]
    async fn test_spot_insert_get_update() {
        let (repo, _temp) = repo().await;

        let created = repo.insert_spot(&new_spot("Lac")).await.unwrap();
        assert_eq!(created.name, "Lac");
        assert_eq!(created.end_lng, Some(6.11));
        assert_eq!(
            created.location_data.as_ref().and_then(|l| l.city.as_deref()),
            Some("Annecy")
        );

        let mut changed = created.clone();
        changed.length = Some(70.0);
        let updated = repo.update_spot(&changed).await.unwrap();
        assert_eq!(updated.length, Some(70.0));
        assert_eq!(updated.created_at, created.created_at);

        assert_eq!(repo.get_spot(created.id).await.unwrap(), Some(updated));
        assert!(repo.get_spot(created.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_spot() {
        let (repo, _temp) = repo().await;
        let mut ghost = repo.insert_spot(&new_spot("Ghost")).await.unwrap();
        ghost.id += 1;

        assert!(matches!(
            repo.update_spot(&ghost).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_photos_ordered_by_id() {
        let (repo, _temp) = repo().await;
        let spot = repo.insert_spot(&new_spot("Gallery")).await.unwrap();
        let other = repo.insert_spot(&new_spot("Other")).await.unwrap();

        repo.insert_photo(spot.id, "http://x/1.jpg").await.unwrap();
        repo.insert_photo(other.id, "http://x/other.jpg").await.unwrap();
        repo.insert_photo(spot.id, "http://x/2.jpg").await.unwrap();

        let photos = repo.list_photos(spot.id).await.unwrap();
        let urls: Vec<&str> = photos.iter().map(|p| p.image_url.as_str()).collect();
        assert_eq!(urls, vec!["http://x/1.jpg", "http://x/2.jpg"]);
        assert!(photos[0].id < photos[1].id);
    }
}
