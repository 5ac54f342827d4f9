use crate::domain::models::{NewSubmission, Submission, User};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

const SESSION_COLUMNS: &str = r#"
    id,
    user_id,
    sleep_hours,
    work_intensity,
    stress_level,
    mood_score,
    screen_time,
    hydration,
    daily_score,
    day_classification,
    persona,
    recommendations,
    created_at
"#;

/// Create a user or return the existing one with the same username.
pub async fn create_or_get_user(pool: &PgPool, username: &str) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username)
        VALUES ($1)
        ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username
        RETURNING id, username, created_at
        "#,
    )
    .bind(username)
    .fetch_one(pool)
    .await?;
    Ok(user)
}

pub async fn find_user_by_id(pool: &PgPool, id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn insert_session(pool: &PgPool, new: &NewSubmission) -> Result<Submission> {
    let m = &new.metrics;
    let p = &new.prediction;
    let sql = format!(
        r#"
        INSERT INTO habit_sessions (
            user_id, sleep_hours, work_intensity, stress_level, mood_score,
            screen_time, hydration, daily_score, day_classification, persona,
            recommendations
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {SESSION_COLUMNS}
        "#
    );
    let session = sqlx::query_as::<_, Submission>(&sql)
        .bind(new.user_id)
        .bind(m.sleep_hours)
        .bind(m.work_intensity)
        .bind(m.stress_level)
        .bind(m.mood_score)
        .bind(m.screen_time)
        .bind(m.hydration)
        .bind(p.daily_score)
        .bind(&p.day_classification)
        .bind(&p.persona)
        .bind(&p.recommendations)
        .fetch_one(pool)
        .await?;
    Ok(session)
}

pub async fn count_sessions(pool: &PgPool, user_id: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM habit_sessions WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Newest first.
pub async fn list_sessions(pool: &PgPool, user_id: i64, limit: i64, offset: i64) -> Result<Vec<Submission>> {
    let sql = format!(
        r#"
        SELECT {SESSION_COLUMNS}
        FROM habit_sessions
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#
    );
    let sessions = sqlx::query_as::<_, Submission>(&sql)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(sessions)
}

pub async fn all_sessions(pool: &PgPool, user_id: i64) -> Result<Vec<Submission>> {
    let sql = format!(
        r#"
        SELECT {SESSION_COLUMNS}
        FROM habit_sessions
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#
    );
    let sessions = sqlx::query_as::<_, Submission>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(sessions)
}

pub async fn sessions_since(pool: &PgPool, user_id: i64, since: DateTime<Utc>) -> Result<Vec<Submission>> {
    let sql = format!(
        r#"
        SELECT {SESSION_COLUMNS}
        FROM habit_sessions
        WHERE user_id = $1
          AND created_at >= $2
        ORDER BY created_at DESC
        "#
    );
    let sessions = sqlx::query_as::<_, Submission>(&sql)
        .bind(user_id)
        .bind(since)
        .fetch_all(pool)
        .await?;
    Ok(sessions)
}
