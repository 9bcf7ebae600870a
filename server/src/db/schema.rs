use sqlx::AnyPool;

pub async fn migrate(pool: &AnyPool) -> anyhow::Result<()> {
    // Key-value options. `expires_at_ms = 0` never expires.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS options (
  name TEXT PRIMARY KEY,
  value TEXT NOT NULL,
  expires_at_ms BIGINT NOT NULL DEFAULT 0
);
"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
