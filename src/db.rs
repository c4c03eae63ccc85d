use std::{fmt::Display, future::Future, time::Duration};

use anyhow::{Context, anyhow};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, Set,
};
use sea_orm_migration::MigratorTrait;
use sqlx::{Connection, Executor, MySqlConnection};

use crate::{
    config::{DatabaseConfig, mysql_url},
    entity::{Products, products},
    migration::Migrator,
};

/// Runs `connect` against every candidate, for up to `attempts` rounds, sleeping
/// `delay` between failed rounds. Returns the candidate that worked with its connection.
pub async fn connect_with_retry<C, T, E, F, Fut>(
    candidates: &[C],
    attempts: u32,
    delay: Duration,
    mut connect: F,
) -> anyhow::Result<(C, T)>
where
    C: Clone,
    E: Display,
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = attempts.max(1);
    let mut last_error = String::from("no connection candidates");

    for attempt in 1..=attempts {
        for candidate in candidates {
            match connect(candidate.clone()).await {
                Ok(conn) => return Ok((candidate.clone(), conn)),
                Err(err) => {
                    tracing::warn!(attempt, attempts, error = %err, "database connection failed");
                    last_error = err.to_string();
                }
            }
        }
        if attempt < attempts {
            tokio::time::sleep(delay).await;
        }
    }

    Err(anyhow!(
        "could not connect to database after {attempts} attempts: {last_error}"
    ))
}

/// Create a SeaORM pool with a fixed connection limit.
pub async fn create_pool(database_url: String, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url);
    options
        .max_connections(max_connections.max(1))
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}

/// Connects to the MySQL server without selecting a database, creates the
/// configured database if needed, and returns the URL of that database.
async fn prepare_mysql_database(config: &DatabaseConfig) -> anyhow::Result<String> {
    let mut passwords = vec![config.password.clone()];
    if config.allow_empty_password_fallback && !config.password.is_empty() {
        passwords.push(String::new());
    }

    let (password, conn) = connect_with_retry(
        &passwords,
        config.connect_attempts,
        config.connect_delay,
        |password: String| {
            let url = mysql_url(&config.host, config.port, &config.user, &password, None);
            async move { MySqlConnection::connect(&url).await }
        },
    )
    .await?;

    if password != config.password {
        tracing::warn!(
            user = %config.user,
            "connected to MySQL with an empty password; disable DB_ALLOW_EMPTY_PASSWORD_FALLBACK outside local development"
        );
    }

    ensure_database(conn, &config.name).await?;
    Ok(mysql_url(
        &config.host,
        config.port,
        &config.user,
        &password,
        Some(&config.name),
    ))
}

async fn ensure_database(mut conn: MySqlConnection, name: &str) -> anyhow::Result<()> {
    let statement = format!(
        "CREATE DATABASE IF NOT EXISTS `{}` CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci",
        name.replace('`', "``")
    );
    conn.execute(statement.as_str())
        .await
        .with_context(|| format!("failed to create database {name}"))?;
    conn.close().await?;
    tracing::info!(database = %name, "database ready");
    Ok(())
}

/// Connects to the configured database, creating it first on MySQL.
pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let url = match &config.url_override {
        Some(url) => url.clone(),
        None => prepare_mysql_database(config).await?,
    };

    let (_, orm) = connect_with_retry(
        &[url],
        config.connect_attempts,
        config.connect_delay,
        |url: String| create_pool(url, config.pool_size),
    )
    .await?;
    Ok(orm)
}

pub async fn migrate(orm: &DatabaseConnection) -> anyhow::Result<()> {
    Migrator::up(orm, None)
        .await
        .context("failed to run migrations")
}

/// Connect, create the schema and seed sample data. Any failure here is fatal for the caller.
pub async fn bootstrap(config: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let orm = connect(config).await?;
    migrate(&orm).await?;

    let seeded = seed_sample_products(&orm).await?;
    if seeded > 0 {
        tracing::info!(count = seeded, "seeded sample products");
    }

    Ok(orm)
}

/// Inserts the two catalog samples when the products table is empty.
pub async fn seed_sample_products(orm: &DatabaseConnection) -> Result<u64, DbErr> {
    if Products::find().count(orm).await? > 0 {
        return Ok(0);
    }

    let samples = [("Plugin Analytics", "addon", 19.9), ("Tema Dark Pro", "theme", 5.5)];
    for (name, kind, price) in samples {
        products::ActiveModel {
            name: Set(name.to_string()),
            kind: Set(kind.to_string()),
            category: Set(None),
            price: Set(price),
            seller_id: Set(None),
            approved: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(orm)
        .await?;
    }
    Ok(samples.len() as u64)
}

pub async fn ping(orm: &DatabaseConnection) -> bool {
    orm.ping().await.is_ok()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_configured_rounds() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = calls.clone();
        let result = connect_with_retry(
            &["secret".to_string(), String::new()],
            3,
            Duration::from_secs(3),
            move |password: String| {
                seen.lock().unwrap().push(password);
                async { Err::<(), _>("connection refused") }
            },
        )
        .await;

        let err = result.unwrap_err().to_string();
        assert!(err.contains("after 3 attempts"), "{err}");
        assert!(err.contains("connection refused"));
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 6);
        assert_eq!(calls[0], "secret");
        assert_eq!(calls[1], "");
    }

    #[tokio::test(start_paused = true)]
    async fn falls_back_to_second_candidate() {
        let (password, conn) = connect_with_retry(
            &["wrong".to_string(), String::new()],
            10,
            Duration::from_secs(3),
            |password: String| async move {
                if password.is_empty() {
                    Ok(42)
                } else {
                    Err("access denied")
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(password, "");
        assert_eq!(conn, 42);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_a_later_round() {
        let mut remaining_failures = 2;
        let started = tokio::time::Instant::now();
        let (_, conn) = connect_with_retry(&["pw".to_string()], 5, Duration::from_secs(3), |_| {
            let fail = remaining_failures > 0;
            remaining_failures -= 1;
            async move { if fail { Err("not yet") } else { Ok("connected") } }
        })
        .await
        .unwrap();

        assert_eq!(conn, "connected");
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(6) && elapsed < Duration::from_secs(9));
    }

    #[tokio::test]
    async fn seeds_only_an_empty_catalog() {
        let orm = create_pool("sqlite::memory:".to_string(), 1).await.unwrap();
        Migrator::up(&orm, None).await.unwrap();

        assert_eq!(seed_sample_products(&orm).await.unwrap(), 2);
        assert_eq!(seed_sample_products(&orm).await.unwrap(), 0);

        let names: Vec<String> = Products::find()
            .all(&orm)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert!(names.contains(&"Plugin Analytics".to_string()));
        assert!(names.contains(&"Tema Dark Pro".to_string()));
        assert!(ping(&orm).await);
    }
}
