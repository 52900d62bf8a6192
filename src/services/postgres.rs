use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use thiserror::Error;

use crate::models::{DesignCategory, DesignStyle, DesignerCandidate, Portfolio, PortfolioImage};
use crate::services::source::{normalize_needles, CandidateSource, SourceError};

/// Default cap on designers returned by one lookup
pub const DEFAULT_MAX_CANDIDATES: usize = 50;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// PostgreSQL-backed designer lookup
///
/// Designers are matched when a selected category or style token, or any of
/// their portfolios' title, description or category token, contains one of
/// the keywords. Full records (categories, styles, portfolios, images) are
/// loaded for the matched ids in a second pass.
pub struct PostgresCandidateSource {
    pool: PgPool,
    max_candidates: usize,
}

impl PostgresCandidateSource {
    /// Create a new source from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        max_candidates: usize,
    ) -> Result<Self, PostgresError> {
        if max_candidates == 0 {
            return Err(PostgresError::InvalidInput("max_candidates must be positive".into()));
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool, max_candidates })
    }

    /// Create a new source from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        max_candidates: Option<usize>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL candidate store");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            max_candidates.unwrap_or(DEFAULT_MAX_CANDIDATES),
        )
        .await
    }

    /// Ids of designers mentioning any of the given LIKE patterns
    async fn find_designer_ids(&self, patterns: &[String]) -> Result<Vec<i64>, PostgresError> {
        let query = r#"
            SELECT u.id
            FROM users u
            WHERE u.user_type = 'DESIGNER'
              AND (
                EXISTS (
                    SELECT 1 FROM user_design_categories c
                    WHERE c.user_id = u.id AND c.design_category ILIKE ANY($1)
                )
                OR EXISTS (
                    SELECT 1 FROM user_design_styles s
                    WHERE s.user_id = u.id AND s.design_style ILIKE ANY($1)
                )
                OR EXISTS (
                    SELECT 1 FROM portfolios p
                    LEFT JOIN portfolio_design_categories pc ON pc.portfolio_id = p.id
                    WHERE p.designer_id = u.id
                      AND (p.title ILIKE ANY($1)
                           OR p.description ILIKE ANY($1)
                           OR pc.design_category ILIKE ANY($1))
                )
              )
            ORDER BY u.id
            LIMIT $2
        "#;

        let rows = sqlx::query(query)
            .bind(patterns)
            .bind(self.max_candidates as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    /// Load complete designer records, preserving the order of `ids`
    async fn load_designers(&self, ids: &[i64]) -> Result<Vec<DesignerCandidate>, PostgresError> {
        let users = sqlx::query("SELECT id, nickname, image_url FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        let mut designers: HashMap<i64, DesignerCandidate> = users
            .iter()
            .map(|row| {
                let id: i64 = row.get("id");
                let candidate = DesignerCandidate {
                    user_id: id,
                    nickname: row.get("nickname"),
                    profile_image_url: row.get("image_url"),
                    ..Default::default()
                };
                (id, candidate)
            })
            .collect();

        let categories = sqlx::query(
            "SELECT user_id, design_category FROM user_design_categories WHERE user_id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        for row in &categories {
            let user_id: i64 = row.get("user_id");
            let token: String = row.get("design_category");
            if let (Some(designer), Some(category)) = (designers.get_mut(&user_id), parse_token::<DesignCategory>(&token)) {
                designer.categories.push(category);
            }
        }

        let styles = sqlx::query(
            "SELECT user_id, design_style FROM user_design_styles WHERE user_id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        for row in &styles {
            let user_id: i64 = row.get("user_id");
            let token: String = row.get("design_style");
            if let (Some(designer), Some(style)) = (designers.get_mut(&user_id), parse_token::<DesignStyle>(&token)) {
                designer.styles.push(style);
            }
        }

        let portfolios = self.load_portfolios(ids).await?;
        for (designer_id, portfolio) in portfolios {
            if let Some(designer) = designers.get_mut(&designer_id) {
                designer.portfolios.push(portfolio);
            }
        }

        Ok(ids.iter().filter_map(|id| designers.remove(id)).collect())
    }

    /// Portfolios with their categories and images, keyed by designer id
    async fn load_portfolios(&self, designer_ids: &[i64]) -> Result<Vec<(i64, Portfolio)>, PostgresError> {
        let rows = sqlx::query(
            "SELECT id, designer_id, title, description FROM portfolios WHERE designer_id = ANY($1) ORDER BY id",
        )
        .bind(designer_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut portfolios: Vec<(i64, Portfolio)> = rows
            .iter()
            .map(|row| {
                let portfolio = Portfolio {
                    id: row.get("id"),
                    title: row.get("title"),
                    description: row.get("description"),
                    categories: Vec::new(),
                    images: Vec::new(),
                };
                (row.get("designer_id"), portfolio)
            })
            .collect();

        if portfolios.is_empty() {
            return Ok(portfolios);
        }

        let portfolio_ids: Vec<i64> = portfolios.iter().map(|(_, p)| p.id).collect();
        let index: HashMap<i64, usize> = portfolio_ids
            .iter()
            .enumerate()
            .map(|(position, id)| (*id, position))
            .collect();

        let categories = sqlx::query(
            "SELECT portfolio_id, design_category FROM portfolio_design_categories WHERE portfolio_id = ANY($1) ORDER BY id",
        )
        .bind(&portfolio_ids)
        .fetch_all(&self.pool)
        .await?;

        for row in &categories {
            let portfolio_id: i64 = row.get("portfolio_id");
            let token: String = row.get("design_category");
            if let (Some(&position), Some(category)) = (index.get(&portfolio_id), parse_token::<DesignCategory>(&token)) {
                portfolios[position].1.categories.push(category);
            }
        }

        let images = sqlx::query(
            r#"
            SELECT id, portfolio_id, image_url, image_name, is_thumbnail
            FROM portfolio_images
            WHERE portfolio_id = ANY($1)
            ORDER BY display_order, id
            "#,
        )
        .bind(&portfolio_ids)
        .fetch_all(&self.pool)
        .await?;

        for row in &images {
            let portfolio_id: i64 = row.get("portfolio_id");
            if let Some(&position) = index.get(&portfolio_id) {
                portfolios[position].1.images.push(PortfolioImage {
                    id: row.get("id"),
                    image_url: row.get("image_url"),
                    image_name: row.get("image_name"),
                    is_thumbnail: row.get::<Option<bool>, _>("is_thumbnail").unwrap_or(false),
                });
            }
        }

        Ok(portfolios)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl CandidateSource for PostgresCandidateSource {
    async fn find_candidates(&self, keywords: &[String]) -> Result<Vec<DesignerCandidate>, SourceError> {
        let patterns: Vec<String> = normalize_needles(keywords)
            .iter()
            .map(|keyword| like_pattern(keyword))
            .collect();

        if patterns.is_empty() {
            return Ok(Vec::new());
        }

        let ids = self.find_designer_ids(&patterns).await?;
        tracing::debug!("Matched {} designer ids for {} keywords", ids.len(), patterns.len());

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self.load_designers(&ids).await?)
    }
}

/// `%keyword%` with LIKE metacharacters escaped
pub fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn parse_token<T: FromStr>(token: &str) -> Option<T> {
    match token.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Skipping unknown vocabulary token from database: {}", token);
            None
        }
    }
}
