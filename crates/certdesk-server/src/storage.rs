//! Persistence client for courses, certificates and institution config.
//!
//! Reads that back a listing (history, searches, course names, config)
//! log failures and fall back to empty or default results. Writes, the
//! duplicate guard and lookups by code propagate the error.

use sqlx::PgPool;
use tracing::{error, info};

use crate::models::{Certificate, CourseInsert, InstitutionConfig, NewCertificate};

/// Postgres SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

const SELECT_CERTIFICATES: &str = r#"
    SELECT c.id, c.names, c.surnames, c.identification, c.email, c.phone,
           c.course_id, COALESCE(co.name, c.course_name) AS course,
           c.issue_date, c.unique_code, c.created_at,
           c.config_institution_name, c.config_logo_url,
           c.config_signature_url, c.config_primary_color
    FROM certificates c
    LEFT JOIN courses co ON co.id = c.course_id
"#;

/// Escapes LIKE wildcards and wraps the term for a substring match.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.trim().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

// ---------------------------------------------------------------------------
// Certificates
// ---------------------------------------------------------------------------

/// All certificates, newest first.
pub async fn list_certificates(pool: &PgPool) -> Vec<Certificate> {
    let sql = format!("{} ORDER BY c.created_at DESC", SELECT_CERTIFICATES);
    sqlx::query_as::<_, Certificate>(&sql)
        .fetch_all(pool)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to list certificates: {}", e);
            Vec::new()
        })
}

/// Admin history search over names, surnames, identification, course and
/// code. A blank term lists everything.
pub async fn search_certificates(pool: &PgPool, term: &str) -> Vec<Certificate> {
    if term.trim().is_empty() {
        return list_certificates(pool).await;
    }

    let sql = format!(
        r#"{}
        WHERE c.names ILIKE $1
           OR c.surnames ILIKE $1
           OR c.identification ILIKE $1
           OR COALESCE(co.name, c.course_name) ILIKE $1
           OR c.unique_code ILIKE $1
        ORDER BY c.created_at DESC"#,
        SELECT_CERTIFICATES
    );
    sqlx::query_as::<_, Certificate>(&sql)
        .bind(like_pattern(term))
        .fetch_all(pool)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to search certificates: {}", e);
            Vec::new()
        })
}

/// Public search: case-insensitive substring match on identification.
pub async fn search_by_identification(pool: &PgPool, term: &str) -> Vec<Certificate> {
    let sql = format!(
        "{} WHERE c.identification ILIKE $1 ORDER BY c.created_at DESC",
        SELECT_CERTIFICATES
    );
    sqlx::query_as::<_, Certificate>(&sql)
        .bind(like_pattern(term))
        .fetch_all(pool)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to search certificates by identification: {}", e);
            Vec::new()
        })
}

/// Looks up a certificate by its unique code (exact, case-insensitive).
///
/// Codes are not unique at the store level; the oldest match wins.
pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Certificate>, sqlx::Error> {
    let sql = format!(
        "{} WHERE UPPER(c.unique_code) = UPPER($1) ORDER BY c.created_at ASC LIMIT 1",
        SELECT_CERTIFICATES
    );
    sqlx::query_as::<_, Certificate>(&sql)
        .bind(code.trim())
        .fetch_optional(pool)
        .await
}

/// Duplicate guard: has this person already been certified for the course?
pub async fn certificate_exists(
    pool: &PgPool,
    identification: &str,
    course: &str,
) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM certificates c
            LEFT JOIN courses co ON co.id = c.course_id
            WHERE c.identification = $1
              AND COALESCE(co.name, c.course_name) = $2
        )
        "#,
    )
    .bind(identification)
    .bind(course)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

/// Inserts a certificate, linking it to the course with the same name if
/// one exists.
pub async fn insert_certificate(
    pool: &PgPool,
    new: &NewCertificate,
) -> Result<Certificate, sqlx::Error> {
    let course_id: Option<(uuid::Uuid,)> =
        sqlx::query_as("SELECT id FROM courses WHERE name = $1")
            .bind(&new.course)
            .fetch_optional(pool)
            .await?;

    let certificate = sqlx::query_as::<_, Certificate>(
        r#"
        INSERT INTO certificates (
            names, surnames, identification, email, phone,
            course_id, course_name, issue_date, unique_code,
            config_institution_name, config_logo_url,
            config_signature_url, config_primary_color
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING id, names, surnames, identification, email, phone,
                  course_id, course_name AS course, issue_date, unique_code,
                  created_at, config_institution_name, config_logo_url,
                  config_signature_url, config_primary_color
        "#,
    )
    .bind(&new.names)
    .bind(&new.surnames)
    .bind(&new.identification)
    .bind(&new.email)
    .bind(&new.phone)
    .bind(course_id.map(|(id,)| id))
    .bind(&new.course)
    .bind(new.issue_date)
    .bind(&new.unique_code)
    .bind(&new.snapshot.institution_name)
    .bind(&new.snapshot.logo_url)
    .bind(&new.snapshot.signature_url)
    .bind(&new.snapshot.primary_color)
    .fetch_one(pool)
    .await?;

    info!(code = %certificate.unique_code, "Certificate stored");
    Ok(certificate)
}

// ---------------------------------------------------------------------------
// Courses
// ---------------------------------------------------------------------------

/// Course names in alphabetical order.
pub async fn list_course_names(pool: &PgPool) -> Vec<String> {
    sqlx::query_as::<_, (String,)>("SELECT name FROM courses ORDER BY name ASC")
        .fetch_all(pool)
        .await
        .map(|rows| rows.into_iter().map(|(name,)| name).collect())
        .unwrap_or_else(|e| {
            error!("Failed to list courses: {}", e);
            Vec::new()
        })
}

/// Inserts a course. An existing name yields [`CourseInsert::Duplicate`].
pub async fn insert_course(pool: &PgPool, name: &str) -> Result<CourseInsert, sqlx::Error> {
    let result = sqlx::query("INSERT INTO courses (name) VALUES ($1)")
        .bind(name)
        .execute(pool)
        .await;

    match result {
        Ok(_) => Ok(CourseInsert::Created),
        Err(sqlx::Error::Database(db_err))
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
        {
            Ok(CourseInsert::Duplicate)
        }
        Err(e) => Err(e),
    }
}

/// Deletes a course by name. Returns false when nothing matched.
///
/// Certificates keep their literal course name.
pub async fn delete_course(pool: &PgPool, name: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM courses WHERE name = $1")
        .bind(name)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// Institution config
// ---------------------------------------------------------------------------

/// Current config; defaults when the row is absent or unreadable.
pub async fn fetch_config(pool: &PgPool) -> InstitutionConfig {
    let result = sqlx::query_as::<_, InstitutionConfig>(
        r#"
        SELECT institution_name, logo_url, signature_url, primary_color, secondary_color
        FROM app_config
        WHERE id = 1
        "#,
    )
    .fetch_optional(pool)
    .await;

    match result {
        Ok(Some(config)) => config,
        Ok(None) => InstitutionConfig::default(),
        Err(e) => {
            error!("Failed to load institution config: {}", e);
            InstitutionConfig::default()
        }
    }
}

/// Upserts the singleton config row.
pub async fn update_config(
    pool: &PgPool,
    config: &InstitutionConfig,
) -> Result<InstitutionConfig, sqlx::Error> {
    sqlx::query_as::<_, InstitutionConfig>(
        r#"
        INSERT INTO app_config (
            id, institution_name, logo_url, signature_url,
            primary_color, secondary_color, updated_at
        )
        VALUES (1, $1, $2, $3, $4, $5, NOW())
        ON CONFLICT (id) DO UPDATE SET
            institution_name = EXCLUDED.institution_name,
            logo_url = EXCLUDED.logo_url,
            signature_url = EXCLUDED.signature_url,
            primary_color = EXCLUDED.primary_color,
            secondary_color = EXCLUDED.secondary_color,
            updated_at = NOW()
        RETURNING institution_name, logo_url, signature_url, primary_color, secondary_color
        "#,
    )
    .bind(&config.institution_name)
    .bind(&config.logo_url)
    .bind(&config.signature_url)
    .bind(&config.primary_color)
    .bind(&config.secondary_color)
    .fetch_one(pool)
    .await
}
