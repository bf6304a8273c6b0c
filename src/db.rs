use anyhow::{Context, Result};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use tracing::info;

pub async fn init_db(database_url: &str, max_connections: u32) -> Result<MySqlPool> {
    MySqlPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("Failed to connect to database")
}

/// Creates the tables this service needs when they are missing. The employee
/// and department tables are owned by the HR core; only the columns read here
/// are declared.
pub async fn run_migrations(pool: &MySqlPool) -> Result<()> {
    info!("Running database migrations...");

    create_departments_table(pool).await?;
    create_employees_table(pool).await?;
    create_attendances_table(pool).await?;
    create_leaves_table(pool).await?;

    info!("Database migrations completed successfully");
    Ok(())
}

async fn create_departments_table(pool: &MySqlPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS departments (
            id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
            name VARCHAR(100) NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_employees_table(pool: &MySqlPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS employees (
            id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
            department_id BIGINT UNSIGNED NULL,
            INDEX idx_employees_department (department_id),
            FOREIGN KEY (department_id) REFERENCES departments (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_attendances_table(pool: &MySqlPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendances (
            id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
            employee_id BIGINT UNSIGNED NOT NULL,
            date DATE NOT NULL,
            check_in_time TIME NULL,
            check_out_time TIME NULL,
            break_start_time TIME NULL,
            break_end_time TIME NULL,
            work_hours DOUBLE NOT NULL DEFAULT 0,
            status VARCHAR(20) NOT NULL,
            notes VARCHAR(500) NULL,
            ip_address VARCHAR(64) NULL,
            location VARCHAR(255) NULL,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL,
            UNIQUE KEY uq_attendance_employee_date (employee_id, date),
            INDEX idx_attendance_date (date),
            FOREIGN KEY (employee_id) REFERENCES employees (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_leaves_table(pool: &MySqlPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS leaves (
            id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
            employee_id BIGINT UNSIGNED NOT NULL,
            leave_type VARCHAR(20) NOT NULL,
            start_date DATE NOT NULL,
            end_date DATE NOT NULL,
            number_of_days INT UNSIGNED NOT NULL,
            reason VARCHAR(500) NULL,
            status VARCHAR(20) NOT NULL,
            approved_by BIGINT UNSIGNED NULL,
            approved_at DATETIME NULL,
            comments VARCHAR(500) NULL,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NULL,
            INDEX idx_leaves_employee (employee_id, start_date),
            INDEX idx_leaves_status (status),
            FOREIGN KEY (employee_id) REFERENCES employees (id),
            FOREIGN KEY (approved_by) REFERENCES employees (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
