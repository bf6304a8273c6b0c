use moka::future::Cache;
use sqlx::MySqlPool;
use std::time::Duration;
use tracing::debug;

use crate::error::HrResult;
use crate::model::employee::EmployeeRef;
use crate::store::EmployeeDirectory;

#[derive(Clone)]
pub struct MySqlEmployeeDirectory {
    pool: MySqlPool,
}

impl MySqlEmployeeDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl EmployeeDirectory for MySqlEmployeeDirectory {
    async fn find(&self, employee_id: u64) -> HrResult<Option<EmployeeRef>> {
        let employee = sqlx::query_as::<_, EmployeeRef>(
            "SELECT id, department_id FROM employees WHERE id = ?",
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }

    async fn department_members(&self, department_id: u64) -> HrResult<Vec<u64>> {
        let ids = sqlx::query_scalar::<_, u64>(
            "SELECT id FROM employees WHERE department_id = ? ORDER BY id",
        )
        .bind(department_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}

/// Caches positive lookups; misses always go to the inner directory so a newly
/// hired employee is visible immediately.
#[derive(Clone)]
pub struct CachedDirectory<D> {
    inner: D,
    cache: Cache<u64, EmployeeRef>,
}

impl<D: EmployeeDirectory> CachedDirectory<D> {
    pub fn new(inner: D, capacity: u64, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }
}

impl<D: EmployeeDirectory> EmployeeDirectory for CachedDirectory<D> {
    async fn find(&self, employee_id: u64) -> HrResult<Option<EmployeeRef>> {
        if let Some(hit) = self.cache.get(&employee_id).await {
            return Ok(Some(hit));
        }

        let found = self.inner.find(employee_id).await?;
        if let Some(employee) = found {
            debug!(employee_id, "Caching employee directory entry");
            self.cache.insert(employee_id, employee).await;
        }
        Ok(found)
    }

    // membership changes with transfers, not worth caching
    async fn department_members(&self, department_id: u64) -> HrResult<Vec<u64>> {
        self.inner.department_members(department_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Default)]
    struct CountingDirectory {
        lookups: Arc<AtomicUsize>,
    }

    impl EmployeeDirectory for CountingDirectory {
        async fn find(&self, employee_id: u64) -> HrResult<Option<EmployeeRef>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok((employee_id == 7).then_some(EmployeeRef {
                id: 7,
                department_id: Some(2),
            }))
        }

        async fn department_members(&self, _department_id: u64) -> HrResult<Vec<u64>> {
            Ok(vec![7])
        }
    }

    #[actix_web::test]
    async fn hits_are_served_from_cache() {
        let inner = CountingDirectory::default();
        let lookups = inner.lookups.clone();
        let directory = CachedDirectory::new(inner, 100, Duration::from_secs(60));

        assert_eq!(directory.find(7).await.unwrap().map(|e| e.id), Some(7));
        assert_eq!(directory.find(7).await.unwrap().map(|e| e.id), Some(7));
        assert_eq!(lookups.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn misses_are_not_cached() {
        let inner = CountingDirectory::default();
        let lookups = inner.lookups.clone();
        let directory = CachedDirectory::new(inner, 100, Duration::from_secs(60));

        assert!(directory.find(8).await.unwrap().is_none());
        assert!(directory.find(8).await.unwrap().is_none());
        assert_eq!(lookups.load(Ordering::SeqCst), 2);
    }
}
