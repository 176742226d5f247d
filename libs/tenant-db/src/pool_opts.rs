//! Applies `PoolCfg` to each engine's sqlx pool builder.

use crate::PoolCfg;

pub trait ApplyPoolOpts {
    #[must_use]
    fn apply(self, cfg: &PoolCfg) -> Self;
}

macro_rules! impl_apply_pool_opts {
    ($feature:literal, $ty:ty) => {
        #[cfg(feature = $feature)]
        impl ApplyPoolOpts for $ty {
            fn apply(mut self, cfg: &PoolCfg) -> Self {
                if let Some(n) = cfg.max_conns {
                    self = self.max_connections(n);
                }
                if let Some(n) = cfg.min_conns {
                    self = self.min_connections(n);
                }
                if let Some(t) = cfg.acquire_timeout {
                    self = self.acquire_timeout(t);
                }
                if let Some(t) = cfg.idle_timeout {
                    self = self.idle_timeout(t);
                }
                if let Some(t) = cfg.max_lifetime {
                    self = self.max_lifetime(t);
                }
                if cfg.test_before_acquire {
                    self = self.test_before_acquire(true);
                }
                self
            }
        }
    };
}

impl_apply_pool_opts!("pg", sea_orm::sqlx::postgres::PgPoolOptions);
impl_apply_pool_opts!("mysql", sea_orm::sqlx::mysql::MySqlPoolOptions);
impl_apply_pool_opts!("sqlite", sea_orm::sqlx::sqlite::SqlitePoolOptions);
