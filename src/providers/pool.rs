//! Native coin pool owned by the relay module.

use alloy_primitives::U256;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::error::PoolError;
use crate::traits::NativePool;

/// Tracks the relay module's native balance in memory.
#[derive(Debug, Clone, Default)]
pub struct ModulePool {
    balance: Arc<Mutex<U256>>,
}

impl ModulePool {
    pub fn with_balance(balance: U256) -> Self {
        Self {
            balance: Arc::new(Mutex::new(balance)),
        }
    }

    pub fn balance(&self) -> U256 {
        self.balance.lock().map(|b| *b).unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, U256>, PoolError> {
        self.balance
            .lock()
            .map_err(|_| PoolError::Unavailable("pool lock poisoned".to_string()))
    }
}

impl NativePool for ModulePool {
    fn burn(&self, amount: U256) -> Result<(), PoolError> {
        let mut balance = self.lock()?;
        let remaining = balance
            .checked_sub(amount)
            .ok_or(PoolError::InsufficientBalance {
                balance: *balance,
                requested: amount,
            })?;
        *balance = remaining;
        debug!(amount = %amount, remaining = %remaining, event = "native_burnt");
        Ok(())
    }

    fn refund(&self, amount: U256) -> Result<(), PoolError> {
        let mut balance = self.lock()?;
        *balance = balance.saturating_add(amount);
        debug!(amount = %amount, balance = %*balance, event = "native_refunded");
        Ok(())
    }
}
