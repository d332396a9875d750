//! In-memory AccountContext implementation for tests and local runs.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use runner_core::BigNumber;

use crate::api::AccountContext;

#[derive(Debug, Clone, Default, PartialEq)]
struct Balances {
    gold: BigNumber,
    rebirth_points: BigNumber,
    highest_chapter: u32,
    rebirth_count: u32,
}

/// In-memory implementation of AccountContext.
///
/// Nothing is persisted; the record and balances live as long as the value.
#[derive(Debug, Default)]
pub struct InMemoryAccount {
    balances: RwLock<Balances>,
}

impl InMemoryAccount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account that already reached `highest_chapter`.
    pub fn with_record(highest_chapter: u32) -> Self {
        Self {
            balances: RwLock::new(Balances {
                highest_chapter,
                ..Balances::default()
            }),
        }
    }

    pub fn rebirth_count(&self) -> u32 {
        self.read().rebirth_count
    }

    fn read(&self) -> RwLockReadGuard<'_, Balances> {
        self.balances
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Balances> {
        self.balances
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl AccountContext for InMemoryAccount {
    fn gold(&self) -> BigNumber {
        self.read().gold
    }

    fn add_gold(&self, amount: BigNumber) {
        self.write().gold += amount;
    }

    fn rebirth_points(&self) -> BigNumber {
        self.read().rebirth_points
    }

    fn add_rebirth_points(&self, amount: BigNumber) {
        self.write().rebirth_points += amount;
    }

    fn highest_chapter(&self) -> u32 {
        self.read().highest_chapter
    }

    fn set_highest_chapter(&self, chapter: u32) {
        let mut balances = self.write();
        balances.highest_chapter = balances.highest_chapter.max(chapter);
    }

    fn rebirth(&self) {
        let mut balances = self.write();
        balances.gold = BigNumber::ZERO;
        balances.rebirth_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_never_lowers() {
        let account = InMemoryAccount::with_record(5);
        account.set_highest_chapter(3);
        assert_eq!(account.highest_chapter(), 5);
        account.set_highest_chapter(6);
        assert_eq!(account.highest_chapter(), 6);
    }

    #[test]
    fn rebirth_keeps_points_and_record() {
        let account = InMemoryAccount::with_record(4);
        account.add_gold(BigNumber::from(100u32));
        account.add_rebirth_points(BigNumber::from(3u32));

        account.rebirth();

        assert_eq!(account.gold(), BigNumber::ZERO);
        assert_eq!(account.rebirth_points(), BigNumber::from(3u32));
        assert_eq!(account.highest_chapter(), 4);
        assert_eq!(account.rebirth_count(), 1);
    }
}
