//! Infrastructure layer: storage adapters, configuration, locking and the
//! async bank service built on the pure ledger.

pub mod bank;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod locks;
pub mod store;


pub use bank::Bank;
pub use bootstrap::{connect, DynBank};
pub use config::BankConfig;
pub use error::{BankError, BankResult};
pub use locks::AccountLocks;
pub use store::{BankStore, InMemoryBankStore, PostgresBankStore, StoreError};
