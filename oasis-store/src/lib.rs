pub mod app_config;
pub mod database;
pub mod memory;
pub mod operator_repo;
pub mod reservation_repo;

pub use app_config::Config;
pub use database::DbClient;
pub use memory::MemoryStore;
pub use operator_repo::SqliteOperatorDirectory;
pub use reservation_repo::SqliteReservationStore;
