pub mod database;
pub mod dispatch;
pub mod fcm;
pub mod gateway;
pub mod memory;
pub mod notification;
pub mod store;
pub mod token;

// 重新导出常用类型
pub use database::Database;
pub use dispatch::DispatchService;
pub use fcm::FcmGateway;
pub use gateway::{DeliveryGateway, GatewayError, LogGateway};
pub use memory::MemoryStore;
pub use notification::NotificationService;
pub use store::{NotificationStore, StoreError, TokenStore};
pub use token::TokenService;
