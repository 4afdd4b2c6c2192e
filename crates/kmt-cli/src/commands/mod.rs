pub mod audit;
pub mod dispatch;
pub mod export;
pub mod material;
pub mod ppe;
pub mod recovery;
pub mod request;
pub mod shared;
