mod material;
mod ppe;
mod recovery;
mod request;

pub use material::MaterialCommands;
pub use ppe::PpeCommands;
pub use recovery::RecoveryCommands;
pub use request::RequestCommands;
