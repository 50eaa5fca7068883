pub mod authenticate;
pub use self::authenticate::{AuthenticateResponse, RadiusRequest};

pub mod health;
pub use self::health::Health;
