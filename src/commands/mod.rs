pub mod apps;
pub mod health;
pub mod insights;
pub mod rankings;
pub mod trends;

// Re-export command functions for convenience
pub use apps::{apps, keywords, ratings};
pub use health::health;
pub use insights::{competitors, landscape, low_competition, opportunities, similar};
pub use rankings::{compare, history, search};
pub use trends::{anomalies, predict, trends};
