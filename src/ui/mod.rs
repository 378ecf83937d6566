pub mod app;
pub mod components;
pub mod layout;

// Re-export commonly used items
pub use app::App;
pub use layout::draw;
