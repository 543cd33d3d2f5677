pub mod keyboard;
pub mod speaker;
pub mod video_scanner;

pub use keyboard::Keyboard;
pub use speaker::{Sample, Speaker};
pub use video_scanner::VideoScanner;
